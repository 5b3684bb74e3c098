use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{SearchQuery, TodayResponse, TrackSavedRequest};
use super::services::{remove_meal, track_saved_meal, TrackSavedError};
use super::summary::{by_category, history_by_day, DayLog};
use super::types::{SavedMeal, TrackingMeal};
use crate::state::AppState;

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/today", get(todays_meals))
        .route("/meals/history", get(history))
        .route("/saved-meals", get(search_saved_meals))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/:id", delete(remove))
        .route("/meals/error/clear", post(clear_error))
        .route("/saved-meals/track", post(track_saved))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn todays_meals(State(state): State<AppState>) -> Json<TodayResponse> {
    let store = state.meals.read().await;
    Json(TodayResponse {
        breakdown: by_category(store.todays_meals()),
        error: store.error().map(str::to_string),
    })
}

#[instrument(skip(state))]
pub async fn history(State(state): State<AppState>) -> Json<Vec<DayLog>> {
    let store = state.meals.read().await;
    let offset = store.clock().now().offset();
    Json(history_by_day(store.history(), offset))
}

#[instrument(skip(state))]
pub async fn search_saved_meals(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<SavedMeal>> {
    let store = state.meals.read().await;
    Json(store.searched_meals(&query.q).into_iter().cloned().collect())
}

#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    remove_meal(&state, id).await;
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
pub async fn clear_error(State(state): State<AppState>) -> StatusCode {
    state.meals.write().await.clear_error();
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
pub async fn track_saved(
    State(state): State<AppState>,
    Json(req): Json<TrackSavedRequest>,
) -> Result<(StatusCode, Json<TrackingMeal>), (StatusCode, String)> {
    match track_saved_meal(&state, &req).await {
        Ok(meal) => Ok((StatusCode::CREATED, Json(meal))),
        Err(e) => {
            warn!(error = %e, dish = %req.dish_name, "track saved meal failed");
            let status = match e {
                TrackSavedError::UnknownDish(_) => StatusCode::NOT_FOUND,
                TrackSavedError::InvalidServings(_) => StatusCode::UNPROCESSABLE_ENTITY,
                TrackSavedError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, e.to_string()))
        }
    }
}
