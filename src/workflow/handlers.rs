use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error, instrument, warn};

use super::machine::{PendingConfirmation, Resolution, RETRY_MESSAGE};
use super::services::{confirm_meal, lookup_meal};
use super::validation::MealForm;
use crate::{error::WorkflowError, meals::types::TrackingMeal, state::AppState};

pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/lookup", post(lookup))
        .route("/meals/pending", get(pending))
        .route("/meals/confirm", post(confirm))
        .route("/meals/cancel", post(cancel))
        .route("/meals/dismiss", post(dismiss))
}

/// POST /meals/lookup: 200 with the staged meal, 422 with field errors.
#[instrument(skip(state, form))]
pub async fn lookup(State(state): State<AppState>, Json(form): Json<MealForm>) -> Response {
    match lookup_meal(&state, &form).await {
        Ok(Resolution::Pending(pending)) => Json(pending).into_response(),
        Ok(Resolution::Failed(errors)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
        }
        Ok(Resolution::Discarded) => {
            (StatusCode::CONFLICT, "Lookup was dismissed".to_string()).into_response()
        }
        Err(e) => rejection(e).into_response(),
    }
}

#[instrument(skip(state))]
pub async fn pending(
    State(state): State<AppState>,
) -> Result<Json<PendingConfirmation>, (StatusCode, String)> {
    state
        .form
        .lock()
        .await
        .pending()
        .cloned()
        .map(Json)
        .ok_or_else(|| rejection(WorkflowError::NothingPending))
}

#[instrument(skip(state))]
pub async fn confirm(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TrackingMeal>), (StatusCode, String)> {
    let meal = confirm_meal(&state).await.map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(meal)))
}

#[instrument(skip(state))]
pub async fn cancel(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = state.form.lock().await.cancel() {
        debug!(error = %e, "cancel with nothing pending");
    }
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
pub async fn dismiss(State(state): State<AppState>) -> StatusCode {
    state.form.lock().await.dismiss();
    StatusCode::NO_CONTENT
}

fn rejection(e: WorkflowError) -> (StatusCode, String) {
    match e {
        WorkflowError::Busy | WorkflowError::AwaitingConfirmation => {
            warn!(error = %e, "form not ready for a new lookup");
            (StatusCode::CONFLICT, e.to_string())
        }
        WorkflowError::NothingPending => (StatusCode::NOT_FOUND, e.to_string()),
        WorkflowError::Commit(_) => {
            error!(error = %e, "confirm failed");
            (StatusCode::INTERNAL_SERVER_ERROR, RETRY_MESSAGE.into())
        }
    }
}
