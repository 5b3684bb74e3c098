use thiserror::Error;
use tracing::{error, instrument};

use super::dto::TrackSavedRequest;
use super::types::{total_for, NewMeal, TrackingMeal};
use crate::error::StoreError;
use crate::state::AppState;
use crate::storage::{save_slot, MEAL_SLOT};
use crate::workflow::validation::servings_error;

#[derive(Debug, Error, PartialEq)]
pub enum TrackSavedError {
    #[error("no saved meal named {0:?}")]
    UnknownDish(String),
    #[error("{0}")]
    InvalidServings(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Writes saved meals and history to the `meal-storage` slot. Failures are
/// logged; the in-memory store stays authoritative.
///
/// The store stays write-locked until the slot is written, so saves land on
/// disk in the order their snapshots were taken.
pub async fn persist_meals(state: &AppState) {
    let store = state.meals.write().await;
    let snapshot = store.snapshot();
    if let Err(e) = save_slot(state.slots.as_ref(), MEAL_SLOT, &snapshot).await {
        error!(error = %e, "persist meals failed");
    }
    drop(store);
}

#[instrument(skip(state))]
pub async fn track_saved_meal(
    state: &AppState,
    req: &TrackSavedRequest,
) -> Result<TrackingMeal, TrackSavedError> {
    if let Some(msg) = servings_error(req.servings) {
        return Err(TrackSavedError::InvalidServings(msg));
    }
    let servings = req.servings.unwrap_or(1.0);

    let meal = {
        let mut store = state.meals.write().await;
        let saved = store
            .find_saved(&req.dish_name)
            .cloned()
            .ok_or_else(|| TrackSavedError::UnknownDish(req.dish_name.clone()))?;
        store.add(NewMeal {
            total_calories: total_for(servings, saved.calories_per_serving),
            dish_name: saved.dish_name,
            servings,
            calories_per_serving: saved.calories_per_serving,
            source: saved.source,
            category: req.category,
            is_search_result: true,
        })?
    };
    persist_meals(state).await;
    Ok(meal)
}

pub async fn remove_meal(state: &AppState, id: uuid::Uuid) {
    state.meals.write().await.remove(id);
    persist_meals(state).await;
}
