use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::meals::types::{totals_agree, MealSnapshot, NewMeal, SavedMeal, TrackingMeal};

const ADD_FAILED: &str = "Failed to add meal";

/// Owned tracker state: saved-meal catalog, active tracking log and the
/// append-only history.
///
/// All mutation goes through `&mut self`, so a reader never sees the tracking
/// log and the history out of step.
pub struct MealStore {
    saved_meals: Vec<SavedMeal>,
    tracking_meals: Vec<TrackingMeal>,
    meal_history: Vec<TrackingMeal>,
    error: Option<String>,
    clock: Arc<dyn Clock>,
}

impl MealStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            saved_meals: Vec::new(),
            tracking_meals: Vec::new(),
            meal_history: Vec::new(),
            error: None,
            clock,
        }
    }

    /// Rebuilds a store from a persisted snapshot. The tracking log starts empty.
    pub fn restore(snapshot: MealSnapshot, clock: Arc<dyn Clock>) -> Self {
        info!(
            saved = snapshot.saved_meals.len(),
            history = snapshot.meal_history.len(),
            "meal store restored"
        );
        Self {
            saved_meals: snapshot.saved_meals,
            tracking_meals: Vec::new(),
            meal_history: snapshot.meal_history,
            error: None,
            clock,
        }
    }

    pub fn snapshot(&self) -> MealSnapshot {
        MealSnapshot {
            saved_meals: self.saved_meals.clone(),
            meal_history: self.meal_history.clone(),
        }
    }

    /// Commits a meal to the tracking log and the history, and adds it to the
    /// catalog unless it came from a catalog search or the dish is already saved.
    pub fn add(&mut self, meal: NewMeal) -> Result<TrackingMeal, StoreError> {
        self.error = None;
        if let Err(e) = check(&meal) {
            error!(error = %e, dish = %meal.dish_name, "rejected meal");
            self.error = Some(ADD_FAILED.to_string());
            return Err(e);
        }

        let record_in_catalog = !meal.is_search_result;
        let tracked = meal.into_tracking(Uuid::new_v4(), self.clock.now());

        if record_in_catalog
            && !self
                .saved_meals
                .iter()
                .any(|m| m.dish_name == tracked.dish_name)
        {
            self.saved_meals.push(SavedMeal {
                dish_name: tracked.dish_name.clone(),
                calories_per_serving: tracked.calories_per_serving,
                source: tracked.source.clone(),
            });
            debug!(dish = %tracked.dish_name, "saved meal added to catalog");
        }
        self.tracking_meals.push(tracked.clone());
        self.meal_history.push(tracked.clone());

        info!(id = %tracked.id, dish = %tracked.dish_name, category = %tracked.category, "meal tracked");
        Ok(tracked)
    }

    /// Drops a meal from the tracking log. History keeps it. Unknown ids are ignored.
    pub fn remove(&mut self, id: Uuid) {
        let before = self.tracking_meals.len();
        self.tracking_meals.retain(|m| m.id != id);
        if self.tracking_meals.len() == before {
            debug!(%id, "remove: meal not in tracking log");
        } else {
            info!(%id, "meal removed from tracking log");
        }
    }

    /// Tracked meals created on the current local calendar day, in insertion order.
    pub fn todays_meals(&self) -> Vec<&TrackingMeal> {
        let now = self.clock.now();
        let today = now.date();
        self.tracking_meals
            .iter()
            .filter(|m| m.created_at.to_offset(now.offset()).date() == today)
            .collect()
    }

    /// Case-insensitive substring search over the catalog. An empty query matches nothing.
    pub fn searched_meals(&self, query: &str) -> Vec<&SavedMeal> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.saved_meals
            .iter()
            .filter(|m| m.dish_name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn find_saved(&self, dish_name: &str) -> Option<&SavedMeal> {
        self.saved_meals.iter().find(|m| m.dish_name == dish_name)
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn saved_meals(&self) -> &[SavedMeal] {
        &self.saved_meals
    }

    pub fn tracking_meals(&self) -> &[TrackingMeal] {
        &self.tracking_meals
    }

    pub fn history(&self) -> &[TrackingMeal] {
        &self.meal_history
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

fn check(meal: &NewMeal) -> Result<(), StoreError> {
    if meal.dish_name.trim().is_empty() {
        return Err(StoreError::EmptyDishName);
    }
    if !(meal.servings.is_finite() && meal.servings > 0.0) {
        return Err(StoreError::InvalidServings(meal.servings));
    }
    if !(meal.calories_per_serving.is_finite() && meal.calories_per_serving >= 0.0) {
        return Err(StoreError::InvalidCalories(meal.calories_per_serving));
    }
    if !totals_agree(meal.total_calories, meal.servings, meal.calories_per_serving) {
        return Err(StoreError::InconsistentTotal {
            total: meal.total_calories,
            servings: meal.servings,
            calories_per_serving: meal.calories_per_serving,
        });
    }
    Ok(())
}
