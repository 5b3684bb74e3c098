use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Meal slot a tracked meal is logged under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Lunch => "lunch",
            Category::Dinner => "dinner",
            Category::Snack => "snack",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry for quick re-selection. Keyed by `dish_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedMeal {
    pub dish_name: String,
    pub calories_per_serving: f64,
    pub source: String,
}

/// A logged meal. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingMeal {
    pub id: Uuid,
    pub dish_name: String,
    pub servings: f64,
    pub calories_per_serving: f64,
    pub total_calories: f64,
    pub source: String,
    pub category: Category,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Set when the meal was picked from the saved catalog rather than looked up.
    #[serde(default)]
    pub is_search_result: bool,
}

/// Input to `MealStore::add`: a tracking meal without id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMeal {
    pub dish_name: String,
    pub servings: f64,
    pub calories_per_serving: f64,
    pub total_calories: f64,
    pub source: String,
    pub category: Category,
    #[serde(default)]
    pub is_search_result: bool,
}

impl NewMeal {
    pub(crate) fn into_tracking(self, id: Uuid, created_at: OffsetDateTime) -> TrackingMeal {
        TrackingMeal {
            id,
            dish_name: self.dish_name,
            servings: self.servings,
            calories_per_serving: self.calories_per_serving,
            total_calories: self.total_calories,
            source: self.source,
            category: self.category,
            created_at,
            is_search_result: self.is_search_result,
        }
    }
}

/// The persisted part of the store. The active tracking log is not included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MealSnapshot {
    #[serde(default)]
    pub saved_meals: Vec<SavedMeal>,
    #[serde(default)]
    pub meal_history: Vec<TrackingMeal>,
}

/// `servings * calories_per_serving`, the single definition of a meal total.
pub fn total_for(servings: f64, calories_per_serving: f64) -> f64 {
    servings * calories_per_serving
}

pub(crate) fn totals_agree(total: f64, servings: f64, calories_per_serving: f64) -> bool {
    let expected = total_for(servings, calories_per_serving);
    (total - expected).abs() <= 1e-9 * expected.abs().max(1.0)
}
