use serde::{Deserialize, Serialize};

use crate::meals::summary::CategoryBreakdown;
use crate::meals::types::Category;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
}

/// Logs a saved meal without a new lookup.
#[derive(Debug, Deserialize)]
pub struct TrackSavedRequest {
    pub dish_name: String,
    #[serde(default = "one_serving")]
    pub servings: Option<f64>,
    pub category: Category,
}

fn one_serving() -> Option<f64> {
    Some(1.0)
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    #[serde(flatten)]
    pub breakdown: CategoryBreakdown,
    pub error: Option<String>,
}
