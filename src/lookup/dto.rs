use serde::{Deserialize, Serialize};

/// Body of a lookup request to the nutrition service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalorieRequest {
    pub dish_name: String,
    pub servings: f64,
}

/// Nutrition data returned for a dish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalorieResult {
    pub dish_name: String,
    pub servings: f64,
    pub calories_per_serving: f64,
    pub total_calories: f64,
    pub source: String,
}

/// Wire shape of the service's answer. The service reports a missing dish
/// as `{ "error": "..." }`, so the error form is tried first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CalorieResponse {
    Failure { error: String },
    Success(CalorieResult),
}

/// Request body accepted by the built-in `/api/get-calories` endpoint. Fields
/// are optional so that missing ones get the service's own error message.
#[derive(Debug, Deserialize)]
pub(crate) struct GetCaloriesBody {
    pub dish_name: Option<String>,
    pub servings: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
