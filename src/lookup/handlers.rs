use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{CalorieResult, ErrorBody, GetCaloriesBody};
use crate::{meals::types::total_for, state::AppState};

const MISSING_FIELDS: &str = "Dish name and servings are required";

/// Built-in nutrition endpoint. Answers every dish with the configured
/// per-serving value until a real nutrition database is wired in.
pub fn nutrition_routes() -> Router<AppState> {
    Router::new().route("/api/get-calories", post(get_calories))
}

#[instrument(skip(state, body))]
async fn get_calories(
    State(state): State<AppState>,
    body: Result<Json<GetCaloriesBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(e) => {
            warn!(error = %e, "get-calories: unreadable body");
            return bad_request();
        }
    };

    let dish_name = body.dish_name.unwrap_or_default();
    let servings = body.servings.unwrap_or(0.0);
    if dish_name.trim().is_empty() || !(servings.is_finite() && servings > 0.0) {
        return bad_request();
    }

    let nutrition = &state.config.nutrition;
    info!(dish = %dish_name, servings, "get-calories");
    Json(CalorieResult {
        dish_name,
        servings,
        calories_per_serving: nutrition.calories_per_serving,
        total_calories: total_for(servings, nutrition.calories_per_serving),
        source: nutrition.source.clone(),
    })
    .into_response()
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: MISSING_FIELDS.into(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::LookupError;
    use crate::lookup::client::{AuthHeaders, CalorieLookup, HttpCalorieClient};
    use crate::lookup::dto::CalorieRequest;

    struct NoToken;

    #[async_trait::async_trait]
    impl AuthHeaders for NoToken {
        async fn auth_headers(&self) -> reqwest::header::HeaderMap {
            reqwest::header::HeaderMap::new()
        }
    }

    async fn spawn_nutrition_service() -> String {
        let (state, _) = AppState::fake();
        let app = nutrition_routes().with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn client(base: &str) -> HttpCalorieClient {
        HttpCalorieClient::new(base, Duration::from_secs(5), Arc::new(NoToken)).unwrap()
    }

    #[tokio::test]
    async fn client_reads_mock_nutrition_data() {
        let base = spawn_nutrition_service().await;
        let result = client(&base)
            .lookup(&CalorieRequest {
                dish_name: "Chicken Biryani".into(),
                servings: 2.0,
            })
            .await
            .unwrap();

        assert_eq!(result.dish_name, "Chicken Biryani");
        assert_eq!(result.calories_per_serving, 280.0);
        assert_eq!(result.total_calories, 560.0);
        assert_eq!(result.source, "USDA FoodData Central");
    }

    #[tokio::test]
    async fn missing_servings_comes_back_as_field_error() {
        let base = spawn_nutrition_service().await;
        let err = client(&base)
            .lookup(&CalorieRequest {
                dish_name: "Soup".into(),
                servings: 0.0,
            })
            .await
            .unwrap_err();
        assert_eq!(err, LookupError::not_found(MISSING_FIELDS));
    }
}
