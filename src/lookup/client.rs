use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, StatusCode};
use tracing::{debug, instrument, warn};

use super::dto::{CalorieRequest, CalorieResponse, CalorieResult};
use crate::error::LookupError;

/// Supplies the auth headers attached to outbound lookups.
#[async_trait]
pub trait AuthHeaders: Send + Sync {
    async fn auth_headers(&self) -> HeaderMap;
}

/// Fetches nutrition data for a dish. Inputs are validated by the caller.
#[async_trait]
pub trait CalorieLookup: Send + Sync {
    async fn lookup(&self, request: &CalorieRequest) -> Result<CalorieResult, LookupError>;
}

/// `CalorieLookup` over HTTP: `POST {base_url}/get-calories`, carrying the
/// session's auth headers.
#[derive(Clone)]
pub struct HttpCalorieClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
    auth: Arc<dyn AuthHeaders>,
}

impl HttpCalorieClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth: Arc<dyn AuthHeaders>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build lookup http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/get-calories", base_url.trim_end_matches('/')),
            timeout,
            auth,
        })
    }
}

#[async_trait]
impl CalorieLookup for HttpCalorieClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn lookup(&self, request: &CalorieRequest) -> Result<CalorieResult, LookupError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.auth.auth_headers().await)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let status = response.status();
        debug!(%status, "lookup response");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "nutrition service rejected session");
            return Err(LookupError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.transport(e))?;
        decode(status, &body)
    }
}

impl HttpCalorieClient {
    fn transport(&self, e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            LookupError::transport(e.to_string())
        }
    }
}

fn decode(status: StatusCode, body: &str) -> Result<CalorieResult, LookupError> {
    if status.is_server_error() {
        let detail = match serde_json::from_str::<CalorieResponse>(body) {
            Ok(CalorieResponse::Failure { error }) => error,
            _ => format!("nutrition service returned {status}"),
        };
        return Err(LookupError::transport(detail));
    }

    match serde_json::from_str::<CalorieResponse>(body) {
        Ok(CalorieResponse::Failure { error }) => Err(LookupError::not_found(error)),
        Ok(CalorieResponse::Success(result)) if status.is_success() => check(result),
        Ok(CalorieResponse::Success(_)) | Err(_) => {
            warn!(%status, "unexpected nutrition response body");
            Err(LookupError::transport(format!(
                "unexpected response from nutrition service ({status})"
            )))
        }
    }
}

fn check(result: CalorieResult) -> Result<CalorieResult, LookupError> {
    let per_serving = result.calories_per_serving;
    if !per_serving.is_finite() || per_serving < 0.0 || result.source.trim().is_empty() {
        warn!(?result, "malformed nutrition data");
        return Err(LookupError::transport("malformed nutrition data"));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoToken;

    #[async_trait]
    impl AuthHeaders for NoToken {
        async fn auth_headers(&self) -> HeaderMap {
            HeaderMap::new()
        }
    }

    /// Nutrition service that records the Authorization header it saw and
    /// answers every request with `status`.
    async fn spawn_rejecting_service(
        status: axum::http::StatusCode,
    ) -> (String, Arc<std::sync::Mutex<Option<String>>>) {
        use axum::{http::HeaderMap as AxumHeaders, routing::post, Router};

        let seen = Arc::new(std::sync::Mutex::new(None));
        let app = Router::new().route(
            "/api/get-calories",
            post({
                let seen = seen.clone();
                move |headers: AxumHeaders| {
                    *seen.lock().unwrap() = headers
                        .get(axum::http::header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    async move { status }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/api"), seen)
    }

    fn banana() -> CalorieRequest {
        CalorieRequest {
            dish_name: "Banana".into(),
            servings: 1.0,
        }
    }

    #[tokio::test]
    async fn session_header_is_sent_and_401_is_unauthorized() {
        use crate::auth::{dto::User, SessionHandle};
        use crate::storage::MemorySlotStorage;

        let (base, seen) = spawn_rejecting_service(axum::http::StatusCode::UNAUTHORIZED).await;
        let session = SessionHandle::signed_out(Arc::new(MemorySlotStorage::default()));
        session
            .establish(
                User {
                    id: None,
                    first_name: "User".into(),
                    last_name: String::new(),
                    email: "hello@example.com".into(),
                },
                "tok-xyz".into(),
            )
            .await;
        let client = HttpCalorieClient::new(&base, Duration::from_secs(5), Arc::new(session)).unwrap();

        let err = client.lookup(&banana()).await.unwrap_err();

        assert_eq!(err, LookupError::Unauthorized { status: 401 });
        assert_eq!(seen.lock().unwrap().as_deref(), Some("Bearer tok-xyz"));
    }

    #[tokio::test]
    async fn forbidden_is_unauthorized_and_no_session_sends_no_header() {
        let (base, seen) = spawn_rejecting_service(axum::http::StatusCode::FORBIDDEN).await;
        let client = HttpCalorieClient::new(&base, Duration::from_secs(5), Arc::new(NoToken)).unwrap();

        let err = client.lookup(&banana()).await.unwrap_err();

        assert_eq!(err, LookupError::Unauthorized { status: 403 });
        assert!(seen.lock().unwrap().is_none());
    }

    #[test]
    fn error_body_is_not_found() {
        let err = decode(StatusCode::OK, r#"{"error":"Food not found in database"}"#).unwrap_err();
        assert_eq!(err, LookupError::not_found("Food not found in database"));
    }

    #[test]
    fn bad_request_with_error_body_is_not_found() {
        let err = decode(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Dish name and servings are required"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));
    }

    #[test]
    fn server_error_is_transport() {
        let err = decode(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Failed to fetch calorie data"}"#,
        )
        .unwrap_err();
        assert_eq!(err, LookupError::transport("Failed to fetch calorie data"));
    }

    #[test]
    fn garbage_body_is_transport() {
        let err = decode(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, LookupError::Transport { .. }));
    }

    #[test]
    fn negative_calories_are_rejected() {
        let body = r#"{"dish_name":"x","servings":1,"calories_per_serving":-5,"total_calories":-5,"source":"s"}"#;
        assert!(matches!(
            decode(StatusCode::OK, body),
            Err(LookupError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpCalorieClient::new(
            &format!("http://{addr}/api"),
            Duration::from_secs(2),
            Arc::new(NoToken),
        )
        .unwrap();
        let err = client.lookup(&banana()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(!matches!(err, LookupError::NotFound { .. }));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client =
            HttpCalorieClient::new("http://localhost:8080/api/", Duration::from_secs(1), Arc::new(NoToken))
                .unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/api/get-calories");
    }
}
