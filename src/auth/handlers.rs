use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::{SessionResponse, SignInRequest, SignUpRequest},
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/signup", post(sign_up))
        .route("/auth/signout", post(sign_out))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let (user, token) = state
        .auth
        .sign_in(&payload.email, &payload.password)
        .await
        .map_err(rejection)?;
    state.session.establish(user, token).await;
    Ok(Json(SessionResponse::from(&state.session.current().await)))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let (user, token) = state
        .auth
        .sign_up(
            &payload.first_name,
            &payload.last_name,
            &payload.email,
            &payload.password,
        )
        .await
        .map_err(rejection)?;
    state.session.establish(user, token).await;
    Ok(Json(SessionResponse::from(&state.session.current().await)))
}

#[instrument(skip(state))]
pub async fn sign_out(State(state): State<AppState>) -> StatusCode {
    state.session.sign_out().await;
    info!("session cleared by user");
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    if !state.session.check_auth().await {
        return Err((StatusCode::UNAUTHORIZED, "Not signed in".into()));
    }
    Ok(Json(SessionResponse::from(&state.session.current().await)))
}

fn rejection(e: AuthError) -> (StatusCode, String) {
    warn!(error = %e, "auth request failed");
    let status = match e {
        AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AuthError::Rejected(_) => StatusCode::UNAUTHORIZED,
        AuthError::Network(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}
