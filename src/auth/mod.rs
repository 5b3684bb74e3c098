use crate::state::AppState;
use axum::Router;

mod claims;
pub mod client;
pub mod dto;
pub mod handlers;
pub mod session;

pub use client::AuthClient;
pub use session::SessionHandle;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
