use axum::{
    Router,
    routing::{get, post},
};

pub mod reports;
pub mod session;
pub mod system;

/// Router for all authenticated endpoints without route-specific claim checks.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/refresh", post(session::refresh))
        .route("/logout", post(session::logout))
}
