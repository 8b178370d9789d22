//! HTTP API application wiring (Axum router + dependency wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use genusdb_auth::{Authenticator, TokenCodec, TokenDenylist, TokenIssuer, UserLookup};
use genusdb_core::Clock;

use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;

/// Everything the router needs, built once at startup.
#[derive(Clone)]
pub struct AuthDeps {
    pub codec: Arc<TokenCodec>,
    pub authenticator: Arc<dyn Authenticator>,
    pub users: Arc<dyn UserLookup>,
    pub clock: Arc<dyn Clock>,
    pub denylist: Option<Arc<dyn TokenDenylist>>,
}

/// Handler-side services, shared through a request extension.
pub struct AuthServices {
    pub issuer: TokenIssuer,
    pub denylist: Option<Arc<dyn TokenDenylist>>,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(deps: AuthDeps) -> Router {
    let auth_state = AuthState::new(
        deps.codec.clone(),
        deps.users.clone(),
        deps.clock.clone(),
        deps.denylist.clone(),
    );

    let services = Arc::new(AuthServices {
        issuer: TokenIssuer::new(deps.codec, deps.authenticator, deps.users, deps.clock),
        denylist: deps.denylist,
    });

    // Protected routes: require a verified session.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::auth_middleware,
    ));

    // Comparison reports carry their own genus check on top of the path check.
    let reports = routes::reports::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state.with_verifier(routes::reports::QueryGenusVerifier),
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/authenticate", post(routes::session::authenticate))
        .merge(protected)
        .merge(reports)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
