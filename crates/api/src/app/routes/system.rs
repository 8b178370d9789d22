use axum::{Json, extract::Extension, http::StatusCode};

use crate::app::dto::WhoAmIResponse;
use crate::context::ClaimsContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<ClaimsContext>) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse::from(ctx.claims()))
}
