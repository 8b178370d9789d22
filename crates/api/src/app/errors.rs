use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use genusdb_auth::{AuthError, AuthzError, StatusClass};

/// Error type returned by handlers and the auth middleware.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Authz(AuthzError),
    /// Request body could not be read as the expected JSON.
    InvalidBody(JsonRejection),
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<AuthzError> for ApiError {
    fn from(value: AuthzError) -> Self {
        Self::Authz(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::InvalidBody(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => auth_error_to_response(&err),
            ApiError::Authz(AuthzError::TenantMismatch) => {
                json_error(StatusCode::FORBIDDEN, "tenant_mismatch", "tenant mismatch")
            }
            ApiError::Authz(err) => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
            ApiError::InvalidBody(rejection) => {
                json_error(rejection.status(), "invalid_request", rejection.body_text())
            }
        }
    }
}

pub fn status_for(class: StatusClass) -> StatusCode {
    match class {
        StatusClass::Unauthorized => StatusCode::UNAUTHORIZED,
        StatusClass::Forbidden => StatusCode::FORBIDDEN,
        StatusClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn auth_error_to_response(err: &AuthError) -> Response {
    json_error(
        status_for(err.status_class()),
        err.code(),
        err.public_message(),
    )
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
