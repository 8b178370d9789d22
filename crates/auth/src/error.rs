//! Authentication error taxonomy.

use thiserror::Error;

/// Externally visible status class for an authentication failure.
///
/// This crate is HTTP-agnostic; the API layer maps each class to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Unauthorized,
    Forbidden,
    Internal,
}

/// Every way token issuance or verification can fail.
///
/// The `Display` output is for logs. Responses must use
/// [`AuthError::public_message`], which never carries internal detail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,

    /// The user's live role or genus no longer matches the token (or the user is gone).
    #[error("token is stale")]
    StaleToken,

    #[error("token has been revoked")]
    RevokedToken,

    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("invalid credentials")]
    InvalidCredentials,

    /// A signed payload failed strict decoding. This indicates a bug, not a bad client.
    #[error("token payload decoding failed: {0}")]
    Decoding(String),

    #[error("claims rejected: {0}")]
    ClaimCallbackRejected(String),

    #[error("internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::Decoding(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::ClaimCallbackRejected(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ExpiredToken => "expired_token",
            AuthError::StaleToken => "stale_token",
            AuthError::RevokedToken => "revoked_token",
            AuthError::TenantMismatch => "tenant_mismatch",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Decoding(_) => "decoding_error",
            AuthError::ClaimCallbackRejected(_) => "claims_rejected",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::ExpiredToken
            | AuthError::StaleToken
            | AuthError::RevokedToken
            | AuthError::InvalidCredentials => StatusClass::Unauthorized,
            AuthError::TenantMismatch | AuthError::ClaimCallbackRejected(_) => {
                StatusClass::Forbidden
            }
            AuthError::Decoding(_) | AuthError::Internal(_) => StatusClass::Internal,
        }
    }

    /// Message safe to return to the client.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::ClaimCallbackRejected(reason) => format!("claims rejected: {reason}"),
            AuthError::Decoding(_) | AuthError::Internal(_) => {
                "internal authentication error".to_string()
            }
            other => other.to_string(),
        }
    }
}
