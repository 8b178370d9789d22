use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::ORIGIN},
    response::{IntoResponse, Response},
};

use genusdb_auth::AuthError;

use crate::app::AuthServices;
use crate::app::dto::{AuthenticateRequest, TokenResponse};
use crate::app::errors::{ApiError, json_error};
use crate::context::ClaimsContext;

/// Exchange credentials for a token. The request's `Origin` header is
/// recorded in the token; absent means empty.
pub async fn authenticate(
    Extension(services): Extension<Arc<AuthServices>>,
    headers: HeaderMap,
    body: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(body) = body?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let issued = services
        .issuer
        .login(&body.identifier, &body.secret, origin)
        .await?;

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
    }))
}

/// Mint a new token for the current session. The presented token stays
/// valid until its own expiry.
pub async fn refresh(
    Extension(services): Extension<Arc<AuthServices>>,
    Extension(ctx): Extension<ClaimsContext>,
) -> Result<Json<TokenResponse>, ApiError> {
    let issued = services.issuer.refresh(ctx.claims()).await?;
    Ok(Json(TokenResponse {
        access_token: issued.access_token,
    }))
}

/// Revoke the presented token. Only available with a denylist configured.
pub async fn logout(
    Extension(services): Extension<Arc<AuthServices>>,
    Extension(ctx): Extension<ClaimsContext>,
) -> Result<Response, ApiError> {
    let Some(denylist) = services.denylist.as_ref() else {
        return Ok(json_error(
            StatusCode::NOT_FOUND,
            "not_enabled",
            "token revocation is not enabled",
        ));
    };

    let claims = ctx.claims();
    denylist
        .revoke(claims.token_id(), claims.expires_at())
        .await
        .map_err(|e| AuthError::internal(e.to_string()))?;

    tracing::info!(subject = %claims.subject(), jti = %claims.token_id(), "token revoked");
    Ok(StatusCode::NO_CONTENT.into_response())
}
