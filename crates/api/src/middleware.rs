//! Request authentication.
//!
//! Every protected request walks the same checks in order and stops at the
//! first failure:
//!
//! 1. bearer token present
//! 2. header, signature and payload decode
//! 3. not expired (evaluated fresh, no grace window)
//! 4. live user record still matches the token's role and genus
//! 5. token id not revoked (only when a denylist is configured)
//! 6. `:genus` path segment, if any, matches the session
//! 7. the route's own claim verifier accepts the raw claims
//!
//! Only then is a [`ClaimsContext`] attached and the handler run.

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use genusdb_auth::{
    AuthError, TokenCodec, TokenDenylist, UserLookup, VerifiedToken, validate_claims,
};
use genusdb_core::Clock;

use crate::app::errors::ApiError;
use crate::context::ClaimsContext;

/// Name of the path parameter that scopes a route to a genus.
pub const GENUS_PARAM: &str = "genus";

/// Per-route extra check over the verified claims.
///
/// Registered when the route is built. Receives the signed payload bytes
/// exactly as decoded and the incoming request; any error fails the request.
pub trait ClaimVerifier: Send + Sync {
    fn verify(&self, raw_claims: &[u8], request: &Request) -> Result<(), AuthError>;
}

/// Verifier for routes without extra requirements.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ClaimVerifier for AcceptAll {
    fn verify(&self, _raw_claims: &[u8], _request: &Request) -> Result<(), AuthError> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<TokenCodec>,
    pub users: Arc<dyn UserLookup>,
    pub clock: Arc<dyn Clock>,
    pub denylist: Option<Arc<dyn TokenDenylist>>,
    pub claim_verifier: Arc<dyn ClaimVerifier>,
}

impl AuthState {
    pub fn new(
        codec: Arc<TokenCodec>,
        users: Arc<dyn UserLookup>,
        clock: Arc<dyn Clock>,
        denylist: Option<Arc<dyn TokenDenylist>>,
    ) -> Self {
        Self {
            codec,
            users,
            clock,
            denylist,
            claim_verifier: Arc::new(AcceptAll),
        }
    }

    /// Same state with a route-specific claim verifier.
    pub fn with_verifier(&self, verifier: impl ClaimVerifier + 'static) -> Self {
        Self {
            claim_verifier: Arc::new(verifier),
            ..self.clone()
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    path_params: Option<RawPathParams>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let genus_segment = path_params.as_ref().and_then(|params| {
        params
            .iter()
            .find(|(name, _)| *name == GENUS_PARAM)
            .map(|(_, value)| value.to_string())
    });

    let result = match extract_bearer(req.headers()).map(str::to_string) {
        Ok(token) => authenticate_token(&state, &token, genus_segment.as_deref()).await,
        Err(err) => Err(err),
    };
    let claims = result.and_then(|verified| {
        state.claim_verifier.verify(&verified.raw_claims, &req)?;
        Ok(verified.claims)
    });

    match claims {
        Ok(claims) => {
            req.extensions_mut().insert(ClaimsContext::new(claims));
            Ok(next.run(req).await)
        }
        Err(err) => {
            log_rejection(&err, req.uri().path());
            Err(err.into())
        }
    }
}

/// Token checks up to (not including) the route's claim verifier.
pub async fn authenticate_token(
    state: &AuthState,
    token: &str,
    genus_segment: Option<&str>,
) -> Result<VerifiedToken, AuthError> {
    let verified = state.codec.decode_verified(token)?;
    let claims = &verified.claims;

    validate_claims(claims, state.clock.now())?;

    let live = state
        .users
        .load_user(claims.subject())
        .await
        .map_err(|e| AuthError::internal(e.to_string()))?
        .ok_or(AuthError::StaleToken)?;
    if live.role != claims.role() || &live.genus != claims.tenant() {
        tracing::info!(
            subject = %claims.subject(),
            token_role = claims.role().code(),
            live_role = live.role.code(),
            "token no longer matches user record"
        );
        return Err(AuthError::StaleToken);
    }

    if let Some(denylist) = &state.denylist {
        let revoked = denylist
            .is_revoked(claims.token_id())
            .await
            .map_err(|e| AuthError::internal(e.to_string()))?;
        if revoked {
            return Err(AuthError::RevokedToken);
        }
    }

    if let Some(segment) = genus_segment {
        if !segment.is_empty() && segment != claims.tenant().as_str() {
            return Err(AuthError::TenantMismatch);
        }
    }

    Ok(verified)
}

/// Pull the token out of `Authorization: <scheme> <token>`.
///
/// The scheme is not checked; anything after the first space is the token.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let header = header.to_str().map_err(|_| AuthError::MalformedToken)?;
    if header.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }

    let (_scheme, token) = header.split_once(' ').ok_or(AuthError::MalformedToken)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

fn log_rejection(err: &AuthError, path: &str) {
    match err {
        AuthError::Decoding(_) | AuthError::Internal(_) => {
            tracing::error!(code = err.code(), error = %err, path, "request authentication failed")
        }
        AuthError::TenantMismatch | AuthError::ClaimCallbackRejected(_) => {
            tracing::warn!(code = err.code(), path, "request rejected by tenant checks")
        }
        _ => tracing::debug!(code = err.code(), path, "request authentication failed"),
    }
}
