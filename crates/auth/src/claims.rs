use serde::{Deserialize, Serialize};
use uuid::Uuid;

use genusdb_core::{Genus, Subject};

use crate::{AuthError, Role, UserRecord};

/// Issuer constant stamped into every token this system mints.
pub const ISSUER: &str = "genusdb";

/// Lifetime of every token, in seconds (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// The signed session descriptor carried inside a token.
///
/// A claim set is immutable: there are no setters, and refreshing a session
/// builds a brand-new value via [`ClaimSet::issue`]. Decoding is strict:
/// unknown or missing fields fail rather than defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimSet {
    #[serde(rename = "sub")]
    subject: Subject,

    /// Informational only; never used for authorization.
    #[serde(rename = "name")]
    display_name: String,

    #[serde(rename = "iss")]
    issuer: String,

    role: Role,

    #[serde(rename = "genus")]
    tenant: Genus,

    #[serde(rename = "iat")]
    issued_at: i64,

    #[serde(rename = "exp")]
    expires_at: i64,

    /// Origin header seen at login, kept for audit correlation. Empty when absent.
    #[serde(rename = "origin")]
    origin_reference: String,

    #[serde(rename = "jti")]
    token_id: Uuid,
}

impl ClaimSet {
    /// Build a fresh claim set for `user`, valid from `issued_at` for [`TOKEN_TTL_SECS`].
    pub fn issue(user: &UserRecord, issued_at: i64, origin: impl Into<String>) -> Self {
        Self::issue_with_id(user, issued_at, origin, Uuid::now_v7())
    }

    /// Like [`ClaimSet::issue`] with an explicit token id (golden tokens, replays).
    pub fn issue_with_id(
        user: &UserRecord,
        issued_at: i64,
        origin: impl Into<String>,
        token_id: Uuid,
    ) -> Self {
        Self {
            subject: user.subject.clone(),
            display_name: user.display_name.clone(),
            issuer: ISSUER.to_string(),
            role: user.role,
            tenant: user.genus.clone(),
            issued_at,
            expires_at: issued_at + TOKEN_TTL_SECS,
            origin_reference: origin.into(),
            token_id,
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tenant(&self) -> &Genus {
        &self.tenant
    }

    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn origin_reference(&self) -> &str {
        &self.origin_reference
    }

    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    /// Structural checks on a payload whose signature has already been verified.
    pub fn check_integrity(&self) -> Result<(), AuthError> {
        if self.issuer != ISSUER {
            return Err(AuthError::MalformedToken);
        }
        if self.expires_at <= self.issued_at {
            return Err(AuthError::MalformedToken);
        }
        Ok(())
    }

    /// Expiry is inclusive: a token is dead at `now == expires_at`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Deterministically validate claims against the current time.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// the codec before a `ClaimSet` ever exists.
pub fn validate_claims(claims: &ClaimSet, now: i64) -> Result<(), AuthError> {
    claims.check_integrity()?;
    if claims.is_expired_at(now) {
        return Err(AuthError::ExpiredToken);
    }
    Ok(())
}
