//! Credential verification against the external user store.
//!
//! The user store itself lives outside this crate. It is reached through two
//! capabilities: [`Authenticator`] checks an identifier/secret pair (and owns
//! the salted, constant-time hash comparison), and [`UserLookup`] fetches the
//! authoritative record for a subject.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use genusdb_core::{Clock, Subject};

use crate::{AuthError, ClaimSet, UserRecord};

/// Why the external store refused a credential pair.
///
/// Callers of this crate never see these variants; they all collapse into
/// [`AuthError::InvalidCredentials`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("unknown identifier")]
    UnknownIdentifier,

    #[error("secret does not match")]
    WrongSecret,

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("user lookup failed: {0}")]
pub struct LookupError(pub String);

/// Checks an identifier/secret pair.
///
/// Implementations must compare secrets with a salted, constant-time hash
/// (argon2, bcrypt) and must not retain the plaintext beyond the call.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, identifier: &str, secret: &str)
    -> Result<UserRecord, CredentialError>;
}

/// Fetches the live, authoritative user record.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// `Ok(None)` means the user no longer exists.
    async fn load_user(&self, subject: &Subject) -> Result<Option<UserRecord>, LookupError>;
}

#[async_trait]
impl<T> Authenticator for Arc<T>
where
    T: Authenticator + ?Sized,
{
    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<UserRecord, CredentialError> {
        (**self).authenticate(identifier, secret).await
    }
}

#[async_trait]
impl<T> UserLookup for Arc<T>
where
    T: UserLookup + ?Sized,
{
    async fn load_user(&self, subject: &Subject) -> Result<Option<UserRecord>, LookupError> {
        (**self).load_user(subject).await
    }
}

/// Maps an identifier/secret pair to a fresh claim set.
#[derive(Clone)]
pub struct CredentialVerifier {
    authenticator: Arc<dyn Authenticator>,
    clock: Arc<dyn Clock>,
}

impl CredentialVerifier {
    pub fn new(authenticator: Arc<dyn Authenticator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            authenticator,
            clock,
        }
    }

    /// Authenticate and build claims stamped with the current time.
    ///
    /// Every failure, including an unreachable store, is reported as
    /// [`AuthError::InvalidCredentials`] so callers cannot probe which
    /// identifiers exist.
    pub async fn verify(
        &self,
        identifier: &str,
        secret: &str,
        origin: &str,
    ) -> Result<ClaimSet, AuthError> {
        match self.authenticator.authenticate(identifier, secret).await {
            Ok(user) => Ok(ClaimSet::issue(&user, self.clock.now(), origin)),
            Err(CredentialError::Unavailable(reason)) => {
                tracing::warn!(%reason, "credential check could not reach user store");
                Err(AuthError::InvalidCredentials)
            }
            Err(_) => {
                tracing::debug!("credential check rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
