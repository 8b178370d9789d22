//! In-memory user directory for tests/dev and small single-node deployments.
//!
//! Implements both [`Authenticator`] and [`UserLookup`]. Secrets are stored as
//! argon2id PHC strings and verified in constant time. Unknown identifiers are
//! checked against a dummy hash so both failure paths cost the same.

use std::collections::HashMap;
use std::sync::RwLock;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use thiserror::Error;

use genusdb_core::Subject;

use crate::credentials::{Authenticator, CredentialError, LookupError, UserLookup};
use crate::{Role, UserRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored hash is not a valid PHC string: {0}")]
    InvalidHash(String),

    #[error("identifier '{0}' already registered")]
    DuplicateIdentifier(String),

    #[error("no user with subject {0}")]
    UnknownSubject(Subject),

    #[error("lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone)]
struct StoredUser {
    password_hash: String,
    record: UserRecord,
}

pub struct InMemoryUserDirectory {
    hasher: Argon2<'static>,
    dummy_hash: String,
    users: RwLock<HashMap<String, StoredUser>>,
}

impl InMemoryUserDirectory {
    /// Directory using argon2 default (OWASP-recommended) parameters.
    pub fn new() -> Result<Self, DirectoryError> {
        Self::with_params(Params::default())
    }

    pub fn with_params(params: Params) -> Result<Self, DirectoryError> {
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&hasher, "genusdb-dummy-secret")?;
        Ok(Self {
            hasher,
            dummy_hash,
            users: RwLock::new(HashMap::new()),
        })
    }

    /// Cheap parameters for tests (NOT for production).
    #[cfg(any(test, debug_assertions))]
    pub fn fast() -> Self {
        let params = Params::new(1024, 1, 1, None).expect("static argon2 params are valid");
        Self::with_params(params).expect("argon2 hashing with static params succeeds")
    }

    /// Register a user, hashing `secret`.
    pub fn insert(
        &self,
        identifier: impl Into<String>,
        secret: &str,
        record: UserRecord,
    ) -> Result<(), DirectoryError> {
        let password_hash = hash_with(&self.hasher, secret)?;
        self.insert_stored(identifier.into(), password_hash, record)
    }

    /// Register a user from an existing PHC hash (e.g. loaded from a seed file).
    pub fn insert_hashed(
        &self,
        identifier: impl Into<String>,
        password_hash: impl Into<String>,
        record: UserRecord,
    ) -> Result<(), DirectoryError> {
        let password_hash = password_hash.into();
        PasswordHash::new(&password_hash)
            .map_err(|e| DirectoryError::InvalidHash(e.to_string()))?;
        self.insert_stored(identifier.into(), password_hash, record)
    }

    fn insert_stored(
        &self,
        identifier: String,
        password_hash: String,
        record: UserRecord,
    ) -> Result<(), DirectoryError> {
        let mut users = self.users.write().map_err(|_| DirectoryError::Poisoned)?;
        if users.contains_key(&identifier) {
            return Err(DirectoryError::DuplicateIdentifier(identifier));
        }
        users.insert(
            identifier,
            StoredUser {
                password_hash,
                record,
            },
        );
        Ok(())
    }

    /// Change a user's role; existing tokens become stale on their next use.
    pub fn set_role(&self, subject: &Subject, role: Role) -> Result<(), DirectoryError> {
        let mut users = self.users.write().map_err(|_| DirectoryError::Poisoned)?;
        let user = users
            .values_mut()
            .find(|u| &u.record.subject == subject)
            .ok_or_else(|| DirectoryError::UnknownSubject(subject.clone()))?;
        user.record.role = role;
        Ok(())
    }

    pub fn remove(&self, subject: &Subject) -> Result<UserRecord, DirectoryError> {
        let mut users = self.users.write().map_err(|_| DirectoryError::Poisoned)?;
        let identifier = users
            .iter()
            .find(|(_, u)| &u.record.subject == subject)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| DirectoryError::UnknownSubject(subject.clone()))?;
        users
            .remove(&identifier)
            .map(|u| u.record)
            .ok_or_else(|| DirectoryError::UnknownSubject(subject.clone()))
    }

    pub fn len(&self) -> Result<usize, DirectoryError> {
        let users = self.users.read().map_err(|_| DirectoryError::Poisoned)?;
        Ok(users.len())
    }

    pub fn is_empty(&self) -> Result<bool, DirectoryError> {
        self.len().map(|n| n == 0)
    }

    /// Run the argon2 check on the blocking pool so login bursts never hold
    /// a runtime worker.
    async fn verify(&self, secret: &str, password_hash: String) -> Result<bool, CredentialError> {
        let hasher = self.hasher.clone();
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || verify_with(&hasher, &secret, &password_hash))
            .await
            .map_err(|e| {
                CredentialError::Unavailable(format!("password verification task failed: {e}"))
            })
    }
}

fn verify_with(hasher: &Argon2<'_>, secret: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => hasher.verify_password(secret.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

fn hash_with(hasher: &Argon2<'_>, secret: &str) -> Result<String, DirectoryError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    hasher
        .hash_password(secret.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DirectoryError::Hash(e.to_string()))
}

#[async_trait]
impl Authenticator for InMemoryUserDirectory {
    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<UserRecord, CredentialError> {
        let stored = self
            .users
            .read()
            .map_err(|_| CredentialError::Unavailable("lock poisoned".into()))?
            .get(identifier)
            .cloned();

        match stored {
            Some(user) => {
                if self.verify(secret, user.password_hash).await? {
                    Ok(user.record)
                } else {
                    Err(CredentialError::WrongSecret)
                }
            }
            None => {
                let _ = self.verify(secret, self.dummy_hash.clone()).await?;
                Err(CredentialError::UnknownIdentifier)
            }
        }
    }
}

#[async_trait]
impl UserLookup for InMemoryUserDirectory {
    async fn load_user(&self, subject: &Subject) -> Result<Option<UserRecord>, LookupError> {
        let users = self
            .users
            .read()
            .map_err(|_| LookupError("lock poisoned".into()))?;
        Ok(users
            .values()
            .find(|u| &u.record.subject == subject)
            .map(|u| u.record.clone()))
    }
}
