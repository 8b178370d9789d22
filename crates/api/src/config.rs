//! Process configuration, read from `GENUSDB_*` environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use genusdb_auth::{
    Algorithm, DirectoryError, InMemoryDenylist, InMemoryUserDirectory, KeyError, Role,
    TokenCodec, TokenDenylist, TokenKey, UserRecord,
};
use genusdb_core::{Clock, Genus, Subject, SystemClock};

use crate::app::AuthDeps;

pub const ENV_PREFIX: &str = "GENUSDB_";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: &'static str },

    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("signing key: {0}")]
    Key(#[from] KeyError),

    #[error("failed to read users file {path}: {source}")]
    UsersFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("users file is not valid: {0}")]
    UsersJson(#[from] serde_json::Error),

    #[error("user directory: {0}")]
    Directory(#[from] DirectoryError),
}

#[derive(Debug)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub key: TokenKey,
    pub users_file: Option<PathBuf>,
    pub enable_denylist: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. `lookup` receives full
    /// variable names (`GENUSDB_BIND_ADDR`, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}{suffix}")).filter(|v| !v.trim().is_empty())
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            var: "GENUSDB_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let algorithm = match get("SIGNING_ALG") {
            Some(raw) => raw.parse::<Algorithm>()?,
            None => Algorithm::Hs256,
        };
        let key = match algorithm {
            Algorithm::Hs256 => {
                let secret = get("JWT_SECRET").ok_or(ConfigError::Missing {
                    var: "GENUSDB_JWT_SECRET",
                })?;
                TokenKey::hmac(secret.into_bytes())?
            }
            Algorithm::EdDsa => {
                let seed = get("ED25519_SEED").ok_or(ConfigError::Missing {
                    var: "GENUSDB_ED25519_SEED",
                })?;
                TokenKey::ed25519_from_base64_seed(seed.trim())?
            }
        };

        let enable_denylist = match get("ENABLE_DENYLIST") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                var: "GENUSDB_ENABLE_DENYLIST",
                value: raw,
            })?,
            None => false,
        };

        Ok(Self {
            bind_addr,
            key,
            users_file: get("USERS_FILE").map(PathBuf::from),
            enable_denylist,
        })
    }

    /// Wire the bundled in-memory collaborators around the configured key.
    pub fn into_deps(self) -> Result<AuthDeps, ConfigError> {
        let directory = Arc::new(InMemoryUserDirectory::new()?);
        match &self.users_file {
            Some(path) => {
                let loaded = load_users_file(&directory, path)?;
                tracing::info!(count = loaded, path = %path.display(), "loaded users");
            }
            None => tracing::warn!("GENUSDB_USERS_FILE not set; user directory is empty"),
        }

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let denylist = self
            .enable_denylist
            .then(|| Arc::new(InMemoryDenylist::new(clock.clone())) as Arc<dyn TokenDenylist>);

        Ok(AuthDeps {
            codec: Arc::new(TokenCodec::new(self.key)),
            authenticator: directory.clone(),
            users: directory,
            clock,
            denylist,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// One entry of the users seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSeed {
    pub identifier: String,
    /// argon2 PHC string.
    pub password_hash: String,
    pub subject: Subject,
    pub name: String,
    pub role: Role,
    pub genus: Genus,
}

pub fn load_users_file(directory: &InMemoryUserDirectory, path: &Path) -> Result<usize, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::UsersFile {
        path: path.to_path_buf(),
        source,
    })?;
    load_users(directory, &raw)
}

/// Insert every user of a JSON seed array. Returns how many were loaded.
pub fn load_users(directory: &InMemoryUserDirectory, json: &str) -> Result<usize, ConfigError> {
    let seeds: Vec<UserSeed> = serde_json::from_str(json)?;
    let count = seeds.len();
    for seed in seeds {
        let record = UserRecord::new(seed.subject, seed.name, seed.role, seed.genus);
        directory.insert_hashed(seed.identifier, seed.password_hash, record)?;
    }
    Ok(count)
}
