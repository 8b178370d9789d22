//! Token signing key material.
//!
//! Key material is loaded once at startup and handed to the codec by value.
//! The signing strategy (symmetric HMAC or asymmetric Ed25519) is a property
//! of the key, not a separate code path through the system.

use core::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Minimum HMAC secret length we accept without complaint.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

const ED25519_SEED_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing secret is empty")]
    EmptySecret,

    #[error("invalid Ed25519 key material: {0}")]
    InvalidEd25519(String),

    #[error("unknown signing algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("key can verify but not sign")]
    VerifyOnly,
}

/// Signature algorithm named in the token header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Hs256,
    EdDsa,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Hs256 => "HS256",
            Algorithm::EdDsa => "EdDSA",
        }
    }
}

impl core::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" | "hs256" => Ok(Algorithm::Hs256),
            "EdDSA" | "eddsa" | "ed25519" => Ok(Algorithm::EdDsa),
            other => Err(KeyError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Process-wide key material for the token codec.
pub enum TokenKey {
    Hmac {
        secret: Vec<u8>,
    },
    Ed25519 {
        signing: Option<SigningKey>,
        verifying: VerifyingKey,
    },
}

impl TokenKey {
    pub fn hmac(secret: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(KeyError::EmptySecret);
        }
        if secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = secret.len(),
                "HMAC signing secret is shorter than {RECOMMENDED_SECRET_LEN} bytes"
            );
        }
        Ok(Self::Hmac { secret })
    }

    pub fn ed25519_from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        let seed: [u8; ED25519_SEED_LEN] = seed.try_into().map_err(|_| {
            KeyError::InvalidEd25519(format!(
                "seed must be {ED25519_SEED_LEN} bytes, got {}",
                seed.len()
            ))
        })?;
        let signing = SigningKey::from_bytes(&seed);
        let verifying = signing.verifying_key();
        Ok(Self::Ed25519 {
            signing: Some(signing),
            verifying,
        })
    }

    /// Seed encoded as unpadded base64url, the form used in configuration.
    pub fn ed25519_from_base64_seed(encoded: &str) -> Result<Self, KeyError> {
        let seed = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| KeyError::InvalidEd25519(format!("seed is not base64url: {e}")))?;
        Self::ed25519_from_seed(&seed)
    }

    /// A key that can only verify tokens minted elsewhere.
    pub fn ed25519_verify_only(public_key: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| KeyError::InvalidEd25519("public key must be 32 bytes".into()))?;
        let verifying = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| KeyError::InvalidEd25519(e.to_string()))?;
        Ok(Self::Ed25519 {
            signing: None,
            verifying,
        })
    }

    pub fn generate_ed25519() -> Self {
        let signing = SigningKey::generate(&mut rand::rngs::OsRng);
        let verifying = signing.verifying_key();
        Self::Ed25519 {
            signing: Some(signing),
            verifying,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            TokenKey::Hmac { .. } => Algorithm::Hs256,
            TokenKey::Ed25519 { .. } => Algorithm::EdDsa,
        }
    }

    /// Raw Ed25519 public key, for distribution to verify-only services.
    pub fn public_key(&self) -> Option<[u8; 32]> {
        match self {
            TokenKey::Hmac { .. } => None,
            TokenKey::Ed25519 { verifying, .. } => Some(verifying.to_bytes()),
        }
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        match self {
            TokenKey::Hmac { secret } => Ok(hmac_sha256(secret, message)),
            TokenKey::Ed25519 { signing, .. } => {
                let signing = signing.as_ref().ok_or(KeyError::VerifyOnly)?;
                Ok(signing.sign(message).to_bytes().to_vec())
            }
        }
    }

    /// Verify `signature` over `message`. Never short-circuits on content.
    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            TokenKey::Hmac { secret } => {
                let expected = hmac_sha256(secret, message);
                constant_time_eq(&expected, signature)
            }
            TokenKey::Ed25519 { verifying, .. } => match Signature::from_slice(signature) {
                Ok(sig) => verifying.verify_strict(message, &sig).is_ok(),
                Err(_) => false,
            },
        }
    }
}

impl core::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenKey::Hmac { secret } => f
                .debug_struct("Hmac")
                .field("secret", &format_args!("<{} bytes redacted>", secret.len()))
                .finish(),
            TokenKey::Ed25519 { signing, verifying } => f
                .debug_struct("Ed25519")
                .field("can_sign", &signing.is_some())
                .field("public_key", &URL_SAFE_NO_PAD.encode(verifying.to_bytes()))
                .finish(),
        }
    }
}

fn hmac_sha256(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
