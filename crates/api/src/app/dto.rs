//! Request/response DTOs for the authentication endpoints.

use serde::{Deserialize, Serialize};

use genusdb_auth::{ClaimSet, can_create};

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub subject: String,
    pub name: String,
    pub role: &'static str,
    pub genus: String,
    pub expires_at: i64,
    pub can_create: bool,
}

impl From<&ClaimSet> for WhoAmIResponse {
    fn from(claims: &ClaimSet) -> Self {
        Self {
            subject: claims.subject().to_string(),
            name: claims.display_name().to_string(),
            role: claims.role().code(),
            genus: claims.tenant().to_string(),
            expires_at: claims.expires_at(),
            can_create: can_create(claims),
        }
    }
}
