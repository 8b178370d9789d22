//! `genusdb-auth`: token issuance, verification and authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage. The user store
//! is reached through the [`Authenticator`] and [`UserLookup`] capabilities.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod issuer;
pub mod keys;
pub mod principal;
pub mod revocation;
pub mod roles;

pub use authorize::{
    AuthzError, can_create, can_edit, can_read_genus, is_admin, require_create, require_edit,
    require_genus,
};
pub use claims::{ClaimSet, ISSUER, TOKEN_TTL_SECS, validate_claims};
pub use codec::{TOKEN_TYPE, TokenCodec, VerifiedToken};
pub use credentials::{Authenticator, CredentialError, CredentialVerifier, LookupError, UserLookup};
pub use directory::{DirectoryError, InMemoryUserDirectory};
pub use error::{AuthError, StatusClass};
pub use issuer::{IssuedToken, TokenIssuer};
pub use keys::{Algorithm, KeyError, TokenKey};
pub use principal::UserRecord;
pub use revocation::{DEFAULT_DENYLIST_CAPACITY, InMemoryDenylist, TokenDenylist};
pub use roles::Role;
