use genusdb_auth::{ClaimSet, Role};
use genusdb_core::{Genus, Subject};

/// Verified session for the current request.
///
/// Inserted into request extensions by the auth middleware once every check
/// has passed; it never outlives the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsContext {
    claims: ClaimSet,
}

impl ClaimsContext {
    pub fn new(claims: ClaimSet) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn subject(&self) -> &Subject {
        self.claims.subject()
    }

    pub fn tenant(&self) -> &Genus {
        self.claims.tenant()
    }

    pub fn role(&self) -> Role {
        self.claims.role()
    }
}
