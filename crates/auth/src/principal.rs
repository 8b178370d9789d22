use serde::{Deserialize, Serialize};

use genusdb_core::{Genus, Subject};

use crate::Role;

/// Authoritative user record as returned by the external user store.
///
/// This is the source of truth that signed claims are cross-checked against
/// on every request: a token's role and genus are only advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub subject: Subject,
    pub display_name: String,
    pub role: Role,
    pub genus: Genus,
}

impl UserRecord {
    pub fn new(
        subject: impl Into<Subject>,
        display_name: impl Into<String>,
        role: Role,
        genus: Genus,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            role,
            genus,
        }
    }
}
