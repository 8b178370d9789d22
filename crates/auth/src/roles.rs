use core::str::FromStr;

use serde::{Deserialize, Serialize};

use genusdb_core::DomainError;

/// Privilege level carried in a session.
///
/// The set is closed. Roles travel on the wire as single letters
/// (`"A"`, `"W"`, `"R"`), matching how user records store them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "A")]
    Admin,
    #[serde(rename = "W")]
    Writer,
    #[serde(rename = "R")]
    Reader,
}

impl Role {
    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "A",
            Role::Writer => "W",
            Role::Reader => "R",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Writer => "writer",
            Role::Reader => "reader",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    /// Accepts either the wire code or the lowercase name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "admin" => Ok(Role::Admin),
            "W" | "writer" => Ok(Role::Writer),
            "R" | "reader" => Ok(Role::Reader),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}
