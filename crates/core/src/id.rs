//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

const MAX_GENUS_LEN: usize = 64;

/// Identifier of a tenant (the organizational "genus" a session is bound to).
///
/// Genus names are short ASCII slugs (`hymenobacter`, `bacillus-subtilis`).
/// They appear in request paths, so path separators and whitespace are
/// rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Genus(String);

impl Genus {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::invalid_id("Genus: empty"));
        }
        if name.len() > MAX_GENUS_LEN {
            return Err(DomainError::invalid_id(format!(
                "Genus: longer than {MAX_GENUS_LEN} bytes"
            )));
        }
        if !name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        {
            return Err(DomainError::invalid_id(format!(
                "Genus: invalid character in '{name}'"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Genus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Genus {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Genus> for String {
    fn from(value: Genus) -> Self {
        value.0
    }
}

impl FromStr for Genus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identity of a user, stable for the user's lifetime.
///
/// User stores key accounts either by a numeric row id or by an opaque string;
/// both shapes are carried verbatim in tokens (`"sub": 1` or `"sub": "u-1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Id(i64),
    Name(String),
}

impl core::fmt::Display for Subject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Subject::Id(id) => write!(f, "{id}"),
            Subject::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for Subject {
    fn from(value: i64) -> Self {
        Self::Id(value)
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl FromStr for Subject {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::invalid_id("Subject: empty"));
        }
        Ok(s.parse::<i64>()
            .map(Subject::Id)
            .unwrap_or_else(|_| Subject::Name(s.to_string())))
    }
}
