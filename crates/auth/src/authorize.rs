//! Authorization predicates over an already-verified claim set.
//!
//! - No IO
//! - No panics
//! - No token re-verification (the request authenticator has already run)

use thiserror::Error;

use genusdb_core::{Genus, Subject};

use crate::{ClaimSet, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("forbidden: role '{role}' cannot {action}")]
    Forbidden { role: Role, action: &'static str },
}

pub fn is_admin(claims: &ClaimSet) -> bool {
    claims.role() == Role::Admin
}

/// Admins and writers may create resources.
pub fn can_create(claims: &ClaimSet) -> bool {
    matches!(claims.role(), Role::Admin | Role::Writer)
}

/// Owners may edit their own resources; admins may edit anything.
pub fn can_edit(claims: &ClaimSet, resource_owner: &Subject) -> bool {
    claims.subject() == resource_owner || is_admin(claims)
}

/// Sessions only see data inside their own genus.
pub fn can_read_genus(claims: &ClaimSet, genus: &Genus) -> bool {
    claims.tenant() == genus
}

pub fn require_create(claims: &ClaimSet) -> Result<(), AuthzError> {
    if can_create(claims) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: claims.role(),
            action: "create",
        })
    }
}

pub fn require_edit(claims: &ClaimSet, resource_owner: &Subject) -> Result<(), AuthzError> {
    if can_edit(claims, resource_owner) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: claims.role(),
            action: "edit",
        })
    }
}

pub fn require_genus(claims: &ClaimSet, genus: &Genus) -> Result<(), AuthzError> {
    if can_read_genus(claims, genus) {
        Ok(())
    } else {
        Err(AuthzError::TenantMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserRecord;

    fn claims(subject: i64, role: Role) -> ClaimSet {
        let user = UserRecord::new(subject, "u", role, Genus::new("hymenobacter").unwrap());
        ClaimSet::issue(&user, 1_700_000_000, "")
    }

    #[test]
    fn create_requires_admin_or_writer() {
        assert!(can_create(&claims(1, Role::Admin)));
        assert!(can_create(&claims(1, Role::Writer)));
        assert!(!can_create(&claims(1, Role::Reader)));
        assert_eq!(
            require_create(&claims(1, Role::Reader)),
            Err(AuthzError::Forbidden {
                role: Role::Reader,
                action: "create"
            })
        );
    }

    #[test]
    fn edit_requires_ownership_or_admin() {
        let owner = Subject::Id(1);
        assert!(can_edit(&claims(1, Role::Reader), &owner));
        assert!(can_edit(&claims(2, Role::Admin), &owner));
        assert!(!can_edit(&claims(2, Role::Writer), &owner));
        assert!(require_edit(&claims(2, Role::Writer), &owner).is_err());
    }

    #[test]
    fn genus_must_match_session() {
        let c = claims(1, Role::Admin);
        assert!(can_read_genus(&c, &Genus::new("hymenobacter").unwrap()));
        assert_eq!(
            require_genus(&c, &Genus::new("other").unwrap()),
            Err(AuthzError::TenantMismatch)
        );
    }
}
