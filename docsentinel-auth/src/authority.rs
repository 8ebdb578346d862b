// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use docsentinel_core::{DocumentId, Principal};

use crate::role::{DocumentOperation, Role};

/// Per-document authority holding the role table and enforcing who may
/// change it.
///
/// The table starts as `{owner: Owner}` and only the owner may grant or
/// revoke roles. The owner row is immutable: ownership is not transferable
/// through role assignment, and exactly one Owner exists for the lifetime of
/// the document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Authority {
    document: DocumentId,
    owner: Principal,
    roles: HashMap<Principal, Role>,
}

impl Authority {
    /// Create the authority for a freshly registered document.
    pub fn new(document: DocumentId, owner: Principal) -> Self {
        let mut roles = HashMap::new();
        roles.insert(owner.clone(), Role::Owner);
        Self {
            document,
            owner,
            roles,
        }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Current role of a principal. Returns `Role::None` for principals
    /// absent from the table; never fails.
    pub fn role(&self, principal: &Principal) -> Role {
        self.roles.get(principal).copied().unwrap_or_default()
    }

    /// Whether a principal may perform the given operation on this document.
    pub fn can(&self, principal: &Principal, operation: DocumentOperation) -> bool {
        self.role(principal).permits(operation)
    }

    /// All principals currently holding a role, including the owner.
    pub fn members(&self) -> Vec<(Principal, Role)> {
        self.roles
            .iter()
            .map(|(principal, role)| (principal.clone(), *role))
            .collect()
    }

    /// Validate a grant without applying it, returning the change it would
    /// produce. Used to check permissions before any external call commits.
    pub fn validate_grant(
        &self,
        actor: &Principal,
        target: &Principal,
        role: Role,
    ) -> Result<RoleChange, AuthorityError> {
        if self.role(actor) != Role::Owner {
            return Err(AuthorityError::Forbidden(actor.clone()));
        }

        if role == Role::Owner && target != &self.owner {
            return Err(AuthorityError::OwnerNotGrantable);
        }

        if target == &self.owner && role != Role::Owner {
            return Err(AuthorityError::OwnerImmutable);
        }

        Ok(RoleChange {
            previous: self.role(target),
            current: role,
        })
    }

    /// Assign a role to a principal.
    ///
    /// Re-assigning the current role is a no-op; assigning `Role::None`
    /// removes the principal from the table. The returned [`RoleChange`]
    /// tells the caller whether a collaborator pass must be minted or burned.
    pub fn grant(
        &mut self,
        actor: &Principal,
        target: &Principal,
        role: Role,
    ) -> Result<RoleChange, AuthorityError> {
        let change = self.validate_grant(actor, target, role)?;

        if !change.is_noop() {
            if role == Role::None {
                self.roles.remove(target);
            } else {
                self.roles.insert(target.clone(), role);
            }
            debug!(
                document = %self.document,
                %target,
                previous = %change.previous,
                current = %change.current,
                "role assignment updated"
            );
        }

        Ok(change)
    }

    /// Remove a principal from the role table. Equivalent to granting
    /// `Role::None`.
    pub fn revoke(
        &mut self,
        actor: &Principal,
        target: &Principal,
    ) -> Result<RoleChange, AuthorityError> {
        self.grant(actor, target, Role::None)
    }
}

/// Outcome of a role assignment.
///
/// Capability passes are presence-only: a pass is minted when a principal
/// first gains any role and burned when their role drops back to `None`. A
/// change between two collaborator roles touches the table but not the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleChange {
    pub previous: Role,
    pub current: Role,
}

impl RoleChange {
    pub fn is_noop(&self) -> bool {
        self.previous == self.current
    }

    pub fn mints_capability(&self) -> bool {
        self.previous == Role::None && self.current > Role::None
    }

    pub fn burns_capability(&self) -> bool {
        self.previous > Role::None && self.current == Role::None
    }
}

/// Errors which can occur when mutating a role table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthorityError {
    #[error("{0} is not permitted to manage roles on this document")]
    Forbidden(Principal),

    #[error("the owner role cannot be granted")]
    OwnerNotGrantable,

    #[error("the owner's role cannot be changed")]
    OwnerImmutable,
}

#[cfg(test)]
mod tests {
    use docsentinel_core::{DocumentId, Principal};

    use super::{Authority, AuthorityError};
    use crate::role::{DocumentOperation, Role};

    fn principal(suffix: u8) -> Principal {
        Principal::parse(&format!("0x{:040x}", suffix)).unwrap()
    }

    #[test]
    fn owner_seeded_on_creation() {
        let owner = principal(1);
        let authority = Authority::new(DocumentId::random(), owner.clone());

        assert_eq!(authority.role(&owner), Role::Owner);
        assert_eq!(authority.role(&principal(2)), Role::None);
        assert!(authority.can(&owner, DocumentOperation::Manage));
    }

    #[test]
    fn only_owner_may_grant() {
        let owner = principal(1);
        let bob = principal(2);
        let claire = principal(3);
        let mut authority = Authority::new(DocumentId::random(), owner.clone());

        authority.grant(&owner, &bob, Role::Editor).unwrap();

        // An editor cannot grant roles to others.
        assert_eq!(
            authority.grant(&bob, &claire, Role::Viewer),
            Err(AuthorityError::Forbidden(bob.clone()))
        );
        assert_eq!(authority.role(&claire), Role::None);
    }

    #[test]
    fn ownership_is_not_transferable() {
        let owner = principal(1);
        let bob = principal(2);
        let mut authority = Authority::new(DocumentId::random(), owner.clone());

        assert_eq!(
            authority.grant(&owner, &bob, Role::Owner),
            Err(AuthorityError::OwnerNotGrantable)
        );
        assert_eq!(
            authority.grant(&owner, &owner, Role::Viewer),
            Err(AuthorityError::OwnerImmutable)
        );

        // The owner keeps Owner and nobody else ever holds it.
        assert_eq!(authority.role(&owner), Role::Owner);
        let owners: Vec<_> = authority
            .members()
            .into_iter()
            .filter(|(_, role)| role.is_owner())
            .collect();
        assert_eq!(owners.len(), 1);
    }

    #[test]
    fn grant_is_idempotent() {
        let owner = principal(1);
        let bob = principal(2);
        let mut authority = Authority::new(DocumentId::random(), owner.clone());

        let change = authority.grant(&owner, &bob, Role::Viewer).unwrap();
        assert!(change.mints_capability());

        let change = authority.grant(&owner, &bob, Role::Viewer).unwrap();
        assert!(change.is_noop());
        assert!(!change.mints_capability());
    }

    #[test]
    fn role_change_between_collaborator_roles_keeps_pass() {
        let owner = principal(1);
        let bob = principal(2);
        let mut authority = Authority::new(DocumentId::random(), owner.clone());

        authority.grant(&owner, &bob, Role::Viewer).unwrap();
        let change = authority.grant(&owner, &bob, Role::Editor).unwrap();

        assert!(!change.mints_capability());
        assert!(!change.burns_capability());
        assert_eq!(authority.role(&bob), Role::Editor);
    }

    #[test]
    fn revoke_removes_from_table() {
        let owner = principal(1);
        let bob = principal(2);
        let mut authority = Authority::new(DocumentId::random(), owner.clone());

        authority.grant(&owner, &bob, Role::Verifier).unwrap();
        let change = authority.revoke(&owner, &bob).unwrap();

        assert!(change.burns_capability());
        assert_eq!(authority.role(&bob), Role::None);
        assert_eq!(authority.members().len(), 1);
    }
}
