// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

/// The five roles which can be assigned to a principal on a single document.
/// Greater roles are assumed to also contain all lower ones.
///
/// None < Viewer < Editor < Verifier < Owner
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Role {
    /// No access; principals absent from a role table hold this implicitly.
    #[default]
    None,

    /// Permission to view the document.
    Viewer,

    /// Permission to edit the document.
    Editor,

    /// Permission to request attestation for the document.
    Verifier,

    /// Permission to manage roles. Held by exactly one principal per
    /// document and not transferable.
    Owner,
}

impl Role {
    /// Role grants access at all; everything above `None`.
    pub fn is_collaborator(&self) -> bool {
        *self > Role::None
    }

    /// Role is Owner.
    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }

    /// Whether this role permits the given operation. Pure function of the
    /// role ordering.
    pub fn permits(&self, operation: DocumentOperation) -> bool {
        match operation {
            DocumentOperation::View => *self >= Role::Viewer,
            DocumentOperation::Edit => *self >= Role::Editor,
            DocumentOperation::Verify => *self >= Role::Verifier,
            DocumentOperation::Manage => *self == Role::Owner,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::None => "none",
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Verifier => "verifier",
            Role::Owner => "owner",
        };
        write!(f, "{}", s)
    }
}

/// Operations a principal can attempt against a document, each guarded by a
/// minimum role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentOperation {
    View,
    Edit,
    Verify,
    Manage,
}

#[cfg(test)]
mod tests {
    use super::{DocumentOperation, Role};

    #[test]
    fn role_ordering() {
        assert!(Role::None < Role::Viewer);
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Verifier);
        assert!(Role::Verifier < Role::Owner);
    }

    #[test]
    fn permission_monotonicity() {
        // Any role which may edit may also view, and so on up the ladder.
        for role in [
            Role::None,
            Role::Viewer,
            Role::Editor,
            Role::Verifier,
            Role::Owner,
        ] {
            if role.permits(DocumentOperation::Edit) {
                assert!(role.permits(DocumentOperation::View));
            }
            if role.permits(DocumentOperation::Verify) {
                assert!(role.permits(DocumentOperation::Edit));
            }
        }
    }

    #[test]
    fn manage_is_owner_only() {
        assert!(Role::Owner.permits(DocumentOperation::Manage));
        assert!(!Role::Verifier.permits(DocumentOperation::Manage));
        assert!(!Role::None.permits(DocumentOperation::View));
    }
}
