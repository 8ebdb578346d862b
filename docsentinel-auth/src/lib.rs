// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-document collaboration authority for DocSentinel.
//!
//! Every registered document gets its own [`Authority`]: a role table mapping
//! principals to [`Role`]s, seeded with the document owner and mutated only
//! by the owner. Role assignments drive a derived [`CapabilityIndex`] of
//! non-transferable collaborator passes which answers "which documents are
//! shared with me" without scanning every role table.
//!
//! The role table is the single source of truth; the capability index is a
//! replayable projection of [`RoleChange`] outcomes and is never mutated
//! independently.
mod authority;
mod capability;
mod role;

pub use authority::{Authority, AuthorityError, RoleChange};
pub use capability::{Capability, CapabilityIndex};
pub use role::{DocumentOperation, Role};
