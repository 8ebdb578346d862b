// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use docsentinel_core::{DocumentId, Principal};

use crate::authority::RoleChange;

/// A non-transferable collaborator pass tying one principal to one document.
///
/// Passes are presence-only: they record that the holder has *some* role on
/// the document, the role itself is always looked up from the [`Authority`]
/// role table.
///
/// [`Authority`]: crate::Authority
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub document: DocumentId,
    pub holder: Principal,
}

/// Index over all issued collaborator passes.
///
/// A principal holds at most one pass per document. The index is a derived
/// projection of the role tables, kept in sync by feeding every
/// [`RoleChange`] through [`CapabilityIndex::apply`]; it must never be
/// mutated from anywhere else or the two will drift.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CapabilityIndex {
    by_holder: HashMap<Principal, BTreeSet<DocumentId>>,
    by_document: HashMap<DocumentId, BTreeSet<Principal>>,
}

impl CapabilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a pass. Minting a pass which is already held is a no-op: the
    /// role table is the source of truth, so a redundant mint is not an
    /// error.
    pub fn mint(&mut self, document: DocumentId, holder: &Principal) -> Capability {
        self.by_holder
            .entry(holder.clone())
            .or_default()
            .insert(document);
        self.by_document
            .entry(document)
            .or_default()
            .insert(holder.clone());

        Capability {
            document,
            holder: holder.clone(),
        }
    }

    /// Destroy a pass. No-op if the holder has none for this document.
    pub fn burn(&mut self, document: DocumentId, holder: &Principal) {
        if let Some(documents) = self.by_holder.get_mut(holder) {
            documents.remove(&document);
            if documents.is_empty() {
                self.by_holder.remove(holder);
            }
        }
        if let Some(holders) = self.by_document.get_mut(&document) {
            holders.remove(holder);
            if holders.is_empty() {
                self.by_document.remove(&document);
            }
        }
    }

    /// Destroy all passes for a document, used when the document itself is
    /// removed.
    pub fn burn_document(&mut self, document: DocumentId) {
        let Some(holders) = self.by_document.remove(&document) else {
            return;
        };
        for holder in holders {
            if let Some(documents) = self.by_holder.get_mut(&holder) {
                documents.remove(&document);
                if documents.is_empty() {
                    self.by_holder.remove(&holder);
                }
            }
        }
    }

    /// Whether a principal holds a pass for a document.
    pub fn holds(&self, document: DocumentId, holder: &Principal) -> bool {
        self.by_holder
            .get(holder)
            .is_some_and(|documents| documents.contains(&document))
    }

    /// All documents a principal holds a pass for, including documents they
    /// do not own. Answers "what is shared with me".
    pub fn documents_for(&self, holder: &Principal) -> BTreeSet<DocumentId> {
        self.by_holder.get(holder).cloned().unwrap_or_default()
    }

    /// All principals holding a pass for a document.
    pub fn holders_of(&self, document: DocumentId) -> BTreeSet<Principal> {
        self.by_document.get(&document).cloned().unwrap_or_default()
    }

    /// Project a role table change onto the pass index: a principal's first
    /// role mints, dropping back to no role burns, anything else leaves the
    /// passes untouched.
    pub fn apply(&mut self, document: DocumentId, holder: &Principal, change: &RoleChange) {
        if change.mints_capability() {
            self.mint(document, holder);
        } else if change.burns_capability() {
            self.burn(document, holder);
        }
    }
}
