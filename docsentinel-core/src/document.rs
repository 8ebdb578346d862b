// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::ContentHash;
use crate::id::DocumentId;
use crate::principal::Principal;
use crate::time::{Timestamp, unix_now};

/// Content-addressed pointer into external object storage (for example an
/// IPFS CID).
///
/// Locators are derived from content by the storage collaborator, so
/// re-uploading identical bytes may yield the same locator. They are never
/// assumed to be unique per call.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Result<Self, LocatorError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(LocatorError::Empty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Locator").field(&self.0).finish()
    }
}

/// Errors which can occur when constructing storage locators.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LocatorError {
    #[error("storage locator must not be empty")]
    Empty,
}

/// Verdict returned by the external AI screening service.
///
/// Malformed or missing screening replies map to `Unknown`, which is neither
/// treated like `Fake` (it does not block the upload) nor like `Real` (the
/// verdict stays on the record for manual review).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenVerdict {
    Real,
    Fake,
    Unknown,
}

impl ScreenVerdict {
    pub fn is_fake(&self) -> bool {
        matches!(self, ScreenVerdict::Fake)
    }
}

impl fmt::Display for ScreenVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScreenVerdict::Real => "REAL",
            ScreenVerdict::Fake => "FAKE",
            ScreenVerdict::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// On-chain identity attached to a document once an external registration
/// transaction has confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainIdentity {
    /// Registry-issued sequence number (token id).
    pub token_id: u64,

    /// Reference to the per-document collaboration authority contract.
    pub authority_ref: String,

    /// Transaction reference of the confirmed registration.
    pub tx_ref: String,
}

/// Attestation state of a document.
///
/// `Unverified → Requested → {Verified, Rejected}`; terminal states are never
/// left again. The transition into `Requested` is driven by a collaborator
/// holding a verifier role, the exit by the external attestor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verification {
    Unverified,
    Requested {
        subject_hash: ContentHash,
        extra_info: String,
        requested_at: Timestamp,
    },
    Verified {
        at: Timestamp,
    },
    Rejected {
        at: Timestamp,
    },
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified { .. })
    }

    pub fn is_requested(&self) -> bool {
        matches!(self, Verification::Requested { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Verification::Verified { .. } | Verification::Rejected { .. }
        )
    }
}

/// A document held in custody.
///
/// Content hash, storage locator and owner are immutable once the record is
/// created; the only fields which change over a document's lifetime are its
/// on-chain registration and its attestation state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    name: String,
    owner: Principal,
    content_hash: ContentHash,
    locator: Locator,
    registration: Option<OnChainIdentity>,
    verification: Verification,
    screen_verdict: ScreenVerdict,
    created_at: Timestamp,
}

impl Document {
    /// Create a new document record with a fresh random id, no on-chain
    /// identity and an unverified attestation state.
    pub fn new(
        name: impl Into<String>,
        owner: Principal,
        content_hash: ContentHash,
        locator: Locator,
        screen_verdict: ScreenVerdict,
    ) -> Self {
        Self {
            id: DocumentId::random(),
            name: name.into(),
            owner,
            content_hash,
            locator,
            registration: None,
            verification: Verification::Unverified,
            screen_verdict,
            created_at: unix_now(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// On-chain identity, or `None` while registration is still pending.
    pub fn registration(&self) -> Option<&OnChainIdentity> {
        self.registration.as_ref()
    }

    pub fn verification(&self) -> &Verification {
        &self.verification
    }

    pub fn screen_verdict(&self) -> ScreenVerdict {
        self.screen_verdict
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Attach the confirmed on-chain identity. A repeated call overwrites;
    /// the caller is responsible for not double-calling.
    pub fn attach_registration(&mut self, identity: OnChainIdentity) {
        self.registration = Some(identity);
    }

    /// Replace the attestation state.
    pub fn set_verification(&mut self, verification: Verification) {
        self.verification = verification;
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Locator, LocatorError, ScreenVerdict, Verification};
    use crate::hash::ContentHash;
    use crate::principal::Principal;

    #[test]
    fn locator_rejects_empty_strings() {
        assert_eq!(Locator::new("   "), Err(LocatorError::Empty));
        assert!(Locator::new("QmYwAPJzv5CZsnAzt8auVZRn1pfejErTuZ5Qf2qMhbZsqM").is_ok());
    }

    #[test]
    fn new_documents_start_unregistered_and_unverified() {
        let owner = Principal::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        let document = Document::new(
            "thesis.pdf",
            owner.clone(),
            ContentHash::new(b"ciphertext"),
            Locator::new("QmYwAPJzv5CZsnAzt8auVZRn1pfejErTuZ5Qf2qMhbZsqM").unwrap(),
            ScreenVerdict::Real,
        );

        assert_eq!(document.owner(), &owner);
        assert!(document.registration().is_none());
        assert_eq!(document.verification(), &Verification::Unverified);
        assert!(!document.verification().is_verified());
    }
}
