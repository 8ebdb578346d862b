// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for storing and querying DocSentinel records.
use std::fmt::{Debug, Display};

use docsentinel_core::{
    AccessRequest, AuditEntry, DecisionRef, Document, DocumentId, OnChainIdentity, Principal,
    RequestId, RequestStatus, Severity, Verification,
};

/// Interface for storing, updating and querying document records.
///
/// Two variants of the trait are provided: one which is thread-safe
/// (implementing `Sync`) and one which is purely intended for
/// single-threaded execution contexts.
#[trait_variant::make(DocumentStore: Send)]
pub trait LocalDocumentStore: Clone {
    type Error: Display + Debug;

    /// Insert a document record.
    ///
    /// Returns `true` when the insert occurred, or `false` when a record
    /// with the same id already existed and no insertion occurred.
    async fn insert_document(&mut self, document: &Document) -> Result<bool, Self::Error>;

    /// Get a document record by id.
    async fn document(&self, id: DocumentId) -> Result<Option<Document>, Self::Error>;

    /// All documents owned by a principal, most recently created first.
    async fn documents_by_owner(&self, owner: &Principal) -> Result<Vec<Document>, Self::Error>;

    /// Total number of document records.
    async fn count_documents(&self) -> Result<u64, Self::Error>;

    /// Attach a confirmed on-chain identity to a document.
    ///
    /// Returns the updated record, or `None` when the document was not
    /// found.
    async fn set_registration(
        &mut self,
        id: DocumentId,
        identity: &OnChainIdentity,
    ) -> Result<Option<Document>, Self::Error>;

    /// Replace a document's attestation state.
    ///
    /// Returns the updated record, or `None` when the document was not
    /// found.
    async fn set_verification(
        &mut self,
        id: DocumentId,
        verification: &Verification,
    ) -> Result<Option<Document>, Self::Error>;

    /// Delete a document record.
    ///
    /// Returns `true` when the removal occurred and `false` when the
    /// document was not found in the store.
    async fn delete_document(&mut self, id: DocumentId) -> Result<bool, Self::Error>;
}

/// Interface for storing and querying access requests.
#[trait_variant::make(RequestStore: Send)]
pub trait LocalRequestStore: Clone {
    type Error: Display + Debug;

    /// Insert a pending access request unless one is already pending for the
    /// same document and requester.
    ///
    /// The duplicate check and the insert happen as one atomic step.
    /// Returns `true` when the insert occurred, or `false` when a pending
    /// request for the (document, requester) pair already existed; the
    /// existing request is left untouched.
    async fn insert_request(&mut self, request: &AccessRequest) -> Result<bool, Self::Error>;

    /// Get an access request by id.
    async fn request(&self, id: RequestId) -> Result<Option<AccessRequest>, Self::Error>;

    /// All requests targeting documents of an owner, most recent first.
    async fn requests_by_owner(
        &self,
        owner: &Principal,
    ) -> Result<Vec<AccessRequest>, Self::Error>;

    /// Record the owner's decision on a request which is still pending.
    ///
    /// The pending check and the update happen as one atomic step. Returns
    /// the updated request, or `None` when no request with this id exists or
    /// it has already been decided — a decided request is never changed
    /// again.
    async fn set_decision(
        &mut self,
        id: RequestId,
        status: RequestStatus,
        reference: &DecisionRef,
    ) -> Result<Option<AccessRequest>, Self::Error>;
}

/// Interface for the append-only audit log.
#[trait_variant::make(AuditStore: Send)]
pub trait LocalAuditStore: Clone {
    type Error: Display + Debug;

    /// Append an entry. Entries are never mutated or deleted.
    async fn append_entry(&mut self, entry: &AuditEntry) -> Result<(), Self::Error>;

    /// The most recent entries, newest first.
    async fn recent_entries(&self, limit: usize) -> Result<Vec<AuditEntry>, Self::Error>;

    /// The most recent entries of one severity, newest first.
    async fn recent_entries_by_severity(
        &self,
        severity: Severity,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, Self::Error>;

    /// Total number of entries with the given severity.
    async fn count_by_severity(&self, severity: Severity) -> Result<u64, Self::Error>;
}
