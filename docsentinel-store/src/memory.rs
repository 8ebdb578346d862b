// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory persistence for DocSentinel records.
use std::convert::Infallible;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use std::collections::HashMap;

use docsentinel_core::{
    AccessRequest, AuditEntry, DecisionRef, Document, DocumentId, OnChainIdentity, Principal,
    RequestId, RequestStatus, Severity, Verification,
};

use crate::traits::{AuditStore, DocumentStore, RequestStore};

/// Record collections held by an in-memory store.
///
/// The insertion logs preserve creation order so "most recent first"
/// listings do not depend on timestamp ties.
#[derive(Debug, Default)]
pub struct InnerMemoryStore {
    documents: HashMap<DocumentId, Document>,
    document_log: Vec<DocumentId>,
    requests: HashMap<RequestId, AccessRequest>,
    request_log: Vec<RequestId>,
    audit: Vec<AuditEntry>,
}

/// An in-memory store for all DocSentinel record collections.
///
/// `MemoryStore` supports usage in asynchronous and multi-threaded contexts
/// by wrapping an `InnerMemoryStore` with an `RwLock` and `Arc`. Every
/// check-then-act sequence holds the write-lock for its whole duration, which
/// makes the store's atomicity guarantees hold under concurrency.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<InnerMemoryStore>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a read-lock on the store.
    fn read_store(&self) -> RwLockReadGuard<'_, InnerMemoryStore> {
        self.inner
            .read()
            .expect("acquire shared read access on store")
    }

    /// Obtain a write-lock on the store.
    fn write_store(&self) -> RwLockWriteGuard<'_, InnerMemoryStore> {
        self.inner
            .write()
            .expect("acquire exclusive write access on store")
    }
}

impl DocumentStore for MemoryStore {
    type Error = Infallible;

    async fn insert_document(&mut self, document: &Document) -> Result<bool, Self::Error> {
        let mut store = self.write_store();

        if store.documents.contains_key(&document.id()) {
            return Ok(false);
        }

        store.documents.insert(document.id(), document.clone());
        store.document_log.push(document.id());
        Ok(true)
    }

    async fn document(&self, id: DocumentId) -> Result<Option<Document>, Self::Error> {
        Ok(self.read_store().documents.get(&id).cloned())
    }

    async fn documents_by_owner(&self, owner: &Principal) -> Result<Vec<Document>, Self::Error> {
        let store = self.read_store();
        let documents = store
            .document_log
            .iter()
            .rev()
            .filter_map(|id| store.documents.get(id))
            .filter(|document| document.owner() == owner)
            .cloned()
            .collect();
        Ok(documents)
    }

    async fn count_documents(&self) -> Result<u64, Self::Error> {
        Ok(self.read_store().documents.len() as u64)
    }

    async fn set_registration(
        &mut self,
        id: DocumentId,
        identity: &OnChainIdentity,
    ) -> Result<Option<Document>, Self::Error> {
        let mut store = self.write_store();
        let Some(document) = store.documents.get_mut(&id) else {
            return Ok(None);
        };
        document.attach_registration(identity.clone());
        Ok(Some(document.clone()))
    }

    async fn set_verification(
        &mut self,
        id: DocumentId,
        verification: &Verification,
    ) -> Result<Option<Document>, Self::Error> {
        let mut store = self.write_store();
        let Some(document) = store.documents.get_mut(&id) else {
            return Ok(None);
        };
        document.set_verification(verification.clone());
        Ok(Some(document.clone()))
    }

    async fn delete_document(&mut self, id: DocumentId) -> Result<bool, Self::Error> {
        let mut store = self.write_store();
        let removed = store.documents.remove(&id).is_some();
        if removed {
            store.document_log.retain(|logged| *logged != id);
        }
        Ok(removed)
    }
}

impl RequestStore for MemoryStore {
    type Error = Infallible;

    async fn insert_request(&mut self, request: &AccessRequest) -> Result<bool, Self::Error> {
        let mut store = self.write_store();

        let pending_exists = store.requests.values().any(|existing| {
            existing.document() == request.document()
                && existing.requester() == request.requester()
                && existing.status().is_pending()
        });
        if pending_exists {
            return Ok(false);
        }

        store.requests.insert(request.id(), request.clone());
        store.request_log.push(request.id());
        Ok(true)
    }

    async fn request(&self, id: RequestId) -> Result<Option<AccessRequest>, Self::Error> {
        Ok(self.read_store().requests.get(&id).cloned())
    }

    async fn requests_by_owner(
        &self,
        owner: &Principal,
    ) -> Result<Vec<AccessRequest>, Self::Error> {
        let store = self.read_store();
        let requests = store
            .request_log
            .iter()
            .rev()
            .filter_map(|id| store.requests.get(id))
            .filter(|request| request.owner() == owner)
            .cloned()
            .collect();
        Ok(requests)
    }

    async fn set_decision(
        &mut self,
        id: RequestId,
        status: RequestStatus,
        reference: &DecisionRef,
    ) -> Result<Option<AccessRequest>, Self::Error> {
        let mut store = self.write_store();
        let Some(request) = store.requests.get_mut(&id) else {
            return Ok(None);
        };
        if !request.status().is_pending() {
            return Ok(None);
        }
        request.decide(status, reference.clone());
        Ok(Some(request.clone()))
    }
}

impl AuditStore for MemoryStore {
    type Error = Infallible;

    async fn append_entry(&mut self, entry: &AuditEntry) -> Result<(), Self::Error> {
        self.write_store().audit.push(entry.clone());
        Ok(())
    }

    async fn recent_entries(&self, limit: usize) -> Result<Vec<AuditEntry>, Self::Error> {
        let store = self.read_store();
        Ok(store.audit.iter().rev().take(limit).cloned().collect())
    }

    async fn recent_entries_by_severity(
        &self,
        severity: Severity,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, Self::Error> {
        let store = self.read_store();
        Ok(store
            .audit
            .iter()
            .rev()
            .filter(|entry| entry.severity == severity)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_by_severity(&self, severity: Severity) -> Result<u64, Self::Error> {
        let store = self.read_store();
        Ok(store
            .audit
            .iter()
            .filter(|entry| entry.severity == severity)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use docsentinel_core::{
        AccessRequest, AuditEntry, ContentHash, DecisionRef, Document, Locator, Principal,
        RequestId, RequestStatus, ScreenVerdict, Severity,
    };

    use crate::traits::{AuditStore, DocumentStore, RequestStore};

    use super::MemoryStore;

    fn principal(suffix: u8) -> Principal {
        Principal::parse(&format!("0x{:040x}", suffix)).unwrap()
    }

    fn document(owner: &Principal, name: &str) -> Document {
        Document::new(
            name,
            owner.clone(),
            ContentHash::new(name.as_bytes()),
            Locator::new(format!("cid:{}", name)).unwrap(),
            ScreenVerdict::Real,
        )
    }

    #[tokio::test]
    async fn insert_document_is_unique_by_id() {
        let mut store = MemoryStore::new();
        let doc = document(&principal(1), "a.pdf");

        assert!(store.insert_document(&doc).await.unwrap());
        assert!(!store.insert_document(&doc).await.unwrap());
        assert_eq!(store.count_documents().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn documents_by_owner_most_recent_first() {
        let mut store = MemoryStore::new();
        let owner = principal(1);
        let other = principal(2);

        let first = document(&owner, "first.pdf");
        let second = document(&owner, "second.pdf");
        store.insert_document(&first).await.unwrap();
        store.insert_document(&document(&other, "theirs.pdf")).await.unwrap();
        store.insert_document(&second).await.unwrap();

        let listed = store.documents_by_owner(&owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id(), second.id());
        assert_eq!(listed[1].id(), first.id());
    }

    #[tokio::test]
    async fn duplicate_pending_request_is_rejected() {
        let mut store = MemoryStore::new();
        let owner = principal(1);
        let requester = principal(2);
        let doc = document(&owner, "a.pdf");

        let request = AccessRequest::new(doc.id(), requester.clone(), owner.clone());
        assert!(store.insert_request(&request).await.unwrap());

        // A second pending request for the same pair is refused and the
        // first one stays untouched.
        let duplicate = AccessRequest::new(doc.id(), requester.clone(), owner.clone());
        assert!(!store.insert_request(&duplicate).await.unwrap());
        assert!(store.request(duplicate.id()).await.unwrap().is_none());
        assert_eq!(
            store.request(request.id()).await.unwrap().unwrap().status(),
            RequestStatus::Pending
        );
    }

    #[tokio::test]
    async fn pending_request_allowed_again_after_decision() {
        let mut store = MemoryStore::new();
        let owner = principal(1);
        let requester = principal(2);
        let doc = document(&owner, "a.pdf");

        let request = AccessRequest::new(doc.id(), requester.clone(), owner.clone());
        store.insert_request(&request).await.unwrap();
        store
            .set_decision(
                request.id(),
                RequestStatus::Rejected,
                &DecisionRef::Local("LOCAL_REJECTED_0".into()),
            )
            .await
            .unwrap()
            .unwrap();

        // After a rejection the requester may ask again.
        let again = AccessRequest::new(doc.id(), requester, owner);
        assert!(store.insert_request(&again).await.unwrap());
    }

    #[tokio::test]
    async fn decided_requests_are_immutable() {
        let mut store = MemoryStore::new();
        let owner = principal(1);
        let doc = document(&owner, "a.pdf");
        let request = AccessRequest::new(doc.id(), principal(2), owner);
        store.insert_request(&request).await.unwrap();

        let approved = store
            .set_decision(
                request.id(),
                RequestStatus::Approved,
                &DecisionRef::OnChain("0xdeadbeef".into()),
            )
            .await
            .unwrap();
        assert!(approved.is_some());

        // Replaying the decision (or trying to flip it) finds no pending
        // request.
        let replay = store
            .set_decision(
                request.id(),
                RequestStatus::Rejected,
                &DecisionRef::OnChain("0xfeedface".into()),
            )
            .await
            .unwrap();
        assert!(replay.is_none());
        assert_eq!(
            store.request(request.id()).await.unwrap().unwrap().status(),
            RequestStatus::Approved
        );
    }

    #[tokio::test]
    async fn unknown_request_decision_is_none() {
        let mut store = MemoryStore::new();
        let result = store
            .set_decision(
                RequestId::random(),
                RequestStatus::Approved,
                &DecisionRef::Local("LOCAL_APPROVED_0".into()),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn audit_log_counts_and_filters_by_severity() {
        let mut store = MemoryStore::new();
        store
            .append_entry(&AuditEntry::new("File Encrypted", "a.pdf", Severity::Info))
            .await
            .unwrap();
        store
            .append_entry(&AuditEntry::new(
                "Deepfake Detected",
                "b.pdf",
                Severity::Critical,
            ))
            .await
            .unwrap();
        store
            .append_entry(&AuditEntry::new(
                "Deepfake Detected",
                "c.pdf",
                Severity::Critical,
            ))
            .await
            .unwrap();

        assert_eq!(store.count_by_severity(Severity::Critical).await.unwrap(), 2);
        assert_eq!(store.count_by_severity(Severity::Warning).await.unwrap(), 0);

        let recent = store
            .recent_entries_by_severity(Severity::Critical, 1)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].description, "c.pdf");

        let all = store.recent_entries(10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].description, "c.pdf");
    }
}
