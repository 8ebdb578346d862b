// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process collaborator doubles for tests.
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::json;
use thiserror::Error;

use docsentinel_auth::Role;
use docsentinel_core::{
    AccessRequest, AuditEntry, ContentHash, DecisionRef, Document, DocumentId, Locator,
    OnChainIdentity, Principal, RequestId, RequestStatus, ScreenVerdict, Severity, Verification,
};
use docsentinel_store::{AuditStore, DocumentStore, MemoryStore, RequestStore};

use crate::collaborators::{
    ChainClient, ChainError, ObjectStorage, Registration, ScreenError, ScreenReport, Screener,
    StorageError,
};

/// Content-addressed in-memory object storage.
///
/// Locators are `mem:` followed by the SHA-256 of the stored bytes, so
/// storing identical ciphertext twice yields the same locator, just like a
/// pinning service would.
#[derive(Clone, Debug, Default)]
pub struct MemoryObjectStorage {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.inner.read().expect("acquire shared read access on storage").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a payload is stored behind this locator.
    pub fn contains(&self, locator: &Locator) -> bool {
        self.inner
            .read()
            .expect("acquire shared read access on storage")
            .contains_key(locator.as_str())
    }
}

impl ObjectStorage for MemoryObjectStorage {
    type Error = StorageError;

    async fn put(&self, ciphertext: &[u8]) -> Result<Locator, Self::Error> {
        let locator = format!("mem:{}", ContentHash::new(ciphertext).to_hex());
        self.inner
            .write()
            .expect("acquire exclusive write access on storage")
            .insert(locator.clone(), ciphertext.to_vec());
        Ok(Locator::new(locator).expect("content-addressed locator is never empty"))
    }

    async fn delete(&self, locator: &Locator) -> Result<(), Self::Error> {
        self.inner
            .write()
            .expect("acquire exclusive write access on storage")
            .remove(locator.as_str());
        Ok(())
    }
}

/// Object storage that is always unreachable.
#[derive(Clone, Debug, Default)]
pub struct FailingObjectStorage;

impl ObjectStorage for FailingObjectStorage {
    type Error = StorageError;

    async fn put(&self, _ciphertext: &[u8]) -> Result<Locator, Self::Error> {
        Err(StorageError::Unreachable("storage offline".into()))
    }

    async fn delete(&self, _locator: &Locator) -> Result<(), Self::Error> {
        Err(StorageError::Unreachable("storage offline".into()))
    }
}

/// Screener double returning a fixed verdict.
#[derive(Clone, Copy, Debug)]
pub enum TestScreener {
    Real,
    Fake,
    Unknown,
    Unreachable,
}

impl Screener for TestScreener {
    type Error = ScreenError;

    async fn screen(&self, _payload: &[u8], _name: &str) -> Result<ScreenReport, Self::Error> {
        match self {
            TestScreener::Real => Ok(ScreenReport {
                verdict: ScreenVerdict::Real,
                confidence: "99.87".to_string(),
                scores: json!({ "real": "99.87", "fake": "0.13" }),
            }),
            TestScreener::Fake => Ok(ScreenReport {
                verdict: ScreenVerdict::Fake,
                confidence: "98.50".to_string(),
                scores: json!({ "real": "1.50", "fake": "98.50" }),
            }),
            TestScreener::Unknown => Ok(ScreenReport::unknown()),
            TestScreener::Unreachable => {
                Err(ScreenError::Unreachable("screening service offline".into()))
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum ChainMode {
    Confirm,
    DuplicateRegistration,
    Unavailable,
}

/// Chain client double.
///
/// Confirms submissions with sequential token ids and deterministic
/// transaction references, or fails in a chosen way. The duplicate mode only
/// affects registrations; other submissions still confirm, matching a chain
/// that holds the hash but accepts fresh transactions. Clones share the
/// mode, so a chain can recover mid-test via [`TestChain::set_confirming`].
#[derive(Clone, Debug)]
pub struct TestChain {
    mode: Arc<RwLock<ChainMode>>,
    sequence: Arc<AtomicU64>,
}

impl TestChain {
    pub fn confirming() -> Self {
        Self::with_mode(ChainMode::Confirm)
    }

    pub fn duplicate_registration() -> Self {
        Self::with_mode(ChainMode::DuplicateRegistration)
    }

    pub fn unavailable() -> Self {
        Self::with_mode(ChainMode::Unavailable)
    }

    fn with_mode(mode: ChainMode) -> Self {
        Self {
            mode: Arc::new(RwLock::new(mode)),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Switch the chain (and all its clones) to confirming submissions.
    pub fn set_confirming(&self) {
        *self
            .mode
            .write()
            .expect("acquire exclusive write access on chain mode") = ChainMode::Confirm;
    }

    fn mode(&self) -> ChainMode {
        *self
            .mode
            .read()
            .expect("acquire shared read access on chain mode")
    }

    fn next(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn ensure_available(&self) -> Result<(), ChainError> {
        match self.mode() {
            ChainMode::Unavailable => Err(ChainError::Unavailable("chain offline".into())),
            _ => Ok(()),
        }
    }
}

impl ChainClient for TestChain {
    async fn submit_registration(
        &self,
        _content_hash: &ContentHash,
        _locator: &Locator,
    ) -> Result<Registration, ChainError> {
        self.ensure_available()?;
        if matches!(self.mode(), ChainMode::DuplicateRegistration) {
            return Err(ChainError::DuplicateHash);
        }
        let token_id = self.next();
        Ok(Registration {
            token_id,
            authority_ref: format!("0x{:040x}", token_id),
            tx_ref: format!("0x{:064x}", token_id),
        })
    }

    async fn submit_role_change(
        &self,
        _document: DocumentId,
        _principal: &Principal,
        _role: Role,
    ) -> Result<(), ChainError> {
        self.ensure_available()?;
        self.next();
        Ok(())
    }

    async fn submit_verification_request(
        &self,
        _document: DocumentId,
        _subject_hash: &ContentHash,
    ) -> Result<(), ChainError> {
        self.ensure_available()?;
        self.next();
        Ok(())
    }

    async fn submit_access_decision(
        &self,
        _request: RequestId,
        _status: RequestStatus,
    ) -> Result<String, ChainError> {
        self.ensure_available()?;
        Ok(format!("0x{:064x}", self.next()))
    }
}

#[derive(Error, Debug)]
#[error("audit store unavailable")]
pub struct AuditUnavailable;

/// Store whose audit log is unavailable while documents and requests
/// persist normally.
///
/// Exercises the guarantee that a failed audit append never fails the
/// operation which triggered it.
#[derive(Clone, Debug, Default)]
pub struct FailingAuditStore {
    inner: MemoryStore,
}

impl FailingAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for FailingAuditStore {
    type Error = Infallible;

    async fn insert_document(&mut self, document: &Document) -> Result<bool, Self::Error> {
        self.inner.insert_document(document).await
    }

    async fn document(&self, id: DocumentId) -> Result<Option<Document>, Self::Error> {
        self.inner.document(id).await
    }

    async fn documents_by_owner(&self, owner: &Principal) -> Result<Vec<Document>, Self::Error> {
        self.inner.documents_by_owner(owner).await
    }

    async fn count_documents(&self) -> Result<u64, Self::Error> {
        self.inner.count_documents().await
    }

    async fn set_registration(
        &mut self,
        id: DocumentId,
        identity: &OnChainIdentity,
    ) -> Result<Option<Document>, Self::Error> {
        self.inner.set_registration(id, identity).await
    }

    async fn set_verification(
        &mut self,
        id: DocumentId,
        verification: &Verification,
    ) -> Result<Option<Document>, Self::Error> {
        self.inner.set_verification(id, verification).await
    }

    async fn delete_document(&mut self, id: DocumentId) -> Result<bool, Self::Error> {
        self.inner.delete_document(id).await
    }
}

impl RequestStore for FailingAuditStore {
    type Error = Infallible;

    async fn insert_request(&mut self, request: &AccessRequest) -> Result<bool, Self::Error> {
        self.inner.insert_request(request).await
    }

    async fn request(&self, id: RequestId) -> Result<Option<AccessRequest>, Self::Error> {
        self.inner.request(id).await
    }

    async fn requests_by_owner(
        &self,
        owner: &Principal,
    ) -> Result<Vec<AccessRequest>, Self::Error> {
        self.inner.requests_by_owner(owner).await
    }

    async fn set_decision(
        &mut self,
        id: RequestId,
        status: RequestStatus,
        reference: &DecisionRef,
    ) -> Result<Option<AccessRequest>, Self::Error> {
        self.inner.set_decision(id, status, reference).await
    }
}

impl AuditStore for FailingAuditStore {
    type Error = AuditUnavailable;

    async fn append_entry(&mut self, _entry: &AuditEntry) -> Result<(), Self::Error> {
        Err(AuditUnavailable)
    }

    async fn recent_entries(&self, _limit: usize) -> Result<Vec<AuditEntry>, Self::Error> {
        Err(AuditUnavailable)
    }

    async fn recent_entries_by_severity(
        &self,
        _severity: Severity,
        _limit: usize,
    ) -> Result<Vec<AuditEntry>, Self::Error> {
        Err(AuditUnavailable)
    }

    async fn count_by_severity(&self, _severity: Severity) -> Result<u64, Self::Error> {
        Err(AuditUnavailable)
    }
}

/// Parse a principal from a short suffix, e.g. `principal(7)`.
pub fn principal(suffix: u8) -> Principal {
    Principal::parse(&format!("0x{:040x}", suffix)).expect("generated address is well-formed")
}

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}
