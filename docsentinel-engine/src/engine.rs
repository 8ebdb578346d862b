// SPDX-License-Identifier: MIT OR Apache-2.0

//! The custody engine tying registry, authority, workflow and collaborator
//! concerns together.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use docsentinel_auth::{
    Authority, AuthorityError, CapabilityIndex, DocumentOperation, Role, RoleChange,
};
use docsentinel_core::{
    AccessRequest, AuditEntry, ContentHash, DecisionRef, Document, DocumentId, Locator,
    OnChainIdentity, Principal, RequestId, RequestStatus, ScreenVerdict, Severity, Timestamp,
    Verification, unix_now,
};
use docsentinel_store::{AuditStore, DocumentStore, RequestStore};

use crate::audit::AuditLog;
use crate::collaborators::{
    ChainClient, ChainError, ObjectStorage, Registration, ScreenReport, Screener,
};
use crate::config::Config;
use crate::encryption::Encryptor;
use crate::error::{EngineError, store_err};
use crate::nonce::NonceStore;

/// How a document upload fared against the chain collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Registration confirmed; the identity is attached to the document.
    Registered(Registration),

    /// No chain client is configured; the document keeps a pending identity.
    Skipped,

    /// The chain already holds this content hash. The document keeps a
    /// pending identity instead of borrowing the earlier transaction's
    /// reference.
    DuplicateOnChain,

    /// The chain was unreachable; the document keeps a pending identity and
    /// registration can be retried later.
    Unavailable(String),
}

/// Result of a successful upload.
#[derive(Clone, Debug)]
pub struct UploadOutcome {
    pub document: Document,
    pub report: ScreenReport,
    pub registration: RegistrationOutcome,
}

/// An access request enriched with document details for presentation.
///
/// The document fields are `None` when the document was removed after the
/// request was filed; the request itself stays on record.
#[derive(Clone, Debug)]
pub struct IncomingRequest {
    pub request: AccessRequest,
    pub document_name: Option<String>,
    pub locator: Option<Locator>,
}

/// The owner's verdict on an access request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

/// Aggregates shown on the security dashboard.
#[derive(Clone, Debug)]
pub struct DashboardStats {
    /// Number of CRITICAL audit entries, i.e. uploads blocked by screening.
    pub threats_blocked: u64,
    pub documents_secured: u64,
    pub recent: Vec<AuditEntry>,
}

/// In-process authority handles, one per live document.
///
/// Each authority sits behind its own `tokio::sync::Mutex` so concurrent
/// role mutations on one document serialize while different documents stay
/// independent. The capability index is a projection of all role tables and
/// is only touched while holding the affected document's authority lock.
#[derive(Clone, Debug, Default)]
struct Authorities {
    table: Arc<RwLock<HashMap<DocumentId, Arc<Mutex<Authority>>>>>,
    capabilities: Arc<RwLock<CapabilityIndex>>,
}

impl Authorities {
    fn create(&self, document: DocumentId, owner: Principal) {
        self.table
            .write()
            .expect("acquire exclusive write access on authority table")
            .insert(document, Arc::new(Mutex::new(Authority::new(document, owner))));
    }

    fn get(&self, document: DocumentId) -> Option<Arc<Mutex<Authority>>> {
        self.table
            .read()
            .expect("acquire shared read access on authority table")
            .get(&document)
            .cloned()
    }

    fn remove(&self, document: DocumentId) {
        self.table
            .write()
            .expect("acquire exclusive write access on authority table")
            .remove(&document);
        self.capabilities
            .write()
            .expect("acquire exclusive write access on capability index")
            .burn_document(document);
    }
}

/// Document custody engine.
///
/// Orchestrates the upload pipeline, the per-document collaboration
/// authorities, the access request workflow and the verification state
/// machine over injected stores and collaborators. All methods take `&self`;
/// the engine is `Clone` and cheap to share across tasks.
#[derive(Clone, Debug)]
pub struct Engine<St, O, C, S, N> {
    store: St,
    audit: AuditLog<St>,
    storage: O,
    chain: Option<C>,
    screener: S,
    nonces: N,
    encryptor: Encryptor,
    authorities: Authorities,
    config: Config,
}

impl<St, O, C, S, N> Engine<St, O, C, S, N>
where
    St: DocumentStore + RequestStore + AuditStore,
    O: ObjectStorage,
    C: ChainClient,
    S: Screener,
    N: NonceStore,
{
    /// Create an engine without a chain collaborator. Registrations are
    /// skipped and decisions get local markers.
    pub fn new(store: St, storage: O, screener: S, nonces: N, config: Config) -> Self {
        Self {
            audit: AuditLog::new(store.clone()),
            encryptor: Encryptor::new(config.encryption_key),
            store,
            storage,
            chain: None,
            screener,
            nonces,
            authorities: Authorities::default(),
            config,
        }
    }

    /// Attach a chain collaborator.
    pub fn with_chain(mut self, chain: C) -> Self {
        self.chain = Some(chain);
        self
    }

    // ------------------------------------------------------------------
    // Upload pipeline
    // ------------------------------------------------------------------

    /// Take a document into custody.
    ///
    /// Screens the payload, encrypts it, pins the ciphertext and attempts an
    /// on-chain registration. A `Fake` verdict rejects the upload before
    /// anything is stored; storage failure aborts before any local mutation.
    /// Chain failure or a duplicate hash does not fail the upload — the
    /// document is kept with a pending identity and the condition is
    /// surfaced in the outcome.
    pub async fn upload(
        &self,
        owner: Principal,
        name: &str,
        payload: &[u8],
    ) -> Result<UploadOutcome, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidInput("document name must not be empty"));
        }

        let report = self
            .screener
            .screen(payload, name)
            .await
            .map_err(|err| EngineError::ExternalService(err.to_string()))?;

        if report.verdict.is_fake() {
            self.audit
                .record(
                    AuditEntry::new("Deepfake Detected", name, Severity::Critical).with_metadata(
                        json!({
                            "confidence": report.confidence,
                            "scores": report.scores,
                        }),
                    ),
                )
                .await;
            return Err(EngineError::RejectedContent);
        }

        let ciphertext = self.encryptor.encrypt(payload)?;
        let content_hash = ContentHash::new(&ciphertext);

        let locator = self
            .storage
            .put(&ciphertext)
            .await
            .map_err(|err| EngineError::ExternalService(err.to_string()))?;

        let registration = match &self.chain {
            None => RegistrationOutcome::Skipped,
            Some(chain) => match chain.submit_registration(&content_hash, &locator).await {
                Ok(registration) => RegistrationOutcome::Registered(registration),
                Err(ChainError::DuplicateHash) => RegistrationOutcome::DuplicateOnChain,
                Err(ChainError::Unavailable(reason)) => {
                    warn!(%content_hash, reason, "chain registration failed, keeping pending identity");
                    RegistrationOutcome::Unavailable(reason)
                }
            },
        };

        let mut document = self
            .register_document(owner, name, content_hash, locator, report.verdict)
            .await?;

        if let RegistrationOutcome::Registered(registration) = &registration {
            document = self.attach_identity(document.id(), registration.clone()).await?;
        }

        self.audit
            .record(AuditEntry::new(
                "File Encrypted (AES-256-GCM)",
                name,
                Severity::Info,
            ))
            .await;

        Ok(UploadOutcome {
            document,
            report,
            registration,
        })
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Create a document record and its collaboration authority.
    ///
    /// Lower-level entry point for content that was screened, encrypted and
    /// pinned elsewhere; [`Engine::upload`] is the full pipeline.
    pub async fn register_document(
        &self,
        owner: Principal,
        name: &str,
        content_hash: ContentHash,
        locator: Locator,
        verdict: ScreenVerdict,
    ) -> Result<Document, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidInput("document name must not be empty"));
        }

        let document = Document::new(name, owner.clone(), content_hash, locator, verdict);

        let mut store = self.store.clone();
        DocumentStore::insert_document(&mut store, &document)
            .await
            .map_err(store_err)?;
        self.authorities.create(document.id(), owner);

        debug!(document = %document.id(), "document registered");
        Ok(document)
    }

    /// Attach a confirmed on-chain registration to a document.
    pub async fn attach_identity(
        &self,
        id: DocumentId,
        registration: Registration,
    ) -> Result<Document, EngineError> {
        let identity = OnChainIdentity {
            token_id: registration.token_id,
            authority_ref: registration.authority_ref,
            tx_ref: registration.tx_ref,
        };
        let mut store = self.store.clone();
        DocumentStore::set_registration(&mut store, id, &identity)
            .await
            .map_err(store_err)?
            .ok_or(EngineError::DocumentNotFound(id))
    }

    /// Retry the on-chain registration of a document still holding a pending
    /// identity.
    ///
    /// Used after an upload whose registration was skipped or failed. A
    /// chain report that the hash is already registered surfaces as
    /// [`EngineError::DuplicateOnChain`]; no synthetic transaction reference
    /// is attached and the document keeps its pending identity.
    pub async fn register_on_chain(&self, id: DocumentId) -> Result<Document, EngineError> {
        let document = self.get_document(id).await?;
        if document.registration().is_some() {
            return Err(EngineError::InvalidTransition(
                "document already carries an on-chain identity",
            ));
        }
        let Some(chain) = &self.chain else {
            return Err(EngineError::ExternalService(
                "no chain client configured".to_string(),
            ));
        };

        match chain
            .submit_registration(document.content_hash(), document.locator())
            .await
        {
            Ok(registration) => self.attach_identity(id, registration).await,
            Err(ChainError::DuplicateHash) => Err(EngineError::DuplicateOnChain),
            Err(ChainError::Unavailable(reason)) => Err(EngineError::ExternalService(reason)),
        }
    }

    pub async fn get_document(&self, id: DocumentId) -> Result<Document, EngineError> {
        DocumentStore::document(&self.store, id)
            .await
            .map_err(store_err)?
            .ok_or(EngineError::DocumentNotFound(id))
    }

    /// All documents owned by a principal, most recently created first.
    pub async fn list_by_owner(&self, owner: &Principal) -> Result<Vec<Document>, EngineError> {
        DocumentStore::documents_by_owner(&self.store, owner)
            .await
            .map_err(store_err)
    }

    /// Remove a document from custody.
    ///
    /// Owner-only. Unpins the ciphertext first; the local record, the
    /// authority and all collaborator passes are only dropped after storage
    /// confirmed the delete.
    pub async fn remove_document(
        &self,
        acting: &Principal,
        id: DocumentId,
    ) -> Result<(), EngineError> {
        let document = self.get_document(id).await?;
        if document.owner() != acting {
            return Err(EngineError::Forbidden {
                principal: acting.clone(),
                action: "remove this document",
            });
        }

        self.storage
            .delete(document.locator())
            .await
            .map_err(|err| EngineError::ExternalService(err.to_string()))?;

        let mut store = self.store.clone();
        DocumentStore::delete_document(&mut store, id)
            .await
            .map_err(store_err)?;
        self.authorities.remove(id);

        self.audit
            .record(AuditEntry::new("File Deleted", document.name(), Severity::Info))
            .await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Roles and capabilities
    // ------------------------------------------------------------------

    /// Assign a role on a document.
    ///
    /// Owner-only, serialized per document. With a chain collaborator
    /// configured the role change is anchored first and the local table only
    /// committed after the chain call succeeded, so an unavailable chain
    /// leaves local state untouched.
    pub async fn grant_role(
        &self,
        acting: &Principal,
        document: DocumentId,
        target: &Principal,
        role: Role,
    ) -> Result<RoleChange, EngineError> {
        let authority = self
            .authorities
            .get(document)
            .ok_or(EngineError::DocumentNotFound(document))?;
        let mut authority = authority.lock().await;

        let change = authority
            .validate_grant(acting, target, role)
            .map_err(map_authority_error)?;

        if !change.is_noop()
            && let Some(chain) = &self.chain
            && let Err(err) = chain.submit_role_change(document, target, role).await
        {
            return Err(EngineError::ExternalService(err.to_string()));
        }

        let change = authority
            .grant(acting, target, role)
            .map_err(map_authority_error)?;
        self.authorities
            .capabilities
            .write()
            .expect("acquire exclusive write access on capability index")
            .apply(document, target, &change);

        Ok(change)
    }

    /// Remove a principal's role. Equivalent to granting `Role::None`.
    pub async fn revoke_role(
        &self,
        acting: &Principal,
        document: DocumentId,
        target: &Principal,
    ) -> Result<RoleChange, EngineError> {
        self.grant_role(acting, document, target, Role::None).await
    }

    /// Current role of a principal on a document. `Role::None` for
    /// principals without any assignment.
    pub async fn role_of(
        &self,
        document: DocumentId,
        principal: &Principal,
    ) -> Result<Role, EngineError> {
        let authority = self
            .authorities
            .get(document)
            .ok_or(EngineError::DocumentNotFound(document))?;
        let authority = authority.lock().await;
        Ok(authority.role(principal))
    }

    /// Whether a principal may perform an operation on a document.
    pub async fn can(
        &self,
        document: DocumentId,
        principal: &Principal,
        operation: DocumentOperation,
    ) -> Result<bool, EngineError> {
        Ok(self.role_of(document, principal).await?.permits(operation))
    }

    /// All documents shared with a principal through a collaborator pass,
    /// including documents they do not own.
    pub async fn shared_with(&self, principal: &Principal) -> Result<Vec<Document>, EngineError> {
        let ids = self
            .authorities
            .capabilities
            .read()
            .expect("acquire shared read access on capability index")
            .documents_for(principal);

        let mut documents = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(document) = DocumentStore::document(&self.store, id)
                .await
                .map_err(store_err)?
            {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    // ------------------------------------------------------------------
    // Access request workflow
    // ------------------------------------------------------------------

    /// File an access request for someone else's document.
    pub async fn request_access(
        &self,
        requester: Principal,
        document: DocumentId,
    ) -> Result<AccessRequest, EngineError> {
        let record = self.get_document(document).await?;
        if record.owner() == &requester {
            return Err(EngineError::InvalidRequest(
                "cannot request access to your own document",
            ));
        }

        let request = AccessRequest::new(document, requester, record.owner().clone());
        let mut store = self.store.clone();
        let inserted = RequestStore::insert_request(&mut store, &request)
            .await
            .map_err(store_err)?;
        if !inserted {
            return Err(EngineError::Conflict);
        }
        Ok(request)
    }

    /// All requests targeting the owner's documents, most recent first,
    /// enriched with document name and locator.
    pub async fn incoming_requests(
        &self,
        owner: &Principal,
    ) -> Result<Vec<IncomingRequest>, EngineError> {
        let requests = RequestStore::requests_by_owner(&self.store, owner)
            .await
            .map_err(store_err)?;

        let mut incoming = Vec::with_capacity(requests.len());
        for request in requests {
            let document = DocumentStore::document(&self.store, request.document())
                .await
                .map_err(store_err)?;
            incoming.push(IncomingRequest {
                document_name: document.as_ref().map(|d| d.name().to_string()),
                locator: document.as_ref().map(|d| d.locator().clone()),
                request,
            });
        }
        Ok(incoming)
    }

    /// Decide a pending access request.
    ///
    /// Only the document owner may decide, and only while the request is
    /// pending; anything else reports the request as not found so callers
    /// cannot probe other owners' requests. Approval grants `Role::Viewer`
    /// to the requester; a failed grant is logged but does not roll the
    /// decision back.
    pub async fn decide_request(
        &self,
        acting: &Principal,
        id: RequestId,
        decision: Decision,
    ) -> Result<AccessRequest, EngineError> {
        let request = RequestStore::request(&self.store, id)
            .await
            .map_err(store_err)?
            .ok_or(EngineError::RequestNotFound(id))?;
        if request.owner() != acting || !request.status().is_pending() {
            return Err(EngineError::RequestNotFound(id));
        }

        let status = decision.status();
        let reference = match &self.chain {
            Some(chain) => match chain.submit_access_decision(id, status).await {
                Ok(tx_ref) => DecisionRef::OnChain(tx_ref),
                Err(err) => return Err(EngineError::ExternalService(err.to_string())),
            },
            None => DecisionRef::Local(format!("LOCAL_{}_{}", status, unix_now())),
        };

        let mut store = self.store.clone();
        let decided = RequestStore::set_decision(&mut store, id, status, &reference)
            .await
            .map_err(store_err)?
            .ok_or(EngineError::RequestNotFound(id))?;

        if decision == Decision::Approve
            && let Err(err) = self
                .grant_role(acting, decided.document(), decided.requester(), Role::Viewer)
                .await
        {
            warn!(
                request = %id,
                requester = %decided.requester(),
                error = %err,
                "approval recorded but viewer grant failed"
            );
        }

        Ok(decided)
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Ask the external attestor to verify a document.
    ///
    /// Requires a role of at least `Verifier` on the document and an
    /// `Unverified` attestation state.
    pub async fn request_verification(
        &self,
        acting: &Principal,
        id: DocumentId,
        subject_hash: ContentHash,
        extra_info: &str,
    ) -> Result<Document, EngineError> {
        let document = self.get_document(id).await?;
        if !self.can(id, acting, DocumentOperation::Verify).await? {
            return Err(EngineError::Forbidden {
                principal: acting.clone(),
                action: "request verification for this document",
            });
        }
        if document.verification() != &Verification::Unverified {
            return Err(EngineError::InvalidTransition(
                "verification already requested or resolved",
            ));
        }

        if let Some(chain) = &self.chain
            && let Err(err) = chain.submit_verification_request(id, &subject_hash).await
        {
            return Err(EngineError::ExternalService(err.to_string()));
        }

        let verification = Verification::Requested {
            subject_hash,
            extra_info: extra_info.to_string(),
            requested_at: unix_now(),
        };
        let mut store = self.store.clone();
        let updated = DocumentStore::set_verification(&mut store, id, &verification)
            .await
            .map_err(store_err)?
            .ok_or(EngineError::DocumentNotFound(id))?;

        self.audit
            .record(AuditEntry::new(
                "Verification Requested",
                updated.name(),
                Severity::Info,
            ))
            .await;
        Ok(updated)
    }

    /// Record the attestor's verdict on a requested verification.
    ///
    /// Trusted entry point for the attestor integration; transitions
    /// `Requested → Verified | Rejected` and never leaves a terminal state.
    pub async fn resolve_verification(
        &self,
        id: DocumentId,
        verified: bool,
        at: Timestamp,
    ) -> Result<Document, EngineError> {
        let document = self.get_document(id).await?;
        if !document.verification().is_requested() {
            return Err(EngineError::InvalidTransition(
                "no verification request is outstanding",
            ));
        }

        let verification = if verified {
            Verification::Verified { at }
        } else {
            Verification::Rejected { at }
        };
        let mut store = self.store.clone();
        let updated = DocumentStore::set_verification(&mut store, id, &verification)
            .await
            .map_err(store_err)?
            .ok_or(EngineError::DocumentNotFound(id))?;

        let (event, severity) = if verified {
            ("Document Verified", Severity::Success)
        } else {
            ("Verification Rejected", Severity::Warning)
        };
        self.audit
            .record(AuditEntry::new(event, updated.name(), severity))
            .await;
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Sign-in challenges
    // ------------------------------------------------------------------

    /// Issue a sign-in challenge nonce for a principal.
    pub async fn issue_nonce(&self, principal: &Principal) -> Result<String, EngineError> {
        let mut nonces = self.nonces.clone();
        nonces
            .issue(principal)
            .await
            .map_err(|err| EngineError::ExternalService(err.to_string()))
    }

    /// Consume a sign-in challenge nonce. Single-use; expired or unknown
    /// nonces return `false`.
    pub async fn verify_nonce(
        &self,
        principal: &Principal,
        nonce: &str,
    ) -> Result<bool, EngineError> {
        let mut nonces = self.nonces.clone();
        nonces
            .take(principal, nonce)
            .await
            .map_err(|err| EngineError::ExternalService(err.to_string()))
    }

    // ------------------------------------------------------------------
    // Audit and dashboard
    // ------------------------------------------------------------------

    /// The most recent audit entries of one severity, newest first.
    pub async fn recent_audit_by_severity(
        &self,
        severity: Severity,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, EngineError> {
        self.audit.recent_by_severity(severity, limit).await
    }

    /// Dashboard aggregates: blocked threats, custody count and the latest
    /// audit entries.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, EngineError> {
        let threats_blocked = self.audit.count_by_severity(Severity::Critical).await?;
        let documents_secured = DocumentStore::count_documents(&self.store)
            .await
            .map_err(store_err)?;
        let recent = self.audit.recent(self.config.audit_recent_limit).await?;

        Ok(DashboardStats {
            threats_blocked,
            documents_secured,
            recent,
        })
    }
}

fn map_authority_error(err: AuthorityError) -> EngineError {
    match err {
        AuthorityError::Forbidden(principal) => EngineError::Forbidden {
            principal,
            action: "manage roles on this document",
        },
        other => EngineError::InvalidRole(other),
    }
}
