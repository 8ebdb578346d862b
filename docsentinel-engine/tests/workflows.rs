// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end workflow tests over in-process collaborator doubles.
use std::time::Duration;

use docsentinel_auth::{DocumentOperation, Role};
use docsentinel_core::{
    ContentHash, DecisionRef, Principal, ScreenVerdict, Severity, Verification, unix_now,
};
use docsentinel_engine::test_utils::{
    FailingAuditStore, FailingObjectStorage, MemoryObjectStorage, TestChain, TestScreener,
    principal, setup_logging,
};
use docsentinel_engine::{
    Config, Decision, Engine, EngineError, MemoryNonceStore, NoChain, RegistrationOutcome,
};
use docsentinel_store::MemoryStore;

fn config() -> Config {
    Config::new([7; 32]).nonce_ttl(Duration::from_secs(60))
}

fn engine(
    screener: TestScreener,
) -> Engine<MemoryStore, MemoryObjectStorage, NoChain, TestScreener, MemoryNonceStore> {
    setup_logging();
    Engine::new(
        MemoryStore::new(),
        MemoryObjectStorage::new(),
        screener,
        MemoryNonceStore::new(Duration::from_secs(60)),
        config(),
    )
}

fn engine_with_chain(
    screener: TestScreener,
    chain: TestChain,
) -> Engine<MemoryStore, MemoryObjectStorage, TestChain, TestScreener, MemoryNonceStore> {
    setup_logging();
    Engine::new(
        MemoryStore::new(),
        MemoryObjectStorage::new(),
        screener,
        MemoryNonceStore::new(Duration::from_secs(60)),
        config(),
    )
    .with_chain(chain)
}

#[tokio::test]
async fn owner_listing_is_case_insensitive() {
    let engine = engine(TestScreener::Real);
    let upper = Principal::parse("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
    let lower = Principal::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();

    engine
        .upload(upper, "deed.pdf", b"title deed")
        .await
        .unwrap();

    let listed = engine.list_by_owner(&lower).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name(), "deed.pdf");
}

#[tokio::test]
async fn upload_encrypts_before_pinning() {
    let storage = MemoryObjectStorage::new();
    let engine = Engine::new(
        MemoryStore::new(),
        storage.clone(),
        TestScreener::Real,
        MemoryNonceStore::new(Duration::from_secs(60)),
        config(),
    )
    .with_chain(TestChain::confirming());

    let outcome = engine
        .upload(principal(1), "deed.pdf", b"title deed")
        .await
        .unwrap();

    // The pinned payload is the ciphertext: its locator is derived from
    // bytes that differ from the plaintext, and the document's hash covers
    // the ciphertext as well.
    assert!(storage.contains(outcome.document.locator()));
    assert_ne!(
        outcome.document.content_hash(),
        &ContentHash::new(b"title deed")
    );
    assert!(matches!(
        outcome.registration,
        RegistrationOutcome::Registered(_)
    ));
    assert!(outcome.document.registration().is_some());
}

#[tokio::test]
async fn fake_upload_is_rejected_and_audited() {
    let engine = engine(TestScreener::Fake);
    let owner = principal(1);

    let err = engine
        .upload(owner.clone(), "forged.pdf", b"payload")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RejectedContent));
    assert!(!err.is_retryable());

    // No document was created; the threat shows up on the dashboard.
    assert!(engine.list_by_owner(&owner).await.unwrap().is_empty());
    let stats = engine.dashboard_stats().await.unwrap();
    assert_eq!(stats.threats_blocked, 1);
    assert_eq!(stats.documents_secured, 0);

    let critical = engine
        .recent_audit_by_severity(Severity::Critical, 10)
        .await
        .unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].event_type, "Deepfake Detected");
    assert_eq!(critical[0].description, "forged.pdf");
    assert_eq!(critical[0].metadata.as_ref().unwrap()["confidence"], "98.50");
}

#[tokio::test]
async fn unknown_verdict_proceeds_but_is_recorded() {
    let engine = engine(TestScreener::Unknown);
    let outcome = engine
        .upload(principal(1), "scan.pdf", b"payload")
        .await
        .unwrap();
    assert_eq!(outcome.document.screen_verdict(), ScreenVerdict::Unknown);
}

#[tokio::test]
async fn unreachable_screener_fails_retryably() {
    let engine = engine(TestScreener::Unreachable);
    let err = engine
        .upload(principal(1), "deed.pdf", b"payload")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExternalService(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn failing_storage_mutates_nothing() {
    let engine = Engine::new(
        MemoryStore::new(),
        FailingObjectStorage,
        TestScreener::Real,
        MemoryNonceStore::new(Duration::from_secs(60)),
        config(),
    )
    .with_chain(TestChain::confirming());
    let owner = principal(1);

    let err = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    assert!(engine.list_by_owner(&owner).await.unwrap().is_empty());
    assert_eq!(engine.dashboard_stats().await.unwrap().documents_secured, 0);
}

#[tokio::test]
async fn duplicate_registration_keeps_pending_identity() {
    let engine = engine_with_chain(TestScreener::Real, TestChain::duplicate_registration());

    let outcome = engine
        .upload(principal(1), "deed.pdf", b"payload")
        .await
        .unwrap();

    // The document survives without borrowing the earlier transaction's
    // reference.
    assert_eq!(outcome.registration, RegistrationOutcome::DuplicateOnChain);
    assert!(outcome.document.registration().is_none());
    assert!(
        engine
            .get_document(outcome.document.id())
            .await
            .unwrap()
            .registration()
            .is_none()
    );
}

#[tokio::test]
async fn unavailable_chain_keeps_pending_identity() {
    let engine = engine_with_chain(TestScreener::Real, TestChain::unavailable());
    let outcome = engine
        .upload(principal(1), "deed.pdf", b"payload")
        .await
        .unwrap();
    assert!(matches!(
        outcome.registration,
        RegistrationOutcome::Unavailable(_)
    ));
    assert!(outcome.document.registration().is_none());
}

#[tokio::test]
async fn pending_registration_can_be_retried() {
    let chain = TestChain::unavailable();
    let engine = engine_with_chain(TestScreener::Real, chain.clone());

    let outcome = engine
        .upload(principal(1), "deed.pdf", b"payload")
        .await
        .unwrap();
    assert!(outcome.document.registration().is_none());

    // Once the chain is back, the pending identity can be filled in.
    chain.set_confirming();
    let updated = engine.register_on_chain(outcome.document.id()).await.unwrap();
    assert!(updated.registration().is_some());

    // A registered document cannot be registered twice.
    let err = engine
        .register_on_chain(outcome.document.id())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
}

#[tokio::test]
async fn duplicate_hash_on_retry_is_surfaced_distinctly() {
    let engine = engine_with_chain(TestScreener::Real, TestChain::duplicate_registration());

    let outcome = engine
        .upload(principal(1), "deed.pdf", b"payload")
        .await
        .unwrap();
    assert_eq!(outcome.registration, RegistrationOutcome::DuplicateOnChain);

    // Retrying against a chain which still holds the hash reports the
    // duplicate as its own error, not a generic service failure, and the
    // document keeps its pending identity.
    let err = engine
        .register_on_chain(outcome.document.id())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateOnChain));
    assert!(!err.is_retryable());
    assert!(
        engine
            .get_document(outcome.document.id())
            .await
            .unwrap()
            .registration()
            .is_none()
    );
}

#[tokio::test]
async fn audit_store_failure_never_fails_uploads() {
    let engine = Engine::<_, _, NoChain, _, _>::new(
        FailingAuditStore::new(),
        MemoryObjectStorage::new(),
        TestScreener::Real,
        MemoryNonceStore::new(Duration::from_secs(60)),
        config(),
    );
    let owner = principal(1);

    // The audit append fails behind the scenes; the upload must still
    // succeed and the document must be in custody.
    let outcome = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap();
    assert_eq!(engine.list_by_owner(&owner).await.unwrap().len(), 1);
    engine.get_document(outcome.document.id()).await.unwrap();
}

#[tokio::test]
async fn fake_rejection_survives_audit_store_failure() {
    let engine = Engine::<_, _, NoChain, _, _>::new(
        FailingAuditStore::new(),
        MemoryObjectStorage::new(),
        TestScreener::Fake,
        MemoryNonceStore::new(Duration::from_secs(60)),
        config(),
    );

    // Losing the CRITICAL audit entry must not turn the screening verdict
    // into a store error.
    let err = engine
        .upload(principal(1), "forged.pdf", b"payload")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RejectedContent));
}

#[tokio::test]
async fn request_approve_grant_and_replay() {
    let engine = engine(TestScreener::Real);
    let owner = principal(1);
    let requester = principal(2);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;

    let request = engine
        .request_access(requester.clone(), document.id())
        .await
        .unwrap();

    let incoming = engine.incoming_requests(&owner).await.unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].document_name.as_deref(), Some("deed.pdf"));

    let decided = engine
        .decide_request(&owner, request.id(), Decision::Approve)
        .await
        .unwrap();
    assert!(matches!(
        decided.decision_ref(),
        Some(DecisionRef::Local(_))
    ));

    // Approval granted Viewer: the requester can view and sees the document
    // among those shared with them.
    assert_eq!(
        engine.role_of(document.id(), &requester).await.unwrap(),
        Role::Viewer
    );
    assert!(
        engine
            .can(document.id(), &requester, DocumentOperation::View)
            .await
            .unwrap()
    );
    assert!(
        !engine
            .can(document.id(), &requester, DocumentOperation::Edit)
            .await
            .unwrap()
    );
    let shared = engine.shared_with(&requester).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].id(), document.id());

    // Replaying the decision finds no pending request.
    let replay = engine
        .decide_request(&owner, request.id(), Decision::Reject)
        .await
        .unwrap_err();
    assert!(matches!(replay, EngineError::RequestNotFound(_)));
    assert_eq!(
        engine.role_of(document.id(), &requester).await.unwrap(),
        Role::Viewer
    );
}

#[tokio::test]
async fn decision_is_anchored_when_chain_is_configured() {
    let engine = engine_with_chain(TestScreener::Real, TestChain::confirming());
    let owner = principal(1);
    let requester = principal(2);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;
    let request = engine
        .request_access(requester, document.id())
        .await
        .unwrap();

    let decided = engine
        .decide_request(&owner, request.id(), Decision::Approve)
        .await
        .unwrap();
    assert!(decided.decision_ref().unwrap().is_on_chain());
}

#[tokio::test]
async fn self_request_and_duplicate_pending_are_refused() {
    let engine = engine(TestScreener::Real);
    let owner = principal(1);
    let requester = principal(2);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;

    let err = engine
        .request_access(owner.clone(), document.id())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));

    engine
        .request_access(requester.clone(), document.id())
        .await
        .unwrap();
    let err = engine
        .request_access(requester, document.id())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict));
}

#[tokio::test]
async fn only_the_owner_decides_requests() {
    let engine = engine(TestScreener::Real);
    let owner = principal(1);
    let requester = principal(2);
    let stranger = principal(3);

    let document = engine
        .upload(owner, "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;
    let request = engine
        .request_access(requester, document.id())
        .await
        .unwrap();

    // A non-owner cannot even learn that the request exists.
    let err = engine
        .decide_request(&stranger, request.id(), Decision::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RequestNotFound(_)));
}

#[tokio::test]
async fn unavailable_chain_aborts_grants_without_local_change() {
    let engine = engine_with_chain(TestScreener::Real, TestChain::unavailable());
    let owner = principal(1);
    let bob = principal(2);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;

    let err = engine
        .grant_role(&owner, document.id(), &bob, Role::Editor)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExternalService(_)));

    // No partial commit: the role table and the pass index are untouched.
    assert_eq!(engine.role_of(document.id(), &bob).await.unwrap(), Role::None);
    assert!(engine.shared_with(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn revoked_collaborator_loses_pass() {
    let engine = engine(TestScreener::Real);
    let owner = principal(1);
    let bob = principal(2);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;

    engine
        .grant_role(&owner, document.id(), &bob, Role::Editor)
        .await
        .unwrap();
    assert_eq!(engine.shared_with(&bob).await.unwrap().len(), 1);

    engine.revoke_role(&owner, document.id(), &bob).await.unwrap();
    assert_eq!(engine.role_of(document.id(), &bob).await.unwrap(), Role::None);
    assert!(engine.shared_with(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_owner_cannot_grant_or_remove() {
    let engine = engine(TestScreener::Real);
    let owner = principal(1);
    let bob = principal(2);
    let claire = principal(3);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;
    engine
        .grant_role(&owner, document.id(), &bob, Role::Editor)
        .await
        .unwrap();

    let err = engine
        .grant_role(&bob, document.id(), &claire, Role::Viewer)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));

    let err = engine.remove_document(&bob, document.id()).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));
}

#[tokio::test]
async fn remove_unpins_and_burns_passes() {
    let storage = MemoryObjectStorage::new();
    let engine = Engine::<_, _, NoChain, _, _>::new(
        MemoryStore::new(),
        storage.clone(),
        TestScreener::Real,
        MemoryNonceStore::new(Duration::from_secs(60)),
        config(),
    );
    let owner = principal(1);
    let bob = principal(2);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;
    engine
        .grant_role(&owner, document.id(), &bob, Role::Viewer)
        .await
        .unwrap();

    engine.remove_document(&owner, document.id()).await.unwrap();

    assert!(!storage.contains(document.locator()));
    assert!(matches!(
        engine.get_document(document.id()).await.unwrap_err(),
        EngineError::DocumentNotFound(_)
    ));
    assert!(engine.shared_with(&bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn verification_follows_the_state_machine() {
    let engine = engine(TestScreener::Real);
    let owner = principal(1);
    let verifier = principal(2);
    let viewer = principal(3);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;
    let subject_hash = document.content_hash().clone();

    engine
        .grant_role(&owner, document.id(), &verifier, Role::Verifier)
        .await
        .unwrap();
    engine
        .grant_role(&owner, document.id(), &viewer, Role::Viewer)
        .await
        .unwrap();

    // A viewer may not request verification; a verifier (or the owner) may.
    let err = engine
        .request_verification(&viewer, document.id(), subject_hash.clone(), "notarized copy")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));

    let requested = engine
        .request_verification(&verifier, document.id(), subject_hash.clone(), "notarized copy")
        .await
        .unwrap();
    assert!(requested.verification().is_requested());

    // A second request cannot pile onto an outstanding one.
    let err = engine
        .request_verification(&owner, document.id(), subject_hash, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let verified = engine
        .resolve_verification(document.id(), true, unix_now())
        .await
        .unwrap();
    assert!(verified.verification().is_verified());

    // Terminal states are never left again.
    let err = engine
        .resolve_verification(document.id(), false, unix_now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let success = engine
        .recent_audit_by_severity(Severity::Success, 10)
        .await
        .unwrap();
    assert_eq!(success.len(), 1);
    assert_eq!(success[0].event_type, "Document Verified");
}

#[tokio::test]
async fn rejected_verification_is_terminal_and_audited() {
    let engine = engine(TestScreener::Real);
    let owner = principal(1);

    let document = engine
        .upload(owner.clone(), "deed.pdf", b"payload")
        .await
        .unwrap()
        .document;
    engine
        .request_verification(&owner, document.id(), document.content_hash().clone(), "")
        .await
        .unwrap();

    let rejected = engine
        .resolve_verification(document.id(), false, unix_now())
        .await
        .unwrap();
    assert!(matches!(
        rejected.verification(),
        Verification::Rejected { .. }
    ));

    let warnings = engine
        .recent_audit_by_severity(Severity::Warning, 10)
        .await
        .unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].event_type, "Verification Rejected");
}

#[tokio::test]
async fn sign_in_nonces_are_single_use() {
    let engine = engine(TestScreener::Real);
    let alice = principal(1);

    let nonce = engine.issue_nonce(&alice).await.unwrap();
    assert!(engine.verify_nonce(&alice, &nonce).await.unwrap());
    assert!(!engine.verify_nonce(&alice, &nonce).await.unwrap());
}
