// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces for the engine's external collaborators.
//!
//! The engine talks to three outside systems: a content-addressed object
//! store holding encrypted payloads, an AI screening service judging
//! authenticity, and an optional chain collaborator anchoring registrations
//! and decisions. Each is injected behind a trait so deployments can swap
//! implementations and tests can run against in-process fakes.
use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use docsentinel_core::{
    ContentHash, DocumentId, Locator, Principal, RequestId, RequestStatus, ScreenVerdict,
};
use docsentinel_auth::Role;

/// Outcome of screening one uploaded payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScreenReport {
    pub verdict: ScreenVerdict,
    /// Confidence as reported by the screening service, e.g. `"98.50"`.
    pub confidence: String,
    /// Raw per-class scores, kept verbatim for the audit trail.
    pub scores: serde_json::Value,
}

impl ScreenReport {
    /// A report for content the screener could not judge.
    ///
    /// Used when the screening service replies with something unparseable;
    /// unreadable replies never pass as authentic.
    pub fn unknown() -> Self {
        Self {
            verdict: ScreenVerdict::Unknown,
            confidence: "0".to_string(),
            scores: serde_json::Value::Null,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object storage unreachable: {0}")]
    Unreachable(String),
}

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("screening service unreachable: {0}")]
    Unreachable(String),
}

#[derive(Error, Debug)]
pub enum ChainError {
    /// The chain already holds a registration for this content hash.
    #[error("content hash already registered")]
    DuplicateHash,

    #[error("chain unavailable: {0}")]
    Unavailable(String),
}

/// A confirmed on-chain registration of a content hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub token_id: u64,
    pub authority_ref: String,
    pub tx_ref: String,
}

/// Content-addressed storage for encrypted document payloads.
///
/// Two variants of the trait are provided: one which is thread-safe
/// (implementing `Sync`) and one which is purely intended for
/// single-threaded execution contexts.
#[trait_variant::make(ObjectStorage: Send)]
pub trait LocalObjectStorage: Clone {
    type Error: Display + Debug;

    /// Persist an encrypted payload and return its locator.
    async fn put(&self, ciphertext: &[u8]) -> Result<Locator, Self::Error>;

    /// Remove the payload behind a locator. Unpinning an unknown locator is
    /// not an error.
    async fn delete(&self, locator: &Locator) -> Result<(), Self::Error>;
}

/// AI screening of uploaded content.
#[trait_variant::make(Screener: Send)]
pub trait LocalScreener: Clone {
    type Error: Display + Debug;

    /// Judge whether the payload is authentic.
    ///
    /// Implementations map unparseable service replies to
    /// [`ScreenReport::unknown`] rather than failing; only an unreachable
    /// service is an error.
    async fn screen(&self, payload: &[u8], name: &str) -> Result<ScreenReport, Self::Error>;
}

/// Chain collaborator anchoring registrations, role changes and decisions.
///
/// The error type is fixed rather than associated: the engine's duplicate
/// handling depends on telling [`ChainError::DuplicateHash`] apart from an
/// unavailable chain.
#[trait_variant::make(ChainClient: Send)]
pub trait LocalChainClient: Clone {
    /// Register a content hash and locator, minting an on-chain identity.
    async fn submit_registration(
        &self,
        content_hash: &ContentHash,
        locator: &Locator,
    ) -> Result<Registration, ChainError>;

    /// Anchor a role change for a document.
    async fn submit_role_change(
        &self,
        document: DocumentId,
        principal: &Principal,
        role: Role,
    ) -> Result<(), ChainError>;

    /// Anchor a verification request for a document.
    async fn submit_verification_request(
        &self,
        document: DocumentId,
        subject_hash: &ContentHash,
    ) -> Result<(), ChainError>;

    /// Anchor an access request decision and return its transaction
    /// reference.
    async fn submit_access_decision(
        &self,
        request: RequestId,
        status: RequestStatus,
    ) -> Result<String, ChainError>;
}

/// Stand-in for deployments running without a chain collaborator.
///
/// The engine never calls the chain when none is configured; this type only
/// exists to give the chain type parameter something concrete to name. All
/// methods report the chain as unavailable.
#[derive(Clone, Debug, Default)]
pub struct NoChain;

impl ChainClient for NoChain {
    async fn submit_registration(
        &self,
        _content_hash: &ContentHash,
        _locator: &Locator,
    ) -> Result<Registration, ChainError> {
        Err(ChainError::Unavailable("no chain client configured".into()))
    }

    async fn submit_role_change(
        &self,
        _document: DocumentId,
        _principal: &Principal,
        _role: Role,
    ) -> Result<(), ChainError> {
        Err(ChainError::Unavailable("no chain client configured".into()))
    }

    async fn submit_verification_request(
        &self,
        _document: DocumentId,
        _subject_hash: &ContentHash,
    ) -> Result<(), ChainError> {
        Err(ChainError::Unavailable("no chain client configured".into()))
    }

    async fn submit_access_decision(
        &self,
        _request: RequestId,
        _status: RequestStatus,
    ) -> Result<String, ChainError> {
        Err(ChainError::Unavailable("no chain client configured".into()))
    }
}
