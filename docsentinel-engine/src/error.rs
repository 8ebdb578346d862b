// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use docsentinel_auth::AuthorityError;
use docsentinel_core::{DocumentId, Principal, RequestId};

use crate::encryption::EncryptionError;

/// Failure taxonomy for engine operations.
///
/// Every variant carries enough detail for a caller to distinguish "fix your
/// input" from "try again later" from "you are not allowed";
/// [`EngineError::is_retryable`] encodes that distinction.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A required input was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The request itself is not allowed, independent of roles — for example
    /// requesting access to one's own document.
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    /// Also returned when a request exists but the caller is not its owner
    /// or it has already been decided, so callers learn nothing about other
    /// owners' requests.
    #[error("access request {0} not found or already processed")]
    RequestNotFound(RequestId),

    #[error("{principal} is not permitted to {action}")]
    Forbidden {
        principal: Principal,
        action: &'static str,
    },

    /// A pending access request already exists for this document and
    /// requester. Retrying the identical request will not succeed.
    #[error("an access request for this document is already pending")]
    Conflict,

    #[error("invalid role assignment: {0}")]
    InvalidRole(#[source] AuthorityError),

    /// The chain collaborator reported the content hash as already
    /// registered. The document keeps its pending identity; no synthetic
    /// transaction reference is fabricated.
    #[error("content hash is already registered on chain")]
    DuplicateOnChain,

    /// A storage, chain or screening collaborator was unreachable. Local
    /// state was not mutated for the failed step; the caller may retry.
    #[error("external service failure: {0}")]
    ExternalService(String),

    /// AI screening flagged the uploaded content as fake. Terminal for this
    /// upload attempt; a CRITICAL audit entry has been recorded.
    #[error("upload rejected by AI screening")]
    RejectedContent,

    /// The operation's current state does not allow the requested
    /// transition, for example resolving a verification which was never
    /// requested.
    #[error("invalid state transition: {0}")]
    InvalidTransition(&'static str),

    #[error("encryption failed: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::ExternalService(_) | EngineError::Store(_))
    }
}

pub(crate) fn store_err(err: impl std::fmt::Display) -> EngineError {
    EngineError::Store(err.to_string())
}

#[cfg(test)]
mod tests {
    use docsentinel_core::DocumentId;

    use super::EngineError;

    #[test]
    fn retryability() {
        assert!(EngineError::ExternalService("ipfs down".into()).is_retryable());
        assert!(!EngineError::Conflict.is_retryable());
        assert!(!EngineError::DocumentNotFound(DocumentId::random()).is_retryable());
        assert!(!EngineError::RejectedContent.is_retryable());
    }
}
