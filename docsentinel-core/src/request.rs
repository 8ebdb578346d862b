// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{DocumentId, RequestId};
use crate::principal::Principal;
use crate::time::{Timestamp, unix_now};

/// Status of an access request.
///
/// `Pending → {Approved, Rejected}`; the terminal states are never left
/// again and requests are never deleted, they remain as an audit trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}

/// Reference to where an access decision was committed.
///
/// The two variants are deliberately distinguishable: a local-only marker can
/// never be mistaken for a real on-chain transaction reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionRef {
    /// Transaction reference returned by the chain collaborator.
    OnChain(String),

    /// Marker recorded when no chain collaborator is configured.
    Local(String),
}

impl DecisionRef {
    pub fn is_on_chain(&self) -> bool {
        matches!(self, DecisionRef::OnChain(_))
    }
}

/// A third party's request for access to a document owned by someone else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    id: RequestId,
    document: DocumentId,
    requester: Principal,
    /// Owner of the document, denormalized at creation time so incoming
    /// request listings do not need a registry join.
    owner: Principal,
    status: RequestStatus,
    decision_ref: Option<DecisionRef>,
    requested_at: Timestamp,
}

impl AccessRequest {
    /// Create a new pending request with a fresh random id.
    pub fn new(document: DocumentId, requester: Principal, owner: Principal) -> Self {
        Self {
            id: RequestId::random(),
            document,
            requester,
            owner,
            status: RequestStatus::Pending,
            decision_ref: None,
            requested_at: unix_now(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn requester(&self) -> &Principal {
        &self.requester
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn decision_ref(&self) -> Option<&DecisionRef> {
        self.decision_ref.as_ref()
    }

    pub fn requested_at(&self) -> Timestamp {
        self.requested_at
    }

    /// Record the owner's decision. Callers must ensure the request is still
    /// pending; the store enforces this atomically.
    pub fn decide(&mut self, status: RequestStatus, reference: DecisionRef) {
        self.status = status;
        self.decision_ref = Some(reference);
    }
}
