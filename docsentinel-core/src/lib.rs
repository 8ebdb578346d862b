// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core data types shared across the DocSentinel stack.
//!
//! DocSentinel keeps custody of user-uploaded documents: every document is
//! screened, encrypted, pinned to content-addressed object storage and
//! optionally anchored on a chain registry. The types in this crate are the
//! leaf entities the higher-level crates operate on: content hashes, wallet
//! principals, document and access-request records and audit entries.
//!
//! All identifiers use hex encodings in human-readable formats (JSON) and raw
//! bytes otherwise (CBOR). Wallet addresses are normalized to lowercase when
//! parsed; every comparison throughout the stack happens on the normalized
//! form.
mod audit;
mod document;
mod hash;
mod id;
mod principal;
mod request;
mod serde;
mod time;

pub use audit::{AuditEntry, Severity};
pub use document::{
    Document, Locator, LocatorError, OnChainIdentity, ScreenVerdict, Verification,
};
pub use hash::{ContentHash, HASH_LEN, HashError};
pub use id::{DocumentId, ID_LEN, IdError, RequestId};
pub use principal::{Principal, PrincipalError};
pub use request::{AccessRequest, DecisionRef, RequestStatus};
pub use serde::{deserialize_hex, serialize_hex};
pub use time::{Timestamp, unix_now};
