// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces and implementations of persistence layers for DocSentinel
//! records.
//!
//! Three trait families cover the three record collections the engine works
//! with: documents, access requests and the append-only audit log. Every
//! check-then-act sequence which guards an invariant (for example "at most
//! one pending request per document and requester") is expressed as a single
//! store operation so concrete backends can make it atomic.
//!
//! An in-memory implementation is provided in the form of a [`MemoryStore`],
//! gated by the `memory` feature flag and enabled by default.
#[cfg(feature = "memory")]
mod memory;
mod traits;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use traits::{
    AuditStore, DocumentStore, LocalAuditStore, LocalDocumentStore, LocalRequestStore,
    RequestStore,
};
