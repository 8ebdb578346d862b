// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort recording into the append-only audit log.
use docsentinel_core::{AuditEntry, Severity};
use docsentinel_store::AuditStore;

use crate::error::{EngineError, store_err};

/// Writer over an [`AuditStore`] which never fails the surrounding
/// operation.
///
/// An operation that already mutated state must not be reported as failed
/// because its audit write did not land, so failures are logged and
/// swallowed.
#[derive(Clone, Debug)]
pub struct AuditLog<A> {
    store: A,
}

impl<A> AuditLog<A>
where
    A: AuditStore,
{
    pub fn new(store: A) -> Self {
        Self { store }
    }

    /// Append an entry, logging instead of propagating a store failure.
    pub async fn record(&self, entry: AuditEntry) {
        let mut store = self.store.clone();
        if let Err(err) = store.append_entry(&entry).await {
            tracing::warn!(
                event_type = entry.event_type,
                error = %err,
                "dropping audit entry, store rejected append"
            );
        }
    }

    /// The most recent entries, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, EngineError> {
        self.store.recent_entries(limit).await.map_err(store_err)
    }

    /// The most recent entries of one severity, newest first.
    pub async fn recent_by_severity(
        &self,
        severity: Severity,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, EngineError> {
        self.store
            .recent_entries_by_severity(severity, limit)
            .await
            .map_err(store_err)
    }

    /// Total number of entries with the given severity.
    pub async fn count_by_severity(&self, severity: Severity) -> Result<u64, EngineError> {
        self.store.count_by_severity(severity).await.map_err(store_err)
    }
}
