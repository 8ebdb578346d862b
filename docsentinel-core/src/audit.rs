// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, unix_now};

/// Severity of an audit log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        write!(f, "{}", s)
    }
}

/// Append-only record of a security-relevant event, consumed by an external
/// dashboard aggregator. Entries are never mutated or deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Free-form event classification, for example "Deepfake Detected".
    pub event_type: String,

    /// Human-readable description, typically the affected file name.
    pub description: String,

    pub severity: Severity,

    pub timestamp: Timestamp,

    /// Optional structured context, for example a screening score breakdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn new(
        event_type: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            description: description.into(),
            severity,
            timestamp: unix_now(),
            metadata: None,
        }
    }

    /// Attach structured metadata to an entry.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
