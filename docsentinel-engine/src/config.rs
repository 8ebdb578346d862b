// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use crate::encryption::KEY_LEN;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// AES-256 key used to seal document payloads before they leave the
    /// engine.
    pub encryption_key: [u8; KEY_LEN],

    /// How long an issued authentication nonce stays valid.
    pub nonce_ttl: Duration,

    /// How many audit entries dashboard queries return by default.
    pub audit_recent_limit: usize,
}

impl Config {
    pub fn new(encryption_key: [u8; KEY_LEN]) -> Self {
        Self {
            encryption_key,
            nonce_ttl: Duration::from_secs(300),
            audit_recent_limit: 50,
        }
    }

    pub fn nonce_ttl(mut self, ttl: Duration) -> Self {
        self.nonce_ttl = ttl;
        self
    }

    pub fn audit_recent_limit(mut self, limit: usize) -> Self {
        self.audit_recent_limit = limit;
        self
    }
}
