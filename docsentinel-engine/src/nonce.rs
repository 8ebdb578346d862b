// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-use authentication nonces for signature challenges.
//!
//! A caller proves control of a principal by asking for a nonce, signing it
//! out-of-band and presenting it back. Each nonce is bound to one principal,
//! expires after a configurable time and is consumed on first use, so a
//! captured challenge cannot be replayed.
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use docsentinel_core::Principal;

/// Number of random bytes behind one nonce.
const NONCE_BYTES: usize = 16;

/// Interface for issuing and consuming authentication nonces.
///
/// Two variants of the trait are provided: one which is thread-safe
/// (implementing `Sync`) and one which is purely intended for
/// single-threaded execution contexts.
#[trait_variant::make(NonceStore: Send)]
pub trait LocalNonceStore: Clone {
    type Error: Display + Debug;

    /// Issue a fresh nonce for a principal, replacing any outstanding one.
    async fn issue(&mut self, principal: &Principal) -> Result<String, Self::Error>;

    /// Consume a nonce.
    ///
    /// Returns `true` when the nonce matches the outstanding one for this
    /// principal and has not expired. The nonce is removed either way, so a
    /// second presentation always fails.
    async fn take(&mut self, principal: &Principal, nonce: &str) -> Result<bool, Self::Error>;
}

/// An in-memory nonce store with per-entry expiry.
#[derive(Clone, Debug)]
pub struct MemoryNonceStore {
    ttl: Duration,
    inner: Arc<RwLock<HashMap<Principal, (String, Instant)>>>,
}

impl MemoryNonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl NonceStore for MemoryNonceStore {
    type Error = std::convert::Infallible;

    async fn issue(&mut self, principal: &Principal) -> Result<String, Self::Error> {
        let nonce = hex::encode(rand::random::<[u8; NONCE_BYTES]>());
        self.inner
            .write()
            .expect("acquire exclusive write access on nonce store")
            .insert(principal.clone(), (nonce.clone(), Instant::now()));
        Ok(nonce)
    }

    async fn take(&mut self, principal: &Principal, nonce: &str) -> Result<bool, Self::Error> {
        let mut store = self
            .inner
            .write()
            .expect("acquire exclusive write access on nonce store");
        let Some((issued, at)) = store.remove(principal) else {
            return Ok(false);
        };
        Ok(issued == nonce && at.elapsed() < self.ttl)
    }
}
