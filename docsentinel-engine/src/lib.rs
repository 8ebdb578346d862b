// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document custody workflows.
//!
//! The engine takes documents into custody (AI screening, AES-256-GCM
//! encryption, content-addressed pinning, optional on-chain registration)
//! and manages everything that happens afterwards: per-document role tables
//! with collaborator passes, an access request workflow, a verification
//! state machine and an append-only audit log.
//!
//! External systems are injected behind the traits in [`collaborators`];
//! persistence comes from the `docsentinel-store` traits. Everything here is
//! transport-agnostic: an HTTP or RPC surface goes on top.
pub mod audit;
pub mod collaborators;
pub mod config;
pub mod encryption;
pub mod engine;
pub mod error;
pub mod nonce;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use audit::AuditLog;
pub use collaborators::{
    ChainClient, ChainError, LocalChainClient, LocalObjectStorage, LocalScreener, NoChain,
    ObjectStorage, Registration, ScreenError, ScreenReport, Screener, StorageError,
};
pub use config::Config;
pub use encryption::{Encryptor, EncryptionError, KEY_LEN, NONCE_LEN};
pub use engine::{
    DashboardStats, Decision, Engine, IncomingRequest, RegistrationOutcome, UploadOutcome,
};
pub use error::EngineError;
pub use nonce::{LocalNonceStore, MemoryNonceStore, NonceStore};
