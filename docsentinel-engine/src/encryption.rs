// SPDX-License-Identifier: MIT OR Apache-2.0

//! Symmetric encryption of document payloads before they leave the engine.
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use thiserror::Error;

/// Length of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("payload encryption failed")]
    Encrypt,

    #[error("payload decryption failed")]
    Decrypt,

    #[error("ciphertext too short to carry a nonce")]
    Truncated,
}

/// AES-256-GCM encryption of document payloads.
///
/// Every call to [`Encryptor::encrypt`] draws a fresh random nonce which is
/// prepended to the ciphertext, so encrypting the same plaintext twice never
/// yields the same bytes.
#[derive(Clone)]
pub struct Encryptor {
    key: Key<Aes256Gcm>,
}

impl Encryptor {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key: key.into() }
    }

    /// Encrypt a payload, returning `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let cipher = Aes256Gcm::new(&self.key);
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, Payload::from(plaintext))
            .map_err(|_| EncryptionError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a `nonce || ciphertext` payload produced by [`encrypt`].
    ///
    /// [`encrypt`]: Encryptor::encrypt
    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        if sealed.len() < NONCE_LEN {
            return Err(EncryptionError::Truncated);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(&self.key);
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), Payload::from(ciphertext))
            .map_err(|_| EncryptionError::Decrypt)
    }
}

impl std::fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encryptor").finish_non_exhaustive()
    }
}
