// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Size of SHA-256 content digests.
pub const HASH_LEN: usize = 32;

/// 32-byte SHA-256 digest of a document's encrypted bytes.
///
/// The hash is always taken over the ciphertext, never the plaintext, so it
/// can be published on chain without leaking anything about the document
/// content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Calculate the hash of the provided bytes.
    pub fn new(buf: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(buf.as_ref()).into())
    }

    /// Create a `ContentHash` from its raw bytes representation.
    pub const fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Convert the hash to a lowercase hex string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for ContentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for ContentHash {
    fn from(value: [u8; HASH_LEN]) -> Self {
        Self(value)
    }
}

impl From<ContentHash> for [u8; HASH_LEN] {
    fn from(value: ContentHash) -> Self {
        value.0
    }
}

impl TryFrom<&[u8]> for ContentHash {
    type Error = HashError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let value_len = value.len();

        let checked_value: [u8; HASH_LEN] = value
            .try_into()
            .map_err(|_| HashError::InvalidLength(value_len, HASH_LEN))?;

        Ok(Self(checked_value))
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::try_from(hex::decode(value)?.as_slice())
    }
}

impl PartialOrd for ContentHash {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContentHash {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHash").field(&self.to_hex()).finish()
    }
}

/// Errors which can occur when parsing content hashes.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("invalid hash length {0}, expected {1}")]
    InvalidLength(usize, usize),

    #[error("invalid hex encoding in hash string")]
    InvalidHexEncoding(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ContentHash, HashError};

    #[test]
    fn digest_known_vector() {
        let hash = ContentHash::new(b"abc");
        assert_eq!(
            hash.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash.to_hex().len(), 64);
    }

    #[test]
    fn hex_string_round_trip() {
        let hash = ContentHash::new(b"some encrypted bytes");
        let hash_again = ContentHash::from_str(&hash.to_hex()).unwrap();
        assert_eq!(hash, hash_again);
    }

    #[test]
    fn invalid_hex_strings() {
        assert!(matches!(
            ContentHash::from_str("not hex"),
            Err(HashError::InvalidHexEncoding(_))
        ));
        assert!(matches!(
            ContentHash::from_str("ba7816bf"),
            Err(HashError::InvalidLength(4, 32))
        ));
    }
}
