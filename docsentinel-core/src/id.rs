// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Size of random record identifiers.
pub const ID_LEN: usize = 16;

/// Unique identifier of a registered document.
///
/// Identifiers are random, not derived from content: duplicate uploads of
/// identical bytes are accepted as distinct registry entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId([u8; ID_LEN]);

/// Unique identifier of an access request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId([u8; ID_LEN]);

macro_rules! impl_record_id {
    ($name:ident) => {
        impl $name {
            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(rand::random())
            }

            /// Create an identifier from its raw bytes representation.
            pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
                Self(bytes)
            }

            /// Bytes of the identifier.
            pub fn as_bytes(&self) -> &[u8; ID_LEN] {
                &self.0
            }

            /// Convert the identifier to a hex string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = IdError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                let value_len = value.len();

                let checked_value: [u8; ID_LEN] = value
                    .try_into()
                    .map_err(|_| IdError::InvalidLength(value_len, ID_LEN))?;

                Ok(Self(checked_value))
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::try_from(hex::decode(value)?.as_slice())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&self.to_hex())
                    .finish()
            }
        }
    };
}

impl_record_id!(DocumentId);
impl_record_id!(RequestId);

/// Errors which can occur when parsing record identifiers.
#[derive(Error, Debug)]
pub enum IdError {
    #[error("invalid id length {0}, expected {1}")]
    InvalidLength(usize, usize),

    #[error("invalid hex encoding in id string")]
    InvalidHexEncoding(#[from] hex::FromHexError),
}
