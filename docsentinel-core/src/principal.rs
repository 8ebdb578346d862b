// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Wallet-style account address identifying a caller.
///
/// Addresses arrive from clients in mixed case (`0xAbC...`) and are
/// normalized to lowercase at parse time. Every role table lookup, ownership
/// check and request comparison operates on the normalized form, so two
/// spellings of the same address always refer to the same principal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal(String);

impl Principal {
    /// Parse and normalize a wallet address.
    ///
    /// Accepts a `0x`-prefixed 40-character hex string in any case.
    pub fn parse(value: &str) -> Result<Self, PrincipalError> {
        let value = value.trim();
        let Some(hex_part) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) else {
            return Err(PrincipalError::MissingPrefix);
        };

        if hex_part.len() != 40 {
            return Err(PrincipalError::InvalidLength(hex_part.len()));
        }

        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PrincipalError::InvalidCharacter);
        }

        Ok(Self(format!("0x{}", hex_part.to_ascii_lowercase())))
    }

    /// The normalized (lowercase) address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Principal").field(&self.0).finish()
    }
}

/// Errors which can occur when parsing wallet addresses.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("wallet address must start with 0x")]
    MissingPrefix,

    #[error("wallet address must contain 40 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("wallet address contains non-hex characters")]
    InvalidCharacter,
}
