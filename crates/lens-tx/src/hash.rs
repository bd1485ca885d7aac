//! Content hash identifying a transaction across broadcast, pending-pool, and lookup stages.

use std::{fmt, str::FromStr};

use sha2::{Digest, Sha256};

/// SHA-256 digest of raw transaction bytes.
///
/// Rendered as upper-case hex. Parsing and [`TxHash::matches_hex`] accept either case.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Hashes raw transaction bytes.
    #[must_use]
    pub fn of(tx_bytes: &[u8]) -> Self {
        Self(Sha256::digest(tx_bytes).into())
    }

    /// Wraps an existing digest.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the upper-case hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Compares against a hex string, ignoring case.
    #[must_use]
    pub fn matches_hex(&self, other: &str) -> bool {
        self.to_hex().eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0_u8; 32];
        hex::decode_to_slice(value.trim(), &mut bytes)?;
        Ok(Self(bytes))
    }
}
