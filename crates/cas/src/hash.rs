//! Fingerprint: the SHA-1 digest of an object's bytes, as 40 lowercase hex chars.
//!
//! The fingerprint is both the public image id and the storage key. Nothing
//! else is minted; identical bytes always land on the same key.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of a rendered fingerprint (20 digest bytes, two hex chars each).
pub const FINGERPRINT_LEN: usize = 40;

/// A content fingerprint - 160 bits of SHA-1, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

/// Errors that can occur when parsing a fingerprint from text.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid fingerprint length: expected 40 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("fingerprint must be lowercase hex")]
    InvalidHex,
}

impl Fingerprint {
    /// Digest the bytes and return their fingerprint.
    pub fn from_data(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        Self(hex::encode(digest))
    }

    /// Create from an existing fingerprint string (validates format).
    ///
    /// Only the canonical lowercase form is accepted; ids are case-sensitive.
    pub fn from_str_checked(s: &str) -> Result<Self, HashError> {
        if s.len() != FINGERPRINT_LEN {
            return Err(HashError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(HashError::InvalidHex);
        }
        Ok(Self(s.to_string()))
    }

    /// First 2 characters, used for directory sharding.
    pub fn prefix(&self) -> &str {
        &self.0[0..2]
    }

    /// Everything after the prefix, used as the file name.
    pub fn remainder(&self) -> &str {
        &self.0[2..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
