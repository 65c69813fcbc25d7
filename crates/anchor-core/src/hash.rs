//! Content hashing and the 32-byte `Hash` value type
//!
//! Every digest in the relay (claim indexes, claim values, tree nodes and roots)
//! comes from [`hash`]. The algorithm is SHA-256; changing it here changes it
//! everywhere.
//!
//! Hex renderings always carry a `0x` prefix. Parsing accepts input with or
//! without the prefix.

// The one place allowed to touch sha2 directly.
#![allow(clippy::disallowed_types, clippy::disallowed_methods)]

use crate::errors::{AnchorError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of every digest in bytes
pub const HASH_LEN: usize = 32;

/// Number of addressable bits in a hash, and so the maximum tree depth
pub const HASH_BITS: usize = HASH_LEN * 8;

/// Hash arbitrary bytes to a 32-byte digest
pub fn hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Hash(hasher.finalize().into())
}

/// Hash the concatenation of several byte slices without allocating
pub fn hash_parts(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}

/// Render bytes as `0x`-prefixed lowercase hex
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with an optional `0x` prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    Ok(hex::decode(digits)?)
}

/// A 32-byte digest: tree key, leaf payload, node hash or root
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    /// The all-zero hash; marks an empty subtree
    pub const EMPTY: Hash = Hash([0u8; HASH_LEN]);

    /// Build from a slice that must be exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            AnchorError::invalid(format!(
                "hash must be {HASH_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Parse from hex with an optional `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&decode_hex(s)?)
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// True for the empty-subtree marker
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// `0x`-prefixed hex rendering
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }

    /// Bit at `depth`, most significant bit of byte 0 first.
    ///
    /// `false` steers left, `true` steers right.
    pub fn bit(&self, depth: usize) -> bool {
        debug_assert!(depth < HASH_BITS);
        let byte = self.0[depth / 8];
        (byte >> (7 - (depth % 8))) & 1 == 1
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}

impl FromStr for Hash {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
