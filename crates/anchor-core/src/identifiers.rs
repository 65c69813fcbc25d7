//! Address identifiers for identities and ledger contracts

use crate::errors::{AnchorError, Result};
use crate::hash::{decode_hex, encode_hex, hash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// 20-byte account-style address.
///
/// Identifies an identity (the owner of one claim tree) or the ledger contract
/// that stores committed roots.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Build from a slice that must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            AnchorError::invalid(format!(
                "address must be {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Parse from hex with an optional `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_slice(&decode_hex(s)?)
    }

    /// Derive an address from public key bytes: the last 20 bytes of their hash
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = hash(public_key);
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest.0[32 - ADDRESS_LEN..]);
        Self(out)
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// `0x`-prefixed hex rendering
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = Address([7u8; ADDRESS_LEN]);
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!(Address::from_hex("0x0102").is_err());
        assert!(Address::from_hex(&format!("0x{}", "00".repeat(32))).is_err());
    }

    #[test]
    fn test_public_key_derivation_is_stable() {
        let a = Address::from_public_key(&[1u8; 32]);
        let b = Address::from_public_key(&[1u8; 32]);
        let c = Address::from_public_key(&[2u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
