//! Claim types
//!
//! A claim is a fixed binary record tagged with its type. Each variant derives
//! two hashes:
//!
//! - `Hi`, over the leading `index_length` bytes: the tree key. Two claims with
//!   the same `Hi` are the same logical claim.
//! - `Hv`, over the whole encoding: the leaf payload stored at `Hi`.
//!
//! The version lives inside the index bytes, so bumping it produces a new `Hi`.

pub mod codec;
pub mod tag;

mod assign_name;
mod authorize_ksign;
mod default;
mod set_root;

pub use assign_name::AssignNameClaim;
pub use authorize_ksign::AuthorizeKSignClaim;
pub use codec::{decode, decode_type_tag, parse, BaseIndex, BASE_INDEX_LEN, MAX_CLAIM_LEN};
pub use default::ClaimDefault;
pub use set_root::SetRootClaim;
pub use tag::{ClaimKind, ClaimTypeTag, TYPE_TAG_LEN};

use crate::hash::{encode_hex, hash, Hash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Shared behaviour of every claim variant
pub trait ClaimBody {
    /// Kind written into the base index
    const KIND: ClaimKind;

    /// Header shared by all variants
    fn base(&self) -> &BaseIndex;

    /// Mutable header, used to derive other versions of the claim
    fn base_mut(&mut self) -> &mut BaseIndex;

    /// Append everything after the base index
    fn encode_payload(&self, out: &mut Vec<u8>);

    /// Full binary encoding
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BASE_INDEX_LEN + 128);
        self.base().encode_into(&mut out);
        self.encode_payload(&mut out);
        out
    }

    /// Index hash: the tree key
    fn hi(&self) -> Hash {
        let bytes = self.to_bytes();
        let index_len = (self.base().index_length as usize).min(bytes.len());
        hash(&bytes[..index_len])
    }

    /// Value hash: the leaf payload
    fn hv(&self) -> Hash {
        hash(&self.to_bytes())
    }
}

/// Any decoded claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Generic attributed claim
    Default(ClaimDefault),
    /// Name to identity binding
    AssignName(AssignNameClaim),
    /// Signing key authorization
    AuthorizeKSign(AuthorizeKSignClaim),
    /// Identity root binding
    SetRoot(SetRootClaim),
}

macro_rules! with_body {
    ($claim:expr, $body:ident => $e:expr) => {
        match $claim {
            Claim::Default($body) => $e,
            Claim::AssignName($body) => $e,
            Claim::AuthorizeKSign($body) => $e,
            Claim::SetRoot($body) => $e,
        }
    };
}

impl Claim {
    /// The claim's kind
    pub fn kind(&self) -> ClaimKind {
        match self {
            Claim::Default(_) => ClaimDefault::KIND,
            Claim::AssignName(_) => AssignNameClaim::KIND,
            Claim::AuthorizeKSign(_) => AuthorizeKSignClaim::KIND,
            Claim::SetRoot(_) => SetRootClaim::KIND,
        }
    }

    /// Header shared by all variants
    pub fn base(&self) -> &BaseIndex {
        with_body!(self, body => body.base())
    }

    /// Claim version
    pub fn version(&self) -> u32 {
        self.base().version
    }

    /// Full binary encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        with_body!(self, body => body.to_bytes())
    }

    /// Index hash
    pub fn hi(&self) -> Hash {
        with_body!(self, body => body.hi())
    }

    /// Value hash
    pub fn hv(&self) -> Hash {
        with_body!(self, body => body.hv())
    }

    /// The same claim carrying a different version.
    ///
    /// The next version's `Hi` is what a non-revocation proof shows absent.
    pub fn with_version(&self, version: u32) -> Claim {
        let mut next = self.clone();
        with_body!(&mut next, body => body.base_mut().version = version);
        next
    }

    /// `0x`-prefixed hex of the encoding
    pub fn to_hex(&self) -> String {
        encode_hex(&self.to_bytes())
    }
}

impl From<ClaimDefault> for Claim {
    fn from(claim: ClaimDefault) -> Self {
        Claim::Default(claim)
    }
}

impl From<AssignNameClaim> for Claim {
    fn from(claim: AssignNameClaim) -> Self {
        Claim::AssignName(claim)
    }
}

impl From<AuthorizeKSignClaim> for Claim {
    fn from(claim: AuthorizeKSignClaim) -> Self {
        Claim::AuthorizeKSign(claim)
    }
}

impl From<SetRootClaim> for Claim {
    fn from(claim: SetRootClaim) -> Self {
        Claim::SetRoot(claim)
    }
}

impl Serialize for Claim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Claim {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = crate::hash::decode_hex(&s).map_err(serde::de::Error::custom)?;
        decode(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::Address;

    fn namespace() -> Hash {
        hash(b"iden3.io")
    }

    fn samples() -> Vec<Claim> {
        vec![
            ClaimDefault::new(namespace(), 0, b"email".to_vec(), b"a@b.c".to_vec())
                .unwrap()
                .into(),
            AssignNameClaim::new(namespace(), hash(b"alice"), Address([1; 20])).into(),
            AuthorizeKSignClaim::new(
                namespace(),
                Address([2; 20]),
                hash(b"app"),
                hash(b"authz"),
                0,
                u64::MAX,
            )
            .into(),
            SetRootClaim::new(namespace(), Address([3; 20]), hash(b"root")).into(),
        ]
    }

    #[test]
    fn test_decode_reproduces_every_variant() {
        for claim in samples() {
            let decoded = decode(&claim.to_bytes()).unwrap();
            assert_eq!(decoded, claim);
            assert_eq!(decoded.kind(), claim.kind());
        }
    }

    #[test]
    fn test_hi_covers_index_only() {
        let a = ClaimDefault::new(namespace(), 0, b"email".to_vec(), b"one".to_vec()).unwrap();
        let b = ClaimDefault::new(namespace(), 0, b"email".to_vec(), b"two".to_vec()).unwrap();
        assert_eq!(a.hi(), b.hi());
        assert_ne!(a.hv(), b.hv());
    }

    #[test]
    fn test_version_changes_hi() {
        for claim in samples() {
            let next = claim.with_version(claim.version() + 1);
            assert_ne!(next.hi(), claim.hi());
            assert_eq!(next.kind(), claim.kind());
        }
    }

    #[test]
    fn test_claim_serializes_as_hex() {
        let claim = samples().remove(1);
        let json = serde_json::to_string(&claim).unwrap();
        let back: Claim = serde_json::from_str(&json).unwrap();
        assert_eq!(back, claim);
    }
}
