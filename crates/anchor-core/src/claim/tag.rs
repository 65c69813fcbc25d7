//! Claim type tags and the closed set of claim kinds

use crate::errors::{AnchorError, Result};
use crate::hash::{encode_hex, hash};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a type tag in bytes
pub const TYPE_TAG_LEN: usize = 24;

/// 24-byte discriminator naming a claim's semantic type.
///
/// A tag is the first 24 bytes of the hash of the type name. Tags compare by
/// exact byte equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimTypeTag(pub [u8; TYPE_TAG_LEN]);

impl ClaimTypeTag {
    /// Derive the tag for a type name
    pub fn from_type_name(name: &str) -> Self {
        let digest = hash(name.as_bytes());
        let mut tag = [0u8; TYPE_TAG_LEN];
        tag.copy_from_slice(&digest.0[..TYPE_TAG_LEN]);
        Self(tag)
    }

    /// Build from a slice that must be exactly 24 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; TYPE_TAG_LEN] = bytes.try_into().map_err(|_| {
            AnchorError::malformed_claim(format!(
                "type tag must be {TYPE_TAG_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8; TYPE_TAG_LEN] {
        &self.0
    }

    /// Resolve to a known claim kind
    pub fn kind(&self) -> Option<ClaimKind> {
        KIND_TAGS
            .iter()
            .find(|(_, tag)| tag == self)
            .map(|(kind, _)| *kind)
    }
}

impl fmt::Debug for ClaimTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimTypeTag({})", encode_hex(&self.0))
    }
}

/// Every claim type the relay understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimKind {
    /// Generic attributed claim
    Default,
    /// Binds a name hash to an identity
    AssignName,
    /// Authorizes a signing key for an application
    AuthorizeKSign,
    /// Binds an identity to its claim tree root
    SetRoot,
}

static KIND_TAGS: Lazy<[(ClaimKind, ClaimTypeTag); 4]> = Lazy::new(|| {
    ClaimKind::ALL.map(|kind| (kind, ClaimTypeTag::from_type_name(kind.type_name())))
});

impl ClaimKind {
    /// All kinds in declaration order
    pub const ALL: [ClaimKind; 4] = [
        ClaimKind::Default,
        ClaimKind::AssignName,
        ClaimKind::AuthorizeKSign,
        ClaimKind::SetRoot,
    ];

    /// Name hashed to produce the tag
    pub fn type_name(self) -> &'static str {
        match self {
            ClaimKind::Default => "default",
            ClaimKind::AssignName => "assignname",
            ClaimKind::AuthorizeKSign => "authorizeksign",
            ClaimKind::SetRoot => "setroot",
        }
    }

    /// The tag carried in the claim's base index
    pub fn tag(self) -> ClaimTypeTag {
        KIND_TAGS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, tag)| *tag)
            .unwrap_or_else(|| ClaimTypeTag::from_type_name(self.type_name()))
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_distinct() {
        for a in ClaimKind::ALL {
            for b in ClaimKind::ALL {
                assert_eq!(a == b, a.tag() == b.tag());
            }
        }
    }

    #[test]
    fn test_tag_resolves_back_to_kind() {
        for kind in ClaimKind::ALL {
            assert_eq!(kind.tag().kind(), Some(kind));
        }
        assert_eq!(ClaimTypeTag([0xff; TYPE_TAG_LEN]).kind(), None);
    }

    #[test]
    fn test_tag_is_hash_prefix() {
        let digest = hash(b"authorizeksign");
        assert_eq!(
            &ClaimKind::AuthorizeKSign.tag().0[..],
            &digest.0[..TYPE_TAG_LEN]
        );
    }
}
