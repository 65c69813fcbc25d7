//! Fixed binary claim layout
//!
//! Every claim starts with a 64-byte base index:
//!
//! ```text
//! 0        32                56             60        64
//! | ns hash | type tag (24)   | index length | version | payload...
//! ```
//!
//! Integers are big-endian. `index length` counts the leading bytes of the
//! whole claim that feed the index hash `Hi`.

use super::tag::{ClaimKind, ClaimTypeTag, TYPE_TAG_LEN};
use super::{AssignNameClaim, AuthorizeKSignClaim, Claim, ClaimDefault, SetRootClaim};
use crate::errors::{AnchorError, Result};
use crate::hash::{Hash, HASH_LEN};
use crate::identifiers::{Address, ADDRESS_LEN};

/// Offset of the type tag
pub const TYPE_TAG_OFFSET: usize = HASH_LEN;
/// Offset of the index length field
pub const INDEX_LENGTH_OFFSET: usize = TYPE_TAG_OFFSET + TYPE_TAG_LEN;
/// Offset of the version field
pub const VERSION_OFFSET: usize = INDEX_LENGTH_OFFSET + 4;
/// Length of the base index, and the minimum length of any claim
pub const BASE_INDEX_LEN: usize = VERSION_OFFSET + 4;
/// Upper bound on encoded claim size
pub const MAX_CLAIM_LEN: usize = 4096;

/// Header shared by every claim variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseIndex {
    /// Hash of the namespace the claim belongs to
    pub namespace: Hash,
    /// Type discriminator
    pub tag: ClaimTypeTag,
    /// Number of leading claim bytes covered by the index hash
    pub index_length: u32,
    /// Claim version; bumping it revokes the previous version
    pub version: u32,
}

impl BaseIndex {
    /// Create a base index for a known kind
    pub fn new(namespace: Hash, kind: ClaimKind, index_length: u32, version: u32) -> Self {
        Self {
            namespace,
            tag: kind.tag(),
            index_length,
            version,
        }
    }

    /// Append the 64-byte encoding
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.namespace.as_bytes());
        out.extend_from_slice(self.tag.as_bytes());
        out.extend_from_slice(&self.index_length.to_be_bytes());
        out.extend_from_slice(&self.version.to_be_bytes());
    }

    /// Read the base index from the front of a claim buffer
    fn decode(reader: &mut ClaimReader<'_>) -> Result<Self> {
        Ok(Self {
            namespace: Hash(reader.read_array::<HASH_LEN>("namespace")?),
            tag: ClaimTypeTag(reader.read_array::<TYPE_TAG_LEN>("type tag")?),
            index_length: reader.read_u32("index length")?,
            version: reader.read_u32("version")?,
        })
    }

    /// Require the index length a fixed-layout variant must carry
    fn expect_index_length(&self, kind: ClaimKind, expected: usize) -> Result<()> {
        if self.index_length as usize != expected {
            return Err(AnchorError::malformed_claim(format!(
                "{kind} claim index length must be {expected}, got {}",
                self.index_length
            )));
        }
        Ok(())
    }
}

/// Bounds-checked cursor over claim bytes
pub(crate) struct ClaimReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ClaimReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            AnchorError::malformed_claim(format!(
                "truncated {field}: need {N} bytes at offset {}, have {}",
                self.pos,
                self.bytes.len().saturating_sub(self.pos)
            ))
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub(crate) fn read_u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array::<4>(field)?))
    }

    pub(crate) fn read_u64(&mut self, field: &str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array::<8>(field)?))
    }

    pub(crate) fn read_hash(&mut self, field: &str) -> Result<Hash> {
        Ok(Hash(self.read_array::<HASH_LEN>(field)?))
    }

    pub(crate) fn read_address(&mut self, field: &str) -> Result<Address> {
        Ok(Address(self.read_array::<ADDRESS_LEN>(field)?))
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        rest
    }

    pub(crate) fn finish(&self, kind: ClaimKind) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(AnchorError::malformed_claim(format!(
                "{kind} claim has {} trailing bytes",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}

/// Extract the type tag from raw claim bytes.
///
/// Fails when the buffer cannot hold a full base index.
pub fn decode_type_tag(bytes: &[u8]) -> Result<ClaimTypeTag> {
    if bytes.len() < BASE_INDEX_LEN {
        return Err(AnchorError::malformed_claim(format!(
            "claim is {} bytes, minimum is {BASE_INDEX_LEN}",
            bytes.len()
        )));
    }
    ClaimTypeTag::from_slice(&bytes[TYPE_TAG_OFFSET..INDEX_LENGTH_OFFSET])
}

/// Decode `bytes` as the variant named by `tag`
pub fn parse(tag: ClaimTypeTag, bytes: &[u8]) -> Result<Claim> {
    let kind = tag
        .kind()
        .ok_or_else(|| AnchorError::unknown_claim_type(tag.as_bytes()))?;
    if bytes.len() > MAX_CLAIM_LEN {
        return Err(AnchorError::malformed_claim(format!(
            "claim is {} bytes, maximum is {MAX_CLAIM_LEN}",
            bytes.len()
        )));
    }

    let mut reader = ClaimReader::new(bytes);
    let base = BaseIndex::decode(&mut reader)?;
    if base.tag != tag {
        return Err(AnchorError::malformed_claim(
            "type tag does not match claim header",
        ));
    }

    let claim = match kind {
        ClaimKind::Default => {
            let data = reader.rest().to_vec();
            let index_length = base.index_length as usize;
            if index_length < BASE_INDEX_LEN || index_length > bytes.len() {
                return Err(AnchorError::malformed_claim(format!(
                    "default claim index length {index_length} outside [{BASE_INDEX_LEN}, {}]",
                    bytes.len()
                )));
            }
            Claim::Default(ClaimDefault { base, data })
        }
        ClaimKind::AssignName => {
            base.expect_index_length(kind, AssignNameClaim::INDEX_LEN)?;
            let name_hash = reader.read_hash("name hash")?;
            let identity = reader.read_address("identity address")?;
            Claim::AssignName(AssignNameClaim {
                base,
                name_hash,
                identity,
            })
        }
        ClaimKind::AuthorizeKSign => {
            base.expect_index_length(kind, AuthorizeKSignClaim::INDEX_LEN)?;
            let key_to_authorize = reader.read_address("key to authorize")?;
            let application_id = reader.read_hash("application id")?;
            let application_authz = reader.read_hash("application authz")?;
            let valid_from = reader.read_u64("valid from")?;
            let valid_until = reader.read_u64("valid until")?;
            if valid_until < valid_from {
                return Err(AnchorError::malformed_claim(format!(
                    "validity window ends ({valid_until}) before it starts ({valid_from})"
                )));
            }
            Claim::AuthorizeKSign(AuthorizeKSignClaim {
                base,
                key_to_authorize,
                application_id,
                application_authz,
                valid_from,
                valid_until,
            })
        }
        ClaimKind::SetRoot => {
            base.expect_index_length(kind, SetRootClaim::INDEX_LEN)?;
            let identity = reader.read_address("identity address")?;
            let root = reader.read_hash("root")?;
            Claim::SetRoot(SetRootClaim {
                base,
                identity,
                root,
            })
        }
    };
    reader.finish(kind)?;
    Ok(claim)
}

/// Extract the tag and decode in one step
pub fn decode(bytes: &[u8]) -> Result<Claim> {
    parse(decode_type_tag(bytes)?, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;
    use assert_matches::assert_matches;

    fn namespace() -> Hash {
        hash(b"iden3.io")
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let err = decode_type_tag(&[0u8; BASE_INDEX_LEN - 1]).unwrap_err();
        assert_matches!(err, AnchorError::MalformedClaim { .. });
    }

    #[test]
    fn test_tag_read_from_fixed_offset() {
        let claim = SetRootClaim::new(namespace(), Address([1; 20]), hash(b"r"));
        let bytes = Claim::SetRoot(claim).to_bytes();
        assert_eq!(decode_type_tag(&bytes).unwrap(), ClaimKind::SetRoot.tag());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut bytes = vec![0u8; BASE_INDEX_LEN];
        bytes[TYPE_TAG_OFFSET..INDEX_LENGTH_OFFSET].copy_from_slice(&[0xee; TYPE_TAG_LEN]);
        let err = decode(&bytes).unwrap_err();
        assert_matches!(err, AnchorError::UnknownClaimType { .. });
    }

    #[test]
    fn test_tag_mismatch_with_header_rejected() {
        let claim = SetRootClaim::new(namespace(), Address([1; 20]), hash(b"r"));
        let bytes = Claim::SetRoot(claim).to_bytes();
        let err = parse(ClaimKind::AssignName.tag(), &bytes).unwrap_err();
        assert_matches!(err, AnchorError::MalformedClaim { .. });
    }

    #[test]
    fn test_fixed_variants_reject_trailing_bytes() {
        let claim = AssignNameClaim::new(namespace(), hash(b"alice"), Address([2; 20]));
        let mut bytes = Claim::AssignName(claim).to_bytes();
        bytes.push(0);
        assert_matches!(decode(&bytes), Err(AnchorError::MalformedClaim { .. }));
    }

    #[test]
    fn test_fixed_variants_reject_truncation() {
        let claim = AssignNameClaim::new(namespace(), hash(b"alice"), Address([2; 20]));
        let bytes = Claim::AssignName(claim).to_bytes();
        assert_matches!(
            decode(&bytes[..bytes.len() - 1]),
            Err(AnchorError::MalformedClaim { .. })
        );
    }

    #[test]
    fn test_default_index_length_bounds() {
        let claim = ClaimDefault::new(namespace(), 0, b"idx".to_vec(), b"value".to_vec()).unwrap();
        let mut bytes = Claim::Default(claim).to_bytes();
        let too_long = (bytes.len() as u32 + 1).to_be_bytes();
        bytes[INDEX_LENGTH_OFFSET..VERSION_OFFSET].copy_from_slice(&too_long);
        assert_matches!(decode(&bytes), Err(AnchorError::MalformedClaim { .. }));

        bytes[INDEX_LENGTH_OFFSET..VERSION_OFFSET].copy_from_slice(&10u32.to_be_bytes());
        assert_matches!(decode(&bytes), Err(AnchorError::MalformedClaim { .. }));
    }

    #[test]
    fn test_oversized_claim_rejected() {
        let claim =
            ClaimDefault::new(namespace(), 0, Vec::new(), vec![0u8; MAX_CLAIM_LEN]).unwrap_err();
        assert_matches!(claim, AnchorError::MalformedClaim { .. });
    }

    #[test]
    fn test_inverted_validity_window_rejected() {
        let claim = AuthorizeKSignClaim::new(
            namespace(),
            Address([3; 20]),
            hash(b"app"),
            hash(b"authz"),
            10,
            20,
        );
        let mut bytes = Claim::AuthorizeKSign(claim).to_bytes();
        let len = bytes.len();
        bytes[len - 8..].copy_from_slice(&5u64.to_be_bytes());
        assert_matches!(decode(&bytes), Err(AnchorError::MalformedClaim { .. }));
    }
}
