use super::codec::{BaseIndex, BASE_INDEX_LEN};
use super::tag::ClaimKind;
use super::ClaimBody;
use crate::hash::{Hash, HASH_LEN};
use crate::identifiers::{Address, ADDRESS_LEN};

/// Binds a name (by hash) to an identity address.
///
/// The name is the index, so one name maps to one identity per tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignNameClaim {
    /// Shared header
    pub base: BaseIndex,
    /// Hash of the assigned name
    pub name_hash: Hash,
    /// Identity receiving the name
    pub identity: Address,
}

impl AssignNameClaim {
    /// Bytes covered by `Hi`: base index plus name hash
    pub const INDEX_LEN: usize = BASE_INDEX_LEN + HASH_LEN;
    /// Encoded length
    pub const LEN: usize = Self::INDEX_LEN + ADDRESS_LEN;

    /// Create a version-0 name assignment
    pub fn new(namespace: Hash, name_hash: Hash, identity: Address) -> Self {
        Self {
            base: BaseIndex::new(
                namespace,
                ClaimKind::AssignName,
                Self::INDEX_LEN as u32,
                0,
            ),
            name_hash,
            identity,
        }
    }
}

impl ClaimBody for AssignNameClaim {
    const KIND: ClaimKind = ClaimKind::AssignName;

    fn base(&self) -> &BaseIndex {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseIndex {
        &mut self.base
    }

    fn encode_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.name_hash.as_bytes());
        out.extend_from_slice(self.identity.as_bytes());
    }
}
