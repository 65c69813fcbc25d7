use super::codec::{BaseIndex, BASE_INDEX_LEN};
use super::tag::ClaimKind;
use super::ClaimBody;
use crate::hash::{Hash, HASH_LEN};
use crate::identifiers::{Address, ADDRESS_LEN};

/// Binds an identity to the current root of its claim tree.
///
/// The relay writes one of these into its own tree per identity. The index is
/// the identity address alone, so each new sub-root updates the same leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRootClaim {
    /// Shared header
    pub base: BaseIndex,
    /// Identity whose root is published
    pub identity: Address,
    /// Root of the identity's claim tree
    pub root: Hash,
}

impl SetRootClaim {
    /// Bytes covered by `Hi`: base index plus identity address
    pub const INDEX_LEN: usize = BASE_INDEX_LEN + ADDRESS_LEN;
    /// Encoded length
    pub const LEN: usize = Self::INDEX_LEN + HASH_LEN;

    /// Create a version-0 root binding
    pub fn new(namespace: Hash, identity: Address, root: Hash) -> Self {
        Self {
            base: BaseIndex::new(namespace, ClaimKind::SetRoot, Self::INDEX_LEN as u32, 0),
            identity,
            root,
        }
    }
}

impl ClaimBody for SetRootClaim {
    const KIND: ClaimKind = ClaimKind::SetRoot;

    fn base(&self) -> &BaseIndex {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseIndex {
        &mut self.base
    }

    fn encode_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.identity.as_bytes());
        out.extend_from_slice(self.root.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    #[test]
    fn test_root_update_keeps_index() {
        let ns = hash(b"iden3.io");
        let id = Address([9; ADDRESS_LEN]);
        let a = SetRootClaim::new(ns, id, hash(b"one"));
        let b = SetRootClaim::new(ns, id, hash(b"two"));
        assert_eq!(a.hi(), b.hi());
        assert_ne!(a.hv(), b.hv());
        assert_eq!(a.to_bytes().len(), SetRootClaim::LEN);
    }
}
