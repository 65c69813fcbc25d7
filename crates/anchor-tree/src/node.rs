//! Tree nodes and their hashes
//!
//! ```text
//! empty  = 0x00..00
//! leaf   = H(0x00 || hi || hv)
//! middle = H(0x01 || left || right)
//! ```
//!
//! The prefixes keep a leaf from ever hashing like a middle node.

use anchor_core::{hash_parts, Hash};
use serde::{Deserialize, Serialize};

const LEAF_PREFIX: &[u8] = &[0x00];
const MIDDLE_PREFIX: &[u8] = &[0x01];

/// A stored `(Hi, Hv)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Leaf {
    /// Index hash, the key
    pub hi: Hash,
    /// Value hash, the payload
    pub hv: Hash,
}

impl Leaf {
    /// Pair an index hash with a value hash
    pub fn new(hi: Hash, hv: Hash) -> Self {
        Self { hi, hv }
    }

    /// Node hash of this leaf
    pub fn node_hash(&self) -> Hash {
        leaf_hash(&self.hi, &self.hv)
    }
}

/// Non-empty node stored in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// Terminal node holding one claim
    Leaf(Leaf),
    /// Internal node; either child may be empty, never both
    Middle {
        /// Subtree whose next key bit is 0
        left: Hash,
        /// Subtree whose next key bit is 1
        right: Hash,
    },
}

impl Node {
    /// Hash under which the node is stored
    pub fn hash(&self) -> Hash {
        match self {
            Node::Leaf(leaf) => leaf.node_hash(),
            Node::Middle { left, right } => middle_hash(left, right),
        }
    }
}

/// Hash of a leaf node
pub fn leaf_hash(hi: &Hash, hv: &Hash) -> Hash {
    hash_parts(&[LEAF_PREFIX, hi.as_bytes(), hv.as_bytes()])
}

/// Hash of a middle node
pub fn middle_hash(left: &Hash, right: &Hash) -> Hash {
    hash_parts(&[MIDDLE_PREFIX, left.as_bytes(), right.as_bytes()])
}

/// Combine `current` with its sibling, placing `current` on the side given by `bit`
pub(crate) fn climb(current: &Hash, sibling: &Hash, bit: bool) -> Hash {
    if bit {
        middle_hash(sibling, current)
    } else {
        middle_hash(current, sibling)
    }
}
