//! Non-existence proofs
//!
//! Walking toward an absent key ends either in an empty slot or in a leaf whose
//! key shares the walked prefix. The proof carries that terminal (as `aux`) and
//! the siblings above it; hashing up must land on the root.

use crate::node::Leaf;
use crate::proof::{compute_root, decode_path, encode_path};
use anchor_core::{decode_hex, encode_hex, AnchorError, Hash, Result};
use serde::{Deserialize, Serialize};

/// Proof that no leaf exists at `hi`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExclusionWire", into = "ExclusionWire")]
pub struct ExclusionProof {
    /// The absent key
    pub hi: Hash,
    /// Leaf occupying the slot the key would fall into, if any
    pub aux: Option<Leaf>,
    /// Sibling hashes ordered from the slot up to the root
    pub siblings: Vec<Hash>,
    /// Root the path leads to
    pub root: Hash,
}

impl ExclusionProof {
    /// Recompute the root and compare it to `expected_root`
    pub fn verify_against(&self, expected_root: &Hash) -> bool {
        let depth = self.siblings.len();
        let start = match &self.aux {
            None => Hash::EMPTY,
            Some(aux) => {
                if aux.hi == self.hi {
                    return false;
                }
                if (0..depth).any(|d| aux.hi.bit(d) != self.hi.bit(d)) {
                    return false;
                }
                aux.node_hash()
            }
        };
        compute_root(start, &self.hi, &self.siblings).is_some_and(|root| root == *expected_root)
    }

    /// Check the proof against the root it names
    pub fn verify(&self) -> bool {
        self.verify_against(&self.root)
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct ExclusionWire {
    hi: Hash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aux: Option<Leaf>,
    root: Hash,
    path: String,
}

impl From<ExclusionProof> for ExclusionWire {
    fn from(proof: ExclusionProof) -> Self {
        Self {
            path: encode_hex(&encode_path(&proof.siblings)),
            hi: proof.hi,
            aux: proof.aux,
            root: proof.root,
        }
    }
}

impl TryFrom<ExclusionWire> for ExclusionProof {
    type Error = AnchorError;

    fn try_from(wire: ExclusionWire) -> Result<Self> {
        Ok(Self {
            hi: wire.hi,
            aux: wire.aux,
            siblings: decode_path(&decode_hex(&wire.path)?)?,
            root: wire.root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_core::hash;

    #[test]
    fn test_empty_tree_excludes_everything() {
        let proof = ExclusionProof {
            hi: hash(b"anything"),
            aux: None,
            siblings: Vec::new(),
            root: Hash::EMPTY,
        };
        assert!(proof.verify());
    }

    #[test]
    fn test_aux_with_same_key_is_rejected() {
        let hi = hash(b"k");
        let aux = Leaf::new(hi, hash(b"v"));
        let proof = ExclusionProof {
            hi,
            aux: Some(aux),
            siblings: Vec::new(),
            root: aux.node_hash(),
        };
        assert!(!proof.verify());
    }
}
