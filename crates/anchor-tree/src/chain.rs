//! Leaf to relay-root proofs
//!
//! An identity's claims live in its own tree. The relay publishes that tree's
//! root into the relay tree as a `SetRoot` claim. Chaining the two inclusion
//! proofs lets a verifier go from one claim to the relay root with no other
//! input.
//!
//! # Compact encoding
//!
//! ```text
//! hi: 32 | hv: 32 | claim path | set-root len: u16 BE | set-root claim | set-root path
//! ```
//!
//! Paths use the [`encode_path`](crate::encode_path) layout. Both roots are
//! implied: the identity root is inside the set-root claim and the relay root
//! is recomputed from the set-root leaf and its path.

use crate::proof::{decode_path, encoded_path_len, verify, ProofOfClaim};
use anchor_core::{
    decode_hex, encode_hex, Address, AnchorError, Claim, ClaimBody, Hash, Result, SetRootClaim,
    HASH_LEN,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// End-to-end proof: claim → identity root → relay root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainedProof {
    /// Claim leaf up to the identity root
    pub claim_proof: ProofOfClaim,
    /// Relay-authored binding of the identity to its root
    #[serde(with = "set_root_hex")]
    pub set_root_claim: SetRootClaim,
    /// `SetRoot` leaf up to the relay root
    pub set_root_proof: ProofOfClaim,
}

impl ChainedProof {
    /// Identity whose claim is proven
    pub fn identity(&self) -> Address {
        self.set_root_claim.identity
    }

    /// Identity root the claim proof ends at
    pub fn identity_root(&self) -> Hash {
        self.set_root_claim.root
    }

    /// Relay root the chain ends at
    pub fn relay_root(&self) -> Hash {
        self.set_root_proof.root
    }

    /// Verify every link against a trusted relay root
    pub fn verify(&self, relay_root: &Hash) -> bool {
        verify(&self.claim_proof, &self.set_root_claim.root)
            && self.set_root_proof.hi == self.set_root_claim.hi()
            && self.set_root_proof.hv == self.set_root_claim.hv()
            && verify(&self.set_root_proof, relay_root)
    }

    /// Verify, additionally requiring the chain to belong to `identity`
    pub fn verify_for(&self, identity: &Address, relay_root: &Hash) -> bool {
        self.set_root_claim.identity == *identity && self.verify(relay_root)
    }

    /// Compact binary form
    pub fn to_bytes(&self) -> Vec<u8> {
        let set_root = self.set_root_claim.to_bytes();
        let mut out = Vec::new();
        out.extend_from_slice(self.claim_proof.hi.as_bytes());
        out.extend_from_slice(self.claim_proof.hv.as_bytes());
        out.extend_from_slice(&self.claim_proof.path_bytes());
        out.extend_from_slice(&(set_root.len() as u16).to_be_bytes());
        out.extend_from_slice(&set_root);
        out.extend_from_slice(&self.set_root_proof.path_bytes());
        out
    }

    /// Hex of [`Self::to_bytes`]
    pub fn to_hex(&self) -> String {
        encode_hex(&self.to_bytes())
    }

    /// Parse the compact binary form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut rest = bytes;
        let hi = Hash::from_slice(take(&mut rest, HASH_LEN)?)?;
        let hv = Hash::from_slice(take(&mut rest, HASH_LEN)?)?;
        let claim_path_len = encoded_path_len(rest)?;
        let claim_siblings = decode_path(take(&mut rest, claim_path_len)?)?;

        let len_bytes = take(&mut rest, 2)?;
        let set_root_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let set_root_claim = match anchor_core::claim::decode(take(&mut rest, set_root_len)?)? {
            Claim::SetRoot(claim) => claim,
            other => {
                return Err(AnchorError::malformed_proof(format!(
                    "expected a setroot claim, got {}",
                    other.kind()
                )))
            }
        };

        let set_root_path_len = encoded_path_len(rest)?;
        let set_root_siblings = decode_path(take(&mut rest, set_root_path_len)?)?;
        if !rest.is_empty() {
            return Err(AnchorError::malformed_proof("trailing bytes after proof"));
        }

        let claim_proof = ProofOfClaim {
            hi,
            hv,
            siblings: claim_siblings,
            root: set_root_claim.root,
        };
        let mut set_root_proof = ProofOfClaim {
            hi: set_root_claim.hi(),
            hv: set_root_claim.hv(),
            siblings: set_root_siblings,
            root: Hash::EMPTY,
        };
        set_root_proof.root = set_root_proof
            .compute_root()
            .ok_or_else(|| AnchorError::malformed_proof("set-root path is too deep"))?;

        Ok(Self {
            claim_proof,
            set_root_claim,
            set_root_proof,
        })
    }

    /// Parse the hex of the compact binary form
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(&decode_hex(s)?)
    }
}

fn take<'a>(rest: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if rest.len() < n {
        return Err(AnchorError::malformed_proof(format!(
            "proof truncated: need {n} bytes, have {}",
            rest.len()
        )));
    }
    let (head, tail) = rest.split_at(n);
    *rest = tail;
    Ok(head)
}

mod set_root_hex {
    use super::*;
    use std::result::Result;

    pub fn serialize<S: Serializer>(claim: &SetRootClaim, serializer: S) -> Result<S::Ok, S::Error> {
        Claim::SetRoot(claim.clone()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SetRootClaim, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_hex(&s).map_err(serde::de::Error::custom)?;
        match anchor_core::claim::decode(&bytes).map_err(serde::de::Error::custom)? {
            Claim::SetRoot(claim) => Ok(claim),
            other => Err(serde::de::Error::custom(format!(
                "expected a setroot claim, got {}",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SparseMerkleTree;
    use anchor_core::hash;

    fn chain() -> ChainedProof {
        let ns = hash(b"iden3.io");
        let id = Address([5; 20]);

        let mut identity_tree = SparseMerkleTree::new();
        identity_tree.insert(hash(b"hi"), hash(b"hv")).unwrap();
        let claim_proof = identity_tree.prove(&hash(b"hi")).unwrap();

        let set_root = SetRootClaim::new(ns, id, identity_tree.root());
        let mut relay_tree = SparseMerkleTree::new();
        relay_tree.insert(hash(b"other"), hash(b"x")).unwrap();
        relay_tree.insert(set_root.hi(), set_root.hv()).unwrap();
        let set_root_proof = relay_tree.prove(&set_root.hi()).unwrap();

        ChainedProof {
            claim_proof,
            set_root_claim: set_root,
            set_root_proof,
        }
    }

    #[test]
    fn test_chain_verifies_against_relay_root() {
        let proof = chain();
        let root = proof.relay_root();
        assert!(proof.verify(&root));
        assert!(proof.verify_for(&Address([5; 20]), &root));
        assert!(!proof.verify_for(&Address([6; 20]), &root));
        assert!(!proof.verify(&hash(b"wrong")));
    }

    #[test]
    fn test_swapped_identity_root_breaks_chain() {
        let mut proof = chain();
        let root = proof.relay_root();
        proof.set_root_claim.root = hash(b"forged");
        assert!(!proof.verify(&root));
    }

    #[test]
    fn test_compact_form_rebuilds_both_roots() {
        let proof = chain();
        let back = ChainedProof::from_hex(&proof.to_hex()).unwrap();
        assert_eq!(back, proof);
        assert!(back.verify_for(&Address([5; 20]), &proof.relay_root()));
    }

    #[test]
    fn test_compact_form_rejects_damage() {
        let bytes = chain().to_bytes();
        assert!(ChainedProof::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(ChainedProof::from_bytes(&trailing).is_err());

        assert!(ChainedProof::from_bytes(&bytes[..40]).is_err());
    }

    #[test]
    fn test_chain_survives_json() {
        let proof = chain();
        let json = serde_json::to_string(&proof).unwrap();
        let back: ChainedProof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }
}
