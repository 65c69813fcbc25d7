//! Inclusion proofs and the proof assembler
//!
//! A [`ProofOfClaim`] carries a leaf, the sibling hashes from that leaf up to a
//! root, and the root it claims to reach. The direction taken at depth `d` is
//! bit `d` of `Hi`, so the path needs no separate direction bits on the wire.
//!
//! Verification needs nothing but the proof and a trusted root.
//!
//! # Path encoding
//!
//! ```text
//! depth: u16 BE | bitmap: 32 bytes | non-empty siblings, 32 bytes each
//! ```
//!
//! Bit `i` of the bitmap (most significant bit of byte 0 first) is set when
//! sibling `i`, counted from the leaf, is non-empty.

use crate::node::{climb, Leaf};
use anchor_core::{decode_hex, encode_hex, AnchorError, Hash, Result, HASH_BITS, HASH_LEN};
use serde::{Deserialize, Serialize};

const BITMAP_LEN: usize = HASH_BITS / 8;
const PATH_HEADER_LEN: usize = 2 + BITMAP_LEN;

/// Leaf plus Merkle path to a named root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProofWire", into = "ProofWire")]
pub struct ProofOfClaim {
    /// Index hash of the proven leaf
    pub hi: Hash,
    /// Value hash of the proven leaf
    pub hv: Hash,
    /// Sibling hashes ordered from the leaf up to the root
    pub siblings: Vec<Hash>,
    /// Root the path leads to
    pub root: Hash,
}

impl ProofOfClaim {
    /// The proven leaf
    pub fn leaf(&self) -> Leaf {
        Leaf::new(self.hi, self.hv)
    }

    /// Depth of the leaf below the root
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Direction taken at each sibling, leaf first; `true` means the leaf side is right
    pub fn directions(&self) -> Vec<bool> {
        (0..self.depth()).rev().map(|d| self.hi.bit(d)).collect()
    }

    /// Recompute the root this proof leads to
    pub fn compute_root(&self) -> Option<Hash> {
        compute_root(self.leaf().node_hash(), &self.hi, &self.siblings)
    }

    /// Check the proof against the root it names
    pub fn verify(&self) -> bool {
        verify(self, &self.root)
    }

    /// Compressed sibling path
    pub fn path_bytes(&self) -> Vec<u8> {
        encode_path(&self.siblings)
    }

    /// Hex of the compressed sibling path
    pub fn path_hex(&self) -> String {
        encode_hex(&self.path_bytes())
    }
}

/// Package a leaf, its sibling path and the root into a proof
pub fn assemble(leaf: Leaf, path: Vec<Hash>, root: Hash) -> ProofOfClaim {
    ProofOfClaim {
        hi: leaf.hi,
        hv: leaf.hv,
        siblings: path,
        root,
    }
}

/// Recompute the root from the leaf and path and compare it to `expected_root`
pub fn verify(proof: &ProofOfClaim, expected_root: &Hash) -> bool {
    proof.compute_root().is_some_and(|root| root == *expected_root)
}

/// Hash `start` up through `siblings` (leaf first), steering by the bits of `key`
pub(crate) fn compute_root(start: Hash, key: &Hash, siblings: &[Hash]) -> Option<Hash> {
    if siblings.len() > HASH_BITS {
        return None;
    }
    let depth = siblings.len();
    let root = siblings
        .iter()
        .enumerate()
        .fold(start, |current, (i, sibling)| {
            climb(&current, sibling, key.bit(depth - 1 - i))
        });
    Some(root)
}

/// Compress a sibling path
pub fn encode_path(siblings: &[Hash]) -> Vec<u8> {
    let mut bitmap = [0u8; BITMAP_LEN];
    let mut body = Vec::new();
    for (i, sibling) in siblings.iter().enumerate() {
        if !sibling.is_empty() {
            bitmap[i / 8] |= 0x80 >> (i % 8);
            body.extend_from_slice(sibling.as_bytes());
        }
    }
    let mut out = Vec::with_capacity(PATH_HEADER_LEN + body.len());
    out.extend_from_slice(&(siblings.len() as u16).to_be_bytes());
    out.extend_from_slice(&bitmap);
    out.extend_from_slice(&body);
    out
}

/// Expand a compressed sibling path
pub fn decode_path(bytes: &[u8]) -> Result<Vec<Hash>> {
    if bytes.len() < PATH_HEADER_LEN {
        return Err(AnchorError::malformed_proof(format!(
            "path is {} bytes, header alone is {PATH_HEADER_LEN}",
            bytes.len()
        )));
    }
    let depth = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    if depth > HASH_BITS {
        return Err(AnchorError::malformed_proof(format!(
            "path depth {depth} exceeds {HASH_BITS}"
        )));
    }
    let bitmap = &bytes[2..PATH_HEADER_LEN];
    let mut body = bytes[PATH_HEADER_LEN..].chunks_exact(HASH_LEN);
    if !body.remainder().is_empty() {
        return Err(AnchorError::malformed_proof(
            "sibling bytes are not a multiple of 32",
        ));
    }

    let mut siblings = Vec::with_capacity(depth);
    for i in 0..depth {
        if bitmap[i / 8] & (0x80 >> (i % 8)) != 0 {
            let chunk = body
                .next()
                .ok_or_else(|| AnchorError::malformed_proof("bitmap names missing siblings"))?;
            siblings.push(Hash::from_slice(chunk)?);
        } else {
            siblings.push(Hash::EMPTY);
        }
    }
    if body.next().is_some() {
        return Err(AnchorError::malformed_proof("unreferenced trailing siblings"));
    }
    if bitmap_bits_beyond(bitmap, depth) {
        return Err(AnchorError::malformed_proof("bitmap marks bits past depth"));
    }
    Ok(siblings)
}

/// Length of the encoded path at the start of `bytes`
pub(crate) fn encoded_path_len(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < PATH_HEADER_LEN {
        return Err(AnchorError::malformed_proof("truncated path header"));
    }
    let present: u32 = bytes[2..PATH_HEADER_LEN].iter().map(|b| b.count_ones()).sum();
    let len = PATH_HEADER_LEN + present as usize * HASH_LEN;
    if bytes.len() < len {
        return Err(AnchorError::malformed_proof("truncated path siblings"));
    }
    Ok(len)
}

fn bitmap_bits_beyond(bitmap: &[u8], depth: usize) -> bool {
    (depth..HASH_BITS).any(|i| bitmap[i / 8] & (0x80 >> (i % 8)) != 0)
}

#[derive(Clone, Serialize, Deserialize)]
struct ProofWire {
    hi: Hash,
    hv: Hash,
    root: Hash,
    path: String,
}

impl From<ProofOfClaim> for ProofWire {
    fn from(proof: ProofOfClaim) -> Self {
        Self {
            path: proof.path_hex(),
            hi: proof.hi,
            hv: proof.hv,
            root: proof.root,
        }
    }
}

impl TryFrom<ProofWire> for ProofOfClaim {
    type Error = AnchorError;

    fn try_from(wire: ProofWire) -> Result<Self> {
        Ok(Self {
            hi: wire.hi,
            hv: wire.hv,
            siblings: decode_path(&decode_hex(&wire.path)?)?,
            root: wire.root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_core::hash;
    use assert_matches::assert_matches;

    #[test]
    fn test_single_leaf_proof() {
        let leaf = Leaf::new(hash(b"hi"), hash(b"hv"));
        let proof = assemble(leaf, Vec::new(), leaf.node_hash());
        assert!(proof.verify());
        assert!(!verify(&proof, &Hash::EMPTY));
    }

    #[test]
    fn test_path_encoding_skips_empty_siblings() {
        let siblings = vec![hash(b"a"), Hash::EMPTY, Hash::EMPTY, hash(b"b")];
        let bytes = encode_path(&siblings);
        assert_eq!(bytes.len(), PATH_HEADER_LEN + 2 * HASH_LEN);
        assert_eq!(decode_path(&bytes).unwrap(), siblings);
    }

    #[test]
    fn test_path_decoding_rejects_bad_input() {
        let siblings = vec![hash(b"a"), hash(b"b")];
        let bytes = encode_path(&siblings);

        assert_matches!(
            decode_path(&bytes[..bytes.len() - 1]),
            Err(AnchorError::MalformedProof { .. })
        );
        assert_matches!(
            decode_path(&bytes[..PATH_HEADER_LEN + HASH_LEN]),
            Err(AnchorError::MalformedProof { .. })
        );

        let mut extra = bytes.clone();
        extra.extend_from_slice(&[0u8; HASH_LEN]);
        assert_matches!(decode_path(&extra), Err(AnchorError::MalformedProof { .. }));

        let mut deep = bytes;
        deep[0..2].copy_from_slice(&300u16.to_be_bytes());
        assert_matches!(decode_path(&deep), Err(AnchorError::MalformedProof { .. }));
    }

    #[test]
    fn test_directions_follow_key_bits() {
        let mut key = [0u8; 32];
        key[0] = 0b1010_0000;
        let proof = assemble(
            Leaf::new(Hash(key), hash(b"v")),
            vec![Hash::EMPTY; 3],
            Hash::EMPTY,
        );
        // Leaf first: depth 2, 1, 0
        assert_eq!(proof.directions(), vec![true, false, true]);
    }

    #[test]
    fn test_json_carries_hex_path() {
        let leaf = Leaf::new(hash(b"hi"), hash(b"hv"));
        let proof = assemble(leaf, vec![hash(b"s"), Hash::EMPTY], hash(b"root"));
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["path"], proof.path_hex());
        let back: ProofOfClaim = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }
}
