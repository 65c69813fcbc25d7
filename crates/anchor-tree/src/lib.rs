//! Anchor Tree: sparse Merkle tree and claim proofs
//!
//! - [`SparseMerkleTree`]: compact, copy-on-write tree keyed by claim `Hi`
//! - [`ProofOfClaim`]: inclusion proof with the [`assemble`]/[`verify`] pair
//! - [`ExclusionProof`]: non-existence proof, used for non-revocation
//! - [`ChainedProof`]: claim → identity root → relay root
//!
//! Proof verification is free-standing; it needs no tree.

pub mod chain;
pub mod exclusion;
pub mod node;
pub mod proof;
pub mod tree;

pub use chain::ChainedProof;
pub use exclusion::ExclusionProof;
pub use node::{leaf_hash, middle_hash, Leaf, Node};
pub use proof::{assemble, decode_path, encode_path, verify, ProofOfClaim};
pub use tree::{InsertOutcome, SparseMerkleTree};
