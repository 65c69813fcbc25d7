//! Property tests for the sparse Merkle tree

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anchor_core::Hash;
use anchor_tree::{verify, InsertOutcome, SparseMerkleTree};
use proptest::collection::btree_map;
use proptest::prelude::*;

fn arb_hash() -> impl Strategy<Value = Hash> {
    proptest::array::uniform32(any::<u8>()).prop_map(Hash)
}

fn build(entries: &[(Hash, Hash)]) -> SparseMerkleTree {
    let mut tree = SparseMerkleTree::new();
    for (hi, hv) in entries {
        tree.insert(*hi, *hv).unwrap();
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every inserted leaf proves against the current root
    #[test]
    fn inserted_leaves_verify(entries in btree_map(arb_hash(), arb_hash(), 1..40)) {
        let entries: Vec<_> = entries.into_iter().collect();
        let tree = build(&entries);
        prop_assert_eq!(tree.len(), entries.len());
        for (hi, hv) in &entries {
            let proof = tree.prove(hi).unwrap();
            prop_assert_eq!(proof.hv, *hv);
            prop_assert!(verify(&proof, &tree.root()));
        }
    }

    /// The root depends on the contents, not the insertion order
    #[test]
    fn root_is_order_independent(entries in btree_map(arb_hash(), arb_hash(), 1..30)) {
        let forward: Vec<_> = entries.into_iter().collect();
        let mut backward = forward.clone();
        backward.reverse();
        prop_assert_eq!(build(&forward).root(), build(&backward).root());
    }

    /// Re-inserting an unchanged pair is a no-op
    #[test]
    fn reinsert_is_idempotent(entries in btree_map(arb_hash(), arb_hash(), 1..20)) {
        let entries: Vec<_> = entries.into_iter().collect();
        let mut tree = build(&entries);
        let root = tree.root();
        for (hi, hv) in &entries {
            prop_assert_eq!(tree.insert(*hi, *hv).unwrap(), InsertOutcome::Unchanged);
        }
        prop_assert_eq!(tree.root(), root);
    }

    /// A new value at an existing key replaces the leaf and moves the root
    #[test]
    fn update_replaces_value(
        entries in btree_map(arb_hash(), arb_hash(), 1..20),
        replacement in arb_hash(),
    ) {
        let entries: Vec<_> = entries.into_iter().collect();
        let (hi, hv) = entries[0];
        prop_assume!(hv != replacement);
        let mut tree = build(&entries);
        let root = tree.root();
        prop_assert_eq!(tree.insert(hi, replacement).unwrap(), InsertOutcome::Updated);
        prop_assert_ne!(tree.root(), root);
        prop_assert_eq!(tree.len(), entries.len());
        prop_assert_eq!(tree.get(&hi).unwrap(), Some(replacement));
    }

    /// Absent keys get verifiable exclusion proofs
    #[test]
    fn absent_keys_are_excluded(
        entries in btree_map(arb_hash(), arb_hash(), 0..20),
        absent in arb_hash(),
    ) {
        prop_assume!(!entries.contains_key(&absent));
        let entries: Vec<_> = entries.into_iter().collect();
        let tree = build(&entries);
        let proof = tree.prove_exclusion(&absent).unwrap();
        prop_assert!(proof.verify_against(&tree.root()));
    }

    /// Tampering with any sibling breaks verification
    #[test]
    fn tampered_paths_fail(
        entries in btree_map(arb_hash(), arb_hash(), 2..20),
        noise in arb_hash(),
    ) {
        let entries: Vec<_> = entries.into_iter().collect();
        let tree = build(&entries);
        let mut proof = tree.prove(&entries[0].0).unwrap();
        prop_assume!(!proof.siblings.is_empty());
        prop_assume!(proof.siblings[0] != noise);
        proof.siblings[0] = noise;
        prop_assert!(!verify(&proof, &tree.root()));
    }
}
