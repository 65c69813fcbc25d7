//! Per-identity claim trees
//!
//! Each identity owns one sparse Merkle tree behind its own lock, so writers
//! to different identities never contend. The forest map is only
//! write-locked while a new identity's first insert is built.

use anchor_core::{Address, AnchorError, Claim, Hash, Result};
use anchor_tree::{InsertOutcome, ProofOfClaim, SparseMerkleTree};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// An identity's tree plus the claims whose leaves it holds
#[derive(Debug, Default)]
pub struct IdentityTree {
    tree: SparseMerkleTree,
    claims: HashMap<Hash, Claim>,
}

impl IdentityTree {
    /// Current root of the identity's tree
    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// An empty tree has never had a root published for it
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Underlying tree, for proofs against earlier roots
    pub fn tree(&self) -> &SparseMerkleTree {
        &self.tree
    }

    /// Latest claim stored at `hi`, if it was submitted with its bytes
    pub fn claim(&self, hi: &Hash) -> Option<&Claim> {
        self.claims.get(hi)
    }

    /// Inclusion proof under the current root
    pub fn prove(&self, hi: &Hash) -> Result<ProofOfClaim> {
        self.tree.prove(hi)
    }

    pub(crate) fn insert(&mut self, hi: Hash, hv: Hash) -> Result<InsertOutcome> {
        self.tree.insert(hi, hv)
    }

    pub(crate) fn record_claim(&mut self, claim: Claim) {
        self.claims.insert(claim.hi(), claim);
    }

    /// Drop stored bytes that no longer match the leaf at `hi`
    pub(crate) fn forget_claim(&mut self, hi: &Hash) {
        self.claims.remove(hi);
    }

    pub(crate) fn reset_root(&mut self, root: Hash) -> Result<()> {
        self.tree.reset_root(root)
    }
}

/// Shared handle to one identity's tree
pub type IdentityHandle = Arc<RwLock<IdentityTree>>;

/// All identity trees known to the relay
#[derive(Debug, Default)]
pub struct IdentityForest {
    trees: RwLock<HashMap<Address, IdentityHandle>>,
}

impl IdentityForest {
    /// Create an empty forest
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree for `identity`, if one exists
    pub fn get(&self, identity: &Address) -> Option<IdentityHandle> {
        self.trees.read().get(identity).cloned()
    }

    /// Run `f` on the identity's tree under its write lock.
    ///
    /// A new identity's tree is built privately and only added to the forest
    /// once `f` succeeds, so readers never see a tree whose first insert is
    /// in flight and a failed first insert leaves nothing behind.
    pub fn update<T>(
        &self,
        identity: &Address,
        f: impl FnOnce(&mut IdentityTree) -> Result<T>,
    ) -> Result<T> {
        if let Some(handle) = self.get(identity) {
            return f(&mut handle.write());
        }
        let mut trees = self.trees.write();
        if let Some(handle) = trees.get(identity).cloned() {
            drop(trees);
            return f(&mut handle.write());
        }
        let mut tree = IdentityTree::default();
        let out = f(&mut tree)?;
        trees.insert(*identity, Arc::new(RwLock::new(tree)));
        Ok(out)
    }

    /// Number of identities with a tree
    pub fn len(&self) -> usize {
        self.trees.read().len()
    }

    /// Whether no identity has a tree
    pub fn is_empty(&self) -> bool {
        self.trees.read().is_empty()
    }

    /// Identities with a tree
    pub fn identities(&self) -> Vec<Address> {
        self.trees.read().keys().copied().collect()
    }

    /// Inclusion proof for `hi` under the identity's current root
    pub fn prove_inclusion(&self, identity: &Address, hi: &Hash) -> Result<ProofOfClaim> {
        let handle = self
            .get(identity)
            .ok_or_else(|| AnchorError::claim_not_found(format!("no claims for {identity}")))?;
        let tree = handle.read();
        tree.prove(hi)
    }

    /// Current root of the identity's tree; the empty root if it has none
    pub fn sub_root(&self, identity: &Address) -> Hash {
        self.get(identity)
            .map(|handle| handle.read().root())
            .unwrap_or(Hash::EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_core::hash;
    use assert_matches::assert_matches;

    #[test]
    fn test_unknown_identity() {
        let forest = IdentityForest::new();
        assert_eq!(forest.sub_root(&Address([1; 20])), Hash::EMPTY);
        assert_matches!(
            forest.prove_inclusion(&Address([1; 20]), &hash(b"hi")),
            Err(AnchorError::ClaimNotFound { .. })
        );
    }

    #[test]
    fn test_update_reuses_existing_tree() {
        let forest = IdentityForest::new();
        let id = Address([1; 20]);
        forest
            .update(&id, |tree| tree.insert(hash(b"a"), hash(b"1")))
            .unwrap();
        let first = forest.get(&id).unwrap();
        forest
            .update(&id, |tree| tree.insert(hash(b"b"), hash(b"2")))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &forest.get(&id).unwrap()));
        assert_eq!(first.read().len(), 2);
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn test_trees_are_independent() {
        let forest = IdentityForest::new();
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);
        forest
            .update(&alice, |tree| tree.insert(hash(b"hi"), hash(b"hv")))
            .unwrap();
        assert_ne!(forest.sub_root(&alice), Hash::EMPTY);
        assert_eq!(forest.sub_root(&bob), Hash::EMPTY);
        forest.prove_inclusion(&alice, &hash(b"hi")).unwrap();
    }

    #[test]
    fn test_failed_first_update_leaves_no_tree() {
        let forest = IdentityForest::new();
        let id = Address([1; 20]);
        let out: Result<()> = forest.update(&id, |tree| {
            tree.insert(hash(b"hi"), hash(b"hv"))?;
            Err(AnchorError::internal("publish failed"))
        });
        assert!(out.is_err());
        assert!(forest.get(&id).is_none());
        assert!(forest.is_empty());
    }
}
