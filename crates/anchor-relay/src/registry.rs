//! Root registry: identity trees bound into the relay tree
//!
//! Every change to an identity's root is published into the relay tree as a
//! [`SetRootClaim`]. Its `Hi` depends only on the namespace and identity, so
//! each new identity root updates the same relay leaf.
//!
//! Locking: an identity's tree lock is always taken before the relay lock.
//! Publishing happens while the identity lock is held, so the identity root
//! seen by a reader holding that lock is always the one published.

use crate::forest::{IdentityForest, IdentityHandle, IdentityTree};
use anchor_core::{Address, AnchorError, Claim, ClaimBody, Hash, Result, SetRootClaim};
use anchor_tree::{ChainedProof, ExclusionProof, InsertOutcome, ProofOfClaim, SparseMerkleTree};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How the ledger's committed root relates to the relay's live root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CommitStatus {
    /// Committed root equals the live relay root
    InSync,
    /// Committed root is an earlier relay root, `behind` updates ago
    Lagging {
        /// Relay updates published since the committed root was live
        behind: u64,
    },
    /// Committed root was never produced by this relay
    Unrecognized,
    /// The committed root could not be read
    Unavailable {
        /// Why the root could not be read
        reason: String,
    },
}

/// Relay tree plus the history needed to answer questions about old roots.
///
/// Every map only grows, like the tree's own node store: any root may become
/// the committed root, and resolving it needs its sequence number and the
/// `SetRoot` claims it bound.
#[derive(Debug, Default)]
struct RelayTree {
    tree: SparseMerkleTree,
    /// Number of published updates so far
    sequence: u64,
    /// Most recent sequence number at which each root was live
    root_sequence: HashMap<Hash, u64>,
    /// Published `SetRoot` claims by value hash
    set_roots: HashMap<Hash, SetRootClaim>,
}

impl RelayTree {
    fn new() -> Self {
        let mut relay = Self::default();
        relay.root_sequence.insert(relay.tree.root(), 0);
        relay
    }

    fn publish(&mut self, claim: SetRootClaim) -> Result<InsertOutcome> {
        let outcome = self.tree.insert(claim.hi(), claim.hv())?;
        if outcome != InsertOutcome::Unchanged {
            self.sequence += 1;
            self.root_sequence.insert(self.tree.root(), self.sequence);
        }
        self.set_roots.insert(claim.hv(), claim);
        Ok(outcome)
    }
}

#[derive(Debug, Default)]
struct CommittedState {
    root: Option<Hash>,
    failure: Option<String>,
}

/// Identity trees, the relay tree that binds them, and the last committed root
#[derive(Debug)]
pub struct RootRegistry {
    namespace: Hash,
    forest: IdentityForest,
    relay: RwLock<RelayTree>,
    committed: RwLock<CommittedState>,
}

impl RootRegistry {
    /// Empty registry authoring `SetRoot` claims under `namespace`
    pub fn new(namespace: Hash) -> Self {
        Self {
            namespace,
            forest: IdentityForest::new(),
            relay: RwLock::new(RelayTree::new()),
            committed: RwLock::new(CommittedState::default()),
        }
    }

    /// Namespace of relay-authored claims
    pub fn namespace(&self) -> Hash {
        self.namespace
    }

    /// Per-identity trees
    pub fn forest(&self) -> &IdentityForest {
        &self.forest
    }

    /// Insert a raw leaf into the identity's tree and republish its root
    pub fn insert(&self, identity: &Address, hi: Hash, hv: Hash) -> Result<InsertOutcome> {
        self.apply(identity, hi, hv, None)
    }

    /// Insert a claim's leaf and keep its bytes for later lookups
    pub fn insert_claim(&self, identity: &Address, claim: &Claim) -> Result<InsertOutcome> {
        self.apply(identity, claim.hi(), claim.hv(), Some(claim))
    }

    fn apply(
        &self,
        identity: &Address,
        hi: Hash,
        hv: Hash,
        claim: Option<&Claim>,
    ) -> Result<InsertOutcome> {
        let (outcome, root) = self.forest.update(identity, |identity_tree| {
            let before = identity_tree.root();
            let outcome = identity_tree.insert(hi, hv)?;
            if outcome != InsertOutcome::Unchanged {
                let set_root = SetRootClaim::new(self.namespace, *identity, identity_tree.root());
                let published = self.relay.write().publish(set_root);
                if let Err(err) = published {
                    warn!(identity = %identity, error = %err, "relay update failed, rolling back");
                    identity_tree.reset_root(before)?;
                    return Err(err);
                }
            }
            match claim {
                Some(claim) => identity_tree.record_claim(claim.clone()),
                None if outcome != InsertOutcome::Unchanged => identity_tree.forget_claim(&hi),
                None => {}
            }
            Ok((outcome, identity_tree.root()))
        })?;

        info!(
            identity = %identity,
            hi = %hi,
            root = %root,
            outcome = ?outcome,
            "claim anchored"
        );
        Ok(outcome)
    }

    /// Current root of the identity's tree
    pub fn sub_root(&self, identity: &Address) -> Hash {
        self.forest.sub_root(identity)
    }

    /// Inclusion proof within the identity's tree
    pub fn prove_inclusion(&self, identity: &Address, hi: &Hash) -> Result<ProofOfClaim> {
        self.forest.prove_inclusion(identity, hi)
    }

    /// Live relay root
    pub fn global_root(&self) -> Hash {
        self.relay.read().tree.root()
    }

    /// Number of updates published into the relay tree
    pub fn sequence(&self) -> u64 {
        self.relay.read().sequence
    }

    /// Identity's current root with its proof into the live relay root
    pub fn identity_root(&self, identity: &Address) -> Result<(Hash, ProofOfClaim)> {
        let handle = self.known(identity)?;
        let identity_tree = handle.read();
        Self::require_published(identity, &identity_tree)?;
        let root = identity_tree.root();
        let proof = self.prove_set_root(identity)?;
        Ok((root, proof))
    }

    /// Proof from the claim at `hi` through the identity root to the live relay root
    pub fn chained_proof(&self, identity: &Address, hi: &Hash) -> Result<ChainedProof> {
        let handle = self.known(identity)?;
        let identity_tree = handle.read();
        Self::require_published(identity, &identity_tree)?;
        let claim_proof = identity_tree.prove(hi)?;
        let set_root_claim = SetRootClaim::new(self.namespace, *identity, identity_tree.root());
        let set_root_proof = self.prove_set_root(identity)?;
        Ok(ChainedProof {
            claim_proof,
            set_root_claim,
            set_root_proof,
        })
    }

    /// Claim stored at `hi`, if one was inserted with its bytes
    pub fn stored_claim(&self, identity: &Address, hi: &Hash) -> Option<Claim> {
        let handle = self.forest.get(identity)?;
        let identity_tree = handle.read();
        identity_tree.claim(hi).cloned()
    }

    /// Proof that the claim at `hi` has no successor version
    pub fn non_revocation_proof(&self, identity: &Address, hi: &Hash) -> Result<ExclusionProof> {
        let handle = self.known(identity)?;
        let identity_tree = handle.read();
        let claim = identity_tree.claim(hi).ok_or_else(|| {
            AnchorError::claim_not_found(format!("no stored claim at {hi} for {identity}"))
        })?;
        let next_version = claim
            .version()
            .checked_add(1)
            .ok_or_else(|| AnchorError::invalid("claim is at the last version"))?;
        let next_hi = claim.with_version(next_version).hi();
        if identity_tree.tree().get(&next_hi)?.is_some() {
            return Err(AnchorError::invalid(format!(
                "claim at {hi} was revoked by version {next_version}"
            )));
        }
        identity_tree.tree().prove_exclusion(&next_hi)
    }

    /// Record a freshly fetched committed root
    pub fn record_committed_root(&self, root: Hash) {
        let mut committed = self.committed.write();
        if committed.root != Some(root) {
            debug!(root = %root, "committed root changed");
        }
        committed.root = Some(root);
        committed.failure = None;
    }

    /// Record that the committed root could not be fetched
    pub fn record_ledger_failure(&self, reason: impl Into<String>) {
        self.committed.write().failure = Some(reason.into());
    }

    /// Last committed root successfully fetched
    pub fn committed_root(&self) -> Option<Hash> {
        self.committed.read().root
    }

    /// Staleness of the last committed root against the live root
    pub fn commit_status(&self) -> CommitStatus {
        let (root, failure) = {
            let committed = self.committed.read();
            (committed.root, committed.failure.clone())
        };
        if let Some(reason) = failure {
            return CommitStatus::Unavailable { reason };
        }
        let Some(root) = root else {
            return CommitStatus::Unavailable {
                reason: "committed root not fetched yet".into(),
            };
        };
        let relay = self.relay.read();
        if root == relay.tree.root() {
            return CommitStatus::InSync;
        }
        match relay.root_sequence.get(&root) {
            Some(seq) => CommitStatus::Lagging {
                behind: relay.sequence - seq,
            },
            None => CommitStatus::Unrecognized,
        }
    }

    /// Proof of the claim at `hi` against the last committed relay root.
    ///
    /// Uses the identity root that was published when that root was committed,
    /// so it only succeeds for claims that were already anchored at the time.
    pub fn committed_chained_proof(&self, identity: &Address, hi: &Hash) -> Result<ChainedProof> {
        let committed = self
            .committed_root()
            .ok_or_else(|| AnchorError::ledger_unavailable("committed root not fetched yet"))?;
        let handle = self.known(identity)?;
        let identity_tree = handle.read();

        let relay = self.relay.read();
        if !relay.tree.contains_root(&committed) {
            return Err(AnchorError::claim_not_found(format!(
                "committed root {committed} was not produced by this relay"
            )));
        }
        let set_root_hi = SetRootClaim::new(self.namespace, *identity, Hash::EMPTY).hi();
        let hv = relay.tree.get_at(&committed, &set_root_hi)?.ok_or_else(|| {
            AnchorError::claim_not_found(format!("{identity} has no root under {committed}"))
        })?;
        let set_root_claim = relay
            .set_roots
            .get(&hv)
            .cloned()
            .ok_or_else(|| AnchorError::internal(format!("missing set-root claim for {hv}")))?;
        let set_root_proof = relay.tree.prove_at(&committed, &set_root_hi)?;
        drop(relay);

        let claim_proof = identity_tree.tree().prove_at(&set_root_claim.root, hi)?;
        Ok(ChainedProof {
            claim_proof,
            set_root_claim,
            set_root_proof,
        })
    }

    fn known(&self, identity: &Address) -> Result<IdentityHandle> {
        self.forest
            .get(identity)
            .ok_or_else(|| AnchorError::claim_not_found(format!("no claims for {identity}")))
    }

    /// An empty tree has no `SetRoot` leaf; it reads as an unknown identity
    fn require_published(identity: &Address, identity_tree: &IdentityTree) -> Result<()> {
        if identity_tree.is_empty() {
            return Err(AnchorError::claim_not_found(format!("no claims for {identity}")));
        }
        Ok(())
    }

    /// Proof of the identity's `SetRoot` leaf under the live relay root
    fn prove_set_root(&self, identity: &Address) -> Result<ProofOfClaim> {
        let set_root_hi = SetRootClaim::new(self.namespace, *identity, Hash::EMPTY).hi();
        let proof = self.relay.read().tree.prove(&set_root_hi);
        proof.map_err(|e| match e {
            AnchorError::ClaimNotFound { message } => {
                AnchorError::internal(format!("identity root not published: {message}"))
            }
            other => other,
        })
    }
}
