//! Claim service: the relay's operations behind one handle

use crate::config::RelayConfig;
use crate::dispatch::{ClaimDispatcher, Dispatch};
use crate::ledger::LedgerRootClient;
use crate::registry::{CommitStatus, RootRegistry};
use crate::signer::SignatureVerifier;
use anchor_core::{decode_hex, Address, Claim, ClaimKind, Hash, Result, SetRootClaim};
use anchor_tree::{ChainedProof, ExclusionProof, ProofOfClaim};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Claim is in the identity's tree and the relay tree binds that tree's root
    Anchored(ClaimReceipt),
    /// Claim kind is accepted but not processed
    Ignored(ClaimKind),
}

/// A claim with its proof up to the live relay root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    /// Claim bytes, when the relay holds them
    pub claim: Option<Claim>,
    /// Claim leaf through the identity root to the relay root
    pub proof: ChainedProof,
}

impl ClaimReceipt {
    /// Proof of the claim within its identity tree
    pub fn proof_of_claim(&self) -> &ProofOfClaim {
        &self.proof.claim_proof
    }
}

/// An identity's root and its binding into the relay tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRootView {
    /// Relay root the proof ends at
    pub relay_root: Hash,
    /// Current root of the identity's tree
    pub identity_root: Hash,
    /// Relay-authored leaf binding the identity to its root
    #[serde(skip)]
    pub set_root_claim: SetRootClaim,
    /// `SetRoot` leaf up to `relay_root`
    pub proof: ProofOfClaim,
}

/// Live relay root next to the ledger's committed root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsView {
    /// Live relay root
    pub relay_root: Hash,
    /// Last committed root known; stale when `status` is unavailable
    pub committed_root: Option<Hash>,
    /// How `committed_root` relates to `relay_root`
    pub status: CommitStatus,
}

/// The relay's claim operations
#[derive(Debug)]
pub struct ClaimService {
    registry: RootRegistry,
    dispatcher: ClaimDispatcher,
    ledger: Arc<dyn LedgerRootClient>,
    contract: Address,
}

impl ClaimService {
    /// Service with an empty registry under `namespace`
    pub fn new(
        namespace: Hash,
        contract: Address,
        verifier: Arc<dyn SignatureVerifier>,
        ledger: Arc<dyn LedgerRootClient>,
    ) -> Self {
        Self {
            registry: RootRegistry::new(namespace),
            dispatcher: ClaimDispatcher::new(verifier),
            ledger,
            contract,
        }
    }

    /// Service using the configured namespace and contract
    pub fn from_config(
        config: &RelayConfig,
        verifier: Arc<dyn SignatureVerifier>,
        ledger: Arc<dyn LedgerRootClient>,
    ) -> Self {
        Self::new(
            config.namespace_hash(),
            config.ledger.root_commits_address,
            verifier,
            ledger,
        )
    }

    /// Trees and roots behind the service
    pub fn registry(&self) -> &RootRegistry {
        &self.registry
    }

    /// Validate, authorize and anchor `raw` in the identity's tree
    pub fn submit_claim(
        &self,
        identity: &Address,
        raw: &[u8],
        signature: Option<&str>,
    ) -> Result<SubmitOutcome> {
        let claim = match self.dispatcher.classify(identity, raw, signature) {
            Ok(Dispatch::Insert(claim)) => claim,
            Ok(Dispatch::Ignore(kind)) => {
                info!(identity = %identity, kind = %kind, "claim ignored");
                return Ok(SubmitOutcome::Ignored(kind));
            }
            Err(err) => {
                warn!(identity = %identity, error = %err, "claim rejected");
                return Err(err);
            }
        };

        self.registry.insert_claim(identity, &claim)?;
        let proof = self.registry.chained_proof(identity, &claim.hi())?;
        Ok(SubmitOutcome::Anchored(ClaimReceipt {
            claim: Some(claim),
            proof,
        }))
    }

    /// [`Self::submit_claim`] with hex-encoded claim bytes
    pub fn submit_claim_hex(
        &self,
        identity: &Address,
        value_hex: &str,
        signature: Option<&str>,
    ) -> Result<SubmitOutcome> {
        let raw = decode_hex(value_hex)?;
        self.submit_claim(identity, &raw, signature)
    }

    /// Claim at `hi` with its proof to the live relay root
    pub fn get_claim_by_index(&self, identity: &Address, hi: &Hash) -> Result<ClaimReceipt> {
        let proof = self.registry.chained_proof(identity, hi)?;
        Ok(ClaimReceipt {
            claim: self.registry.stored_claim(identity, hi),
            proof,
        })
    }

    /// Identity's root with its proof into the live relay root
    pub fn get_identity_root(&self, identity: &Address) -> Result<IdentityRootView> {
        let (identity_root, proof) = self.registry.identity_root(identity)?;
        Ok(IdentityRootView {
            relay_root: proof.root,
            identity_root,
            set_root_claim: SetRootClaim::new(self.registry.namespace(), *identity, identity_root),
            proof,
        })
    }

    /// Fetch the committed root and report it next to the live root.
    ///
    /// A ledger failure degrades the status instead of failing the call.
    pub async fn get_global_and_committed_root(&self) -> RootsView {
        if let Err(err) = self.refresh_committed_root().await {
            warn!(error = %err, "serving roots without a fresh committed root");
        }
        RootsView {
            relay_root: self.registry.global_root(),
            committed_root: self.registry.committed_root(),
            status: self.registry.commit_status(),
        }
    }

    /// Read the committed root from the ledger and remember it
    pub async fn refresh_committed_root(&self) -> Result<Hash> {
        match self.ledger.fetch_committed_root(&self.contract).await {
            Ok(root) => {
                self.registry.record_committed_root(root);
                Ok(root)
            }
            Err(err) => {
                self.registry.record_ledger_failure(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Proof of the claim at `hi` against the last committed root
    pub fn get_committed_claim_proof(&self, identity: &Address, hi: &Hash) -> Result<ChainedProof> {
        self.registry.committed_chained_proof(identity, hi)
    }

    /// Proof that the claim at `hi` has not been superseded
    pub fn get_non_revocation_proof(&self, identity: &Address, hi: &Hash) -> Result<ExclusionProof> {
        self.registry.non_revocation_proof(identity, hi)
    }
}
