//! Committed-root source
//!
//! The relay only reads the ledger. Publishing roots happens elsewhere; this
//! module fetches whatever was last committed for a contract.

use anchor_core::{AnchorError, Address, Hash};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Failure reading the committed root
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The ledger node could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// The contract call failed or returned garbage
    #[error("contract error: {0}")]
    Contract(String),
}

impl From<LedgerError> for AnchorError {
    fn from(err: LedgerError) -> Self {
        AnchorError::ledger_unavailable(err.to_string())
    }
}

/// Read-only access to the root-commits contract
#[async_trait]
pub trait LedgerRootClient: Send + Sync + fmt::Debug {
    /// Last root committed under `contract`
    async fn fetch_committed_root(&self, contract: &Address) -> Result<Hash, LedgerError>;
}

/// Ledger held in process memory.
///
/// A contract with no commit reads as the zero root, matching an unset
/// contract storage slot. Failures can be injected to exercise degraded mode.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    roots: RwLock<HashMap<Address, Hash>>,
    failure: RwLock<Option<LedgerError>>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `root` as committed under `contract`
    pub fn commit(&self, contract: Address, root: Hash) {
        self.roots.write().insert(contract, root);
    }

    /// Make every fetch fail with `failure` until cleared with `None`
    pub fn set_failure(&self, failure: Option<LedgerError>) {
        *self.failure.write() = failure;
    }
}

#[async_trait]
impl LedgerRootClient for InMemoryLedger {
    async fn fetch_committed_root(&self, contract: &Address) -> Result<Hash, LedgerError> {
        if let Some(failure) = self.failure.read().clone() {
            return Err(failure);
        }
        Ok(self
            .roots
            .read()
            .get(contract)
            .copied()
            .unwrap_or(Hash::EMPTY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_core::hash;

    #[tokio::test]
    async fn test_unset_contract_reads_zero() {
        let ledger = InMemoryLedger::new();
        let root = ledger.fetch_committed_root(&Address([1; 20])).await.unwrap();
        assert_eq!(root, Hash::EMPTY);
    }

    #[tokio::test]
    async fn test_commit_then_fetch() {
        let ledger = InMemoryLedger::new();
        let contract = Address([1; 20]);
        ledger.commit(contract, hash(b"root"));
        assert_eq!(
            ledger.fetch_committed_root(&contract).await.unwrap(),
            hash(b"root")
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let ledger = InMemoryLedger::new();
        ledger.set_failure(Some(LedgerError::Network("down".into())));
        let err = ledger
            .fetch_committed_root(&Address([1; 20]))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::Network("down".into()));
        assert!(matches!(
            AnchorError::from(err),
            AnchorError::LedgerUnavailable { .. }
        ));

        ledger.set_failure(None);
        assert!(ledger.fetch_committed_root(&Address([1; 20])).await.is_ok());
    }
}
