//! Anchor Relay: claim submission and root anchoring
//!
//! Identities submit claims; the relay validates them, inserts them into the
//! identity's tree, and binds every identity root into a single relay tree.
//!
//! - [`ClaimService`]: the operations, behind one handle
//! - [`RootRegistry`]: identity trees plus the relay tree
//! - [`http::router`]: JSON routes over the service

pub mod config;
pub mod dispatch;
pub mod forest;
pub mod http;
pub mod ledger;
pub mod registry;
pub mod service;
pub mod signer;

pub use config::RelayConfig;
pub use dispatch::{ClaimDispatcher, Dispatch};
pub use forest::{IdentityForest, IdentityTree};
pub use ledger::{InMemoryLedger, LedgerError, LedgerRootClient};
pub use registry::{CommitStatus, RootRegistry};
pub use service::{ClaimReceipt, ClaimService, IdentityRootView, RootsView, SubmitOutcome};
pub use signer::{Ed25519AddressVerifier, SignatureVerifier};
