//! Claim classification
//!
//! Reads the type tag, parses the matching claim and applies per-kind policy
//! before anything touches a tree.

use crate::signer::SignatureVerifier;
use anchor_core::claim::{decode_type_tag, parse};
use anchor_core::{Address, AnchorError, Claim, ClaimKind, Result};
use std::sync::Arc;
use tracing::debug;

/// What to do with a submitted claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Parsed and authorized; insert into the identity's tree
    Insert(Claim),
    /// Recognized but not processed
    Ignore(ClaimKind),
}

/// Routes raw claim bytes by type tag
#[derive(Debug, Clone)]
pub struct ClaimDispatcher {
    verifier: Arc<dyn SignatureVerifier>,
}

impl ClaimDispatcher {
    /// Dispatcher checking key authorizations with `verifier`
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Decide how to handle `raw`, submitted on behalf of `identity`.
    ///
    /// Key authorizations must be signed by the identity. Relay-authored
    /// `SetRoot` claims are accepted but never inserted from outside.
    pub fn classify(
        &self,
        identity: &Address,
        raw: &[u8],
        signature: Option<&str>,
    ) -> Result<Dispatch> {
        let tag = decode_type_tag(raw)?;
        let kind = tag
            .kind()
            .ok_or_else(|| AnchorError::unknown_claim_type(tag.as_bytes()))?;
        debug!(identity = %identity, kind = %kind, len = raw.len(), "classifying claim");

        match kind {
            ClaimKind::Default | ClaimKind::AssignName => Ok(Dispatch::Insert(parse(tag, raw)?)),
            ClaimKind::AuthorizeKSign => {
                let claim = parse(tag, raw)?;
                let signature = signature
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| AnchorError::unauthorized("key authorization is not signed"))?;
                if !self.verifier.verify(signature, raw, identity) {
                    return Err(AnchorError::unauthorized(format!(
                        "signature does not match {identity}"
                    )));
                }
                Ok(Dispatch::Insert(claim))
            }
            ClaimKind::SetRoot => Ok(Dispatch::Ignore(kind)),
        }
    }
}
