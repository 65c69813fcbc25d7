//! Unified error system for Anchor
//!
//! Every rejection the relay can produce is a variant here. Rejections are
//! terminal for the request that caused them and never leave partial state.

use serde::{Deserialize, Serialize};

/// Unified error type for all Anchor operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AnchorError {
    /// Claim bytes have the wrong length or an invalid field encoding
    #[error("Malformed claim: {message}")]
    MalformedClaim {
        /// Which field or length check failed
        message: String,
    },

    /// The 24-byte type tag does not name a known claim type
    #[error("Unknown claim type: {tag}")]
    UnknownClaimType {
        /// Hex rendering of the offending tag
        tag: String,
    },

    /// Signature check failed or was missing for a claim that requires one
    #[error("Unauthorized claim: {message}")]
    UnauthorizedClaim {
        /// Reason the authorization was refused
        message: String,
    },

    /// No leaf exists at the requested index
    #[error("Claim not found: {message}")]
    ClaimNotFound {
        /// What was looked up
        message: String,
    },

    /// Structural tree fault; indicates an integrity violation
    #[error("Tree insert error: {message}")]
    TreeInsert {
        /// Description of the fault
        message: String,
    },

    /// The committed root could not be read from the ledger
    #[error("Ledger unavailable: {message}")]
    LedgerUnavailable {
        /// Underlying ledger failure
        message: String,
    },

    /// Proof bytes could not be decoded
    #[error("Malformed proof: {message}")]
    MalformedProof {
        /// Which part of the proof encoding failed
        message: String,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl AnchorError {
    /// Create a malformed claim error
    pub fn malformed_claim(message: impl Into<String>) -> Self {
        Self::MalformedClaim {
            message: message.into(),
        }
    }

    /// Create an unknown claim type error from the raw tag bytes
    pub fn unknown_claim_type(tag: &[u8]) -> Self {
        Self::UnknownClaimType {
            tag: crate::hash::encode_hex(tag),
        }
    }

    /// Create an unauthorized claim error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::UnauthorizedClaim {
            message: message.into(),
        }
    }

    /// Create a claim not found error
    pub fn claim_not_found(message: impl Into<String>) -> Self {
        Self::ClaimNotFound {
            message: message.into(),
        }
    }

    /// Create a tree insert error
    pub fn tree_insert(message: impl Into<String>) -> Self {
        Self::TreeInsert {
            message: message.into(),
        }
    }

    /// Create a ledger unavailable error
    pub fn ledger_unavailable(message: impl Into<String>) -> Self {
        Self::LedgerUnavailable {
            message: message.into(),
        }
    }

    /// Create a malformed proof error
    pub fn malformed_proof(message: impl Into<String>) -> Self {
        Self::MalformedProof {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's input rather than relay state
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedClaim { .. }
                | Self::UnknownClaimType { .. }
                | Self::UnauthorizedClaim { .. }
                | Self::MalformedProof { .. }
                | Self::Invalid { .. }
        )
    }
}

/// Standard Result type for Anchor operations
pub type Result<T> = std::result::Result<T, AnchorError>;

impl From<hex::FromHexError> for AnchorError {
    fn from(err: hex::FromHexError) -> Self {
        Self::invalid(format!("hex decoding failed: {err}"))
    }
}

impl From<std::io::Error> for AnchorError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnchorError::malformed_claim("too short");
        assert_eq!(err.to_string(), "Malformed claim: too short");
    }

    #[test]
    fn test_unknown_type_renders_hex() {
        let err = AnchorError::unknown_claim_type(&[0xab, 0xcd]);
        assert_eq!(err.to_string(), "Unknown claim type: 0xabcd");
    }

    #[test]
    fn test_rejection_classification() {
        assert!(AnchorError::unauthorized("bad sig").is_rejection());
        assert!(!AnchorError::claim_not_found("hi").is_rejection());
        assert!(!AnchorError::tree_insert("depth").is_rejection());
    }
}
