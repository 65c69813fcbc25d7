//! Signature verification for authorization claims
//!
//! The relay never holds keys. It only asks a [`SignatureVerifier`] whether a
//! signature over the raw claim bytes came from the identity that owns the tree.

use anchor_core::{decode_hex, encode_hex, Address};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use std::fmt;
use tracing::debug;

/// Checks that `signature_hex` signs `message` on behalf of `expected_signer`
pub trait SignatureVerifier: Send + Sync + fmt::Debug {
    /// True only for a well-formed signature from the expected signer
    fn verify(&self, signature_hex: &str, message: &[u8], expected_signer: &Address) -> bool;
}

/// Length of an encoded public key followed by its signature
pub const SIGNATURE_BLOB_LEN: usize = 32 + 64;

/// Ed25519 verifier for signatures that carry their public key.
///
/// The blob is `public key (32) || signature (64)`. The signer's address is the
/// address derived from that public key, so a signature proves both possession
/// of the key and that the key belongs to the identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519AddressVerifier;

impl Ed25519AddressVerifier {
    /// Address an Ed25519 key signs as
    pub fn address_of(key: &VerifyingKey) -> Address {
        Address::from_public_key(key.as_bytes())
    }

    /// Produce the hex blob this verifier accepts
    pub fn sign(key: &SigningKey, message: &[u8]) -> String {
        let signature = key.sign(message);
        let mut blob = Vec::with_capacity(SIGNATURE_BLOB_LEN);
        blob.extend_from_slice(key.verifying_key().as_bytes());
        blob.extend_from_slice(&signature.to_bytes());
        encode_hex(&blob)
    }
}

impl SignatureVerifier for Ed25519AddressVerifier {
    fn verify(&self, signature_hex: &str, message: &[u8], expected_signer: &Address) -> bool {
        let blob = match decode_hex(signature_hex) {
            Ok(blob) => blob,
            Err(e) => {
                debug!(error = %e, "signature is not hex");
                return false;
            }
        };
        if blob.len() != SIGNATURE_BLOB_LEN {
            debug!(len = blob.len(), "signature blob has wrong length");
            return false;
        }

        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&blob[..32]);
        let mut sig_bytes = [0u8; 64];
        sig_bytes.copy_from_slice(&blob[32..]);

        let key = match VerifyingKey::from_bytes(&key_bytes) {
            Ok(key) => key,
            Err(e) => {
                debug!(error = %e, "signature carries an invalid public key");
                return false;
            }
        };
        if Self::address_of(&key) != *expected_signer {
            debug!(signer = %Self::address_of(&key), expected = %expected_signer, "signer mismatch");
            return false;
        }
        key.verify_strict(message, &Signature::from_bytes(&sig_bytes))
            .is_ok()
    }
}
