//! Anchor Core: claim framing and shared primitives
//!
//! This crate holds everything the relay's tree and service layers agree on:
//!
//! - **Claims**: the fixed binary claim layout, its four variants and the
//!   `Hi`/`Hv` hashes each one derives
//! - **Hashing**: the single hash function and the 32-byte [`Hash`] value type
//! - **Identifiers**: 20-byte [`Address`] values for identities and contracts
//! - **Errors**: the unified [`AnchorError`] taxonomy
//!
//! Decoding is pure. Nothing here holds state.

pub mod claim;
pub mod errors;
pub mod hash;
pub mod identifiers;

pub use claim::{
    AssignNameClaim, AuthorizeKSignClaim, BaseIndex, Claim, ClaimBody, ClaimDefault, ClaimKind,
    ClaimTypeTag, SetRootClaim,
};
pub use errors::{AnchorError, Result};
pub use hash::{decode_hex, encode_hex, hash, hash_parts, Hash, HASH_BITS, HASH_LEN};
pub use identifiers::{Address, ADDRESS_LEN};
