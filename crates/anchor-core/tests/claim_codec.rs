//! Claim codec behaviour on hostile and boundary inputs

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anchor_core::claim::{codec, decode, decode_type_tag, BASE_INDEX_LEN};
use anchor_core::{
    hash, Address, AnchorError, AuthorizeKSignClaim, Claim, ClaimDefault, ClaimKind, Hash,
};
use assert_matches::assert_matches;
use proptest::prelude::*;

fn namespace() -> Hash {
    hash(b"iden3.io")
}

/// Tag bytes sit right after the namespace, the way the relay reads them
#[test]
fn test_type_tag_slice_matches_kind() {
    let claim: Claim = AuthorizeKSignClaim::new(
        namespace(),
        Address([4; 20]),
        hash(b"app"),
        hash(b"authz"),
        1,
        2,
    )
    .into();
    let bytes = claim.to_bytes();
    assert_eq!(
        &bytes[codec::TYPE_TAG_OFFSET..codec::INDEX_LENGTH_OFFSET],
        &ClaimKind::AuthorizeKSign.tag().0[..]
    );
    assert_eq!(bytes.len(), AuthorizeKSignClaim::LEN);
}

#[test]
fn test_default_claim_with_empty_index_payload() {
    let claim = ClaimDefault::new(namespace(), 3, Vec::new(), b"v".to_vec()).unwrap();
    assert_eq!(claim.base.index_length as usize, BASE_INDEX_LEN);
    assert!(claim.index_data().is_empty());
    let decoded = decode(&Claim::from(claim.clone()).to_bytes()).unwrap();
    assert_eq!(decoded, Claim::Default(claim));
}

#[test]
fn test_empty_buffer_rejected() {
    assert_matches!(decode(&[]), Err(AnchorError::MalformedClaim { .. }));
}

proptest! {
    /// Decoding arbitrary bytes never panics and short buffers never pass
    #[test]
    fn decode_is_total(bytes in proptest::collection::vec(any::<u8>(), 0..400)) {
        let result = decode(&bytes);
        if bytes.len() < BASE_INDEX_LEN {
            let is_malformed = matches!(result, Err(AnchorError::MalformedClaim { .. }));
            prop_assert!(is_malformed);
        }
    }

    /// Random tags in an otherwise valid header are rejected as unknown
    #[test]
    fn random_tags_are_unknown(tag in proptest::array::uniform24(any::<u8>())) {
        prop_assume!(ClaimKind::ALL.iter().all(|k| k.tag().0 != tag));
        let mut bytes = vec![0u8; BASE_INDEX_LEN];
        bytes[codec::TYPE_TAG_OFFSET..codec::INDEX_LENGTH_OFFSET].copy_from_slice(&tag);
        prop_assert!(decode_type_tag(&bytes).is_ok());
        prop_assert!(
            matches!(decode(&bytes), Err(AnchorError::UnknownClaimType { .. })),
            "unknown tag must be rejected"
        );
    }

    /// Hi depends only on the index part of a default claim
    #[test]
    fn default_hi_ignores_value(
        index in proptest::collection::vec(any::<u8>(), 0..64),
        a in proptest::collection::vec(any::<u8>(), 0..64),
        b in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let ca = ClaimDefault::new(namespace(), 0, index.clone(), a.clone()).unwrap();
        let cb = ClaimDefault::new(namespace(), 0, index, b.clone()).unwrap();
        let (ca, cb) = (Claim::from(ca), Claim::from(cb));
        prop_assert_eq!(ca.hi(), cb.hi());
        prop_assert_eq!(ca.hv() == cb.hv(), a == b);
    }
}
