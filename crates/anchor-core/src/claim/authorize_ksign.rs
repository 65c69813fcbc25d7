use super::codec::{BaseIndex, BASE_INDEX_LEN};
use super::tag::ClaimKind;
use super::ClaimBody;
use crate::hash::{Hash, HASH_LEN};
use crate::identifiers::{Address, ADDRESS_LEN};

/// Authorizes a signing key to act for an application within a time window.
///
/// The relay only accepts this claim with a valid signature from the identity
/// that owns the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeKSignClaim {
    /// Shared header
    pub base: BaseIndex,
    /// Address of the key being authorized
    pub key_to_authorize: Address,
    /// Application the authorization applies to
    pub application_id: Hash,
    /// Application-specific authorization scope
    pub application_authz: Hash,
    /// Start of validity, unix seconds
    pub valid_from: u64,
    /// End of validity, unix seconds
    pub valid_until: u64,
}

impl AuthorizeKSignClaim {
    /// Bytes covered by `Hi`: base, key, application id and authz
    pub const INDEX_LEN: usize = BASE_INDEX_LEN + ADDRESS_LEN + 2 * HASH_LEN;
    /// Encoded length
    pub const LEN: usize = Self::INDEX_LEN + 16;

    /// Create a version-0 key authorization
    pub fn new(
        namespace: Hash,
        key_to_authorize: Address,
        application_id: Hash,
        application_authz: Hash,
        valid_from: u64,
        valid_until: u64,
    ) -> Self {
        Self {
            base: BaseIndex::new(
                namespace,
                ClaimKind::AuthorizeKSign,
                Self::INDEX_LEN as u32,
                0,
            ),
            key_to_authorize,
            application_id,
            application_authz,
            valid_from,
            valid_until,
        }
    }

    /// Whether `timestamp` falls inside the validity window
    pub fn is_valid_at(&self, timestamp: u64) -> bool {
        (self.valid_from..=self.valid_until).contains(&timestamp)
    }
}

impl ClaimBody for AuthorizeKSignClaim {
    const KIND: ClaimKind = ClaimKind::AuthorizeKSign;

    fn base(&self) -> &BaseIndex {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseIndex {
        &mut self.base
    }

    fn encode_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.key_to_authorize.as_bytes());
        out.extend_from_slice(self.application_id.as_bytes());
        out.extend_from_slice(self.application_authz.as_bytes());
        out.extend_from_slice(&self.valid_from.to_be_bytes());
        out.extend_from_slice(&self.valid_until.to_be_bytes());
    }
}
