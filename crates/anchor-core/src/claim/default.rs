use super::codec::{BaseIndex, BASE_INDEX_LEN, MAX_CLAIM_LEN};
use super::tag::ClaimKind;
use super::ClaimBody;
use crate::errors::{AnchorError, Result};
use crate::hash::Hash;

/// Generic attributed claim.
///
/// The payload is free-form; `index_length` decides how much of it belongs to
/// the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimDefault {
    /// Shared header
    pub base: BaseIndex,
    /// Index bytes followed by value bytes
    pub data: Vec<u8>,
}

impl ClaimDefault {
    /// Build a claim whose index covers `index_data` and whose value adds `value_data`
    pub fn new(
        namespace: Hash,
        version: u32,
        index_data: Vec<u8>,
        value_data: Vec<u8>,
    ) -> Result<Self> {
        let total = BASE_INDEX_LEN + index_data.len() + value_data.len();
        if total > MAX_CLAIM_LEN {
            return Err(AnchorError::malformed_claim(format!(
                "default claim would be {total} bytes, maximum is {MAX_CLAIM_LEN}"
            )));
        }
        let index_length = (BASE_INDEX_LEN + index_data.len()) as u32;
        let mut data = index_data;
        data.extend_from_slice(&value_data);
        Ok(Self {
            base: BaseIndex::new(namespace, ClaimKind::Default, index_length, version),
            data,
        })
    }

    /// Payload bytes that feed `Hi`
    pub fn index_data(&self) -> &[u8] {
        let split = (self.base.index_length as usize)
            .saturating_sub(BASE_INDEX_LEN)
            .min(self.data.len());
        &self.data[..split]
    }
}

impl ClaimBody for ClaimDefault {
    const KIND: ClaimKind = ClaimKind::Default;

    fn base(&self) -> &BaseIndex {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseIndex {
        &mut self.base
    }

    fn encode_payload(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data);
    }
}
