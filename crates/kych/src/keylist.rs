//! The per-item key list: 20-byte tag -> unwrapped 24-byte content key.
//!
//! Built in one pass over the symmetric-key table before any password table
//! is visited; SSGP decryption resolves its key by tag lookup. The ordering
//! is a correctness requirement, not an optimisation.

use std::collections::HashMap;

use kych_crypto::{ContentKey, WrappingKey, unwrap_item_key};
use kych_format::{Image, Table, key_blob};
use kych_types::KeyTag;

/// Content keys unwrapped from the symmetric-key table, keyed by tag.
#[derive(Debug, Default)]
pub struct KeyList {
    keys: HashMap<KeyTag, ContentKey>,
}

impl KeyList {
    /// Walks a symmetric-key table and unwraps every well-formed blob.
    /// Records that fail their structural checks or do not decrypt under
    /// `wrapping` are skipped.
    pub(crate) fn build(image: &Image, table: &Table, wrapping: &WrappingKey) -> Self {
        let table_offset = (table.base - kych_format::layout::header::SIZE) as u32;
        let mut keys = HashMap::with_capacity(table.record_offsets.len());
        for &record_offset in &table.record_offsets {
            let Some(raw) = key_blob(image, table_offset, record_offset) else {
                tracing::warn!(record_offset, "skipping malformed symmetric-key record");
                continue;
            };
            let Some(content) = unwrap_item_key(wrapping, &raw.iv, &raw.ciphertext) else {
                tracing::warn!(
                    record_offset,
                    tag = %raw.tag,
                    "symmetric-key blob did not unwrap"
                );
                continue;
            };
            keys.insert(raw.tag, content);
        }
        tracing::debug!(count = keys.len(), "key list built");
        Self { keys }
    }

    /// Looks up the content key for an SSGP payload tag.
    pub fn get(&self, tag: &KeyTag) -> Option<&ContentKey> {
        self.keys.get(tag)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
