use bytes::Bytes;

use crate::metadata::Metadata;
use crate::record::{MetadataEntry, MetadataPayload};

/// A structured payload together with the exact number of bytes it embeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadBuilder<T> {
    pub payload: T,
    pub size: u64,
    /// Set when a size ceiling caused content to be left out.
    pub truncated: bool,
}

/// Optional ceilings on embedded payload bytes.
///
/// Both are unset by default, in which case payloads are copied whole.
/// A ceiling is an explicit policy decision of the caller; there is no
/// built-in limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadLimits {
    pub max_metadata_bytes: Option<usize>,
    pub max_message_bytes: Option<usize>,
}

/// Copy every metadata entry, accounting `len(key) + len(value)` per entry.
pub fn metadata_to_structured(metadata: &Metadata) -> PayloadBuilder<MetadataPayload> {
    metadata_to_structured_limited(metadata, None)
}

/// Like [`metadata_to_structured`], but skips any entry that would push
/// the total past `max_bytes`. Later, smaller entries may still fit.
pub fn metadata_to_structured_limited(
    metadata: &Metadata,
    max_bytes: Option<usize>,
) -> PayloadBuilder<MetadataPayload> {
    let mut entries = Vec::with_capacity(metadata.len());
    let mut total: usize = 0;
    let mut truncated = false;

    for (key, value) in metadata.iter() {
        let after = total + key.len() + value.len();
        if max_bytes.is_some_and(|max| after > max) {
            truncated = true;
            continue;
        }
        entries.push(MetadataEntry {
            key: key.to_string(),
            value: value.clone(),
        });
        total = after;
    }

    PayloadBuilder {
        payload: MetadataPayload { entries },
        size: total as u64,
        truncated,
    }
}

/// Wrap a message unchanged; its size is its length.
pub fn message_to_structured(message: Bytes) -> PayloadBuilder<Bytes> {
    message_to_structured_limited(message, None)
}

/// Like [`message_to_structured`], but keeps at most `max_bytes` leading bytes.
pub fn message_to_structured_limited(
    message: Bytes,
    max_bytes: Option<usize>,
) -> PayloadBuilder<Bytes> {
    let (payload, truncated) = match max_bytes {
        Some(max) if message.len() > max => (message.slice(..max), true),
        _ => (message, false),
    };
    PayloadBuilder {
        size: payload.len() as u64,
        payload,
        truncated,
    }
}
