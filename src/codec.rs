//! JSON text encoding of work items for the queue.

use crate::error::{Error, Result};
use crate::model::WorkItem;

/// Serialize a work item to the queue's text payload.
pub fn encode(item: &WorkItem) -> Result<String> {
    serde_json::to_string(item).map_err(Error::Encode)
}

/// Parse a queue payload back into a work item.
///
/// Malformed JSON, missing or mistyped fields, and values that break a
/// work item invariant all come back as [`Error::Decode`].
pub fn decode(text: &str) -> Result<WorkItem> {
    decode_bytes(text.as_bytes())
}

/// Parse a raw queue payload. Bytes that are not UTF-8 are a decode error.
pub fn decode_bytes(raw: &[u8]) -> Result<WorkItem> {
    let item: WorkItem = serde_json::from_slice(raw).map_err(|e| Error::decode(e.to_string()))?;
    item.validate().map_err(Error::decode)?;
    Ok(item)
}
