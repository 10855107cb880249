//! Record framing shared by the node-list cache and the completion journal
//!
//! Layout: a 4-byte magic identifying the artifact kind, then zero or more
//! records `[u32 little-endian length][UTF-8 node id]`. Records are
//! self-delimiting, so the journal can grow by pure appends.

use crate::domain::{BulkExportError, NodeId, Result};

/// Magic of a node-list cache file
pub const CACHE_MAGIC: [u8; 4] = *b"BXC1";

/// Magic of a completion journal file
pub const JOURNAL_MAGIC: [u8; 4] = *b"BXJ1";

/// Longest node id a record may carry
pub const MAX_RECORD_LEN: usize = 64 * 1024;

const LEN_PREFIX: usize = 4;

/// Encodes one node id as a framed record
pub fn encode_record(id: &NodeId) -> Result<Vec<u8>> {
    let bytes = id.as_str().as_bytes();
    if bytes.len() > MAX_RECORD_LEN {
        return Err(BulkExportError::State(format!(
            "Node id of {} bytes exceeds record limit of {MAX_RECORD_LEN}",
            bytes.len()
        )));
    }
    let mut out = Vec::with_capacity(LEN_PREFIX + bytes.len());
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Result of decoding a framed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Records read before the first malformed one
    pub ids: Vec<NodeId>,
    /// Byte offset just past the last good record (or the magic)
    pub valid_len: usize,
    /// False when decoding stopped at a short or malformed record
    pub clean: bool,
}

/// Decodes a framed file
///
/// A file shorter than the magic decodes as empty. A file whose magic differs
/// from `magic` is an error: it is not an artifact of the expected kind.
/// Decoding stops at the first short or malformed record.
pub fn decode_records(bytes: &[u8], magic: [u8; 4]) -> Result<Decoded> {
    if bytes.len() < magic.len() {
        return Ok(Decoded {
            ids: Vec::new(),
            valid_len: 0,
            clean: bytes.is_empty(),
        });
    }
    if bytes[..magic.len()] != magic {
        return Err(BulkExportError::State(format!(
            "Unexpected file header {:?}, expected {:?}",
            String::from_utf8_lossy(&bytes[..magic.len()]),
            String::from_utf8_lossy(&magic)
        )));
    }

    let mut ids = Vec::new();
    let mut offset = magic.len();
    let mut clean = true;

    while offset < bytes.len() {
        match decode_one(&bytes[offset..]) {
            Some((id, used)) => {
                ids.push(id);
                offset += used;
            }
            None => {
                clean = false;
                break;
            }
        }
    }

    Ok(Decoded {
        ids,
        valid_len: offset,
        clean,
    })
}

fn decode_one(buf: &[u8]) -> Option<(NodeId, usize)> {
    let prefix: [u8; LEN_PREFIX] = buf.get(..LEN_PREFIX)?.try_into().ok()?;
    let len = u32::from_le_bytes(prefix) as usize;
    if len > MAX_RECORD_LEN {
        return None;
    }
    let body = buf.get(LEN_PREFIX..LEN_PREFIX + len)?;
    let text = std::str::from_utf8(body).ok()?;
    let id = NodeId::new(text).ok()?;
    Some((id, LEN_PREFIX + len))
}
