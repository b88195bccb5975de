//! Rebuilding a container from a sidecar and a set of bitmaps.
//!
//! The inverse of extraction: blobs go back to back right after the
//! table, the gap up to the declared capacity fills with padding, the
//! version trailer lands at the very end and the checksum is recomputed
//! over the finished body. Header fields come from the sidecar verbatim,
//! so a rebuild of an untouched extraction reproduces the input file
//! byte for byte.

use std::collections::BTreeMap;

use crate::checksum;
use crate::error::Pd3Error;
use crate::format::{ENTRY_WIDTH, HEADER_LEN, PAD_BYTE, TABLE_START, TRAILER_LEN};
use crate::manifest::Manifest;
use crate::table;

/// What to do when the content does not fit the declared capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Emit the oversized container anyway and report the overflow.
    /// Such a file fails verification against its own header.
    #[default]
    Report,
    /// Fail instead of emitting an oversized container.
    Enforce,
}

/// Capacity overrun detected during a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeOverflow {
    /// Bytes the emitted file occupies, trailer included.
    pub needed:   u64,
    /// Bytes the header says the file may occupy.
    pub capacity: u64,
}

/// A finished rebuild.
#[derive(Debug, Clone)]
pub struct Rebuilt {
    pub bytes:    Vec<u8>,
    pub overflow: Option<SizeOverflow>,
}

/// Assemble a container from `manifest` and the `blobs` keyed by bitmap
/// index.
///
/// The table spans the union of sidecar indices and supplied indices;
/// entries with no blob encode the empty sentinel. Supplying an index the
/// sidecar never listed grows the table.
pub fn rebuild(
    manifest: &Manifest,
    blobs: &BTreeMap<u32, Vec<u8>>,
    policy: OverflowPolicy,
) -> Result<Rebuilt, Pd3Error> {
    let mut header = manifest.to_header();
    let version = header.version().ok_or_else(|| Pd3Error::VersionPatternMismatch {
        found: header.version_name(),
    })?;

    let max_index = manifest
        .max_index()
        .into_iter()
        .chain(blobs.keys().next_back().copied())
        .max();
    let table_len = match max_index {
        Some(max) => (u64::from(max) + 2) * u64::from(ENTRY_WIDTH),
        None => u64::from(ENTRY_WIDTH),
    };

    // lay the blobs back to back right after the table
    let mut entries: BTreeMap<u32, Option<u32>> = BTreeMap::new();
    for &index in manifest.table.keys() {
        entries.insert(index, None);
    }
    let mut cursor = TABLE_START as u64 + table_len;
    for (&index, blob) in blobs {
        entries.insert(index, Some(cursor as u32));
        cursor += blob.len() as u64;
    }

    let mut body = table::encode(&entries, TABLE_START);
    for blob in blobs.values() {
        body.extend_from_slice(blob);
    }

    let capacity = header.total_size();
    let content_end = HEADER_LEN as u64 + body.len() as u64;
    let trailer = format!("{version:03}");
    let needed = content_end + trailer.len() as u64;
    let overflow = if content_end > capacity.saturating_sub(TRAILER_LEN as u64) {
        if policy == OverflowPolicy::Enforce {
            return Err(Pd3Error::SizeOverflow { needed, capacity });
        }
        Some(SizeOverflow { needed, capacity })
    } else {
        None
    };

    let padding = capacity
        .saturating_sub(content_end)
        .saturating_sub(trailer.len() as u64);
    body.extend(std::iter::repeat(PAD_BYTE).take(padding as usize));
    body.extend_from_slice(trailer.as_bytes());

    header.checksum = checksum::compute(&body, 0);
    let mut bytes = header.encode();
    bytes.extend_from_slice(&body);
    Ok(Rebuilt { bytes, overflow })
}
