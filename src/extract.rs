//! Pulling bitmaps and metadata out of a verified container.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::bitmap::BitmapProbe;
use crate::container::Container;
use crate::error::Pd3Error;
use crate::manifest::{Manifest, SlotRecord};

/// Extraction result: the sidecar plus one optional blob per table entry.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub manifest: Manifest,
    /// `(index, blob)` in table order, `None` for empty slots.
    pub bitmaps:  Vec<(u32, Option<Vec<u8>>)>,
}

/// Read every table entry of `container`, probing each blob.
///
/// A declared length that runs past the blob region is clamped at the
/// region end, so the trailer never ends up inside an extracted bitmap.
/// Probe failures abort the whole extraction.
pub fn extract(container: &Container, probe: &impl BitmapProbe) -> Result<Extraction, Pd3Error> {
    let mut table = BTreeMap::new();
    let mut bitmaps = Vec::with_capacity(container.entries().len());

    for &(index, maybe_addr) in container.entries() {
        let Some(addr) = maybe_addr else {
            table.insert(index, SlotRecord { addr: None, size: None, content_hash: None });
            bitmaps.push((index, None));
            continue;
        };
        let tail = container.tail_from(addr);
        let info = probe.probe(tail)?;
        let end = (info.declared_len as usize).min(tail.len());
        let blob = tail[..end].to_vec();
        let hash: [u8; 32] = blake3::hash(&blob).into();
        table.insert(
            index,
            SlotRecord {
                addr:         Some(addr),
                size:         Some((info.width, info.height)),
                content_hash: Some(hex::encode(hash)),
            },
        );
        bitmaps.push((index, Some(blob)));
    }

    Ok(Extraction { manifest: Manifest::new(container.header(), table), bitmaps })
}

/// Extract into `dir`: one `NNNN-WxH.bmp` per present entry plus the
/// `header.json` sidecar. The directory is created when missing.
pub fn extract_to_dir(
    container: &Container,
    probe: &impl BitmapProbe,
    dir: &Path,
) -> Result<Extraction, Pd3Error> {
    let extraction = extract(container, probe)?;
    fs::create_dir_all(dir)?;
    for (index, blob) in &extraction.bitmaps {
        let Some(blob) = blob else { continue };
        let (width, height) = extraction
            .manifest
            .table
            .get(index)
            .and_then(|slot| slot.size)
            .unwrap_or((0, 0));
        fs::write(dir.join(bitmap_file_name(*index, width, height)), blob)?;
    }
    extraction.manifest.save(dir)?;
    Ok(extraction)
}

/// `NNNN-WxH.bmp`, the shape [`parse_bitmap_stem`] reads back.
pub fn bitmap_file_name(index: u32, width: u32, height: u32) -> String {
    format!("{index:04}-{width}x{height}.bmp")
}

/// Parse `NNNN-WxH` out of a bitmap file stem.
pub fn parse_bitmap_stem(stem: &str) -> Option<(u32, u32, u32)> {
    let (index, dimensions) = stem.split_once('-')?;
    let (width, height) = dimensions.split_once('x')?;
    Some((index.parse().ok()?, width.parse().ok()?, height.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        assert_eq!(bitmap_file_name(3, 64, 48), "0003-64x48.bmp");
        assert_eq!(parse_bitmap_stem("0003-64x48"), Some((3, 64, 48)));
        assert_eq!(parse_bitmap_stem("0012-0x0"), Some((12, 0, 0)));
        assert_eq!(parse_bitmap_stem("header"), None);
        assert_eq!(parse_bitmap_stem("12-64x48 (copy)"), None);
    }
}
