//! Bitmap blob handling.
//!
//! Every payload in a container is a BMP file stored verbatim: `BM`, then
//! a little-endian `u32` with the total blob length, then the rest of the
//! image. The container format only depends on that 6-byte prefix; image
//! dimensions are read on a best-effort basis for listings and file names.

use crate::error::Pd3Error;
use crate::format::BITMAP_MAGIC;

/// What a probe learned about one blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfo {
    /// Blob length declared by the BMP size field, prefix included.
    pub declared_len: u32,
    pub width:        u32,
    pub height:       u32,
}

/// Inspects the bytes at a table address.
///
/// The chain walk and the extractor only rely on [`blob_len`]; probes add
/// whatever metadata a caller wants per blob. Swapping the probe changes
/// listing output, never container acceptance.
pub trait BitmapProbe {
    fn probe(&self, data: &[u8]) -> Result<BitmapInfo, Pd3Error>;
}

/// Probe reading dimensions straight from the DIB header.
#[derive(Debug, Clone, Copy, Default)]
pub struct DibProbe;

impl BitmapProbe for DibProbe {
    fn probe(&self, data: &[u8]) -> Result<BitmapInfo, Pd3Error> {
        let declared_len = blob_len(data)?;
        let (width, height) = dib_dimensions(data);
        Ok(BitmapInfo { declared_len, width, height })
    }
}

/// Declared length of the blob starting at `data[0]`.
///
/// Fails with [`Pd3Error::NotABitmap`] when the magic is absent, which the
/// chain walk treats as the end of the blob region.
pub fn blob_len(data: &[u8]) -> Result<u32, Pd3Error> {
    if !data.starts_with(BITMAP_MAGIC) {
        let mut found = [0u8; 2];
        let n = data.len().min(2);
        found[..n].copy_from_slice(&data[..n]);
        return Err(Pd3Error::NotABitmap { found });
    }
    match data.get(2..6) {
        Some(s) => Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]])),
        None => Err(Pd3Error::InsufficientSize {
            needed:    6,
            available: data.len() as u64,
        }),
    }
}

/// Width and height from the DIB header, `(0, 0)` when the blob is too
/// short or the header flavor is unknown.
fn dib_dimensions(data: &[u8]) -> (u32, u32) {
    match read_le_u32(data, 14) {
        // BITMAPCOREHEADER stores 16-bit dimensions
        Some(12) => {
            let width = read_le_u16(data, 18).unwrap_or(0);
            let height = read_le_u16(data, 20).unwrap_or(0);
            (u32::from(width), u32::from(height))
        }
        // BITMAPINFOHEADER and its extensions store signed 32-bit
        // dimensions; a negative height means top-down row order
        Some(size) if size >= 40 => {
            let width = read_le_u32(data, 18).unwrap_or(0) as i32;
            let height = read_le_u32(data, 22).unwrap_or(0) as i32;
            (width.unsigned_abs(), height.unsigned_abs())
        }
        _ => (0, 0),
    }
}

fn read_le_u16(data: &[u8], at: usize) -> Option<u16> {
    let s = data.get(at..at + 2)?;
    Some(u16::from_le_bytes([s[0], s[1]]))
}

fn read_le_u32(data: &[u8], at: usize) -> Option<u32> {
    let s = data.get(at..at + 4)?;
    Some(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_declared_length() {
        let blob = b"BM\x0a\x00\x00\x00zzzz";
        assert_eq!(blob_len(blob).unwrap(), 10);
    }

    #[test]
    fn rejects_missing_magic() {
        let err = blob_len(b"XYinvalid").unwrap_err();
        assert!(matches!(err, Pd3Error::NotABitmap { found: [b'X', b'Y'] }));
        assert!(matches!(blob_len(b""), Err(Pd3Error::NotABitmap { .. })));
    }

    #[test]
    fn rejects_short_prefix() {
        let err = blob_len(b"BM\x0a\x00").unwrap_err();
        assert!(matches!(
            err,
            Pd3Error::InsufficientSize { needed: 6, available: 4 }
        ));
    }

    #[test]
    fn probes_info_header_dimensions() {
        // 14-byte file header, then a BITMAPINFOHEADER with 64x48
        let mut blob = Vec::new();
        blob.extend_from_slice(b"BM");
        blob.extend_from_slice(&54u32.to_le_bytes());
        blob.extend_from_slice(&[0u8; 8]);
        blob.extend_from_slice(&40u32.to_le_bytes());
        blob.extend_from_slice(&64i32.to_le_bytes());
        blob.extend_from_slice(&(-48i32).to_le_bytes());
        blob.extend_from_slice(&[0u8; 16]);
        let info = DibProbe.probe(&blob).unwrap();
        assert_eq!(info.declared_len, 54);
        assert_eq!((info.width, info.height), (64, 48));
    }

    #[test]
    fn short_blob_probes_zero_dimensions() {
        let info = DibProbe.probe(b"BM\x08\x00\x00\x00xx").unwrap();
        assert_eq!((info.width, info.height), (0, 0));
    }
}
