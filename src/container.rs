//! Validated container handle.

use std::fs;
use std::path::Path;

use crate::error::Pd3Error;
use crate::format::TRAILER_LEN;
use crate::header::Header;
use crate::verify;

/// An in-memory container that already passed the full verification
/// pipeline. Everything downstream (listing, extraction) starts here, so
/// it never has to re-check structure.
pub struct Container {
    data:      Vec<u8>,
    header:    Header,
    entries:   Vec<(u32, Option<u32>)>,
    table_end: u32,
}

impl Container {
    /// Verify `data` for the given target device and take ownership.
    pub fn from_bytes(data: Vec<u8>, device: u8) -> Result<Self, Pd3Error> {
        let verified = verify::verify(&data, device)?;
        Ok(Container {
            header:    verified.header,
            entries:   verified.table.entries,
            table_end: verified.table.end_offset,
            data,
        })
    }

    pub fn from_file(path: impl AsRef<Path>, device: u8) -> Result<Self, Pd3Error> {
        let data = fs::read(path)?;
        Self::from_bytes(data, device)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Decoded table entries, one `(index, address)` pair per slot.
    pub fn entries(&self) -> &[(u32, Option<u32>)] {
        &self.entries
    }

    /// Where the table stopped and the first blob begins.
    pub fn table_end(&self) -> u32 {
        self.table_end
    }

    /// End of the blob region: everything before the version trailer.
    pub fn blob_region_end(&self) -> usize {
        self.data.len().saturating_sub(TRAILER_LEN)
    }

    /// Bytes from `addr` up to the end of the blob region, empty when the
    /// address falls outside it. Blob slicing is the caller's business;
    /// the trailer never leaks into a blob this way.
    pub fn tail_from(&self, addr: u32) -> &[u8] {
        self.data
            .get(addr as usize..self.blob_region_end())
            .unwrap_or(&[])
    }
}
