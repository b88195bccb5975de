//! Full container validation pipeline.
//!
//! Verification is a fixed sequence of stages, each gating the next:
//! header field checks, table decoding, then the bitmap chain walk. The
//! verifier stops at the first mismatch and remembers the last stage it
//! completed, which is what the CLI reports when a file is rejected.

use crate::chain;
use crate::checksum;
use crate::error::Pd3Error;
use crate::format::{
    COLOR_TABLE_NAME, COLOR_TYPE_SENTINEL, CONTAINER_MAGIC, TABLE_START, TRAILER_LEN,
};
use crate::header::{self, Header};
use crate::table::{self, DecodedTable};

/// Last completed stage of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    HeaderChecked,
    TableDecoded,
    ChainChecked,
    Valid,
}

/// Everything a successful run proves about the bytes.
#[derive(Debug, Clone)]
pub struct Verified {
    pub header: Header,
    pub table:  DecodedTable,
}

/// Stateful checker over one in-memory container.
pub struct Verifier<'a> {
    data:   &'a [u8],
    device: u8,
    stage:  Stage,
}

impl<'a> Verifier<'a> {
    pub fn new(data: &'a [u8], device: u8) -> Self {
        Verifier { data, device, stage: Stage::Start }
    }

    /// Last stage that completed without a mismatch.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run every stage, stopping at the first mismatch.
    pub fn run(&mut self) -> Result<Verified, Pd3Error> {
        let header = self.check_header()?;
        self.stage = Stage::HeaderChecked;
        let table = self.decode_table()?;
        self.stage = Stage::TableDecoded;
        self.check_chain(&table)?;
        self.stage = Stage::ChainChecked;
        let verified = Verified { header, table };
        self.stage = Stage::Valid;
        Ok(verified)
    }

    fn check_header(&self) -> Result<Header, Pd3Error> {
        let header = Header::decode(self.data)?;

        // the magic gate only fires for containers addressed at our
        // device; foreign-device files still face every later check
        if header.magic != CONTAINER_MAGIC && header.device == self.device {
            return Err(Pd3Error::MagicMismatch {
                expected: CONTAINER_MAGIC,
                found:    header.magic,
            });
        }
        if header.type_id == COLOR_TYPE_SENTINEL {
            return Err(Pd3Error::TypeMismatch { found: header.type_id });
        }
        let computed = checksum::compute(self.data, TABLE_START);
        if header.checksum != computed {
            return Err(Pd3Error::ChecksumMismatch { stored: header.checksum, computed });
        }
        if header.total_size() != self.data.len() as u64 {
            return Err(Pd3Error::SizeMismatch {
                declared: header.total_size(),
                actual:   self.data.len() as u64,
            });
        }
        let table_name = header.table_name();
        if table_name != COLOR_TABLE_NAME {
            return Err(Pd3Error::TableTypeMismatch {
                expected: COLOR_TABLE_NAME,
                found:    table_name,
            });
        }
        let version_name = header.version_name();
        if !header::version_name_matches(&version_name) {
            return Err(Pd3Error::VersionPatternMismatch { found: version_name });
        }
        let version = header
            .version()
            .ok_or(Pd3Error::VersionPatternMismatch { found: version_name })?;
        let (trailer_text, trailer_value) = self.trailer_version();
        if trailer_value != Some(version) {
            return Err(Pd3Error::VersionTrailerMismatch { version, trailer: trailer_text });
        }
        Ok(header)
    }

    fn decode_table(&self) -> Result<DecodedTable, Pd3Error> {
        let table = table::decode(self.data, TABLE_START)?.collect_entries()?;
        // the first bitmap must start exactly where the table ended
        if let Some(&(index, Some(first))) = table.entries.iter().find(|(_, addr)| addr.is_some())
        {
            if first != table.end_offset {
                return Err(Pd3Error::LocationMismatch {
                    expected: table.end_offset,
                    actual:   first,
                    index:    index as usize,
                });
            }
        }
        Ok(table)
    }

    fn check_chain(&self, table: &DecodedTable) -> Result<(), Pd3Error> {
        let body = &self.data[..self.data.len().saturating_sub(TRAILER_LEN)];
        chain::validate(body, &table.addresses())
    }

    /// Raw trailer text and, when it parses as decimal, its value.
    fn trailer_version(&self) -> (String, Option<u32>) {
        let raw = &self.data[self.data.len().saturating_sub(TRAILER_LEN)..];
        let text = String::from_utf8_lossy(raw).into_owned();
        let value = std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok());
        (text, value)
    }
}

/// One-shot verification of `data` for the given target device.
pub fn verify(data: &[u8], device: u8) -> Result<Verified, Pd3Error> {
    Verifier::new(data, device).run()
}
