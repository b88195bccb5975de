//! Extraction sidecar.
//!
//! `header.json` preserves every header field byte for byte, plus where
//! each table entry pointed and what the bitmap behind it looked like.
//! Rebuilding a container needs nothing beyond this file and the bitmaps
//! next to it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Pd3Error;
use crate::format::MANIFEST_FILE;
use crate::header::Header;

/// Header mirror in sidecar form. Byte fields render as hex strings so
/// the file stays hand-editable yet reverses to the exact original bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHeader {
    #[serde(with = "hex_array")]
    pub magic:        [u8; 3],
    pub device:       u8,
    #[serde(with = "hex_array")]
    pub type_id:      [u8; 4],
    #[serde(with = "hex_array")]
    pub reserved0:    [u8; 6],
    pub checksum:     u16,
    pub body_size:    u32,
    #[serde(with = "hex_array")]
    pub reserved1:    [u8; 12],
    #[serde(with = "hex_array")]
    pub table_name:   [u8; 32],
    #[serde(with = "hex_array")]
    pub version_name: [u8; 32],
    #[serde(with = "hex_array")]
    pub reserved2:    [u8; 32],
}

impl From<&Header> for ManifestHeader {
    fn from(h: &Header) -> Self {
        ManifestHeader {
            magic:        h.magic,
            device:       h.device,
            type_id:      h.type_id,
            reserved0:    h.reserved0,
            checksum:     h.checksum,
            body_size:    h.body_size,
            reserved1:    h.reserved1,
            table_name:   h.table_name,
            version_name: h.version_name,
            reserved2:    h.reserved2,
        }
    }
}

impl ManifestHeader {
    pub fn to_header(&self) -> Header {
        Header {
            magic:        self.magic,
            device:       self.device,
            type_id:      self.type_id,
            reserved0:    self.reserved0,
            checksum:     self.checksum,
            body_size:    self.body_size,
            reserved1:    self.reserved1,
            table_name:   self.table_name,
            version_name: self.version_name,
            reserved2:    self.reserved2,
        }
    }
}

/// Per-entry metadata captured at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Absolute address the entry had, `None` for an empty slot.
    pub addr: Option<u32>,
    /// Bitmap width and height as probed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<(u32, u32)>,
    /// Hex blake3 of the blob bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub header:       ManifestHeader,
    pub table:        BTreeMap<u32, SlotRecord>,
    /// Unix timestamp of the extraction run.
    pub extracted_at: i64,
}

impl Manifest {
    pub fn new(header: &Header, table: BTreeMap<u32, SlotRecord>) -> Self {
        Manifest {
            header: ManifestHeader::from(header),
            table,
            extracted_at: Utc::now().timestamp(),
        }
    }

    pub fn to_header(&self) -> Header {
        self.header.to_header()
    }

    /// Highest bitmap index the sidecar knows about.
    pub fn max_index(&self) -> Option<u32> {
        self.table.keys().next_back().copied()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, Pd3Error> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, Pd3Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Write the sidecar as `header.json` inside `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), Pd3Error> {
        fs::write(dir.join(MANIFEST_FILE), self.to_json()?)?;
        Ok(())
    }

    /// Read the sidecar back from `dir`.
    pub fn load(dir: &Path) -> Result<Self, Pd3Error> {
        let bytes = fs::read(dir.join(MANIFEST_FILE))?;
        Self::from_json(&bytes)
    }
}

mod hex_array {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom(format!("expected {} hex-encoded bytes", N)))
    }
}
