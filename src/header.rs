//! Fixed 0x80-byte header at the start of every container.
//!
//! Decoding is lossless and judgment-free: reserved regions and whatever
//! sits after a NUL terminator inside the name fields are kept verbatim, so
//! `encode(decode(bytes)) == bytes` holds for any 0x80-byte input. Deciding
//! whether the fields are acceptable is the verifier's job.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::Pd3Error;
use crate::format::HEADER_LEN;

/// Decoded header fields, in file order.
///
/// | Offset        | Field          |
/// |---------------|----------------|
/// | `0x00..0x03`  | `magic`        |
/// | `0x03`        | `device`       |
/// | `0x04..0x08`  | `type_id`      |
/// | `0x08..0x0E`  | `reserved0`    |
/// | `0x0E..0x10`  | `checksum`     |
/// | `0x10..0x14`  | `body_size`    |
/// | `0x14..0x20`  | `reserved1`    |
/// | `0x20..0x40`  | `table_name`   |
/// | `0x40..0x60`  | `version_name` |
/// | `0x60..0x80`  | `reserved2`    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic:        [u8; 3],
    pub device:       u8,
    pub type_id:      [u8; 4],
    pub reserved0:    [u8; 6],
    pub checksum:     u16,
    pub body_size:    u32,
    pub reserved1:    [u8; 12],
    pub table_name:   [u8; 32],
    pub version_name: [u8; 32],
    pub reserved2:    [u8; 32],
}

impl Header {
    /// Parse the first [`HEADER_LEN`] bytes of `data`.
    pub fn decode(data: &[u8]) -> Result<Self, Pd3Error> {
        if data.len() < HEADER_LEN {
            return Err(Pd3Error::InsufficientSize {
                needed:    HEADER_LEN as u64,
                available: data.len() as u64,
            });
        }
        let mut r = &data[..HEADER_LEN];

        let mut magic = [0u8; 3];
        r.read_exact(&mut magic)?;
        let device = r.read_u8()?;
        let mut type_id = [0u8; 4];
        r.read_exact(&mut type_id)?;
        let mut reserved0 = [0u8; 6];
        r.read_exact(&mut reserved0)?;
        let checksum = r.read_u16::<LittleEndian>()?;
        let body_size = r.read_u32::<LittleEndian>()?;
        let mut reserved1 = [0u8; 12];
        r.read_exact(&mut reserved1)?;
        let mut table_name = [0u8; 32];
        r.read_exact(&mut table_name)?;
        let mut version_name = [0u8; 32];
        r.read_exact(&mut version_name)?;
        let mut reserved2 = [0u8; 32];
        r.read_exact(&mut reserved2)?;

        Ok(Header {
            magic,
            device,
            type_id,
            reserved0,
            checksum,
            body_size,
            reserved1,
            table_name,
            version_name,
            reserved2,
        })
    }

    /// Serialize back to exactly [`HEADER_LEN`] bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.magic);
        out.push(self.device);
        out.extend_from_slice(&self.type_id);
        out.extend_from_slice(&self.reserved0);
        out.extend_from_slice(&self.checksum.to_le_bytes());
        out.extend_from_slice(&self.body_size.to_le_bytes());
        out.extend_from_slice(&self.reserved1);
        out.extend_from_slice(&self.table_name);
        out.extend_from_slice(&self.version_name);
        out.extend_from_slice(&self.reserved2);
        out
    }

    /// Total file length the header declares: body size plus the header
    /// itself, widened so the sum cannot wrap.
    pub fn total_size(&self) -> u64 {
        u64::from(self.body_size) + HEADER_LEN as u64
    }

    /// Table name field up to its NUL terminator.
    pub fn table_name(&self) -> String {
        null_terminated(&self.table_name)
    }

    /// Version name field up to its NUL terminator.
    pub fn version_name(&self) -> String {
        null_terminated(&self.version_name)
    }

    /// Numeric version parsed from the four digits of the version name,
    /// `None` when the name does not carry them.
    pub fn version(&self) -> Option<u32> {
        let name = self.version_name();
        let digits = name.get(1..5)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Whether `name` looks like `V0123AB_CD`: a `V`, four digits, one or more
/// uppercase letters, an underscore, then at least one more uppercase
/// letter. Trailing bytes after that prefix are not inspected.
pub fn version_name_matches(name: &str) -> bool {
    let b = name.as_bytes();
    if b.len() < 8 || b[0] != b'V' {
        return false;
    }
    if !b[1..5].iter().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut i = 5;
    while i < b.len() && b[i].is_ascii_uppercase() {
        i += 1;
    }
    if i == 5 || i >= b.len() || b[i] != b'_' {
        return false;
    }
    i += 1;
    i < b.len() && b[i].is_ascii_uppercase()
}

/// Field content up to the first NUL. A field with no terminator at all
/// reads as empty, matching how existing tooling treats runaway names.
fn null_terminated(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(0);
    String::from_utf8_lossy(&field[..end]).into_owned()
}
