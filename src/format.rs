//! On-disk constants of the PD3 color-table container.
//!
//! A container is a single flat file:
//!
//! | Range                | Content                                          |
//! |----------------------|--------------------------------------------------|
//! | `0x00 .. 0x80`       | fixed header ([`crate::header::Header`])         |
//! | `0x80 ..`            | offset table, one `u32` slot per bitmap entry    |
//! | table end ..         | bitmap blobs, back to back                       |
//! | after last blob ..   | `0xFF` padding                                   |
//! | last 3 bytes         | ASCII decimal version trailer                    |
//!
//! All integers are little-endian. Offsets are 32-bit and wrap around;
//! address arithmetic in this crate never widens them.

/// Leading bytes of every container header.
pub const CONTAINER_MAGIC: [u8; 3] = [0x90, 0x80, 0x30];

/// Type id reserved for the raw color table itself. A container carrying
/// this id holds no bitmap payload and is rejected by the verifier.
pub const COLOR_TYPE_SENTINEL: [u8; 4] = [0x30, 0x00, 0x01, 0x03];

/// Fixed header length.
pub const HEADER_LEN: usize = 0x80;

/// Absolute address of the offset table, directly after the header.
pub const TABLE_START: usize = 0x80;

/// Value the self-describing width slot must hold, and the stride of the
/// table in bytes.
pub const ENTRY_WIDTH: u32 = 4;

/// Slot value marking an entry with no bitmap behind it.
pub const EMPTY_SENTINEL: u32 = 0xFFFF_FFFF;

/// First two bytes of every bitmap blob payload.
pub const BITMAP_MAGIC: &[u8] = b"BM";

/// Filler between the last blob and the version trailer.
pub const PAD_BYTE: u8 = 0xFF;

/// Length of the ASCII version trailer at the very end of the file.
pub const TRAILER_LEN: usize = 3;

/// Table name the header must carry for a color-table container.
pub const COLOR_TABLE_NAME: &str = "FP-COLOR";

/// Device id this toolkit targets by default.
pub const DEFAULT_DEVICE: u8 = 0x6A;

/// Sidecar file the extractor writes next to the bitmaps.
pub const MANIFEST_FILE: &str = "header.json";
