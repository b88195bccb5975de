//! Error taxonomy shared by every layer of the crate.
//!
//! Each variant names one way a container can be malformed, so callers can
//! match on the failure instead of parsing message strings. Validation is
//! fail-fast: the first mismatch wins and later ones stay unreported.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Pd3Error {
    /// A structure ran past the end of the available bytes.
    #[error("Not enough data: need {needed} bytes, have {available}")]
    InsufficientSize { needed: u64, available: u64 },

    /// Header magic is wrong for a container targeting the expected device.
    #[error("Incompatible magic bytes: {found:02x?}, expected {expected:02x?}")]
    MagicMismatch { expected: [u8; 3], found: [u8; 3] },

    /// The header carries the type id reserved for the raw color table.
    #[error("Reserved color-table type id {found:02x?} is not a bitmap container")]
    TypeMismatch { found: [u8; 4] },

    /// Stored header checksum does not match the recomputed one.
    #[error("Mismatching checksum: stored {stored:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { stored: u16, computed: u16 },

    /// Declared total size disagrees with the actual file length.
    #[error("Incorrect length in header: declared {declared}, file is {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },

    /// Header table name is not the color-table name.
    #[error("Incorrect table type: {found:?}, expected {expected:?}")]
    TableTypeMismatch { expected: &'static str, found: String },

    /// Version name does not follow the `V` + 4 digits + letters pattern.
    #[error("Version didn't match pattern: {found:?}")]
    VersionPatternMismatch { found: String },

    /// Numeric header version differs from the ASCII trailer.
    #[error("Version mismatch: header V{version:04}, trailer {trailer:?}")]
    VersionTrailerMismatch { version: u32, trailer: String },

    /// Self-describing width slot holds something other than 4.
    #[error("Bad table width slot: {found}, expected {expected}")]
    TableWidthMismatch { expected: u32, found: u32 },

    /// A bitmap starts somewhere else than the table says.
    #[error("Location mismatch at entry {index}: {actual:#010x}, expected {expected:#010x}")]
    LocationMismatch { expected: u32, actual: u32, index: usize },

    /// Non-padding bytes found after the bitmap chain ended.
    #[error("Stray data after the bitmap chain at {offset:#010x}")]
    ChainBroken { offset: u64 },

    /// Bytes that should open a bitmap blob do not.
    #[error("Not a BMP image: leading bytes {found:02x?}")]
    NotABitmap { found: [u8; 2] },

    /// Rebuilt content does not fit the capacity the header declares.
    #[error("Max size exceeded: content needs {needed} bytes, capacity is {capacity}")]
    SizeOverflow { needed: u64, capacity: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}
