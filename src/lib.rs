pub mod format;
pub mod error;
pub mod checksum;
pub mod header;
pub mod table;
pub mod bitmap;
pub mod chain;
pub mod verify;
pub mod container;
pub mod manifest;
pub mod extract;
pub mod rebuild;

pub use bitmap::{BitmapInfo, BitmapProbe, DibProbe};
pub use container::Container;
pub use error::Pd3Error;
pub use extract::{extract, extract_to_dir, Extraction};
pub use header::Header;
pub use manifest::{Manifest, SlotRecord};
pub use rebuild::{rebuild, OverflowPolicy, Rebuilt, SizeOverflow};
pub use verify::{verify, Stage, Verified, Verifier};
