//! Bitmap chain walk.
//!
//! Blobs sit back to back, so each declared length leads to the start of
//! the next blob. The walk begins at the first table address and keeps
//! hopping until the magic stops matching; from there on only padding may
//! remain. Every landing spot must agree with the table, otherwise the
//! offsets have drifted.

use crate::bitmap;
use crate::error::Pd3Error;
use crate::format::PAD_BYTE;

/// Walk the blob chain inside `body` and cross-check it against the table
/// `addresses` (present entries in index order).
///
/// `body` is the container without its version trailer; the padding scan
/// runs right up to its end. An empty address list is trivially valid:
/// the walk has no starting point, so the body goes unchecked. A length
/// that jumps past the end of `body` ends the walk successfully, however
/// far past it lands, matching how device firmware treats the final blob.
pub fn validate(body: &[u8], addresses: &[u32]) -> Result<(), Pd3Error> {
    let Some(&first) = addresses.first() else {
        return Ok(());
    };
    let mut addr = first;
    let mut index = 0usize;
    loop {
        let at = addr as usize;
        let tail = body.get(at..).unwrap_or(&[]);
        let length = match bitmap::blob_len(tail) {
            Ok(length) => length,
            Err(Pd3Error::NotABitmap { .. }) => {
                // chain over; everything left must be padding
                return match tail.iter().position(|&b| b != PAD_BYTE) {
                    None => Ok(()),
                    Some(stray) => Err(Pd3Error::ChainBroken {
                        offset: u64::from(addr) + stray as u64,
                    }),
                };
            }
            Err(Pd3Error::InsufficientSize { needed, available }) => {
                // rebase the relative counts onto file offsets
                return Err(Pd3Error::InsufficientSize {
                    needed:    u64::from(addr) + needed,
                    available: u64::from(addr) + available,
                });
            }
            Err(other) => return Err(other),
        };
        match addresses.get(index) {
            Some(&expected) if expected == addr => {}
            Some(&expected) => {
                return Err(Pd3Error::LocationMismatch { expected, actual: addr, index });
            }
            None => return Err(Pd3Error::ChainBroken { offset: u64::from(addr) }),
        }
        // cursor advance is unbounded; only table offsets wrap mod 2^32
        let next = u64::from(addr) + u64::from(length);
        index += 1;
        if next >= body.len() as u64 {
            return Ok(());
        }
        addr = next as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(total_len: u32) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"BM");
        b.extend_from_slice(&total_len.to_le_bytes());
        b.resize(total_len as usize, 0x20);
        b
    }

    fn body_with_blobs() -> Vec<u8> {
        let mut body = vec![0u8; 0x10];
        body.extend_from_slice(&blob(8));
        body.extend_from_slice(&blob(6));
        body.extend_from_slice(&[PAD_BYTE; 4]);
        body
    }

    #[test]
    fn contiguous_chain_with_padding() {
        let body = body_with_blobs();
        assert!(validate(&body, &[0x10, 0x18]).is_ok());
    }

    #[test]
    fn no_addresses_is_trivially_valid() {
        assert!(validate(b"anything at all", &[]).is_ok());
    }

    #[test]
    fn stray_byte_in_padding() {
        let mut body = body_with_blobs();
        body[0x20] = 0x00;
        let err = validate(&body, &[0x10, 0x18]).unwrap_err();
        assert!(matches!(err, Pd3Error::ChainBroken { offset: 0x20 }));
    }

    #[test]
    fn drifted_table_address() {
        let body = body_with_blobs();
        let err = validate(&body, &[0x10, 0x19]).unwrap_err();
        assert!(matches!(
            err,
            Pd3Error::LocationMismatch { expected: 0x19, actual: 0x18, index: 1 }
        ));
    }

    #[test]
    fn blob_beyond_listed_addresses() {
        let body = body_with_blobs();
        let err = validate(&body, &[0x10]).unwrap_err();
        assert!(matches!(err, Pd3Error::ChainBroken { offset: 0x18 }));
    }

    #[test]
    fn truncated_length_prefix() {
        let mut body = vec![0u8; 0x10];
        body.extend_from_slice(b"BM\x20");
        let err = validate(&body, &[0x10]).unwrap_err();
        assert!(matches!(
            err,
            Pd3Error::InsufficientSize { needed: 0x16, available: 0x13 }
        ));
    }

    #[test]
    fn final_blob_may_overshoot() {
        let mut body = vec![0u8; 0x10];
        body.extend_from_slice(&blob(8));
        // length field claims far more than the buffer holds
        body[0x12] = 0xFF;
        assert!(validate(&body, &[0x10]).is_ok());
    }

    #[test]
    fn overshoot_survives_the_32_bit_boundary() {
        // declared length pushes the cursor past u32::MAX
        let mut body = vec![0u8; 0x10];
        body.extend_from_slice(&blob(8));
        body[0x12..0x16].copy_from_slice(&0xFFFF_FFF8u32.to_le_bytes());
        assert!(validate(&body, &[0x10]).is_ok());
    }
}
