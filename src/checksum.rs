//! Byte-sum checksum used by the container header.

/// Sum of all bytes from `start` to the end of `data`, truncated to 16 bits.
///
/// A `start` past the end of the buffer sums nothing and returns 0. Header
/// verification starts at the table (the header does not checksum itself);
/// the rebuilder checksums a bare body buffer from 0.
pub fn compute(data: &[u8], start: usize) -> u16 {
    let mut sum: u16 = 0;
    for &byte in data.get(start..).unwrap_or(&[]) {
        sum = sum.wrapping_add(u16::from(byte));
    }
    sum
}
