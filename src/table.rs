//! Offset table codec.
//!
//! The table sits at [`TABLE_START`] and carries one little-endian `u32`
//! slot per entry:
//!
//! | Slot        | Meaning                                                |
//! |-------------|--------------------------------------------------------|
//! | slot 0      | self-describing entry width, always 4                  |
//! | slot i >= 1 | bitmap index `i - 1`: offset relative to the slot's    |
//! |             | own address, or [`EMPTY_SENTINEL`] for a hole          |
//!
//! The table stores no length. It ends where the first bitmap begins, so
//! the decoder sniffs each slot position for the raw bytes `BM` before
//! committing to read it as a number. A slot whose bytes happen to start
//! with `BM` therefore terminates the table; well-formed writers never
//! produce such a slot because the first blob starts exactly at the end of
//! the table.
//!
//! Absolute addresses are the slot address plus the stored offset, in
//! wrapping 32-bit arithmetic. The stored value is not a file offset on its
//! own, which is why the empty sentinel is a raw slot value, not an
//! address.

use std::collections::BTreeMap;

use crate::error::Pd3Error;
use crate::format::{BITMAP_MAGIC, EMPTY_SENTINEL, ENTRY_WIDTH};

/// Streaming decoder over the entry slots.
///
/// Yields `(bitmap_index, absolute_address)` pairs in table order, `None`
/// for the address of an empty slot. The iterator fuses after the
/// terminator or the first error.
#[derive(Debug)]
pub struct TableDecoder<'a> {
    data:       &'a [u8],
    cursor:     usize,
    next_index: u32,
    finished:   bool,
}

/// Fully decoded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTable {
    /// One pair per entry slot, in index order.
    pub entries:    Vec<(u32, Option<u32>)>,
    /// Absolute address of the byte that terminated the table. The first
    /// bitmap blob starts here.
    pub end_offset: u32,
}

impl DecodedTable {
    /// Addresses of the present entries, in index order.
    pub fn addresses(&self) -> Vec<u32> {
        self.entries.iter().filter_map(|&(_, addr)| addr).collect()
    }

    /// Address of the first present entry.
    pub fn first_address(&self) -> Option<u32> {
        self.entries.iter().filter_map(|&(_, addr)| addr).next()
    }
}

/// Start decoding the table at `table_offset`.
///
/// Checks the width slot up front; entry slots decode lazily through the
/// returned iterator.
pub fn decode(data: &[u8], table_offset: usize) -> Result<TableDecoder<'_>, Pd3Error> {
    let width = match data.get(table_offset..table_offset + 4) {
        Some(s) => u32::from_le_bytes([s[0], s[1], s[2], s[3]]),
        None => {
            return Err(Pd3Error::InsufficientSize {
                needed:    (table_offset + 4) as u64,
                available: data.len() as u64,
            })
        }
    };
    if width != ENTRY_WIDTH {
        return Err(Pd3Error::TableWidthMismatch { expected: ENTRY_WIDTH, found: width });
    }
    Ok(TableDecoder {
        data,
        cursor: table_offset + ENTRY_WIDTH as usize,
        next_index: 0,
        finished: false,
    })
}

impl<'a> TableDecoder<'a> {
    /// Where decoding stopped. Only meaningful once the iterator has
    /// terminated cleanly.
    pub fn end_offset(&self) -> u32 {
        self.cursor as u32
    }

    /// Drain the iterator into a [`DecodedTable`], failing on the first
    /// bad slot.
    pub fn collect_entries(mut self) -> Result<DecodedTable, Pd3Error> {
        let mut entries = Vec::new();
        for item in self.by_ref() {
            entries.push(item?);
        }
        Ok(DecodedTable { entries, end_offset: self.end_offset() })
    }
}

impl<'a> Iterator for TableDecoder<'a> {
    type Item = Result<(u32, Option<u32>), Pd3Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let remaining = &self.data[self.cursor..];
        // sniff the raw window first: the terminator wins over slot decode
        if remaining.starts_with(BITMAP_MAGIC) {
            self.finished = true;
            return None;
        }
        let raw = match remaining.get(..4) {
            Some(s) => u32::from_le_bytes([s[0], s[1], s[2], s[3]]),
            None => {
                self.finished = true;
                return Some(Err(Pd3Error::InsufficientSize {
                    needed:    (self.cursor + 4) as u64,
                    available: self.data.len() as u64,
                }));
            }
        };
        let slot_addr = self.cursor as u32;
        let index = self.next_index;
        self.cursor += ENTRY_WIDTH as usize;
        self.next_index += 1;

        let address = if raw == EMPTY_SENTINEL {
            None
        } else {
            Some(slot_addr.wrapping_add(raw))
        };
        Some(Ok((index, address)))
    }
}

/// Serialize a table covering indices `0..=max` of `entries`.
///
/// Indices absent from the map encode the empty sentinel, so sparse maps
/// produce the same bytes as maps with explicit `None` holes. An empty map
/// yields just the width slot.
pub fn encode(entries: &BTreeMap<u32, Option<u32>>, table_offset: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 * (entries.len() + 1));
    out.extend_from_slice(&ENTRY_WIDTH.to_le_bytes());
    let Some(&max_index) = entries.keys().next_back() else {
        return out;
    };
    for index in 0..=max_index {
        let slot_addr = (table_offset as u32)
            .wrapping_add(ENTRY_WIDTH.wrapping_mul(index.wrapping_add(1)));
        let raw = match entries.get(&index) {
            Some(&Some(address)) => address.wrapping_sub(slot_addr),
            _ => EMPTY_SENTINEL,
        };
        out.extend_from_slice(&raw.to_le_bytes());
    }
    out
}
