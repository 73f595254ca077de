use std::collections::BTreeMap;

use crate::error::Error;

const OTTO: u32 = 0x4F54_544F;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Assembles tables into an sfnt container.
///
/// Tables are keyed by tag, which also yields the sorted directory order
/// the format requires. Each table pads to a 4-byte boundary, carries the
/// checksum of its padded contents, and `head.checkSumAdjustment` is
/// patched last so the whole file sums to the OpenType magic.
#[derive(Debug, Default)]
pub struct FontBuilder {
    tables: BTreeMap<[u8; 4], Vec<u8>>,
}

impl FontBuilder {
    pub fn new() -> Self {
        FontBuilder::default()
    }

    pub fn add_table(&mut self, tag: [u8; 4], data: Vec<u8>) {
        self.tables.insert(tag, data);
    }

    pub fn build(self) -> Result<Vec<u8>, Error> {
        let num_tables = u16::try_from(self.tables.len())
            .map_err(|_| Error::OffsetOverflow(self.tables.len() as u64))?;

        // Binary-search fields of the offset table.
        let (entry_selector, search_range, range_shift) = if num_tables == 0 {
            (0, 0, 0)
        } else {
            let entry_selector = 15 - num_tables.leading_zeros() as u16;
            let search_range = (1u16 << entry_selector) * 16;
            (entry_selector, search_range, num_tables * 16 - search_range)
        };

        let mut out = Vec::new();
        out.extend_from_slice(&OTTO.to_be_bytes());
        out.extend_from_slice(&num_tables.to_be_bytes());
        out.extend_from_slice(&search_range.to_be_bytes());
        out.extend_from_slice(&entry_selector.to_be_bytes());
        out.extend_from_slice(&range_shift.to_be_bytes());

        let mut offset = 12 + usize::from(num_tables) * 16;
        let mut padded: Vec<([u8; 4], Vec<u8>)> = Vec::with_capacity(self.tables.len());
        for (tag, data) in &self.tables {
            let length = data.len();
            let mut data = data.clone();
            while data.len() % 4 != 0 {
                data.push(0);
            }

            out.extend_from_slice(tag);
            out.extend_from_slice(&table_checksum(&data).to_be_bytes());
            out.extend_from_slice(&u32::try_from(offset).map_err(|_| {
                Error::OffsetOverflow(offset as u64)
            })?.to_be_bytes());
            out.extend_from_slice(&u32::try_from(length).map_err(|_| {
                Error::OffsetOverflow(length as u64)
            })?.to_be_bytes());

            offset += data.len();
            padded.push((*tag, data));
        }

        let mut head_offset = None;
        for (tag, data) in &padded {
            if tag == b"head" {
                head_offset = Some(out.len());
            }
            out.extend_from_slice(data);
        }

        // checkSumAdjustment lives 8 bytes into head and is summed as
        // zero up to this point.
        if let Some(head_offset) = head_offset {
            let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(&out));
            out[head_offset + 8..head_offset + 12].copy_from_slice(&adjustment.to_be_bytes());
        }

        Ok(out)
    }
}

/// Big-endian u32 sum; trailing bytes count as zero-padded.
pub fn table_checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u32::from_be_bytes(chunk.try_into().unwrap()));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut last = [0u8; 4];
        last[..rest.len()].copy_from_slice(rest);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}
