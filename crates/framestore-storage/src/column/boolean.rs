//! Boolean Column Codec
//!
//! Booleans are three-state (false / true / missing). Each value occupies
//! one u32 word in the raw block so the fixed-ratio bit packer can fold 16
//! of them into a single word (2 bits apiece) before any entropy stage
//! runs: a guaranteed 16x reduction even at compression level 0.

use std::io::{Read, Seek, Write};

use framestore_core::{plan_for, ColumnType, Result};

use crate::stream;

/// Booleans per compression block (16 KiB of raw words).
pub(crate) const BLOCK_ELEMENTS: usize = 4096;

const ELEMENT_SIZE: usize = 4;

const FALSE_WORD: u32 = 0;
const TRUE_WORD: u32 = 1;
const MISSING_WORD: u32 = 2;

pub(crate) fn write<S: Write + Seek>(
    sink: &mut S,
    values: &[Option<bool>],
    level: u8,
) -> Result<()> {
    let plan = plan_for(ColumnType::Boolean, level);

    let mut raw = Vec::with_capacity(values.len() * ELEMENT_SIZE);
    for value in values {
        let word = match value {
            Some(false) => FALSE_WORD,
            Some(true) => TRUE_WORD,
            None => MISSING_WORD,
        };
        raw.extend_from_slice(&word.to_le_bytes());
    }

    stream::write_blocks(sink, &raw, values.len(), ELEMENT_SIZE, BLOCK_ELEMENTS, plan)
}

pub(crate) fn read<R: Read + Seek>(
    source: &mut R,
    col_offset: u64,
    first_row: usize,
    n_rows: usize,
    total_rows: usize,
) -> Result<Vec<Option<bool>>> {
    let mut raw = vec![0u8; n_rows * ELEMENT_SIZE];
    stream::read_range(
        source,
        &mut raw,
        col_offset,
        first_row,
        n_rows,
        total_rows,
        ELEMENT_SIZE,
        BLOCK_ELEMENTS,
    )?;

    Ok(raw
        .chunks_exact(ELEMENT_SIZE)
        .map(|c| match u32::from_le_bytes([c[0], c[1], c[2], c[3]]) {
            FALSE_WORD => Some(false),
            TRUE_WORD => Some(true),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample(n: usize) -> Vec<Option<bool>> {
        (0..n)
            .map(|i| match i % 3 {
                0 => Some(true),
                1 => Some(false),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_roundtrip_small() {
        let values = vec![Some(true), Some(false), None, Some(true)];
        let mut sink = Cursor::new(Vec::new());
        write(&mut sink, &values, 0).unwrap();

        let got = read(&mut sink, 0, 0, 4, 4).unwrap();
        assert_eq!(got, values);
    }

    #[test]
    fn test_roundtrip_across_blocks() {
        let values = sample(BLOCK_ELEMENTS + 100);
        for level in [0u8, 30, 80] {
            let mut sink = Cursor::new(Vec::new());
            write(&mut sink, &values, level).unwrap();

            let total = values.len();
            let got = read(&mut sink, 0, 0, total, total).unwrap();
            assert_eq!(got, values, "level={}", level);
        }
    }

    #[test]
    fn test_partial_read_spans_block_boundary() {
        let values = sample(BLOCK_ELEMENTS * 2 + 7);
        let mut sink = Cursor::new(Vec::new());
        write(&mut sink, &values, 50).unwrap();

        let first = BLOCK_ELEMENTS - 3;
        let n = 10;
        let got = read(&mut sink, 0, first, n, values.len()).unwrap();
        assert_eq!(got, &values[first..first + n]);
    }

    #[test]
    fn test_level_zero_is_pure_bitpack() {
        // at level 0 the payload is exactly index + packed words
        let values = sample(BLOCK_ELEMENTS);
        let mut sink = Cursor::new(Vec::new());
        write(&mut sink, &values, 0).unwrap();

        let index_len = 16;
        let packed_len = BLOCK_ELEMENTS / 16 * 4;
        assert_eq!(sink.get_ref().len(), index_len + packed_len);
    }
}
