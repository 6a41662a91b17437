//! Integer Column Codec
//!
//! Integers are stored as raw little-endian i32. The missing sentinel
//! (`i32::MIN` by host convention) is just another bit pattern here; the
//! engine round-trips it without interpretation. Compression shuffles the
//! four byte planes apart before the entropy stage.

use std::io::{Read, Seek, Write};

use framestore_core::{plan_for, ColumnType, Result};

use crate::stream;

/// Integers per compression block (16 KiB of raw bytes).
pub(crate) const BLOCK_ELEMENTS: usize = 4096;

const ELEMENT_SIZE: usize = 4;

pub(crate) fn write<S: Write + Seek>(sink: &mut S, values: &[i32], level: u8) -> Result<()> {
    let plan = plan_for(ColumnType::Integer, level);
    let raw = to_le_bytes(values);
    stream::write_blocks(sink, &raw, values.len(), ELEMENT_SIZE, BLOCK_ELEMENTS, plan)
}

pub(crate) fn read<R: Read + Seek>(
    source: &mut R,
    col_offset: u64,
    first_row: usize,
    n_rows: usize,
    total_rows: usize,
) -> Result<Vec<i32>> {
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
    Ok(from_le_bytes(&raw))
}

pub(crate) fn to_le_bytes(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * ELEMENT_SIZE);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub(crate) fn from_le_bytes(raw: &[u8]) -> Vec<i32> {
    raw.chunks_exact(ELEMENT_SIZE)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample(n: usize) -> Vec<i32> {
        (0..n)
            .map(|i| {
                if i % 97 == 0 {
                    i32::MIN // host missing sentinel, must round-trip as-is
                } else {
                    (i as i32).wrapping_mul(-31) + 7
                }
            })
            .collect()
    }

    #[test]
    fn test_roundtrip_all_levels() {
        let values = sample(BLOCK_ELEMENTS + 5);
        for level in [0u8, 1, 50, 51, 100] {
            let mut sink = Cursor::new(Vec::new());
            write(&mut sink, &values, level).unwrap();

            let got = read(&mut sink, 0, 0, values.len(), values.len()).unwrap();
            assert_eq!(got, values, "level={}", level);
        }
    }

    #[test]
    fn test_partial_read_two_blocks() {
        let values = sample(BLOCK_ELEMENTS + 5);
        let mut sink = Cursor::new(Vec::new());
        write(&mut sink, &values, 50).unwrap();

        let first = BLOCK_ELEMENTS - 2;
        let got = read(&mut sink, 0, first, 5, values.len()).unwrap();
        assert_eq!(got, &values[first..first + 5]);
    }

    #[test]
    fn test_single_value_column() {
        let values = vec![42];
        let mut sink = Cursor::new(Vec::new());
        write(&mut sink, &values, 100).unwrap();

        let got = read(&mut sink, 0, 0, 1, 1).unwrap();
        assert_eq!(got, values);
    }
}
