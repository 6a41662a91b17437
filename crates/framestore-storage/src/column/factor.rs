//! Factor Column Codec
//!
//! A factor is a categorical column: a list of level strings plus one
//! 1-based level index per row (`i32::MIN` for missing). On disk the
//! column starts with a small header, then the levels as a character
//! stream, then the codes as an integer stream:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ n_levels   (u32)                             │
//! │ reserved   (u32)                             │
//! │ codes_pos  (u64, absolute offset of codes)   │
//! ├──────────────────────────────────────────────┤
//! │ levels  (character block stream)             │
//! ├──────────────────────────────────────────────┤
//! │ codes   (integer block stream)               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Levels are always read in full (they are the column's dictionary),
//! while the codes honor the requested row range like any other column.

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::{Buf, BufMut, BytesMut};
use framestore_core::{plan_for, ColumnType, Error, Result};

use crate::column::{character, integer};
use crate::stream;

/// Factor header: level count, reserved word, codes offset.
const HEADER_SIZE: usize = 16;

pub(crate) fn write<S: Write + Seek>(
    sink: &mut S,
    levels: &[String],
    codes: &[i32],
    level: u8,
) -> Result<()> {
    let header_pos = sink.stream_position()?;
    sink.seek(SeekFrom::Current(HEADER_SIZE as i64))?;

    character::write(sink, levels.len(), level, |i| Some(levels[i].as_str()))?;

    let codes_pos = sink.stream_position()?;
    let plan = plan_for(ColumnType::Factor, level);
    let raw = integer::to_le_bytes(codes);
    stream::write_blocks(sink, &raw, codes.len(), 4, integer::BLOCK_ELEMENTS, plan)?;
    let end_pos = sink.stream_position()?;

    let mut header = BytesMut::with_capacity(HEADER_SIZE);
    header.put_u32_le(levels.len() as u32);
    header.put_u32_le(0);
    header.put_u64_le(codes_pos);

    sink.seek(SeekFrom::Start(header_pos))?;
    sink.write_all(&header)?;
    sink.seek(SeekFrom::Start(end_pos))?;
    Ok(())
}

pub(crate) fn read<R: Read + Seek>(
    source: &mut R,
    col_offset: u64,
    first_row: usize,
    n_rows: usize,
    total_rows: usize,
) -> Result<(Vec<String>, Vec<i32>)> {
    let mut header = [0u8; HEADER_SIZE];
    stream::read_exact_at(source, col_offset, &mut header)?;
    let mut cursor = &header[..];
    let n_levels = cursor.get_u32_le() as usize;
    let _reserved = cursor.get_u32_le();
    let codes_pos = cursor.get_u64_le();

    if codes_pos < col_offset + HEADER_SIZE as u64 {
        return Err(Error::CorruptColumn(
            "factor codes offset points before the level heap".to_string(),
        ));
    }

    let levels = character::read(
        source,
        col_offset + HEADER_SIZE as u64,
        0,
        n_levels,
        n_levels,
    )?
    .into_iter()
    .map(|s| {
        s.ok_or_else(|| Error::CorruptColumn("factor level must not be missing".to_string()))
    })
    .collect::<Result<Vec<String>>>()?;

    let mut raw = vec![0u8; n_rows * 4];
    stream::read_range(
        source,
        &mut raw,
        codes_pos,
        first_row,
        n_rows,
        total_rows,
        4,
        integer::BLOCK_ELEMENTS,
    )?;

    Ok((levels, integer::from_le_bytes(&raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> (Vec<String>, Vec<i32>) {
        let levels = vec!["low".to_string(), "mid".to_string(), "high".to_string()];
        let codes = (0..10_000)
            .map(|i| {
                if i % 41 == 0 {
                    i32::MIN
                } else {
                    (i % 3) as i32 + 1
                }
            })
            .collect();
        (levels, codes)
    }

    #[test]
    fn test_roundtrip_all_levels() {
        let (levels, codes) = sample();
        for level in [0u8, 40, 90] {
            let mut sink = Cursor::new(Vec::new());
            write(&mut sink, &levels, &codes, level).unwrap();

            let (got_levels, got_codes) =
                read(&mut sink, 0, 0, codes.len(), codes.len()).unwrap();
            assert_eq!(got_levels, levels, "level={}", level);
            assert_eq!(got_codes, codes, "level={}", level);
        }
    }

    #[test]
    fn test_partial_read_keeps_full_level_set() {
        let (levels, codes) = sample();
        let mut sink = Cursor::new(Vec::new());
        write(&mut sink, &levels, &codes, 55).unwrap();

        let (got_levels, got_codes) = read(&mut sink, 0, 5000, 100, codes.len()).unwrap();
        assert_eq!(got_levels, levels);
        assert_eq!(got_codes, &codes[5000..5100]);
    }

    #[test]
    fn test_factor_without_levels() {
        // a column where every code is missing has an empty dictionary
        let levels: Vec<String> = Vec::new();
        let codes = vec![i32::MIN; 5];
        let mut sink = Cursor::new(Vec::new());
        write(&mut sink, &levels, &codes, 0).unwrap();

        let (got_levels, got_codes) = read(&mut sink, 0, 0, 5, 5).unwrap();
        assert!(got_levels.is_empty());
        assert_eq!(got_codes, codes);
    }

    #[test]
    fn test_write_at_nonzero_offset() {
        let (levels, codes) = sample();
        let mut sink = Cursor::new(Vec::new());
        sink.set_position(777);
        write(&mut sink, &levels, &codes, 20).unwrap();

        let (got_levels, got_codes) = read(&mut sink, 777, 0, codes.len(), codes.len()).unwrap();
        assert_eq!(got_levels, levels);
        assert_eq!(got_codes, codes);
    }
}
