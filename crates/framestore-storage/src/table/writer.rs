//! Table Writer
//!
//! Serializes a [`Table`] to a framestore file in one pass plus one patch:
//!
//! 1. Validate everything that can fail cheaply (compression level, shape,
//!    key names) before the file is even created, so a rejected store
//!    leaves nothing on disk
//! 2. Write the metadata block with a zero chunk position
//! 3. Write the column names through the character codec at compression 0
//! 4. Reserve the column-offset table by seeking past it
//! 5. Write each column via its codec, recording where it landed
//! 6. Rewind and patch the metadata block and the offset table
//!
//! Any failure after the file exists simply abandons it: a partial file
//! fails header validation on read, which is the format's crash story.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::{BufMut, BytesMut};
use framestore_core::{Error, Result, Table};
use tracing::debug;

use super::{variable_meta_size, CHUNK_SLOTS, FILE_MAGIC, FORMAT_VERSION, TABLE_META_SIZE};
use crate::column::{self, character};

/// Store `table` at `path` with the given compression level (0..=100).
pub fn write_table(path: impl AsRef<Path>, table: &Table, compression: u32) -> Result<()> {
    if compression > 100 {
        return Err(Error::InvalidCompressionLevel(compression));
    }
    let level = compression as u8;

    let nr_of_cols = table.columns.len();
    if nr_of_cols == 0 {
        return Err(Error::NoColumns);
    }
    if table.names.len() != nr_of_cols {
        return Err(Error::NameCountMismatch {
            names: table.names.len(),
            columns: nr_of_cols,
        });
    }
    let nr_of_rows = table.columns[0].len();
    if nr_of_rows == 0 {
        return Err(Error::EmptyTable);
    }
    for (name, col) in table.names.iter().zip(&table.columns) {
        if col.len() != nr_of_rows {
            return Err(Error::ColumnLengthMismatch {
                column: name.clone(),
                expected: nr_of_rows,
                actual: col.len(),
            });
        }
    }

    let key_col_index: Vec<i32> = table
        .keys
        .iter()
        .map(|key| {
            table
                .names
                .iter()
                .position(|name| name == key)
                .map(|i| i as i32)
                .ok_or_else(|| Error::UnknownKey(key.clone()))
        })
        .collect::<Result<_>>()?;

    let col_types: Vec<u16> = table
        .columns
        .iter()
        .map(|col| col.column_type().code())
        .collect();

    debug!(
        path = %path.as_ref().display(),
        cols = nr_of_cols,
        rows = nr_of_rows,
        compression,
        "writing table"
    );

    let mut sink = BufWriter::new(File::create(path)?);

    let mut chunk_pos = [0u64; CHUNK_SLOTS];
    let mut chunk_rows = [0u64; CHUNK_SLOTS];
    chunk_rows[0] = nr_of_rows as u64;

    // chunk_pos[0] is unknown until the columns land; patched below
    sink.write_all(&encode_metadata(
        nr_of_cols,
        &key_col_index,
        &col_types,
        &chunk_pos,
        &chunk_rows,
    ))?;

    character::write(&mut sink, nr_of_cols, 0, |i| Some(table.names[i].as_str()))?;

    let offset_table_pos = sink.stream_position()?;
    sink.seek(SeekFrom::Current((8 * nr_of_cols) as i64))?;

    let mut col_offsets = Vec::with_capacity(nr_of_cols);
    for (name, col) in table.names.iter().zip(&table.columns) {
        let offset = sink.stream_position()?;
        col_offsets.push(offset);
        debug!(column = %name, offset, "writing column");
        column::write_column(&mut sink, col, level)?;
    }

    chunk_pos[0] = offset_table_pos;
    sink.seek(SeekFrom::Start(0))?;
    sink.write_all(&encode_metadata(
        nr_of_cols,
        &key_col_index,
        &col_types,
        &chunk_pos,
        &chunk_rows,
    ))?;

    sink.seek(SeekFrom::Start(offset_table_pos))?;
    let mut offsets = BytesMut::with_capacity(8 * nr_of_cols);
    for off in &col_offsets {
        offsets.put_u64_le(*off);
    }
    sink.write_all(&offsets)?;

    sink.flush()?;
    Ok(())
}

/// Encode the full metadata block (fixed header plus variable part).
fn encode_metadata(
    nr_of_cols: usize,
    key_col_index: &[i32],
    col_types: &[u16],
    chunk_pos: &[u64; CHUNK_SLOTS],
    chunk_rows: &[u64; CHUNK_SLOTS],
) -> BytesMut {
    let total = TABLE_META_SIZE + variable_meta_size(key_col_index.len(), nr_of_cols);
    let mut buf = BytesMut::with_capacity(total);

    buf.put_i32_le(nr_of_cols as i32);
    buf.put_i32_le(key_col_index.len() as i32);
    buf.put_u32_le(FORMAT_VERSION);
    buf.put_u32_le(1); // chunks per index row

    buf.put_u64_le(FILE_MAGIC);
    for pos in chunk_pos {
        buf.put_u64_le(*pos);
    }
    for rows in chunk_rows {
        buf.put_u64_le(*rows);
    }

    buf.put_u32_le(1); // chunks used
    for key in key_col_index {
        buf.put_i32_le(*key);
    }
    for ty in col_types {
        buf.put_u16_le(*ty);
    }

    debug_assert_eq!(buf.len(), total);
    buf
}
