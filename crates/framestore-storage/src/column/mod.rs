//! Column Codecs
//!
//! One codec per logical column type, each pairing the generic block
//! streamer with type-specific pre/post-processing:
//!
//! | type      | codec        | element on disk       | block elements |
//! |-----------|--------------|-----------------------|----------------|
//! | Boolean   | `boolean`    | u32 tri-state word    | 4096           |
//! | Integer   | `integer`    | i32, little-endian    | 4096           |
//! | Double    | `double`     | f64 bits, LE          | 2048           |
//! | Character | `character`  | offsets + string heap | 2048           |
//! | Factor    | `factor`     | levels + i32 codes    | 2048 / 4096    |
//!
//! The numeric block-element counts all come out to 16 KiB of raw bytes
//! per block, the format's default compression unit. Dispatch is a match
//! over the on-disk type tag; adding a column type means adding a variant
//! here and a module beside the others.

pub(crate) mod boolean;
pub(crate) mod character;
pub(crate) mod double;
pub(crate) mod factor;
pub(crate) mod integer;

use std::io::{Read, Seek, Write};

use framestore_core::{Column, ColumnType, Result};
use tracing::debug;

/// Write one column at the sink's current position.
pub(crate) fn write_column<S: Write + Seek>(
    sink: &mut S,
    column: &Column,
    level: u8,
) -> Result<()> {
    match column {
        Column::Boolean(values) => boolean::write(sink, values, level),
        Column::Integer(values) => integer::write(sink, values, level),
        Column::Double(values) => double::write(sink, values, level),
        Column::Character(values) => {
            character::write(sink, values.len(), level, |i| values[i].as_deref())
        }
        Column::Factor { levels, codes } => factor::write(sink, levels, codes, level),
    }
}

/// Read rows `[first_row, first_row + n_rows)` of the column starting at
/// `col_offset`.
pub(crate) fn read_column<R: Read + Seek>(
    source: &mut R,
    column_type: ColumnType,
    col_offset: u64,
    first_row: usize,
    n_rows: usize,
    total_rows: usize,
) -> Result<Column> {
    debug!(
        ?column_type,
        col_offset, first_row, n_rows, "reading column"
    );
    match column_type {
        ColumnType::Boolean => {
            boolean::read(source, col_offset, first_row, n_rows, total_rows).map(Column::Boolean)
        }
        ColumnType::Integer => {
            integer::read(source, col_offset, first_row, n_rows, total_rows).map(Column::Integer)
        }
        ColumnType::Double => {
            double::read(source, col_offset, first_row, n_rows, total_rows).map(Column::Double)
        }
        ColumnType::Character => character::read(source, col_offset, first_row, n_rows, total_rows)
            .map(Column::Character),
        ColumnType::Factor => factor::read(source, col_offset, first_row, n_rows, total_rows)
            .map(|(levels, codes)| Column::Factor { levels, codes }),
    }
}
