//! Legacy Format Reader
//!
//! Files written before the format gained its magic constant carry a
//! different, smaller header:
//!
//! ```text
//! 0                : i16      nr_of_cols (C)
//! 2                : i16      key_length (K, top bit masked off)
//! 4                : i16[K]   key column indices
//! 4+2K             : i16[C]   col types (1=Character 2=Integer 3=Double
//!                                        4=Boolean 5=Factor)
//! 4+2K+2C          : u64[C+1] block positions; entry 0 is the row count,
//!                             the rest must be monotonically non-decreasing
//! 8(C+1)+2(C+K+2)  : column names (character codec)
//! ```
//!
//! The table reader lands here whenever the magic does not match; every
//! header inconsistency is reported as `MalformedLegacyHeader` because at
//! that point we genuinely do not know what the file is. Column payloads
//! use the same codec streams as current files, at the recorded positions.
//!
//! This reader is read-only and each successful operation emits one
//! deprecation warning; these files should be re-written.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use bytes::Buf;
use framestore_core::{Column, ColumnType, Error, Result, TableMeta};
use tracing::warn;

use crate::column::{self, character};
use crate::table::{clamp_row_range, resolve_selection, ReadRequest, ReadResult};

const DEPRECATION_NOTICE: &str =
    "this file was created with a beta release of framestore; re-write it to the current format";

struct LegacyHeader {
    nr_of_rows: u64,
    key_col_index: Vec<usize>,
    col_types: Vec<ColumnType>,
    col_offsets: Vec<u64>,
    names: Vec<String>,
}

/// Read the metadata of a pre-magic file.
pub fn read_meta(path: impl AsRef<Path>) -> Result<TableMeta> {
    let mut source = BufReader::new(File::open(path)?);
    let header = parse_header(&mut source)?;

    let meta = TableMeta {
        version: 0,
        nr_of_rows: header.nr_of_rows,
        nr_of_cols: header.col_types.len(),
        col_names: header.names,
        col_types: header.col_types,
        key_col_index: header.key_col_index,
        nr_of_chunks: 1,
    };
    warn!("{}", DEPRECATION_NOTICE);
    Ok(meta)
}

/// Read a column subset and row range from a pre-magic file.
pub fn read_table(path: impl AsRef<Path>, request: &ReadRequest) -> Result<ReadResult> {
    let mut source = BufReader::new(File::open(path)?);
    let header = parse_header(&mut source)?;

    let selection = resolve_selection(&header.names, request.columns.as_deref())?;
    let nr_of_rows = header.nr_of_rows as usize;
    let (first_row, n_rows) = clamp_row_range(request.from_row, request.to_row, nr_of_rows)?;

    let mut names = Vec::with_capacity(selection.len());
    let mut columns = Vec::with_capacity(selection.len());
    for &col in &selection {
        names.push(header.names[col].clone());
        columns.push(column::read_column(
            &mut source,
            header.col_types[col],
            header.col_offsets[col],
            first_row,
            n_rows,
            nr_of_rows,
        )?);
    }

    let keys: Vec<String> = header
        .key_col_index
        .iter()
        .copied()
        .filter(|key| selection.contains(key))
        .map(|key| header.names[key].clone())
        .collect();

    warn!("{}", DEPRECATION_NOTICE);
    Ok(ReadResult {
        names,
        columns,
        keys,
    })
}

fn parse_header<R: Read + Seek>(source: &mut R) -> Result<LegacyHeader> {
    let mut sizes = [0u8; 4];
    read_legacy_bytes(source, &mut sizes)?;
    let nr_of_cols = i16::from_le_bytes([sizes[0], sizes[1]]);
    let key_field = i16::from_le_bytes([sizes[2], sizes[3]]);
    if nr_of_cols < 0 || key_field < 0 {
        return Err(Error::MalformedLegacyHeader(
            "negative column or key count".to_string(),
        ));
    }
    let nr_of_cols = nr_of_cols as usize;
    let key_length = (key_field & 0x7FFF) as usize;

    let mut raw = vec![0u8; 2 * key_length + 2 * nr_of_cols + 8 * (nr_of_cols + 1)];
    read_legacy_bytes(source, &mut raw)?;
    let mut cursor = raw.as_slice();

    let mut key_col_index = Vec::with_capacity(key_length);
    for _ in 0..key_length {
        let key = cursor.get_i16_le();
        if key < 0 || key as usize >= nr_of_cols {
            return Err(Error::MalformedLegacyHeader(format!(
                "key column index {} out of range",
                key
            )));
        }
        key_col_index.push(key as usize);
    }

    let mut col_types = Vec::with_capacity(nr_of_cols);
    for _ in 0..nr_of_cols {
        let code = cursor.get_i16_le();
        col_types.push(remap_type(code)?);
    }

    let mut block_pos = Vec::with_capacity(nr_of_cols + 1);
    for _ in 0..nr_of_cols + 1 {
        block_pos.push(cursor.get_u64_le());
    }
    // entry 0 holds the row count; positions after the first column's must
    // be monotonically non-decreasing
    for i in 2..=nr_of_cols {
        if block_pos[i] < block_pos[i - 1] {
            return Err(Error::MalformedLegacyHeader(format!(
                "block positions decrease at column {}",
                i
            )));
        }
    }
    let nr_of_rows = block_pos[0];
    if nr_of_rows == 0 {
        return Err(Error::MalformedLegacyHeader("zero rows".to_string()));
    }

    let names_offset = (8 * (nr_of_cols + 1) + 2 * (nr_of_cols + key_length + 2)) as u64;
    let names = character::read(source, names_offset, 0, nr_of_cols, nr_of_cols)
        .map_err(|e| match e {
            Error::Io(e) => Error::Io(e),
            other => Error::MalformedLegacyHeader(other.to_string()),
        })?
        .into_iter()
        .map(|name| {
            name.ok_or_else(|| Error::MalformedLegacyHeader("missing column name".to_string()))
        })
        .collect::<Result<Vec<String>>>()?;

    Ok(LegacyHeader {
        nr_of_rows,
        key_col_index,
        col_types,
        col_offsets: block_pos[1..].to_vec(),
        names,
    })
}

/// Legacy type codes predate the current tags.
fn remap_type(code: i16) -> Result<ColumnType> {
    match code {
        1 => Ok(ColumnType::Character),
        2 => Ok(ColumnType::Integer),
        3 => Ok(ColumnType::Double),
        4 => Ok(ColumnType::Boolean),
        5 => Ok(ColumnType::Factor),
        _ => Err(Error::MalformedLegacyHeader(format!(
            "column type code {} out of range",
            code
        ))),
    }
}

fn read_legacy_bytes<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    source.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::MalformedLegacyHeader("file too small for a legacy header".to_string())
        } else {
            Error::Io(e)
        }
    })
}
