//! Table Reader
//!
//! Parses the table header, then reads only what was asked for: a column
//! subset (in the caller's order) and a row range. Each selected column is
//! decoded independently at its absolute offset, so the cost of a read
//! scales with the selection, not with the table.
//!
//! ## Validation Order
//!
//! 1. Fixed 24-byte header: column/key counts, version, magic
//! 2. Magic mismatch → the whole operation is re-dispatched to the legacy
//!    reader (the only recovery path in the engine)
//! 3. `version > FORMAT_VERSION` → `UnsupportedVersion`
//! 4. Variable metadata: chunk index, key columns, column types
//! 5. `chunks_used > 1` → `NotImplemented` (reserved for vertical
//!    partitioning)
//! 6. Selection and row-range validation, then per-column reads

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use bytes::Buf;
use framestore_core::{Column, ColumnType, Error, Result, TableMeta};
use tracing::debug;

use super::{
    clamp_row_range, resolve_selection, variable_meta_size, CHUNK_SLOTS, FILE_MAGIC,
    FORMAT_VERSION, TABLE_META_SIZE,
};
use crate::column::{self, character};
use crate::legacy;
use crate::stream::read_exact_at;

/// What to read from a stored table.
#[derive(Debug, Clone)]
pub struct ReadRequest {
    /// Column names to read, in result order; `None` reads every column.
    pub columns: Option<Vec<String>>,
    /// First row to read (0-based).
    pub from_row: usize,
    /// Exclusive end row; `None` (or anything larger) means the row count.
    pub to_row: Option<usize>,
}

impl Default for ReadRequest {
    fn default() -> Self {
        Self {
            columns: None,
            from_row: 0,
            to_row: None,
        }
    }
}

/// Columns handed back by [`read_table`], in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub names: Vec<String>,
    pub columns: Vec<Column>,
    /// The subset of the table's key columns present in the selection.
    pub keys: Vec<String>,
}

/// Everything the header knows, parsed and validated.
struct ParsedHeader {
    version: u32,
    nr_of_rows: u64,
    chunks_used: u32,
    key_col_index: Vec<usize>,
    col_types: Vec<ColumnType>,
    names: Vec<String>,
    col_offsets: Vec<u64>,
}

/// Read a file's table metadata without touching column data.
pub fn read_meta(path: impl AsRef<Path>) -> Result<TableMeta> {
    let mut source = BufReader::new(File::open(path.as_ref())?);
    let header = match parse_header(&mut source)? {
        Some(header) => header,
        None => return legacy::read_meta(path),
    };

    Ok(TableMeta {
        version: header.version,
        nr_of_rows: header.nr_of_rows,
        nr_of_cols: header.col_types.len(),
        col_names: header.names,
        col_types: header.col_types,
        key_col_index: header.key_col_index,
        nr_of_chunks: header.chunks_used,
    })
}

/// Read a column subset and row range from a stored table.
pub fn read_table(path: impl AsRef<Path>, request: &ReadRequest) -> Result<ReadResult> {
    let mut source = BufReader::new(File::open(path.as_ref())?);
    let header = match parse_header(&mut source)? {
        Some(header) => header,
        None => return legacy::read_table(path, request),
    };

    if header.chunks_used > 1 {
        return Err(Error::NotImplemented("multi-chunk read"));
    }

    let selection = resolve_selection(&header.names, request.columns.as_deref())?;
    let nr_of_rows = header.nr_of_rows as usize;
    let (first_row, n_rows) = clamp_row_range(request.from_row, request.to_row, nr_of_rows)?;

    debug!(
        path = %path.as_ref().display(),
        columns = selection.len(),
        first_row,
        n_rows,
        "reading table"
    );

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

    Ok(ReadResult {
        names,
        columns,
        keys,
    })
}

/// Parse and validate the header; `Ok(None)` means "not our magic, try the
/// legacy reader".
fn parse_header<R: Read + Seek>(source: &mut R) -> Result<Option<ParsedHeader>> {
    let mut fixed = [0u8; TABLE_META_SIZE];
    read_header_bytes(source, &mut fixed)?;

    let mut cursor = &fixed[..];
    let nr_of_cols = cursor.get_i32_le();
    let key_length = cursor.get_i32_le();
    let version = cursor.get_u32_le();
    let _chunks_per_index_row = cursor.get_u32_le();
    let magic = cursor.get_u64_le();

    if magic != FILE_MAGIC {
        return Ok(None);
    }
    if version > FORMAT_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    if nr_of_cols < 1 || key_length < 0 {
        return Err(Error::DamagedHeader(format!(
            "implausible column count {} or key count {}",
            nr_of_cols, key_length
        )));
    }
    let nr_of_cols = nr_of_cols as usize;
    let key_length = key_length as usize;

    let var_len = variable_meta_size(key_length, nr_of_cols);
    let mut var = vec![0u8; var_len];
    read_header_bytes(source, &mut var)?;
    let mut cursor = &var[..];

    let mut chunk_pos = [0u64; CHUNK_SLOTS];
    for slot in &mut chunk_pos {
        *slot = cursor.get_u64_le();
    }
    let mut chunk_rows = [0u64; CHUNK_SLOTS];
    for slot in &mut chunk_rows {
        *slot = cursor.get_u64_le();
    }
    let chunks_used = cursor.get_u32_le();

    let mut key_col_index = Vec::with_capacity(key_length);
    for _ in 0..key_length {
        let key = cursor.get_i32_le();
        if key < 0 || key as usize >= nr_of_cols {
            return Err(Error::DamagedHeader(format!(
                "key column index {} out of range",
                key
            )));
        }
        key_col_index.push(key as usize);
    }

    let mut col_types = Vec::with_capacity(nr_of_cols);
    for _ in 0..nr_of_cols {
        col_types.push(ColumnType::try_from(cursor.get_u16_le())?);
    }

    let names_offset = (TABLE_META_SIZE + var_len) as u64;
    let names = character::read(source, names_offset, 0, nr_of_cols, nr_of_cols)?
        .into_iter()
        .map(|name| {
            name.ok_or_else(|| Error::CorruptColumn("missing column name".to_string()))
        })
        .collect::<Result<Vec<String>>>()?;

    let mut offsets_raw = vec![0u8; 8 * nr_of_cols];
    read_exact_at(source, chunk_pos[0], &mut offsets_raw)?;
    let mut cursor = offsets_raw.as_slice();
    let col_offsets = (0..nr_of_cols).map(|_| cursor.get_u64_le()).collect();

    Ok(Some(ParsedHeader {
        version,
        nr_of_rows: chunk_rows[0],
        chunks_used,
        key_col_index,
        col_types,
        names,
        col_offsets,
    }))
}

/// Header bytes must exist in full; a truncated file is a damaged header,
/// not a short read.
fn read_header_bytes<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    source.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::DamagedHeader("file is incomplete or damaged".to_string())
        } else {
            Error::Io(e)
        }
    })
}
