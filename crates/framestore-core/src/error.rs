//! Error Types for Framestore
//!
//! This module defines all error types that can occur in framestore operations.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! - `Io`: file open/read/write/seek failures
//! - `ShortRead`: the file ended before a complete structure could be read
//!
//! ### Format Errors
//! - `DamagedHeader`: the table header is incomplete or inconsistent
//! - `UnsupportedVersion`: file was written by a newer format version
//! - `UnknownColumnType`: a column type code outside the known set
//! - `CorruptBlockIndex`: non-monotonic block offsets, or a block covering
//!   rows beyond the column's row count
//! - `CorruptColumn`: a decompressed block payload fails its own invariants
//! - `MalformedLegacyHeader`: a pre-magic file whose header does not parse
//!
//! ### Codec Errors
//! - `UnknownCodec`: an algorithm id we cannot decompress
//! - `Compression` / `Decompression`: the byte compressor failed
//!
//! ### Argument Errors
//! - `InvalidCompressionLevel`, `EmptyTable`, `NoColumns`,
//!   `ColumnLengthMismatch`, `UnknownColumn`, `UnknownKey`,
//!   `RangeOutOfBounds`
//!
//! ## Usage
//!
//! All framestore operations return `Result<T>` which is aliased to
//! `Result<T, Error>`, allowing `?` propagation throughout the engine. Every
//! error maps to a stable [`ErrorKind`] so embedders and the CLI can turn
//! failures into exit codes without matching on individual variants.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], stable across releases.
///
/// The numeric codes double as CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The operating system failed us.
    Io,
    /// The file contents are not a valid framestore table.
    Format,
    /// The caller asked for something impossible.
    Argument,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Io => 1,
            ErrorKind::Format => 2,
            ErrorKind::Argument => 3,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of file")]
    ShortRead,

    #[error("damaged table header: {0}")]
    DamagedHeader(String),

    #[error("incompatible file: written by format version {0}")]
    UnsupportedVersion(u32),

    #[error("unknown column type code: {0}")]
    UnknownColumnType(u16),

    #[error("corrupt block index: {0}")]
    CorruptBlockIndex(String),

    #[error("corrupt column data: {0}")]
    CorruptColumn(String),

    #[error("malformed legacy header: {0}")]
    MalformedLegacyHeader(String),

    #[error("unknown compression algorithm id: {0}")]
    UnknownCodec(u16),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("feature not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("compression must be in range 0 to 100, got {0}")]
    InvalidCompressionLevel(u32),

    #[error("the dataset contains no data")]
    EmptyTable,

    #[error("the dataset needs at least one column")]
    NoColumns,

    #[error("column {column} has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("table has {names} names for {columns} columns")]
    NameCountMismatch { names: usize, columns: usize },

    #[error("selected column not found: {0}")]
    UnknownColumn(String),

    #[error("key column not found: {0}")]
    UnknownKey(String),

    #[error("row selection {first}..{last} is out of range for {rows} rows")]
    RangeOutOfBounds {
        first: usize,
        last: usize,
        rows: usize,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::ShortRead
            | Error::DamagedHeader(_)
            | Error::UnsupportedVersion(_)
            | Error::UnknownColumnType(_)
            | Error::CorruptBlockIndex(_)
            | Error::CorruptColumn(_)
            | Error::MalformedLegacyHeader(_)
            | Error::UnknownCodec(_)
            | Error::Compression(_)
            | Error::Decompression(_)
            | Error::NotImplemented(_) => ErrorKind::Format,
            Error::InvalidCompressionLevel(_)
            | Error::EmptyTable
            | Error::NoColumns
            | Error::ColumnLengthMismatch { .. }
            | Error::NameCountMismatch { .. }
            | Error::UnknownColumn(_)
            | Error::UnknownKey(_)
            | Error::RangeOutOfBounds { .. } => ErrorKind::Argument,
        }
    }
}
