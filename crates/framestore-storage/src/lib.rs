//! Framestore Storage Engine
//!
//! This crate implements the framestore file format: a block-compressed
//! columnar layout for tabular datasets, built for reading a few columns
//! of a wide table at memory-bandwidth speeds.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐
//! │  host table  │  typed columns (framestore-core)
//! └──────┬───────┘
//!        │ write_table
//!        ▼
//! ┌──────────────────┐
//! │   TableWriter    │  header, chunk index, names, offset table
//! └──────┬───────────┘
//!        │ per column
//!        ▼
//! ┌──────────────────┐
//! │   ColumnCodec    │  type-specific pre/post processing
//! └──────┬───────────┘
//!        │ fixed-width blocks
//!        ▼
//! ┌──────────────────┐
//! │  BlockStreamer   │  block index + per-block compression
//! └──────┬───────────┘
//!        │ bytes
//!        ▼
//! ┌──────────────────┐
//! │ ByteCompressor   │  identity / LZ4 / zstd / shuffle / bit-pack
//! └──────────────────┘
//! ```
//!
//! Reads run the same stack bottom-up, but touch only the blocks covering
//! the requested rows of the selected columns.
//!
//! ## Main Entry Points
//!
//! - [`write_table`]: store a table at a path, compression level 0..=100
//! - [`read_meta`]: parse a file's header into a [`TableMeta`]
//! - [`read_table`]: read a column subset and row range
//! - [`legacy`]: reader for pre-magic beta files (also reachable
//!   transparently through [`read_meta`] / [`read_table`])
//!
//! ## Concurrency Model
//!
//! Every operation is synchronous and owns its file handle exclusively;
//! the format itself would permit column-parallel reads (each column is
//! independent and its offset is known), but this crate does not spawn.

mod column;
mod compression;
mod stream;

pub mod legacy;
pub mod table;

pub use framestore_core::{
    Column, ColumnType, Error, ErrorKind, Result, Table, TableMeta,
};
pub use table::{
    read_meta, read_table, write_table, ReadRequest, ReadResult, FILE_MAGIC, FORMAT_VERSION,
    TABLE_META_SIZE,
};
