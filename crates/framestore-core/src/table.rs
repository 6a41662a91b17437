//! Table Metadata and Construction
//!
//! A table is a rectangular set of named, typed columns with an identical
//! row count, plus an optional sort key (a list of column names carried as
//! metadata only).
//!
//! [`TableMeta`] is what [`meta`] returns without touching column data:
//! everything the header knows about a file. It derives serde traits so the
//! CLI can print it as JSON.
//!
//! [`meta`]: https://docs.rs/framestore-storage

use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnType};

/// An in-memory table handed to the writer or assembled by the reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column names, one per column, unique.
    pub names: Vec<String>,

    /// Column data, all of identical length.
    pub columns: Vec<Column>,

    /// Names of the key (sort) columns, possibly empty.
    pub keys: Vec<String>,
}

impl Table {
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> Self {
        Self {
            names,
            columns,
            keys: Vec::new(),
        }
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }

    /// Row count of the first column, or zero for a column-less table.
    pub fn nr_of_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn nr_of_cols(&self) -> usize {
        self.columns.len()
    }
}

/// Header-level description of a stored table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Format version the file was written with (0 for legacy files).
    pub version: u32,

    pub nr_of_rows: u64,
    pub nr_of_cols: usize,

    /// Column names in on-disk order.
    pub col_names: Vec<String>,

    /// Column type tags in on-disk order.
    pub col_types: Vec<ColumnType>,

    /// Indices of the key columns into `col_names`.
    pub key_col_index: Vec<usize>,

    /// Number of horizontal chunks in the file (always 1 in version 1).
    pub nr_of_chunks: u32,
}

impl TableMeta {
    /// Names of the key columns, in key order.
    pub fn key_names(&self) -> Vec<String> {
        self.key_col_index
            .iter()
            .map(|&i| self.col_names[i].clone())
            .collect()
    }
}
