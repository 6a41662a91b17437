//! Shared types for the framestore columnar storage engine.
//!
//! This crate holds everything both the engine and its embedders need:
//! the error type, the typed column model, table metadata, and the
//! compression-plan values the planner produces. It deliberately has no
//! I/O; the engine itself lives in `framestore-storage`.

pub mod column;
pub mod error;
pub mod plan;
pub mod table;

pub use column::{Column, ColumnType};
pub use error::{Error, ErrorKind, Result};
pub use plan::{plan_for, CompressAlgo, CompressionPlan, Stage};
pub use table::{Table, TableMeta};
