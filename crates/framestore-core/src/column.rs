//! Column Data Model
//!
//! This module defines the typed column handles exchanged between a host
//! data-frame bridge and the storage engine.
//!
//! ## Column Types
//!
//! A framestore table holds five kinds of columns, each with a stable
//! on-disk type code:
//!
//! | code | type      | element          | missing value          |
//! |------|-----------|------------------|------------------------|
//! | 6    | Character | UTF-8 string     | `None`                 |
//! | 7    | Factor    | level index      | `i32::MIN`             |
//! | 8    | Integer   | `i32`            | `i32::MIN` (host)      |
//! | 9    | Double    | `f64`            | NaN (host)             |
//! | 10   | Boolean   | three-state bool | `None`                 |
//!
//! ## Design Decisions
//!
//! - Integer and double columns carry their missing sentinel *inside* the
//!   value domain; the engine stores those bit patterns verbatim and never
//!   interprets them.
//! - Boolean missingness is a real third state: it survives the 2-bit
//!   on-disk packing.
//! - Factor codes are 1-based indices into the level list, matching the
//!   convention of the statistical hosts this format serves.

use serde::{Deserialize, Serialize};

/// On-disk column type tag.
///
/// The numeric codes are part of the file format and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Character = 6,
    Factor = 7,
    Integer = 8,
    Double = 9,
    Boolean = 10,
}

impl ColumnType {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for ColumnType {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            6 => Ok(ColumnType::Character),
            7 => Ok(ColumnType::Factor),
            8 => Ok(ColumnType::Integer),
            9 => Ok(ColumnType::Double),
            10 => Ok(ColumnType::Boolean),
            _ => Err(crate::Error::UnknownColumnType(value)),
        }
    }
}

/// A single typed column, owned.
///
/// Every variant holds exactly one element per table row.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Character(Vec<Option<String>>),
    Factor { levels: Vec<String>, codes: Vec<i32> },
    Integer(Vec<i32>),
    Double(Vec<f64>),
    Boolean(Vec<Option<bool>>),
}

impl Column {
    /// Number of elements (table rows) in this column.
    pub fn len(&self) -> usize {
        match self {
            Column::Character(v) => v.len(),
            Column::Factor { codes, .. } => codes.len(),
            Column::Integer(v) => v.len(),
            Column::Double(v) => v.len(),
            Column::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The on-disk type tag for this column.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Character(_) => ColumnType::Character,
            Column::Factor { .. } => ColumnType::Factor,
            Column::Integer(_) => ColumnType::Integer,
            Column::Double(_) => ColumnType::Double,
            Column::Boolean(_) => ColumnType::Boolean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes_are_stable() {
        assert_eq!(ColumnType::Character.code(), 6);
        assert_eq!(ColumnType::Factor.code(), 7);
        assert_eq!(ColumnType::Integer.code(), 8);
        assert_eq!(ColumnType::Double.code(), 9);
        assert_eq!(ColumnType::Boolean.code(), 10);
    }

    #[test]
    fn test_type_code_roundtrip() {
        for code in [6u16, 7, 8, 9, 10] {
            let ty = ColumnType::try_from(code).unwrap();
            assert_eq!(ty.code(), code);
        }
    }

    #[test]
    fn test_unknown_type_code_rejected() {
        for code in [0u16, 1, 5, 11, 255] {
            assert!(ColumnType::try_from(code).is_err());
        }
    }

    #[test]
    fn test_column_len_and_type() {
        let col = Column::Integer(vec![1, 2, 3]);
        assert_eq!(col.len(), 3);
        assert_eq!(col.column_type(), ColumnType::Integer);

        let col = Column::Factor {
            levels: vec!["a".to_string(), "b".to_string()],
            codes: vec![1, 2, 1, 1],
        };
        assert_eq!(col.len(), 4);
        assert_eq!(col.column_type(), ColumnType::Factor);

        let col = Column::Boolean(vec![]);
        assert!(col.is_empty());
    }
}
