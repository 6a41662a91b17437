//! JSON Table Documents
//!
//! The CLI's wire format for tables: a JSON object with one entry per
//! column plus an optional key list.
//!
//! ```json
//! {
//!   "columns": [
//!     {"name": "id",    "type": "integer",   "values": [1, 2, null]},
//!     {"name": "score", "type": "double",    "values": [0.5, null, 2.0]},
//!     {"name": "city",  "type": "factor",    "values": ["ams", "nyc", "ams"]},
//!     {"name": "ok",    "type": "boolean",   "values": [true, null, false]},
//!     {"name": "note",  "type": "character", "values": ["a", null, ""]}
//!   ],
//!   "keys": ["id"]
//! }
//! ```
//!
//! `null` always means the missing value; for integers that is the
//! `i32::MIN` sentinel, for doubles NaN. Factor levels may be given
//! explicitly via `"levels"`, otherwise they are collected from the values
//! in first-appearance order.

use anyhow::{bail, Result};
use framestore_storage::{Column, ColumnType, ReadResult, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct TableDocument {
    pub columns: Vec<ColumnDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<String>>,
    pub values: Vec<Value>,
}

impl TableDocument {
    pub fn into_table(self) -> Result<Table> {
        let mut names = Vec::with_capacity(self.columns.len());
        let mut columns = Vec::with_capacity(self.columns.len());
        for doc in self.columns {
            names.push(doc.name.clone());
            columns.push(doc.into_column()?);
        }
        Ok(Table::new(names, columns).with_keys(self.keys))
    }

    pub fn from_result(result: &ReadResult) -> Self {
        let columns = result
            .names
            .iter()
            .zip(&result.columns)
            .map(|(name, column)| ColumnDocument::from_column(name, column))
            .collect();
        Self {
            columns,
            keys: result.keys.clone(),
        }
    }
}

impl ColumnDocument {
    fn into_column(self) -> Result<Column> {
        let name = &self.name;
        match self.column_type {
            ColumnType::Integer => {
                let mut out = Vec::with_capacity(self.values.len());
                for v in &self.values {
                    out.push(match v {
                        Value::Null => i32::MIN,
                        Value::Number(n) => match n.as_i64().and_then(|x| i32::try_from(x).ok())
                        {
                            Some(x) => x,
                            None => bail!("column {name}: {n} is not a 32-bit integer"),
                        },
                        other => bail!("column {name}: expected integer, got {other}"),
                    });
                }
                Ok(Column::Integer(out))
            }
            ColumnType::Double => {
                let mut out = Vec::with_capacity(self.values.len());
                for v in &self.values {
                    out.push(match v {
                        Value::Null => f64::NAN,
                        Value::Number(n) => match n.as_f64() {
                            Some(x) => x,
                            None => bail!("column {name}: {n} is not a double"),
                        },
                        other => bail!("column {name}: expected number, got {other}"),
                    });
                }
                Ok(Column::Double(out))
            }
            ColumnType::Boolean => {
                let mut out = Vec::with_capacity(self.values.len());
                for v in &self.values {
                    out.push(match v {
                        Value::Null => None,
                        Value::Bool(b) => Some(*b),
                        other => bail!("column {name}: expected boolean, got {other}"),
                    });
                }
                Ok(Column::Boolean(out))
            }
            ColumnType::Character => {
                let mut out = Vec::with_capacity(self.values.len());
                for v in &self.values {
                    out.push(match v {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => bail!("column {name}: expected string, got {other}"),
                    });
                }
                Ok(Column::Character(out))
            }
            ColumnType::Factor => {
                let mut levels = self.levels.unwrap_or_default();
                let mut codes = Vec::with_capacity(self.values.len());
                for v in &self.values {
                    match v {
                        Value::Null => codes.push(i32::MIN),
                        Value::String(s) => {
                            let code = match levels.iter().position(|l| l == s) {
                                Some(i) => i + 1,
                                None => {
                                    levels.push(s.clone());
                                    levels.len()
                                }
                            };
                            codes.push(code as i32);
                        }
                        other => bail!("column {name}: expected string, got {other}"),
                    }
                }
                Ok(Column::Factor { levels, codes })
            }
        }
    }

    fn from_column(name: &str, column: &Column) -> Self {
        let column_type = column.column_type();
        let (levels, values) = match column {
            Column::Integer(values) => (
                None,
                values
                    .iter()
                    .map(|&v| {
                        if v == i32::MIN {
                            Value::Null
                        } else {
                            Value::from(v)
                        }
                    })
                    .collect(),
            ),
            Column::Double(values) => (
                None,
                values
                    .iter()
                    .map(|&v| {
                        if v.is_nan() {
                            Value::Null
                        } else {
                            Value::from(v)
                        }
                    })
                    .collect(),
            ),
            Column::Boolean(values) => (
                None,
                values
                    .iter()
                    .map(|v| v.map(Value::from).unwrap_or(Value::Null))
                    .collect(),
            ),
            Column::Character(values) => (
                None,
                values
                    .iter()
                    .map(|v| v.clone().map(Value::from).unwrap_or(Value::Null))
                    .collect(),
            ),
            Column::Factor { levels, codes } => (
                Some(levels.clone()),
                codes
                    .iter()
                    .map(|&code| {
                        usize::try_from(code)
                            .ok()
                            .filter(|&c| c >= 1 && c <= levels.len())
                            .map(|c| Value::from(levels[c - 1].clone()))
                            .unwrap_or(Value::Null)
                    })
                    .collect(),
            ),
        };
        Self {
            name: name.to_string(),
            column_type,
            levels,
            values,
        }
    }
}
