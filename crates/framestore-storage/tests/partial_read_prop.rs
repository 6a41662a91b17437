//! Property tests for the partial-read law
//!
//! For any column contents, compression level, and in-bounds `(first, n)`,
//! the slice read back equals the original slice. Sizes hover around one
//! block boundary so head/tail/interior block handling all get exercised.

use framestore_storage::{read_table, write_table, Column, ReadRequest, Table};
use proptest::prelude::*;
use tempfile::TempDir;

fn integer_column() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(
        prop_oneof![
            5 => any::<i32>(),
            1 => Just(i32::MIN),
        ],
        1..600,
    )
}

fn character_column() -> impl Strategy<Value = Vec<Option<String>>> {
    prop::collection::vec(
        prop_oneof![
            1 => Just(None::<String>),
            1 => Just(Some(String::new())),
            4 => "[a-z0-9]{0,16}".prop_map(Some),
        ],
        1..300,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_integer_partial_reads(
        values in integer_column(),
        level in 0u32..=100,
        first_frac in 0.0f64..1.0,
        len_frac in 0.0f64..=1.0,
    ) {
        let n = values.len();
        let first = ((n as f64 - 1.0) * first_frac) as usize;
        let len = 1 + ((n - first - 1) as f64 * len_frac) as usize;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.fsf");
        let table = Table::new(vec!["v".to_string()], vec![Column::Integer(values.clone())]);
        write_table(&path, &table, level).unwrap();

        let request = ReadRequest { columns: None, from_row: first, to_row: Some(first + len) };
        let result = read_table(&path, &request).unwrap();
        prop_assert_eq!(
            &result.columns[0],
            &Column::Integer(values[first..first + len].to_vec())
        );
    }

    #[test]
    fn prop_character_partial_reads(
        values in character_column(),
        level in 0u32..=100,
        first_frac in 0.0f64..1.0,
    ) {
        let n = values.len();
        let first = ((n as f64 - 1.0) * first_frac) as usize;
        let len = n - first;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.fsf");
        let table = Table::new(vec!["v".to_string()], vec![Column::Character(values.clone())]);
        write_table(&path, &table, level).unwrap();

        let request = ReadRequest { columns: None, from_row: first, to_row: Some(first + len) };
        let result = read_table(&path, &request).unwrap();
        prop_assert_eq!(
            &result.columns[0],
            &Column::Character(values[first..first + len].to_vec())
        );
    }
}
