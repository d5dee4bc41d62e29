//! FILENAME: tests/common/mod.rs
//! Fixtures for resultbox integration tests.

#![allow(dead_code)]

use resultbox::{record, Key, Record, ResultBox, ResultRow, Value};

/// Rows where `d` and `e` share independent mappings but arrive separately.
pub fn lst3() -> ResultBox {
    ResultBox::from_rows(vec![
        ResultRow::new(0, record! { "a" => 1, "b" => 1 }, record! { "d" => vec![12, 30] }),
        ResultRow::new(1, record! { "a" => 1, "b" => 2 }, record! { "d" => vec![13, 31] }),
        ResultRow::new(4, record! { "a" => 1, "b" => 1 }, record! { "e" => vec![1, 2] }),
        ResultRow::new(7, record! { "a" => 1, "b" => 2 }, record! { "e" => vec![1, 2] }),
    ])
}

/// Full factorial over a, b, c in {1, 2} with d = 11..=18 in insertion order.
pub struct FactorialFixture;

impl FactorialFixture {
    pub fn rows() -> Vec<(Record, i64)> {
        [
            (1, 1, 1, 11),
            (1, 2, 2, 12),
            (1, 2, 1, 13),
            (1, 1, 2, 14),
            (2, 1, 1, 15),
            (2, 1, 2, 16),
            (2, 2, 1, 17),
            (2, 2, 2, 18),
        ]
        .into_iter()
        .map(|(a, b, c, d)| (record! { "a" => a, "b" => b, "c" => c }, d))
        .collect()
    }

    pub fn result_box() -> ResultBox {
        let mut b = ResultBox::new();
        for (indep, d) in Self::rows() {
            b.add_value(&indep, "d", d).expect("valid row");
        }
        b
    }
}

pub fn keys(names: &[&str]) -> Vec<Key> {
    names.iter().map(|n| Key::from(*n)).collect()
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}
