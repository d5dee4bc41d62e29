//! FILENAME: tests/common/mod.rs
//! Fixtures for pivot-engine integration tests.

#![allow(dead_code)]

use resultbox::{record, Record, ResultBox, Store, Value, Variable};

/// (a, b, c) -> d over a full factorial, in a deliberately unsorted order.
pub const FACTORIAL: [(i64, i64, i64, i64); 8] = [
    (1, 1, 1, 11),
    (1, 2, 2, 12),
    (1, 2, 1, 13),
    (1, 1, 2, 14),
    (2, 1, 1, 15),
    (2, 1, 2, 16),
    (2, 2, 1, 17),
    (2, 2, 2, 18),
];

/// (a, b) -> the pair of values sampled at c = [1, 2].
pub const PAIRS: [(i64, i64, [i64; 2]); 4] = [
    (1, 1, [12, 30]),
    (1, 2, [13, 31]),
    (2, 1, [16, 34]),
    (2, 2, [19, 37]),
];

fn ab(a: i64, b: i64) -> Record {
    record! { "a" => a, "b" => b }
}

/// Scalar `d` per (a, b, c).
pub fn scalar_box() -> ResultBox {
    let mut rb = ResultBox::new();
    for (a, b, c, d) in FACTORIAL {
        rb.add_value(&record! { "a" => a, "b" => b, "c" => c }, "d", d)
            .expect("valid row");
    }
    rb
}

/// Vector `d` per (a, b) with the independent vector `c = [1, 2]`.
pub fn vector_box() -> ResultBox {
    let mut rb = ResultBox::new();
    for (a, b, d) in PAIRS {
        rb.add_value(&record! { "a" => a, "b" => b, "c" => vec![1, 2] }, "d", d.to_vec())
            .expect("valid row");
    }
    rb
}

/// Vector `d` per (a, b) and nothing else.
pub fn pair_box() -> ResultBox {
    let mut rb = ResultBox::new();
    for (a, b, d) in PAIRS {
        rb.add_value(&ab(a, b), "d", d.to_vec()).expect("valid row");
    }
    rb
}

/// `d = [d, d + 10]` per (a, b, c).
pub fn factorial_pair_box() -> ResultBox {
    let mut rb = ResultBox::new();
    for (a, b, c, d) in FACTORIAL {
        rb.add_value(&record! { "a" => a, "b" => b, "c" => c }, "d", vec![d, d + 10])
            .expect("valid row");
    }
    rb
}

/// `d` and a separately added `e`, both vectors, under the same (a, b).
pub fn split_box() -> ResultBox {
    let mut rb = ResultBox::new();
    rb.add_value(&ab(1, 1), "d", vec![12, 30]).expect("valid row");
    rb.add_value(&ab(1, 2), "d", vec![13, 31]).expect("valid row");
    rb.add_value(&ab(1, 1), "e", vec![1, 2]).expect("valid row");
    rb.add_value(&ab(1, 2), "e", vec![1, 2]).expect("valid row");
    rb
}

/// Dependent sample points `c` and values `d` per (a, b).
pub fn curve_box() -> ResultBox {
    let mut rb = ResultBox::new();
    for (a, b, d) in PAIRS {
        rb.add_dict(&ab(a, b), record! { "c" => vec![1, 2], "d" => d.to_vec() })
            .expect("valid row");
    }
    rb
}

/// 2D `d` (3 components x 2 samples) per b, with a = 1.
pub fn array_curve_box() -> ResultBox {
    let mut rb = ResultBox::new();
    let arrays = [
        vec![vec![1, 2], vec![3, 4], vec![5, 6]],
        vec![vec![7, 8], vec![9, 10], vec![11, 12]],
    ];
    for (b, d) in arrays.into_iter().enumerate() {
        rb.add_dict(&ab(1, b as i64 + 1), record! { "c" => vec![1, 2], "d" => d })
            .expect("valid row");
    }
    rb
}

/// A store holding `d` with x/y components, optionally with a unit.
pub fn component_store(unit: Option<&str>) -> (Store, Variable) {
    let mut variable = Variable::new("d").with_components(["x", "y"]);
    if let Some(unit) = unit {
        variable = variable.with_unit(unit);
    }
    let mut store = Store::new();
    store.add(variable.clone()).expect("unique variable");
    (store, variable)
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}
