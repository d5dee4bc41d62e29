//! FILENAME: tests/common/mod.rs
//! Fixtures for persistence integration tests.

#![allow(dead_code)]

use resultbox::{record, ArrayData, Key, NdArray, Record, ResultBox, Value, Variable};

/// A box mixing scalars, lists, nested maps, arrays and Variable keys.
pub fn mixed_box() -> ResultBox {
    let force = Variable::new("force")
        .with_unit("N")
        .with_doc("Reaction force")
        .with_components(["x", "y", "z"])
        .with_category("loads")
        .with_tags(["fea"])
        .with_identifier("F1");
    let mut rb = ResultBox::new();

    let mut dependent = Record::new();
    dependent.insert(
        Key::from(force),
        Value::Array(
            NdArray::new(vec![3, 2], ArrayData::Float(vec![1.0, 2.0, 3.0, 4.0, 5.5, 6.0]))
                .expect("shape matches"),
        ),
    );
    dependent.insert(Key::from("count"), Value::Int(7));
    rb.add_dict(&record! { "a" => 1, "name" => "first" }, dependent)
        .expect("valid row");

    rb.add_dict(
        &record! { "a" => 2, "flag" => true, "missing" => Value::None },
        record! {
            "list" => vec![1.5, 2.5],
            "ids" => Value::Array(NdArray::from_int_vec(vec![3, 4, 5])),
            "nested" => record! { "inner" => 3, "deeper" => record! { "x" => "y" } },
        },
    )
    .expect("valid row");
    rb
}
