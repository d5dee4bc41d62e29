//! FILENAME: tests/test_vector_table.rs
//! Integration tests for vector tables.

mod common;

use common::{array_curve_box, curve_box, ints};
use pivot_engine::{vector_table, Orient, VectorTableSpec};
use resultbox::utils::interp::{Fill, InterpOptions};
use resultbox::{record, Key, ResultBox, Value, Variable};

// ============================================================================
// 1D VALUES
// ============================================================================

#[test]
fn test_vector_table_rows() {
    let spec = VectorTableSpec::new("d", "c").with_index_vals(vec![1.0, 2.0]);
    let table = vector_table(&curve_box(), &spec).unwrap();
    assert_eq!(
        table.to_string(),
        "a     1           2      \nb     1     2     1     2\nc                        \n1  12.0  13.0  16.0  19.0\n2  30.0  31.0  34.0  37.0"
    );
}

#[test]
fn test_vector_table_cols() {
    let spec = VectorTableSpec::new("d", "c")
        .with_index_vals(vec![1.0, 2.0])
        .with_orient(Orient::Cols);
    let table = vector_table(&curve_box(), &spec).unwrap();
    assert_eq!(
        table.to_string(),
        "c       1     2\na b            \n1 1  12.0  30.0\n  2  13.0  31.0\n2 1  16.0  34.0\n  2  19.0  37.0"
    );
}

#[test]
fn test_vector_table_shared_points_skip_interpolation() {
    let table = vector_table(&curve_box(), &VectorTableSpec::new("d", "c")).unwrap();
    assert_eq!(table.get(&ints(&[2]), &ints(&[2, 2])), Some(&Value::Int(37)));
}

#[test]
fn test_vector_table_interpolates_between_points() {
    let spec = VectorTableSpec::new("d", "c").with_index_vals(vec![1.5]);
    let table = vector_table(&curve_box(), &spec).unwrap();
    assert_eq!(table.row_axis.labels, vec![vec![Value::Float(1.5)]]);
    assert_eq!(table.get(&[Value::Float(1.5)], &ints(&[1, 1])), Some(&Value::Float(21.0)));
}

#[test]
fn test_vector_table_fill_policy() {
    let mut spec = VectorTableSpec::new("d", "c").with_index_vals(vec![0.0, 3.0]);
    let clamped = vector_table(&curve_box(), &spec).unwrap();
    assert_eq!(clamped.cells[0][0], Some(Value::Float(12.0)));
    assert_eq!(clamped.cells[1][0], Some(Value::Float(30.0)));

    spec.interp = InterpOptions {
        fill: Fill::Nan,
        ..InterpOptions::default()
    };
    let table = vector_table(&curve_box(), &spec).unwrap();
    assert!(table.values()[0][0].as_f64().map(f64::is_nan).unwrap_or(false));
}

#[test]
fn test_vector_table_without_combining() {
    let mut rb = curve_box();
    rb.add_dict(&record! { "a" => 1, "b" => 1 }, record! { "c" => vec![1, 2], "d" => vec![0, 0] })
        .unwrap();
    let combined = vector_table(&rb, &VectorTableSpec::new("d", "c")).unwrap();
    assert_eq!(combined.shape(), (2, 4));
    let rows = vector_table(&rb, &VectorTableSpec::new("d", "c").with_combine(false)).unwrap();
    assert_eq!(rows.shape(), (2, 5));
}

// ============================================================================
// 2D VALUES
// ============================================================================

#[test]
fn test_vector_table_components() {
    let spec = VectorTableSpec::new("d", "c")
        .with_index_vals(vec![1.0, 2.0])
        .with_components(["x", "y", "z"]);
    let table = vector_table(&array_curve_box(), &spec).unwrap();
    assert_eq!(
        table.to_string(),
        "a     1                           \nb     1              2            \nd:    x    y    z    x     y     z\nc                                 \n1   1.0  3.0  5.0  7.0   9.0  11.0\n2   2.0  4.0  6.0  8.0  10.0  12.0"
    );
}

#[test]
fn test_vector_table_components_from_variable() {
    let d = Variable::new("d").with_unit("m").with_components(["x", "y", "z"]);
    let mut dependent = record! { "c" => vec![1, 2] };
    dependent.insert(Key::from(d.clone()), Value::from(vec![vec![1, 2], vec![3, 4], vec![5, 6]]));
    let mut rb = ResultBox::new();
    rb.add_dict(&record! { "a" => 1 }, dependent).unwrap();
    let table = vector_table(&rb, &VectorTableSpec::new(d, "c")).unwrap();
    assert_eq!(table.col_axis.names, vec!["a".to_string(), "d:".to_string()]);
    assert_eq!(table.col_axis.labels[2], vec![Value::Int(1), Value::from("z [m]")]);
    assert_eq!(table.cells[1][2], Some(Value::Int(6)));
}
