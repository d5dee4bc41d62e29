//! FILENAME: core/resultbox/src/result_box.rs
//! The Row Store: an append-only sequence of result rows.
//!
//! Every append assigns `index = len()`, validates the row, and folds it into
//! the Combiner so combined records never need a rescan. Rows are shared as
//! `Arc`s, which makes shallow copies cheap.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combiner::Combiner;
use crate::error::{BoxError, Result};
use crate::key::Key;
use crate::row::{CombinedRecord, ResultRow};
use crate::utils::interp::{orient_value, Orientation};
use crate::value::{Record, Value};

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxSettings {
    /// Replace size-1 arrays with their single element on insert.
    pub convert_scalar_arrays: bool,
    /// Log every appended row at debug level.
    pub log_updates: bool,
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// The dependent data of one `add` call.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A single key and its value (scalar, vector or 2D).
    Value { key: Key, value: Value },
    /// An explicit dependent mapping.
    Dict(Record),
    /// Several keys with a matching array; one axis must have `keys.len()` entries.
    Array { keys: Vec<Key>, values: Value },
}

// ============================================================================
// RESULT BOX
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ResultBox {
    rows: Vec<Arc<ResultRow>>,
    combiner: Combiner,
    /// One past the largest row index held.
    next_index: usize,
    pub settings: BoxSettings,
}

impl ResultBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: BoxSettings) -> Self {
        ResultBox {
            settings,
            ..Self::default()
        }
    }

    /// Rebuilds a box from persisted rows. Row indices are kept as given and
    /// new rows are numbered after the largest of them.
    pub fn from_rows(rows: Vec<ResultRow>) -> Self {
        let next_index = rows.iter().map(|r| r.index + 1).max().unwrap_or(0);
        let rows: Vec<Arc<ResultRow>> = rows.into_iter().map(Arc::new).collect();
        let combiner = Combiner::from_rows(rows.iter().map(|r| r.as_ref()));
        log::debug!(
            target: "BOX",
            "Rebuilt box from {} rows ({} combined records)",
            rows.len(),
            combiner.len()
        );
        ResultBox {
            rows,
            combiner,
            next_index,
            settings: BoxSettings::default(),
        }
    }

    // ------------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------------

    /// Appends a row and returns its index.
    pub fn append(&mut self, independent: Record, dependent: Record) -> Result<usize> {
        let index = self.next_index;
        let mut row = ResultRow::new(index, independent, dependent);
        validate_row(&row)?;
        if self.settings.convert_scalar_arrays {
            scalarise(&mut row.independent);
            scalarise(&mut row.dependent);
        }
        if self.settings.log_updates {
            log::debug!(target: "BOX", "\n{}", show_rows([&row]));
        }
        self.combiner.observe(&row);
        self.rows.push(Arc::new(row));
        self.next_index += 1;
        Ok(index)
    }

    pub fn add(&mut self, independent: &Record, payload: Payload) -> Result<usize> {
        match payload {
            Payload::Value { key, value } => self.add_value(independent, key, value),
            Payload::Dict(dependent) => self.add_dict(independent, dependent),
            Payload::Array { keys, values } => self.add_array(independent, &keys, &values),
        }
    }

    pub fn add_value(
        &mut self,
        independent: &Record,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<usize> {
        let mut dependent = Record::new();
        dependent.insert(key.into(), value.into());
        self.add_dict(independent, dependent)
    }

    pub fn add_dict(&mut self, independent: &Record, dependent: Record) -> Result<usize> {
        self.append(independent.clone(), dependent)
    }

    /// Pairs each key with one slice of `values`.
    ///
    /// A 2D `values` is re-oriented so it has one row per key. A 1D `values`
    /// gives each key a single element.
    pub fn add_array(&mut self, independent: &Record, keys: &[Key], values: &Value) -> Result<usize> {
        let slices = if values.ndim() > 1 {
            orient_value(values, keys.len(), Orientation::Rows)?.elements()
        } else {
            values.elements()
        };
        if slices.len() != keys.len() {
            return Err(BoxError::shape("add_array values", keys.len(), values.shape()));
        }
        let dependent: Record = keys.iter().cloned().zip(slices).collect();
        self.add_dict(independent, dependent)
    }

    // ------------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------------

    pub fn rows(&self) -> &[Arc<ResultRow>] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultRow> {
        self.rows.get(index).map(|r| r.as_ref())
    }

    /// The value of `key` at row `index`, dependent first.
    pub fn item(&self, index: usize, key: &str) -> Result<&Value> {
        let row = self
            .get(index)
            .ok_or_else(|| BoxError::KeyNotFound(format!("row {}", index)))?;
        row.dependent
            .get(key)
            .or_else(|| row.independent.get(key))
            .ok_or_else(|| BoxError::KeyNotFound(key.to_string()))
    }

    /// Distinct keys across all rows.
    pub fn keys(&self, dependent: bool, independent: bool) -> BTreeSet<Key> {
        let mut out = BTreeSet::new();
        for row in self.iter() {
            if independent {
                out.extend(row.independent.keys().cloned());
            }
            if dependent {
                out.extend(row.dependent.keys().cloned());
            }
        }
        out
    }

    pub fn combined(&self) -> &[CombinedRecord] {
        self.combiner.combined()
    }

    pub fn minimal(&self) -> Vec<Record> {
        self.combiner.minimal()
    }

    // ------------------------------------------------------------------------
    // Whole-box operations
    // ------------------------------------------------------------------------

    /// Appends the rows of other boxes, renumbering them to follow this box.
    pub fn merge(&mut self, others: &[&ResultBox]) {
        let before = self.rows.len();
        for other in others {
            for row in &other.rows {
                let mut row = ResultRow::clone(row);
                row.index = self.next_index;
                self.next_index += 1;
                self.combiner.observe(&row);
                self.rows.push(Arc::new(row));
            }
        }
        log::debug!(
            target: "BOX",
            "Merged {} rows from {} boxes",
            self.rows.len() - before,
            others.len()
        );
    }

    /// Like `merge`, but on a deep copy; this box is left untouched.
    pub fn merged(&self, others: &[&ResultBox]) -> ResultBox {
        let mut base = self.copy();
        base.merge(others);
        base
    }

    /// A fully independent copy.
    pub fn copy(&self) -> ResultBox {
        ResultBox {
            rows: self
                .rows
                .iter()
                .map(|r| Arc::new(ResultRow::clone(r)))
                .collect(),
            combiner: self.combiner.clone(),
            next_index: self.next_index,
            settings: self.settings.clone(),
        }
    }

    /// A copy that shares row storage with this box.
    pub fn copy_shallow(&self) -> ResultBox {
        self.clone()
    }

    /// A three-column text dump of all rows.
    pub fn show(&self) -> String {
        show_rows(self.iter())
    }
}

// ============================================================================
// ROW VALIDATION
// ============================================================================

/// 2D values must line up with their variable's components.
pub fn validate_row(row: &ResultRow) -> Result<()> {
    for (key, value) in row.independent.iter().chain(row.dependent.iter()) {
        if value.is_none() {
            continue;
        }
        let shape = value.shape();
        if shape.len() <= 1 {
            continue;
        }
        if shape.len() > 2 {
            return Err(BoxError::InvalidValue(format!(
                "{}: values may have at most 2 dimensions, got shape {:?}",
                key, shape
            )));
        }
        if shape.contains(&1) {
            continue;
        }
        if let Some(components) = key.components() {
            if !shape.contains(&components.len()) {
                return Err(BoxError::shape(key.as_str(), components.len(), shape));
            }
        }
    }
    Ok(())
}

fn scalarise(record: &mut Record) {
    for value in record.values_mut() {
        if let Value::Array(array) = value {
            if let Some(item) = array.scalar() {
                *value = item;
            }
        }
    }
}

// ============================================================================
// TEXT DUMP
// ============================================================================

const INDEX_WIDTH: usize = 7;
const COLUMN_WIDTH: usize = 60;

fn shape_str(shape: &[usize]) -> String {
    match shape {
        [n] => format!("({},)", n),
        _ => format!(
            "({})",
            shape.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Short form of a value: large or multi-dimensional values show their shape.
fn brief(value: &Value) -> String {
    let shape = value.shape();
    let size: usize = shape.iter().product();
    if shape.is_empty() {
        value.to_string()
    } else if size == 1 {
        value.elements().first().map(|v| brief(v)).unwrap_or_default()
    } else if size > 3 || shape.len() > 1 {
        shape_str(&shape)
    } else {
        value.to_string()
    }
}

/// Renders rows as index, independent and dependent columns.
pub fn show_rows<'a>(rows: impl IntoIterator<Item = &'a ResultRow>) -> String {
    let mut out = vec![format!(
        "{:<iw$}{:<cw$}{}",
        "index",
        "independent",
        "dependent",
        iw = INDEX_WIDTH,
        cw = COLUMN_WIDTH
    )];
    for row in rows {
        let indep: Vec<String> = row
            .independent
            .iter()
            .map(|(k, v)| format!("{}: {}", k, brief(v)))
            .collect();
        let dep: Vec<String> = row
            .dependent
            .iter()
            .map(|(k, v)| format!("{}: {}", k, brief(v)))
            .collect();
        let lines = indep.len().max(dep.len()).max(1);
        for i in 0..lines {
            let index = if i == 0 { row.index.to_string() } else { String::new() };
            let line = format!(
                "{:<iw$}{:<cw$}{}",
                index,
                indep.get(i).map(String::as_str).unwrap_or(""),
                dep.get(i).map(String::as_str).unwrap_or(""),
                iw = INDEX_WIDTH,
                cw = COLUMN_WIDTH
            );
            out.push(line.trim_end().to_string());
        }
        out.push(String::new());
    }
    out.join("\n")
}

impl fmt::Display for ResultBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::value::NdArray;
    use crate::variable::Variable;

    #[test]
    fn test_add_value() {
        let mut b = ResultBox::new();
        let idx = b.add_value(&record! { "a" => 1, "b" => 2 }, "test", 7).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(b.len(), 1);
        let expected = ResultRow::new(0, record! { "a" => 1, "b" => 2 }, record! { "test" => 7 });
        assert_eq!(b.get(0), Some(&expected));
    }

    #[test]
    fn test_independent_is_copied() {
        let mut b = ResultBox::new();
        let mut indep = record! { "a" => 1, "b" => 2 };
        b.add_value(&indep, "test", 7).unwrap();
        indep.insert(Key::from("b"), Value::Int(3));
        b.add_value(&indep, "test", 8).unwrap();
        assert_eq!(b.get(0).unwrap().independent.get("b"), Some(&Value::Int(2)));
        assert_eq!(b.combined().len(), 2);
    }

    #[test]
    fn test_index_equals_position() {
        let mut b = ResultBox::new();
        for i in 0..5 {
            b.add_value(&record! { "i" => i }, "x", i * 2).unwrap();
        }
        for (pos, row) in b.iter().enumerate() {
            assert_eq!(row.index, pos);
        }
    }

    #[test]
    fn test_append_after_rebuild_skips_used_indices() {
        let mut b = ResultBox::from_rows(vec![
            ResultRow::new(0, record! { "a" => 1 }, record! { "d" => 1 }),
            ResultRow::new(5, record! { "a" => 2 }, record! { "d" => 2 }),
        ]);
        assert_eq!(b.add_value(&record! { "a" => 3 }, "d", 3).unwrap(), 6);

        let other = ResultBox::from_rows(vec![ResultRow::new(0, record! { "a" => 4 }, record! { "d" => 4 })]);
        b.merge(&[&other]);
        let indices: Vec<usize> = b.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 5, 6, 7]);
    }

    #[test]
    fn test_add_payload_dispatch() {
        let mut b = ResultBox::new();
        let indep = record! { "a" => 1 };
        b.add(&indep, Payload::Value { key: "x".into(), value: 1.into() }).unwrap();
        b.add(&indep, Payload::Dict(record! { "y" => 2 })).unwrap();
        b.add(
            &indep,
            Payload::Array {
                keys: vec!["p".into(), "q".into()],
                values: Value::from(vec![vec![1, 2, 3], vec![4, 5, 6]]),
            },
        )
        .unwrap();
        assert_eq!(b.len(), 3);
        let merged = &b.combined()[0].dependent;
        assert_eq!(merged.get("q"), Some(&Value::from(vec![4, 5, 6])));
    }

    #[test]
    fn test_add_array_orients() {
        let mut b = ResultBox::new();
        let tall = NdArray::from_rows(vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]).unwrap();
        b.add_array(&Record::new(), &["p".into(), "q".into()], &Value::Array(tall))
            .unwrap();
        let dep = &b.get(0).unwrap().dependent;
        assert_eq!(dep.get("p"), Some(&Value::Array(NdArray::from_vec(vec![1.0, 2.0, 3.0]))));
        assert_eq!(dep.get("q"), Some(&Value::Array(NdArray::from_vec(vec![4.0, 5.0, 6.0]))));
    }

    #[test]
    fn test_add_array_shape_mismatch() {
        let mut b = ResultBox::new();
        let values = Value::from(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        let err = b
            .add_array(&Record::new(), &["a".into(), "b".into(), "c".into(), "d".into()], &values)
            .unwrap_err();
        assert!(matches!(err, BoxError::ShapeMismatch { expected: 4, .. }));
        assert!(b.is_empty());
    }

    #[test]
    fn test_validate_components() {
        let pos = Variable::new("pos").with_components(["x", "y", "z"]);
        let mut b = ResultBox::new();
        let good = Value::from(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert!(b.add_value(&Record::new(), pos.clone(), good).is_ok());

        let bad = Value::from(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let err = b.add_value(&Record::new(), pos, bad).unwrap_err();
        assert!(matches!(err, BoxError::ShapeMismatch { expected: 3, .. }));

        // keys without components accept any 2D value
        let plain = Value::from(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(b.add_value(&Record::new(), "m", plain).is_ok());
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_convert_scalar_arrays() {
        let mut b = ResultBox::with_settings(BoxSettings {
            convert_scalar_arrays: true,
            ..BoxSettings::default()
        });
        b.add_value(&Record::new(), "x", NdArray::from_vec(vec![2.5])).unwrap();
        assert_eq!(b.item(0, "x").unwrap(), &Value::Float(2.5));
    }

    #[test]
    fn test_item_and_keys() {
        let mut b = ResultBox::new();
        b.add_value(&record! { "a" => 1 }, "d", 4).unwrap();
        assert_eq!(b.item(0, "d").unwrap(), &Value::Int(4));
        assert_eq!(b.item(0, "a").unwrap(), &Value::Int(1));
        assert!(matches!(b.item(0, "z"), Err(BoxError::KeyNotFound(_))));
        assert!(matches!(b.item(3, "d"), Err(BoxError::KeyNotFound(_))));

        let keys: Vec<String> = b.keys(true, true).iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "d"]);
        assert_eq!(b.keys(true, false).len(), 1);
    }

    #[test]
    fn test_merge_renumbers_and_combines() {
        let indep = record! { "a" => 1, "b" => 2 };
        let mut b1 = ResultBox::new();
        let mut b2 = ResultBox::new();
        b1.add_value(&indep, "test", 7).unwrap();
        b2.add_value(&indep, "test2", 8).unwrap();

        let b3 = b1.merged(&[&b2]);
        assert_eq!(b1.len(), 1);
        assert_eq!(b3.len(), 2);
        assert_eq!(b3.get(1).unwrap().index, 1);
        assert_eq!(b3.combined().len(), 1);

        b1.merge(&[&b2]);
        assert_eq!(b1.len(), 2);
        assert_eq!(b1.get(1).unwrap().dependent, record! { "test2" => 8 });
        // the source box keeps its own numbering
        assert_eq!(b2.get(0).unwrap().index, 0);
    }

    #[test]
    fn test_copies() {
        let mut b = ResultBox::new();
        b.add_value(&record! { "a" => 1 }, "d", 1).unwrap();
        let shallow = b.copy_shallow();
        let deep = b.copy();
        assert!(Arc::ptr_eq(&shallow.rows()[0], &b.rows()[0]));
        assert!(!Arc::ptr_eq(&deep.rows()[0], &b.rows()[0]));
        assert_eq!(deep.get(0), b.get(0));

        b.add_value(&record! { "a" => 2 }, "d", 2).unwrap();
        assert_eq!(shallow.len(), 1);
        assert_eq!(deep.combined().len(), 1);
    }

    #[test]
    fn test_show() {
        let mut b = ResultBox::new();
        b.add_value(&record! { "a" => 1 }, "d", vec![1, 2, 3, 4, 5]).unwrap();
        let text = b.show();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("index  independent"));
        assert!(lines[1].starts_with("0      a: 1"));
        assert!(lines[1].ends_with("d: (5,)"));
    }
}
