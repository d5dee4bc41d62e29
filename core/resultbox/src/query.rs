//! FILENAME: core/resultbox/src/query.rs
//! Query Engine: filtering and projection over rows and combined records.
//!
//! The free functions work on any slice of `Entry` values (rows, combined
//! records or flat records). `ResultBox` exposes the same operations over its
//! own rows or combined records.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::combiner::{fingerprint, Fingerprint};
use crate::error::{BoxError, Result};
use crate::key::Key;
use crate::result_box::ResultBox;
use crate::row::{Entry, ResultRow};
use crate::utils::format::{dict_to_str, DictFormat};
use crate::utils::interp::{orient, Orientation};
use crate::value::{sorted_unique, try_cmp_slices, try_sort_by, Record, Value};

// ============================================================================
// FILTERING
// ============================================================================

/// Entries that contain every key, in either mapping.
pub fn filter<'a, E: Entry>(entries: &'a [E], keys: &'a [Key]) -> impl Iterator<Item = &'a E> + 'a {
    entries.iter().filter(move |e| e.contains_all(keys))
}

/// Like `filter`, collected. An empty source is an error.
pub fn filtered<'a, E: Entry>(entries: &'a [E], keys: &[Key]) -> Result<Vec<&'a E>> {
    if entries.is_empty() {
        return Err(BoxError::EmptySource);
    }
    Ok(entries.iter().filter(|e| e.contains_all(keys)).collect())
}

/// Entries whose value for each condition key equals the condition value.
/// A missing key never matches.
pub fn iwhere<'a, E: Entry>(entries: &'a [E], conditions: &'a Record) -> impl Iterator<Item = &'a E> + 'a {
    entries.iter().filter(move |e| matches_all(*e, conditions))
}

pub fn where_<'a, E: Entry>(entries: &'a [E], conditions: &Record) -> Vec<&'a E> {
    entries.iter().filter(|e| matches_all(*e, conditions)).collect()
}

fn matches_all<E: Entry>(entry: &E, conditions: &Record) -> bool {
    conditions
        .iter()
        .all(|(k, v)| entry.lookup(k.as_str()) == Some(v))
}

// ============================================================================
// LOOKUPS
// ============================================================================

/// Values of `key` by row index, dependent first. Entries without an index
/// are numbered by position.
pub fn find<E: Entry>(entries: &[E], key: &str) -> IndexMap<usize, Value> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(pos, e)| {
            e.lookup_dependent_first(key)
                .map(|v| (e.index().unwrap_or(pos), v.clone()))
        })
        .collect()
}

/// Sorted distinct values of `key`.
pub fn unique<E: Entry>(entries: &[E], key: &str) -> Result<Vec<Value>> {
    sorted_unique(find(entries, key).into_values().collect())
}

/// Sorted distinct value tuples across `keys`, independent values first.
pub fn combinations<E: Entry>(entries: &[E], keys: &[Key]) -> Result<Vec<Record>> {
    let mut tuples: Vec<Vec<Value>> = filtered(entries, keys)?
        .into_iter()
        .map(|e| {
            keys.iter()
                .map(|k| e.lookup(k.as_str()).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    try_sort_by(&mut tuples, |a, b| try_cmp_slices(a, b))?;
    tuples.dedup();
    Ok(tuples
        .into_iter()
        .map(|values| keys.iter().cloned().zip(values).collect())
        .collect())
}

/// Each entry's flat mapping reduced to `keys`.
pub fn exclusively<E: Entry>(entries: &[E], keys: &[Key]) -> Result<Vec<Record>> {
    entries
        .iter()
        .map(|e| {
            let minimal = e.to_minimal();
            keys.iter()
                .map(|k| {
                    minimal
                        .get(k.as_str())
                        .map(|v| (k.clone(), v.clone()))
                        .ok_or_else(|| BoxError::KeyNotFound(k.to_string()))
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// VECTORS
// ============================================================================

/// How labels are attached to each vector entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    /// `"a=1, b=2"`
    #[default]
    Text,
    /// The independent mapping itself.
    Map,
    Omit,
}

#[derive(Debug, Clone)]
pub struct VectorOptions {
    /// Exact-match conditions applied after the key filter.
    pub filter: Option<Record>,
    pub labels: LabelStyle,
    /// Work on combined records rather than raw rows.
    pub combine: bool,
    /// Return one list per independent key instead of labels.
    pub indep_keys: Option<Vec<Key>>,
}

impl Default for VectorOptions {
    fn default() -> Self {
        VectorOptions {
            filter: None,
            labels: LabelStyle::Text,
            combine: true,
            indep_keys: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    Omitted,
    Text(Vec<String>),
    Maps(Vec<Record>),
    /// One list per requested independent key.
    Independent(Vec<Vec<Value>>),
}

/// Parallel lists: `values[k][i]` and label `i` come from the same entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Vectors {
    pub values: Vec<Vec<Value>>,
    pub labels: Labels,
}

impl Vectors {
    pub fn len(&self) -> usize {
        self.values.first().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text_labels(&self) -> Option<&[String]> {
        match &self.labels {
            Labels::Text(labels) => Some(labels),
            _ => None,
        }
    }

    pub fn map_labels(&self) -> Option<&[Record]> {
        match &self.labels {
            Labels::Maps(labels) => Some(labels),
            _ => None,
        }
    }
}

/// Collects, per key, the value of every entry that has all `keys`.
/// Each key takes its dependent value, falling back to the independent one.
pub fn vectors<E: Entry>(entries: &[E], keys: &[Key], options: &VectorOptions) -> Result<Vectors> {
    let mut selected = filtered(entries, keys)?;
    if let Some(conditions) = &options.filter {
        selected.retain(|e| matches_all(*e, conditions));
    }
    let mut values: Vec<Vec<Value>> = vec![Vec::with_capacity(selected.len()); keys.len()];
    for entry in &selected {
        for (out, key) in values.iter_mut().zip(keys) {
            out.push(entry.lookup_dependent_first(key.as_str()).cloned().unwrap_or_default());
        }
    }
    let labels = match (&options.indep_keys, options.labels) {
        (Some(indep_keys), _) => {
            let lists = indep_keys
                .iter()
                .map(|k| {
                    selected
                        .iter()
                        .map(|e| {
                            e.independent_value(k.as_str())
                                .cloned()
                                .ok_or_else(|| BoxError::KeyNotFound(k.to_string()))
                        })
                        .collect::<Result<Vec<Value>>>()
                })
                .collect::<Result<Vec<_>>>()?;
            Labels::Independent(lists)
        }
        (None, LabelStyle::Text) => Labels::Text(
            selected
                .iter()
                .map(|e| dict_to_str(e.independent(), &DictFormat::label()))
                .collect(),
        ),
        (None, LabelStyle::Map) => {
            Labels::Maps(selected.iter().map(|e| e.independent().clone()).collect())
        }
        (None, LabelStyle::Omit) => Labels::Omitted,
    };
    log::trace!(target: "QUERY", "vectors {:?}: {} entries", keys, selected.len());
    Ok(Vectors { values, labels })
}

// ============================================================================
// GROUPING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupLabels {
    #[default]
    Map,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupLabel {
    Map(Record),
    Text(String),
}

/// Values of the grouped keys for entries sharing all other independent values.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: GroupLabel,
    pub values: IndexMap<Key, Vec<Value>>,
}

impl Group {
    /// Flat form: one list per key, then the label.
    pub fn into_row(self) -> Vec<Value> {
        let mut row: Vec<Value> = self.values.into_values().map(Value::List).collect();
        row.push(match self.label {
            GroupLabel::Map(map) => Value::Map(map),
            GroupLabel::Text(text) => Value::Text(text),
        });
        row
    }
}

/// Groups entries by their independent mapping with `keys` removed.
pub fn grouped<E: Entry>(entries: &[E], keys: &[Key], labels: GroupLabels) -> Result<Vec<Group>> {
    let mut groups: IndexMap<Fingerprint, Group> = IndexMap::new();
    for entry in filtered(entries, keys)? {
        let mut remaining = entry.independent().clone();
        let mut picked = Vec::with_capacity(keys.len());
        for key in keys {
            let value = match remaining.shift_remove(key.as_str()) {
                Some(v) => v,
                None => entry
                    .dependent_value(key.as_str())
                    .cloned()
                    .ok_or_else(|| BoxError::KeyNotFound(key.to_string()))?,
            };
            picked.push(value);
        }
        let group = groups.entry(fingerprint(&remaining)).or_insert_with(|| Group {
            label: match labels {
                GroupLabels::Map => GroupLabel::Map(remaining.clone()),
                GroupLabels::Text => {
                    GroupLabel::Text(dict_to_str(&remaining, &DictFormat::default()))
                }
            },
            values: keys.iter().map(|k| (k.clone(), Vec::new())).collect(),
        });
        for (list, value) in group.values.values_mut().zip(picked) {
            list.push(value);
        }
    }
    Ok(groups.into_values().collect())
}

// ============================================================================
// SERIES
// ============================================================================

/// One x-y curve, as consumed by a plotting backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Numeric x-y curves, one per matching entry.
///
/// 2D values hold one vector per component; `component` selects which one
/// and is required whenever such values are present.
pub fn series<E: Entry>(
    entries: &[E],
    x: &Key,
    y: &Key,
    filter: Option<&Record>,
    component: Option<usize>,
) -> Result<Vec<Series>> {
    let options = VectorOptions {
        filter: filter.cloned(),
        ..VectorOptions::default()
    };
    let keys = [x.clone(), y.clone()];
    let found = vectors(entries, &keys, &options)?;
    let labels = found.text_labels().unwrap_or_default().to_vec();
    let mut out = Vec::with_capacity(labels.len());
    for (i, label) in labels.into_iter().enumerate() {
        let xs = curve(&found.values[0][i], x, component, None)?;
        let ys = curve(&found.values[1][i], y, component, Some(xs.len()))?;
        out.push(Series { label, x: xs, y: ys });
    }
    Ok(out)
}

fn curve(value: &Value, key: &Key, component: Option<usize>, length: Option<usize>) -> Result<Vec<f64>> {
    if value.ndim() < 2 {
        return value
            .to_f64_vec()
            .ok_or_else(|| BoxError::InvalidValue(format!("{} is not numeric", key)));
    }
    let c = component.ok_or_else(|| BoxError::ComponentRequired {
        key: key.to_string(),
    })?;
    let rows = value
        .to_f64_rows()
        .ok_or_else(|| BoxError::InvalidValue(format!("{} is not numeric", key)))?;
    // One row per component: samples run along the axis matching the x length
    let rows = match (length, key.components()) {
        (Some(n), _) => orient(&rows, n, Orientation::Cols)?,
        (None, Some(components)) => orient(&rows, components.len(), Orientation::Rows)?,
        (None, None) => rows,
    };
    rows.get(c).cloned().ok_or_else(|| {
        BoxError::KeyNotFound(format!("component {} of {}", c, key))
    })
}

// ============================================================================
// RESULT BOX QUERIES
// ============================================================================

impl ResultBox {
    pub fn filter<'a>(&'a self, keys: &'a [Key]) -> impl Iterator<Item = &'a Arc<ResultRow>> + 'a {
        filter(self.rows(), keys)
    }

    pub fn filtered(&self, keys: &[Key]) -> Result<Vec<&Arc<ResultRow>>> {
        filtered(self.rows(), keys)
    }

    pub fn iwhere<'a>(&'a self, conditions: &'a Record) -> impl Iterator<Item = &'a Arc<ResultRow>> + 'a {
        iwhere(self.rows(), conditions)
    }

    pub fn where_(&self, conditions: &Record) -> Vec<&Arc<ResultRow>> {
        where_(self.rows(), conditions)
    }

    pub fn find(&self, key: &str) -> IndexMap<usize, Value> {
        find(self.rows(), key)
    }

    pub fn unique(&self, key: &str) -> Result<Vec<Value>> {
        unique(self.rows(), key)
    }

    pub fn combinations(&self, keys: &[Key]) -> Result<Vec<Record>> {
        combinations(self.rows(), keys)
    }

    pub fn vectors(&self, keys: &[Key], options: &VectorOptions) -> Result<Vectors> {
        if options.combine {
            vectors(self.combined(), keys, options)
        } else {
            vectors(self.rows(), keys, options)
        }
    }

    /// Groups combined records by the independent values other than `keys`.
    pub fn grouped(&self, keys: &[Key], labels: GroupLabels) -> Result<Vec<Group>> {
        grouped(self.combined(), keys, labels)
    }

    /// Minimal records reduced to `keys`.
    pub fn exclusively(&self, keys: &[Key]) -> Result<Vec<Record>> {
        exclusively(&self.minimal(), keys)
    }

    pub fn series(
        &self,
        x: &Key,
        y: &Key,
        filter: Option<&Record>,
        component: Option<usize>,
    ) -> Result<Vec<Series>> {
        series(self.combined(), x, y, filter, component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::variable::Variable;

    fn keys(names: &[&str]) -> Vec<Key> {
        names.iter().map(|n| Key::from(*n)).collect()
    }

    fn sample() -> ResultBox {
        let mut b = ResultBox::new();
        let mut indep = record! { "a" => 1, "b" => 2 };
        b.add_value(&indep, "test", 7).unwrap();
        b.add_value(&indep, "test2", 8).unwrap();
        indep.insert(Key::from("b"), Value::Int(3));
        b.add_value(&indep, "test", 9).unwrap();
        b.add_value(&indep, "test2", 11).unwrap();
        b
    }

    fn lst3() -> ResultBox {
        ResultBox::from_rows(vec![
            ResultRow::new(0, record! { "a" => 1, "b" => 1 }, record! { "d" => vec![12, 30] }),
            ResultRow::new(1, record! { "a" => 1, "b" => 2 }, record! { "d" => vec![13, 31] }),
            ResultRow::new(4, record! { "a" => 1, "b" => 1 }, record! { "e" => vec![1, 2] }),
            ResultRow::new(7, record! { "a" => 1, "b" => 2 }, record! { "e" => vec![1, 2] }),
        ])
    }

    #[test]
    fn test_filtered() {
        let b = sample();
        let rows = b.filtered(&keys(&["test2"])).unwrap();
        let indices: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert!(matches!(ResultBox::new().filtered(&keys(&["x"])), Err(BoxError::EmptySource)));
        assert_eq!(b.filter(&keys(&["test", "a"])).count(), 2);
    }

    #[test]
    fn test_where() {
        let b = sample();
        let rows = b.where_(&record! { "b" => 3 });
        let indices: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 3]);
        assert_eq!(b.iwhere(&record! { "test" => 9 }).count(), 1);
    }

    #[test]
    fn test_where_missing_key_never_matches() {
        let b = sample();
        // a None condition must not match rows that lack the key
        assert!(b.where_(&record! { "missing" => Value::None }).is_empty());
        assert!(b.where_(&record! { "missing" => false }).is_empty());
        assert!(b.where_(&record! { "missing" => 0 }).is_empty());
    }

    #[test]
    fn test_find_and_unique() {
        let b = sample();
        let found = b.find("test");
        assert_eq!(found.get(&0), Some(&Value::Int(7)));
        assert_eq!(found.get(&2), Some(&Value::Int(9)));
        assert_eq!(found.len(), 2);
        assert_eq!(b.unique("b").unwrap(), vec![Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_unique_incomparable() {
        let mut b = ResultBox::new();
        b.add_value(&Record::new(), "x", 1).unwrap();
        b.add_value(&Record::new(), "x", "one").unwrap();
        assert!(matches!(b.unique("x"), Err(BoxError::Incomparable(_))));
    }

    #[test]
    fn test_combinations() {
        let b = sample();
        let combos = b.combinations(&keys(&["a", "b"])).unwrap();
        assert_eq!(combos, vec![record! { "a" => 1, "b" => 2 }, record! { "a" => 1, "b" => 3 }]);
    }

    #[test]
    fn test_vectors_alignment() {
        let b = lst3();
        let v = b.vectors(&keys(&["d", "e"]), &VectorOptions::default()).unwrap();
        assert_eq!(v.values[0], vec![Value::from(vec![12, 30]), Value::from(vec![13, 31])]);
        assert_eq!(v.values[1], vec![Value::from(vec![1, 2]), Value::from(vec![1, 2])]);
        assert_eq!(
            v.text_labels().unwrap(),
            &["a=1, b=1".to_string(), "a=1, b=2".to_string()]
        );
    }

    #[test]
    fn test_vectors_uncombined_and_filtered() {
        let b = lst3();
        let opts = VectorOptions { combine: false, ..VectorOptions::default() };
        assert!(b.vectors(&keys(&["d", "e"]), &opts).unwrap().is_empty());

        let opts = VectorOptions {
            filter: Some(record! { "b" => 2 }),
            labels: LabelStyle::Map,
            ..VectorOptions::default()
        };
        let v = b.vectors(&keys(&["d"]), &opts).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v.map_labels().unwrap()[0], record! { "a" => 1, "b" => 2 });
    }

    #[test]
    fn test_vectors_indep_keys() {
        let b = lst3();
        let opts = VectorOptions {
            indep_keys: Some(keys(&["b"])),
            labels: LabelStyle::Omit,
            ..VectorOptions::default()
        };
        let v = b.vectors(&keys(&["d"]), &opts).unwrap();
        assert_eq!(v.labels, Labels::Independent(vec![vec![Value::Int(1), Value::Int(2)]]));
    }

    #[test]
    fn test_grouped() {
        let mut b = ResultBox::new();
        for (t, x) in [(1, 10), (2, 20)] {
            b.add_value(&record! { "run" => "A", "t" => t }, "x", x).unwrap();
            b.add_value(&record! { "run" => "B", "t" => t }, "x", x + 1).unwrap();
        }
        let groups = b.grouped(&keys(&["t", "x"]), GroupLabels::Map).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, GroupLabel::Map(record! { "run" => "A" }));
        assert_eq!(groups[0].values[0], vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(groups[1].values[1], vec![Value::Int(11), Value::Int(21)]);

        let text = b.grouped(&keys(&["t", "x"]), GroupLabels::Text).unwrap();
        let row = text.into_iter().next().unwrap().into_row();
        assert_eq!(row.len(), 3);
        assert_eq!(row[2], Value::from("run A"));
    }

    #[test]
    fn test_exclusively() {
        let b = sample();
        let out = b.exclusively(&keys(&["b", "test"])).unwrap();
        assert_eq!(out[0], record! { "b" => 2, "test" => 7 });
        assert!(matches!(b.exclusively(&keys(&["nope"])), Err(BoxError::KeyNotFound(_))));
    }

    #[test]
    fn test_series_requires_component_for_2d() {
        let pos = Key::from(Variable::new("pos").with_components(["x", "y"]));
        let mut b = ResultBox::new();
        let samples = Value::from(vec![vec![0.0, 1.0, 2.0], vec![5.0, 6.0, 7.0]]);
        b.add_dict(
            &record! { "run" => 1 },
            record! { "t" => vec![0.0, 0.5, 1.0], &pos => samples },
        )
        .unwrap();

        let err = b.series(&"t".into(), &pos, None, None).unwrap_err();
        assert_eq!(err, BoxError::ComponentRequired { key: "pos".to_string() });

        let curves = b.series(&"t".into(), &pos, None, Some(1)).unwrap();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].label, "run=1");
        assert_eq!(curves[0].x, vec![0.0, 0.5, 1.0]);
        assert_eq!(curves[0].y, vec![5.0, 6.0, 7.0]);
    }
}
