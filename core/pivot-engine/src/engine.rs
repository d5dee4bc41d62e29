//! FILENAME: core/pivot-engine/src/engine.rs
//! Table Engine - Cross-tabulates ResultBox records into a Table.
//!
//! Algorithm:
//! 1. Translate keys through the aliases and resolve component levels
//! 2. Expand Variable values into their components
//! 3. Infer the row index when none is given
//! 4. Keep records that carry every value, column and index key
//! 5. Unfold component levels and explode vector values into sub-rows
//! 6. Intern labels and fold values into one accumulator per cell
//! 7. Sort the axes and fill the grid
//! 8. Reorder axis levels to the requested order

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use resultbox::{Aliases, BoxError, Entry, Key, Record, ResultBox, Store, Value, Variable};

use crate::cache::{AggregateAccumulator, CacheValue, FieldCache, GroupKey, ValueId};
use crate::definition::{AggregationType, Field, SortOrder, TableSpec};
use crate::error::TableError;
use crate::view::{Axis, Table};

// ============================================================================
// LEVELS
// ============================================================================

/// An axis level after alias translation and Store lookup.
#[derive(Debug, Clone)]
enum Level {
    Key(Key),
    Components(Arc<Variable>),
}

impl Level {
    fn name(&self) -> String {
        match self {
            Level::Key(key) => key.to_string(),
            Level::Components(variable) => variable.label(),
        }
    }

    fn present_in(&self, record: &Record) -> bool {
        match self {
            Level::Key(key) => record.contains_key(key.as_str()),
            Level::Components(variable) => has_components(record, variable),
        }
    }
}

fn has_components(record: &Record, variable: &Variable) -> bool {
    match variable.subkeys() {
        Some(subkeys) => subkeys.iter().all(|k| record.contains_key(k.as_str())),
        None => false,
    }
}

/// A value key is present as itself or, once expanded, as all its components.
fn value_present(key: &Key, record: &Record) -> bool {
    record.contains_key(key.as_str())
        || key
            .variable()
            .map(|v| has_components(record, v))
            .unwrap_or(false)
}

fn is_number(value: &Value) -> bool {
    !matches!(value, Value::Bool(_)) && value.as_f64().is_some()
}

fn names(levels: &[Level]) -> String {
    let names: Vec<String> = levels.iter().map(Level::name).collect();
    format!("[{}]", names.join(", "))
}

// ============================================================================
// TABLE CALCULATOR
// ============================================================================

/// The calculation engine for pivot tables over a ResultBox.
pub struct TableCalculator<'a> {
    aliases: Option<&'a Aliases>,
    store: Option<&'a Store>,
    aggregation: AggregationType,
    sort_order: SortOrder,

    values: Vec<Key>,
    columns: Vec<Level>,
    index: Option<Vec<Level>>,

    row_fields: Vec<FieldCache>,
    col_fields: Vec<FieldCache>,

    /// Row and column keys in first-seen order.
    row_keys: Vec<GroupKey>,
    col_keys: Vec<GroupKey>,

    /// One accumulator per value key, by (row key, column key).
    cells: FxHashMap<(GroupKey, GroupKey), Vec<AggregateAccumulator>>,
}

impl<'a> TableCalculator<'a> {
    /// Resolves the keys and levels named by a TableSpec.
    pub fn new(spec: &TableSpec<'a>) -> Result<Self, TableError> {
        let mut calculator = TableCalculator {
            aliases: spec.aliases,
            store: spec.store,
            aggregation: spec.aggregation,
            sort_order: spec.sort_order,
            values: Vec::new(),
            columns: Vec::new(),
            index: None,
            row_fields: Vec::new(),
            col_fields: Vec::new(),
            row_keys: Vec::new(),
            col_keys: Vec::new(),
            cells: FxHashMap::default(),
        };
        calculator.values = spec.values.iter().map(|k| calculator.resolve_key(k)).collect();
        calculator.columns = spec
            .columns
            .iter()
            .map(|f| calculator.resolve_field(f))
            .collect::<Result<_, _>>()?;
        calculator.index = match &spec.index {
            Some(index) => Some(
                index
                    .iter()
                    .map(|f| calculator.resolve_field(f))
                    .collect::<Result<_, _>>()?,
            ),
            None => None,
        };
        Ok(calculator)
    }

    /// Executes the full calculation.
    pub fn calculate(&mut self, result_box: &ResultBox) -> Result<Table, TableError> {
        // Step 1-2: Translated, expanded (independent, flat) pairs
        let records = self.load_records(result_box);

        // Step 3: Index inference
        let index = match &self.index {
            Some(index) => index.clone(),
            None => self.infer_index(&records),
        };

        // Step 4: Complete records only
        let complete: Vec<&Record> = records
            .iter()
            .map(|(_, flat)| flat)
            .filter(|flat| self.is_complete(flat, &index))
            .collect();
        if complete.is_empty() {
            return Err(BoxError::EmptyResult(format!(
                "no records contain values={} index={} columns={}",
                self.value_names(),
                names(&index),
                names(&self.columns)
            ))
            .into());
        }
        log::debug!(
            target: "PIVOT",
            "tabulate values={} index={} columns={}: {} of {} records",
            self.value_names(),
            names(&index),
            names(&self.columns),
            complete.len(),
            records.len()
        );

        // Steps 5-7 report failures along with the values, index and columns
        let mut table = self
            .pivot(&complete, &index)
            .map_err(|source| TableError::Pivot {
                values: self.value_names(),
                index: names(&index),
                columns: names(&self.columns),
                source,
            })?;

        // Step 8: Level order (best effort)
        let row_names: Vec<String> = index.iter().map(Level::name).collect();
        let row_names: Vec<&str> = row_names.iter().map(String::as_str).collect();
        if let Err(e) = table.reorder_row_levels(&row_names) {
            log::debug!(target: "PIVOT", "skipped row level reordering: {}", e);
        }
        let mut col_names: Vec<String> = self.columns.iter().map(Level::name).collect();
        if table.col_axis.nlevels() > col_names.len() {
            col_names.insert(0, String::new());
        }
        let col_names: Vec<&str> = col_names.iter().map(String::as_str).collect();
        if let Err(e) = table.reorder_col_levels(&col_names) {
            log::debug!(target: "PIVOT", "skipped column level reordering: {}", e);
        }
        Ok(table)
    }

    // ------------------------------------------------------------------------
    // RESOLUTION
    // ------------------------------------------------------------------------

    fn resolve_key(&self, key: &Key) -> Key {
        let key = match self.aliases {
            Some(aliases) => aliases.translate_key(key),
            None => key.clone(),
        };
        match self.store {
            Some(store) if key.variable().is_none() => {
                store.get(key.as_str()).map(Key::from).unwrap_or(key)
            }
            _ => key,
        }
    }

    fn resolve_field(&self, field: &Field) -> Result<Level, TableError> {
        match field {
            Field::Key(key) => Ok(Level::Key(self.resolve_key(key))),
            Field::Components(label) => {
                let store = self.store.ok_or_else(|| {
                    BoxError::InvalidValue(format!("component level \"{}\" requires a store", label))
                })?;
                let variable = store
                    .by_label(label)
                    .ok_or_else(|| BoxError::KeyNotFound(label.clone()))?;
                Ok(Level::Components(variable))
            }
        }
    }

    fn value_names(&self) -> String {
        let names: Vec<&str> = self.values.iter().map(|k| k.as_str()).collect();
        format!("[{}]", names.join(", "))
    }

    // ------------------------------------------------------------------------
    // RECORDS
    // ------------------------------------------------------------------------

    fn load_records(&self, result_box: &ResultBox) -> Vec<(Record, Record)> {
        result_box
            .combined()
            .iter()
            .map(|combined| {
                let (independent, flat) = match self.aliases {
                    Some(aliases) => (
                        aliases.translate_record(combined.independent()),
                        aliases.translate_record(&combined.to_minimal()),
                    ),
                    None => (combined.independent().clone(), combined.to_minimal()),
                };
                let flat = match self.store {
                    Some(store) => store.expand_record(&flat),
                    None => flat,
                };
                (independent, flat)
            })
            .collect()
    }

    fn is_complete(&self, flat: &Record, index: &[Level]) -> bool {
        self.values.iter().all(|k| value_present(k, flat))
            && self.columns.iter().all(|l| l.present_in(flat))
            && index.iter().all(|l| l.present_in(flat))
    }

    /// All independent keys, except values and columns, of the records that
    /// carry the values and columns.
    ///
    /// When records disagree on that key set, the full candidate set is still
    /// used; such data can silently produce a different index than intended.
    fn infer_index(&self, records: &[(Record, Record)]) -> Vec<Level> {
        let excluded: FxHashSet<String> = self
            .values
            .iter()
            .map(|k| k.to_string())
            .chain(self.columns.iter().map(Level::name))
            .collect();
        let matching: Vec<&Record> = records
            .iter()
            .filter(|(_, flat)| {
                self.values.iter().all(|k| value_present(k, flat))
                    && self.columns.iter().all(|l| l.present_in(flat))
            })
            .map(|(independent, _)| independent)
            .collect();

        let mut candidates: Vec<Key> = Vec::new();
        for independent in &matching {
            for key in independent.keys() {
                if !excluded.contains(key.as_str()) && !candidates.contains(key) {
                    candidates.push(key.clone());
                }
            }
        }
        let uniform = matching.iter().all(|independent| {
            let remaining = independent
                .keys()
                .filter(|k| !excluded.contains(k.as_str()))
                .count();
            remaining == candidates.len()
        });
        if !uniform {
            log::warn!(
                target: "PIVOT",
                "records do not share one index key set; using all of {:?}",
                candidates
            );
        }
        candidates.into_iter().map(Level::Key).collect()
    }

    // ------------------------------------------------------------------------
    // SUB-ROWS
    // ------------------------------------------------------------------------

    /// Splits a record into the sub-rows that are actually pivoted.
    fn unfold(&self, record: &Record, index: &[Level]) -> Result<Vec<Record>, BoxError> {
        let mut rows = vec![record.clone()];
        for level in self.columns.iter().chain(index) {
            if let Level::Components(variable) = level {
                rows = rows
                    .iter()
                    .flat_map(|row| melt(row, variable, &self.values))
                    .collect();
            }
        }
        let level_names: Vec<String> = self.columns.iter().chain(index).map(Level::name).collect();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.extend(explode(row, &self.values, &level_names)?);
        }
        Ok(out)
    }

    // ------------------------------------------------------------------------
    // PIVOT
    // ------------------------------------------------------------------------

    fn pivot(&mut self, records: &[&Record], index: &[Level]) -> Result<Table, BoxError> {
        self.row_fields = index.iter().map(new_field).collect();
        self.col_fields = self.columns.iter().map(new_field).collect();
        self.row_keys.clear();
        self.col_keys.clear();
        self.cells.clear();

        let mut seen_rows: FxHashSet<GroupKey> = FxHashSet::default();
        let mut seen_cols: FxHashSet<GroupKey> = FxHashSet::default();
        let mut sub_rows = 0usize;

        // Step 6: Intern and accumulate
        for record in records {
            for row in self.unfold(record, index)? {
                sub_rows += 1;
                let row_key = intern_levels(&mut self.row_fields, &row)?;
                let col_key = intern_levels(&mut self.col_fields, &row)?;
                if seen_rows.insert(row_key.clone()) {
                    self.row_keys.push(row_key.clone());
                }
                if seen_cols.insert(col_key.clone()) {
                    self.col_keys.push(col_key.clone());
                }
                let accumulators = self
                    .cells
                    .entry((row_key, col_key))
                    .or_insert_with(|| vec![AggregateAccumulator::new(); self.values.len()]);
                for (acc, key) in accumulators.iter_mut().zip(&self.values) {
                    let value = match row.get(key.as_str()) {
                        Some(value) => value,
                        None => continue,
                    };
                    if self.aggregation.is_numeric() && !is_number(value) {
                        return Err(BoxError::InvalidValue(format!(
                            "{:?} cannot aggregate non-numeric {} = {}",
                            self.aggregation,
                            key,
                            value.repr()
                        )));
                    }
                    acc.add(value);
                }
            }
        }
        log::trace!(target: "PIVOT", "{} sub-rows into {} cells", sub_rows, self.cells.len());

        // Step 7: Axes and grid
        let order = self.sort_order;
        let row_fields = &self.row_fields;
        let col_fields = &self.col_fields;
        self.row_keys.sort_by(|a, b| a.compare(b, row_fields, order));
        self.col_keys.sort_by(|a, b| a.compare(b, col_fields, order));
        Ok(self.build_table())
    }

    fn build_table(&self) -> Table {
        // Value keys get their own outer level when there are several of
        // them, or nothing else to label the columns
        let value_level = self.values.len() > 1 || self.columns.is_empty();
        let value_count = if value_level { self.values.len() } else { 1 };

        let mut col_names: Vec<String> = Vec::new();
        if value_level {
            col_names.push(String::new());
        }
        col_names.extend(self.col_fields.iter().map(|f| f.name.clone()));

        let mut col_labels = Vec::new();
        let mut col_entries: Vec<(usize, &GroupKey)> = Vec::new();
        for vi in 0..value_count {
            for col_key in &self.col_keys {
                let mut label = Vec::with_capacity(col_names.len());
                if value_level {
                    label.push(Value::Text(self.values[vi].to_string()));
                }
                label.extend(col_key.labels(&self.col_fields));
                col_labels.push(label);
                col_entries.push((vi, col_key));
            }
        }

        let mut cells: Vec<Vec<Option<Value>>> = self
            .row_keys
            .iter()
            .map(|row_key| {
                col_entries
                    .iter()
                    .map(|(vi, col_key)| {
                        self.cells
                            .get(&(row_key.clone(), (*col_key).clone()))
                            .and_then(|accs| accs[*vi].value(self.aggregation))
                    })
                    .collect()
            })
            .collect();

        for vi in 0..value_count {
            let columns: Vec<usize> = col_entries
                .iter()
                .enumerate()
                .filter(|(_, (v, _))| *v == vi)
                .map(|(j, _)| j)
                .collect();
            if self.all_integer_inputs(vi) {
                downcast_integral(&mut cells, &columns);
            }
        }

        let row_axis = Axis::new(
            self.row_fields.iter().map(|f| f.name.clone()).collect(),
            self.row_keys.iter().map(|k| k.labels(&self.row_fields)).collect(),
        );
        Table::new(row_axis, Axis::new(col_names, col_labels), cells)
    }

    fn all_integer_inputs(&self, vi: usize) -> bool {
        matches!(
            self.aggregation,
            AggregationType::Sum
                | AggregationType::Average
                | AggregationType::Min
                | AggregationType::Max
                | AggregationType::Product
        ) && self.cells.values().all(|accs| accs[vi].all_int)
    }
}

// ============================================================================
// HELPER FUNCTIONS (outside impl to avoid borrow issues)
// ============================================================================

fn new_field(level: &Level) -> FieldCache {
    let mut field = FieldCache::new(level.name());
    field.fixed_order = matches!(level, Level::Components(_));
    field
}

fn intern_levels(fields: &mut [FieldCache], row: &Record) -> Result<GroupKey, BoxError> {
    let mut ids: SmallVec<[ValueId; 4]> = SmallVec::with_capacity(fields.len());
    for field in fields.iter_mut() {
        let value = row.get(field.name.as_str()).cloned().unwrap_or_default();
        ids.push(field.intern(CacheValue::try_from(&value)?));
    }
    Ok(GroupKey { values: ids })
}

/// One sub-row per component: the level holds the component label and each
/// value key naming the Variable takes that component's value.
fn melt(row: &Record, variable: &Variable, values: &[Key]) -> Vec<Record> {
    let components = variable.components().unwrap_or_default();
    components
        .iter()
        .map(|component| {
            let mut out = row.clone();
            out.insert(
                Key::from(variable.label()),
                Value::Text(variable.component_label(component)),
            );
            let part = variable
                .component_key(component)
                .and_then(|subkey| row.get(subkey.as_str()).cloned());
            if let Some(part) = part {
                for key in values.iter().filter(|k| k.as_str() == variable.key()) {
                    out.insert(key.clone(), part.clone());
                }
            }
            out
        })
        .collect()
}

/// One sub-row per vector position. All vector entries among the value and
/// level keys must share a length; scalars repeat.
fn explode(row: Record, values: &[Key], levels: &[String]) -> Result<Vec<Record>, BoxError> {
    let keys: Vec<&str> = values
        .iter()
        .map(|k| k.as_str())
        .chain(levels.iter().map(String::as_str))
        .collect();
    let mut length: Option<usize> = None;
    let mut vectors: Vec<(Key, Vec<Value>)> = Vec::new();
    for (key, value) in row.iter() {
        if !keys.contains(&key.as_str()) {
            continue;
        }
        let n = match value.len() {
            Some(n) => n,
            None => continue,
        };
        match length {
            Some(expected) if expected != n => {
                return Err(BoxError::shape(
                    format!("vector entry \"{}\"", key),
                    expected,
                    value.shape(),
                ));
            }
            _ => length = Some(n),
        }
        vectors.push((key.clone(), value.elements()));
    }
    let n = match length {
        Some(n) => n,
        None => return Ok(vec![row]),
    };
    Ok((0..n)
        .map(|i| {
            let mut sub = row.clone();
            for (key, elements) in &vectors {
                sub.insert(key.clone(), elements[i].clone());
            }
            sub
        })
        .collect())
}

/// Converts a set of columns to integers when every cell there is present and
/// integral.
// i64::MAX as f64 rounds up to 2^63, which is out of range.
const I64_RANGE: std::ops::Range<f64> = i64::MIN as f64..i64::MAX as f64;

fn downcast_integral(cells: &mut [Vec<Option<Value>>], columns: &[usize]) {
    let integral = cells.iter().all(|row| {
        columns.iter().all(|&j| match &row[j] {
            Some(Value::Float(x)) => x.fract() == 0.0 && I64_RANGE.contains(x),
            Some(Value::Int(_)) => true,
            _ => false,
        })
    });
    if !integral {
        return;
    }
    for row in cells.iter_mut() {
        for &j in columns {
            if let Some(Value::Float(x)) = row[j] {
                row[j] = Some(Value::Int(x as i64));
            }
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Cross-tabulates the combined records of a box.
pub fn tabulate(result_box: &ResultBox, spec: &TableSpec) -> Result<Table, TableError> {
    TableCalculator::new(spec)?.calculate(result_box)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultbox::{record, ResultRow};

    fn lst() -> ResultBox {
        let data = [
            (1, 1, 1, 11),
            (1, 2, 2, 12),
            (1, 2, 1, 13),
            (1, 1, 2, 14),
            (2, 1, 1, 15),
            (2, 1, 2, 16),
            (2, 2, 1, 17),
            (2, 2, 2, 18),
        ];
        ResultBox::from_rows(
            data.iter()
                .enumerate()
                .map(|(i, (a, b, c, d))| {
                    ResultRow::new(i, record! { "a" => *a, "b" => *b, "c" => *c }, record! { "d" => *d })
                })
                .collect(),
        )
    }

    #[test]
    fn test_basic_tabulate() {
        let spec = TableSpec::new(["d"], ["c"]).with_index(["a", "b"]);
        let table = tabulate(&lst(), &spec).unwrap();
        assert_eq!(table.shape(), (4, 2));
        let expected = [[11, 14], [13, 12], [15, 16], [17, 18]];
        for (row, values) in table.cells.iter().zip(expected) {
            let row: Vec<Value> = row.iter().map(|c| c.clone().unwrap_or_default()).collect();
            assert_eq!(row, vec![Value::Int(values[0]), Value::Int(values[1])]);
        }
    }

    #[test]
    fn test_aggregation_collapses_levels() {
        let spec = TableSpec::new(["d"], ["c"])
            .with_index(["a"])
            .with_aggregation(AggregationType::Sum);
        let table = tabulate(&lst(), &spec).unwrap();
        assert_eq!(table.get(&[Value::Int(1)], &[Value::Int(1)]), Some(&Value::Int(24)));

        let spec = TableSpec::new(["d"], ["c"]).with_index(["a"]);
        let table = tabulate(&lst(), &spec).unwrap();
        assert_eq!(table.get(&[Value::Int(1)], &[Value::Int(2)]), Some(&Value::Int(13)));
        assert_eq!(table.get(&[Value::Int(2)], &[Value::Int(1)]), Some(&Value::Int(16)));
    }

    #[test]
    fn test_non_integral_mean_stays_float() {
        let mut b = ResultBox::new();
        b.add_value(&record! { "a" => 1, "c" => 1 }, "d", 1).unwrap();
        b.add_value(&record! { "a" => 1, "c" => 1, "r" => 2 }, "d", 2).unwrap();
        let spec = TableSpec::new(["d"], ["c"]).with_index(["a"]);
        let table = tabulate(&b, &spec).unwrap();
        assert_eq!(table.cells[0][0], Some(Value::Float(1.5)));
    }

    #[test]
    fn test_sum_beyond_i64_stays_float() {
        let mut b = ResultBox::new();
        b.add_value(&record! { "a" => 1, "c" => 1 }, "d", 6_000_000_000_000_000_000i64).unwrap();
        b.add_value(&record! { "a" => 1, "c" => 1, "r" => 2 }, "d", 6_000_000_000_000_000_000i64)
            .unwrap();
        let spec = TableSpec::new(["d"], ["c"])
            .with_index(["a"])
            .with_aggregation(AggregationType::Sum);
        let table = tabulate(&b, &spec).unwrap();
        assert_eq!(table.cells[0][0], Some(Value::Float(1.2e19)));
    }

    #[test]
    fn test_downcast_checks_range() {
        let mut cells = vec![vec![Some(Value::Float(2.0)), Some(Value::Float(-9.0e18))]];
        downcast_integral(&mut cells, &[0, 1]);
        assert_eq!(cells[0], vec![Some(Value::Int(2)), Some(Value::Int(-9_000_000_000_000_000_000))]);

        let mut cells = vec![vec![Some(Value::Float(2.0)), Some(Value::Float(9.3e18))]];
        downcast_integral(&mut cells, &[0, 1]);
        assert_eq!(cells[0][1], Some(Value::Float(9.3e18)));
        assert_eq!(cells[0][0], Some(Value::Float(2.0)));
    }

    #[test]
    fn test_descending_sort() {
        let spec = TableSpec::new(["d"], ["c"])
            .with_index(["a", "b"])
            .with_sort_order(SortOrder::Descending);
        let table = tabulate(&lst(), &spec).unwrap();
        assert_eq!(table.row_axis.labels[0], vec![Value::Int(2), Value::Int(2)]);
        assert_eq!(table.col_axis.labels[0], vec![Value::Int(2)]);
    }

    #[test]
    fn test_multiple_values_add_outer_level() {
        let mut b = lst();
        for (i, row) in lst().iter().enumerate() {
            b.add_value(&row.independent, "e", i as i64).unwrap();
        }
        let spec = TableSpec::new(["d", "e"], ["c"]).with_index(["a", "b"]);
        let table = tabulate(&b, &spec).unwrap();
        assert_eq!(table.col_axis.names, vec!["".to_string(), "c".to_string()]);
        assert_eq!(table.shape(), (4, 4));
        assert_eq!(table.col_axis.labels[2], vec![Value::from("e"), Value::Int(1)]);
    }

    #[test]
    fn test_empty_result() {
        let spec = TableSpec::new(["zz"], ["c"]).with_index(["a"]);
        let err = tabulate(&lst(), &spec).unwrap_err();
        assert!(matches!(err, TableError::Box(BoxError::EmptyResult(_))));
    }

    #[test]
    fn test_shape_mismatch_is_wrapped() {
        let mut b = ResultBox::new();
        b.add_value(&record! { "a" => 1, "c" => vec![1, 2] }, "d", vec![1, 2, 3]).unwrap();
        let spec = TableSpec::new(["d"], ["c"]).with_index(["a"]);
        match tabulate(&b, &spec).unwrap_err() {
            TableError::Pivot { values, columns, source, .. } => {
                assert_eq!(values, "[d]");
                assert_eq!(columns, "[c]");
                assert!(matches!(source, BoxError::ShapeMismatch { .. }));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_text_values_need_first_or_last() {
        let mut b = ResultBox::new();
        b.add_value(&record! { "a" => 1, "c" => 1 }, "d", "x").unwrap();
        let spec = TableSpec::new(["d"], ["c"]).with_index(["a"]);
        assert!(matches!(tabulate(&b, &spec), Err(TableError::Pivot { .. })));
        let spec = spec.with_aggregation(AggregationType::First);
        let table = tabulate(&b, &spec).unwrap();
        assert_eq!(table.cells[0][0], Some(Value::from("x")));
    }

    #[test]
    fn test_components_require_store() {
        let spec = TableSpec::new(["d"], ["d:"]).with_index(["a"]);
        assert!(TableCalculator::new(&spec).is_err());
    }

    #[test]
    fn test_explode_broadcasts_scalars() {
        let row = record! { "a" => 1, "c" => vec![1, 2], "d" => vec![5, 6] };
        let rows = explode(row, &[Key::from("d")], &["c".to_string(), "a".to_string()]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], record! { "a" => 1, "c" => 2, "d" => 6 });
    }
}
