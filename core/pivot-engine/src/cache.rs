//! FILENAME: core/pivot-engine/src/cache.rs
//! Table Cache - Interned representation of the prepared records.
//!
//! Architecture:
//! - Each unique axis label is stored once per level and referenced by index
//! - Each prepared sub-row becomes a GroupKey over the row and column levels
//! - Values are folded into one accumulator per (GroupKey, value key)

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use resultbox::{BoxError, Value};

use crate::definition::{AggregationType, SortOrder};

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned label within a level's unique value store.
pub type ValueId = u32;

/// A missing label.
pub const VALUE_ID_EMPTY: ValueId = u32::MAX;

/// A normalized, hashable representation of an axis label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheValue {
    Empty,
    Int(i64),
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

impl TryFrom<&Value> for CacheValue {
    type Error = BoxError;

    fn try_from(value: &Value) -> Result<Self, BoxError> {
        match value {
            Value::None => Ok(CacheValue::Empty),
            Value::Bool(b) => Ok(CacheValue::Boolean(*b)),
            Value::Int(i) => Ok(CacheValue::Int(*i)),
            Value::Float(x) => Ok(CacheValue::Number(OrderedFloat(*x))),
            Value::Text(s) => Ok(CacheValue::Text(s.clone())),
            Value::Array(a) => match a.scalar() {
                Some(item) => CacheValue::try_from(&item),
                None => Err(BoxError::InvalidValue(format!(
                    "{} cannot be used as a table label",
                    value.repr()
                ))),
            },
            other => Err(BoxError::InvalidValue(format!(
                "{} cannot be used as a table label",
                other.repr()
            ))),
        }
    }
}

impl CacheValue {
    pub fn to_value(&self) -> Value {
        match self {
            CacheValue::Empty => Value::None,
            CacheValue::Int(i) => Value::Int(*i),
            CacheValue::Number(n) => Value::Float(n.as_f64()),
            CacheValue::Text(s) => Value::Text(s.clone()),
            CacheValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            // -0.0 and 0.0 compare equal, so they must hash alike
            (self.0 + 0.0).to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// Empty first, then numbers (Int and Number compared exactly, NaN last),
/// text, and booleans.
pub fn compare_cache_values(a: &CacheValue, b: &CacheValue) -> Ordering {
    fn rank(v: &CacheValue) -> u8 {
        match v {
            CacheValue::Empty => 0,
            CacheValue::Int(_) | CacheValue::Number(_) => 1,
            CacheValue::Text(_) => 2,
            CacheValue::Boolean(_) => 3,
        }
    }
    match (a, b) {
        (CacheValue::Int(x), CacheValue::Int(y)) => x.cmp(y),
        (CacheValue::Number(x), CacheValue::Number(y)) => compare_floats(x.0, y.0),
        (CacheValue::Int(x), CacheValue::Number(y)) => compare_int_float(*x, y.0),
        (CacheValue::Number(x), CacheValue::Int(y)) => compare_int_float(*y, x.0).reverse(),
        (CacheValue::Text(x), CacheValue::Text(y)) => x.cmp(y),
        (CacheValue::Boolean(x), CacheValue::Boolean(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_floats(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

// 2^63; floats at or beyond it are outside i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison, so large integers near a float never tie with it.
fn compare_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let floor = f.floor();
    match i.cmp(&(floor as i64)) {
        Ordering::Equal if f > floor => Ordering::Less,
        ord => ord,
    }
}

// ============================================================================
// FIELD CACHE
// ============================================================================

/// Unique labels of one axis level, with O(1) lookup by ValueId.
#[derive(Debug, Clone)]
pub struct FieldCache {
    /// Level name as shown in the header.
    pub name: String,

    /// Keep first-seen order whatever the table's sort order (component levels).
    pub fixed_order: bool,

    value_to_id: FxHashMap<CacheValue, ValueId>,

    /// Ordered list of unique values (indexed by ValueId).
    id_to_value: Vec<CacheValue>,
}

impl FieldCache {
    pub fn new(name: impl Into<String>) -> Self {
        FieldCache {
            name: name.into(),
            fixed_order: false,
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
        }
    }

    /// Interns a value and returns its ValueId.
    /// If the value already exists, returns the existing ID.
    pub fn intern(&mut self, value: CacheValue) -> ValueId {
        if let CacheValue::Empty = value {
            return VALUE_ID_EMPTY;
        }

        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        id
    }

    /// Gets the value for a given ID.
    pub fn get_value(&self, id: ValueId) -> Option<&CacheValue> {
        if id == VALUE_ID_EMPTY {
            return Some(&CacheValue::Empty);
        }
        self.id_to_value.get(id as usize)
    }

    /// Returns the number of unique values (excluding empty).
    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// Compares two IDs under the given sort order.
    pub fn compare_ids(&self, a: ValueId, b: ValueId, order: SortOrder) -> Ordering {
        let first_seen = |id: ValueId| if id == VALUE_ID_EMPTY { -1i64 } else { id as i64 };
        if self.fixed_order {
            return first_seen(a).cmp(&first_seen(b));
        }
        let (va, vb) = (self.get_value(a), self.get_value(b));
        match order {
            SortOrder::DataSourceOrder => first_seen(a).cmp(&first_seen(b)),
            SortOrder::Ascending => match (va, vb) {
                (Some(va), Some(vb)) => compare_cache_values(va, vb),
                _ => Ordering::Equal,
            },
            SortOrder::Descending => match (va, vb) {
                (Some(va), Some(vb)) => compare_cache_values(vb, va),
                _ => Ordering::Equal,
            },
        }
    }
}

// ============================================================================
// GROUP KEY
// ============================================================================

/// A unique combination of level values along one axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub values: SmallVec<[ValueId; 4]>,
}

impl GroupKey {
    pub fn new(values: impl IntoIterator<Item = ValueId>) -> Self {
        GroupKey {
            values: values.into_iter().collect(),
        }
    }

    /// Lexicographic comparison, level by level.
    pub fn compare(&self, other: &GroupKey, fields: &[FieldCache], order: SortOrder) -> Ordering {
        self.values
            .iter()
            .zip(&other.values)
            .zip(fields)
            .map(|((&a, &b), field)| field.compare_ids(a, b, order))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// The labels of this key, looked up level by level.
    pub fn labels(&self, fields: &[FieldCache]) -> Vec<Value> {
        self.values
            .iter()
            .zip(fields)
            .map(|(&id, field)| {
                field
                    .get_value(id)
                    .map(CacheValue::to_value)
                    .unwrap_or_default()
            })
            .collect()
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
/// Stores intermediate state needed for all aggregation types.
#[derive(Debug, Clone)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub product: f64,
    /// For variance/stddev: sum of squared differences from mean.
    /// Using Welford's algorithm for numerical stability.
    pub m2: f64,
    pub mean: f64,
    pub has_product: bool,
    /// Every numeric input was an integer.
    pub all_int: bool,
    pub first: Option<Value>,
    pub last: Option<Value>,
}

impl Default for AggregateAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator {
            sum: 0.0,
            count: 0,
            count_numbers: 0,
            min: None,
            max: None,
            product: 1.0,
            m2: 0.0,
            mean: 0.0,
            has_product: false,
            all_int: true,
            first: None,
            last: None,
        }
    }

    /// Adds any value; numbers feed the numeric aggregates.
    pub fn add(&mut self, value: &Value) {
        match value {
            Value::Int(i) => self.add_number(*i as f64),
            Value::Float(x) => {
                self.all_int = false;
                self.add_number(*x);
            }
            Value::Array(a) => match a.scalar() {
                Some(Value::Int(i)) => self.add_number(i as f64),
                Some(Value::Float(x)) => {
                    self.all_int = false;
                    self.add_number(x);
                }
                _ => self.add_non_number(),
            },
            _ => self.add_non_number(),
        }
        if self.first.is_none() {
            self.first = Some(value.clone());
        }
        self.last = Some(value.clone());
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;

        self.sum += value;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        if !self.has_product {
            self.has_product = true;
            self.product = value;
        } else {
            self.product *= value;
        }

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Adds a non-numeric value (only increments count).
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Computes the final numeric aggregate.
    pub fn compute(&self, aggregation: AggregationType) -> f64 {
        match aggregation {
            AggregationType::Sum => self.sum,
            AggregationType::Count => self.count as f64,
            AggregationType::CountNumbers => self.count_numbers as f64,
            AggregationType::Average => {
                if self.count_numbers > 0 {
                    self.sum / (self.count_numbers as f64)
                } else {
                    0.0
                }
            }
            AggregationType::Min => self.min.unwrap_or(0.0),
            AggregationType::Max => self.max.unwrap_or(0.0),
            AggregationType::Product => {
                if self.has_product {
                    self.product
                } else {
                    0.0
                }
            }
            AggregationType::Var => {
                if self.count_numbers > 1 {
                    self.m2 / ((self.count_numbers - 1) as f64)
                } else {
                    0.0
                }
            }
            AggregationType::VarP => {
                if self.count_numbers > 0 {
                    self.m2 / (self.count_numbers as f64)
                } else {
                    0.0
                }
            }
            AggregationType::StdDev => {
                if self.count_numbers > 1 {
                    (self.m2 / ((self.count_numbers - 1) as f64)).sqrt()
                } else {
                    0.0
                }
            }
            AggregationType::StdDevP => {
                if self.count_numbers > 0 {
                    (self.m2 / (self.count_numbers as f64)).sqrt()
                } else {
                    0.0
                }
            }
            AggregationType::First | AggregationType::Last => f64::NAN,
        }
    }

    /// The cell value for an aggregation. Counts are integers; First and Last
    /// return the stored value. `None` when nothing numeric was added.
    pub fn value(&self, aggregation: AggregationType) -> Option<Value> {
        match aggregation {
            AggregationType::First => self.first.clone(),
            AggregationType::Last => self.last.clone(),
            AggregationType::Count => Some(Value::Int(self.count as i64)),
            AggregationType::CountNumbers => Some(Value::Int(self.count_numbers as i64)),
            _ if self.count_numbers == 0 => None,
            other => Some(Value::Float(self.compute(other))),
        }
    }
}
