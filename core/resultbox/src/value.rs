//! FILENAME: core/resultbox/src/value.rs
//! The value model stored in rows.
//!
//! A closed sum type over scalars, sequences, nested mappings and
//! n-dimensional numeric arrays. Numbers compare across Int/Float/Bool,
//! everything else only compares with its own kind.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

use crate::error::{BoxError, Result};
use crate::key::Key;

/// An insertion-ordered mapping of keys to values.
pub type Record = IndexMap<Key, Value>;

// ============================================================================
// NUMERIC ARRAYS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int64,
    Float64,
}

impl DType {
    pub fn name(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int64" | "int32" | "int" => Some(DType::Int64),
            "float64" | "float32" | "float" => Some(DType::Float64),
            _ => None,
        }
    }
}

/// Flat, row-major element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ArrayData {
    fn len(&self) -> usize {
        match self {
            ArrayData::Int(v) => v.len(),
            ArrayData::Float(v) => v.len(),
        }
    }

    fn value_at(&self, i: usize) -> Value {
        match self {
            ArrayData::Int(v) => Value::Int(v[i]),
            ArrayData::Float(v) => Value::Float(v[i]),
        }
    }

    fn f64_at(&self, i: usize) -> f64 {
        match self {
            ArrayData::Int(v) => v[i] as f64,
            ArrayData::Float(v) => v[i],
        }
    }

    fn gather(&self, indices: impl Iterator<Item = usize>) -> ArrayData {
        match self {
            ArrayData::Int(v) => ArrayData::Int(indices.map(|i| v[i]).collect()),
            ArrayData::Float(v) => ArrayData::Float(indices.map(|i| v[i]).collect()),
        }
    }
}

/// An n-dimensional numeric array with a fixed shape and element type.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(BoxError::InvalidValue(format!(
                "array of shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(NdArray { shape, data })
    }

    /// A 1D float array.
    pub fn from_vec(values: Vec<f64>) -> Self {
        NdArray {
            shape: vec![values.len()],
            data: ArrayData::Float(values),
        }
    }

    /// A 1D integer array.
    pub fn from_int_vec(values: Vec<i64>) -> Self {
        NdArray {
            shape: vec![values.len()],
            data: ArrayData::Int(values),
        }
    }

    /// A 2D float array from equal-length rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != ncols) {
            return Err(BoxError::InvalidValue(
                "rows of a 2D array must have equal lengths".to_string(),
            ));
        }
        let shape = vec![rows.len(), ncols];
        let data = rows.into_iter().flatten().collect();
        Ok(NdArray {
            shape,
            data: ArrayData::Float(data),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Length of the first axis.
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> DType {
        match self.data {
            ArrayData::Int(_) => DType::Int64,
            ArrayData::Float(_) => DType::Float64,
        }
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// All elements, row-major, as floats.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.size()).map(|i| self.data.f64_at(i)).collect()
    }

    /// The single element of a size-1 array.
    pub fn scalar(&self) -> Option<Value> {
        if self.size() == 1 {
            Some(self.data.value_at(0))
        } else {
            None
        }
    }

    /// Sub-array (or scalar for 1D arrays) at position `i` of the first axis.
    pub fn item(&self, i: usize) -> Value {
        if self.ndim() <= 1 {
            return self.data.value_at(i);
        }
        let inner: usize = self.shape[1..].iter().product();
        let data = self.data.gather(i * inner..(i + 1) * inner);
        Value::Array(NdArray {
            shape: self.shape[1..].to_vec(),
            data,
        })
    }

    /// Slices along the first axis.
    pub fn items(&self) -> Vec<Value> {
        if self.ndim() == 0 {
            return vec![self.data.value_at(0)];
        }
        (0..self.len()).map(|i| self.item(i)).collect()
    }

    /// Swaps the axes of a 2D array. Other arrays are returned unchanged.
    pub fn transposed(&self) -> NdArray {
        if self.ndim() != 2 {
            return self.clone();
        }
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let order = (0..cols).flat_map(|c| (0..rows).map(move |r| r * cols + c));
        NdArray {
            shape: vec![cols, rows],
            data: self.data.gather(order),
        }
    }
}

// ============================================================================
// VALUE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(Record),
    Array(NdArray),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Array(a) if a.size() == 1 => Some(a.data.f64_at(0)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Shape of arrays and rectangular nested lists. Scalars have shape `[]`.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Value::Array(a) => a.shape().to_vec(),
            Value::List(items) => {
                let mut shape = vec![items.len()];
                if let Some(first) = items.first() {
                    let inner = first.shape();
                    if !inner.is_empty() && items.iter().all(|v| v.shape() == inner) {
                        shape.extend(inner);
                    }
                }
                shape
            }
            _ => Vec::new(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Length of a vector-like value (first axis). None for scalars and maps.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(items) => Some(items.len()),
            Value::Array(a) if a.ndim() > 0 => Some(a.len()),
            _ => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        self.len().is_some()
    }

    /// Items along the first axis; a scalar yields itself.
    pub fn elements(&self) -> Vec<Value> {
        match self {
            Value::List(items) => items.clone(),
            Value::Array(a) => a.items(),
            other => vec![other.clone()],
        }
    }

    /// Numeric contents of a scalar or 1D value.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Value::Array(a) if a.ndim() <= 1 => Some(a.to_f64_vec()),
            Value::List(items) => items.iter().map(|v| v.as_f64()).collect(),
            other => other.as_f64().map(|x| vec![x]),
        }
    }

    /// Rows of a 2D numeric value.
    pub fn to_f64_rows(&self) -> Option<Vec<Vec<f64>>> {
        if self.ndim() != 2 {
            return None;
        }
        self.elements().iter().map(|row| row.to_f64_vec()).collect()
    }

    /// Converts a numeric list (possibly nested) into an array.
    pub fn to_array(&self) -> Option<NdArray> {
        match self {
            Value::Array(a) => Some(a.clone()),
            Value::List(_) => {
                let shape = self.shape();
                let mut flat = Vec::new();
                flatten(self, &mut flat);
                if flat.len() != shape.iter().product::<usize>() {
                    return None;
                }
                if flat.iter().all(|v| matches!(v, Value::Int(_))) {
                    let data = flat.iter().filter_map(|v| match v {
                        Value::Int(i) => Some(*i),
                        _ => None,
                    });
                    NdArray::new(shape, ArrayData::Int(data.collect())).ok()
                } else {
                    let data: Option<Vec<f64>> = flat.iter().map(|v| v.as_f64()).collect();
                    NdArray::new(shape, ArrayData::Float(data?)).ok()
                }
            }
            _ => None,
        }
    }

    /// Swaps the axes of a 2D value, keeping array-vs-list representation.
    pub fn transposed(&self) -> Option<Value> {
        match self {
            Value::Array(a) if a.ndim() == 2 => Some(Value::Array(a.transposed())),
            Value::List(rows) if self.ndim() == 2 => {
                let ncols = rows.first().and_then(|r| r.len()).unwrap_or(0);
                let columns = (0..ncols)
                    .map(|c| Value::List(rows.iter().map(|r| r.elements()[c].clone()).collect()))
                    .collect();
                Some(Value::List(columns))
            }
            _ => None,
        }
    }

    /// Total order among mutually comparable values.
    pub fn try_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::None, Value::None) => Some(Ordering::Equal),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => try_cmp_slices(a, b),
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.to_f64_vec(), b.to_f64_vec());
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.partial_cmp(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (a, b) if a.is_numeric() && b.is_numeric() => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            _ => None,
        }
    }

    /// Python-style representation: text is quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Text(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

fn flatten(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::List(items) => items.iter().for_each(|v| flatten(v, out)),
        Value::Array(a) => out.extend((0..a.size()).map(|i| a.data.value_at(i))),
        other => out.push(other.clone()),
    }
}

/// Lexicographic comparison of value tuples.
pub fn try_cmp_slices(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.try_cmp(y)? {
            Ordering::Equal => continue,
            ord => return Some(ord),
        }
    }
    Some(a.len().cmp(&b.len()))
}

/// Stable sort with a fallible comparison. Fails with `Incomparable` when a
/// compared pair is unordered, leaving `items` untouched.
///
/// Every adjacent pair of a sorted output is compared directly, so mixed
/// kinds always surface as an error regardless of input size.
pub fn try_sort_by<T, F>(items: &mut Vec<T>, mut cmp: F) -> Result<()>
where
    T: fmt::Debug,
    F: FnMut(&T, &T) -> Option<Ordering>,
{
    let order = merge_sort_indices(items, (0..items.len()).collect(), &mut cmp)?;
    let mut slots: Vec<Option<T>> = std::mem::take(items).into_iter().map(Some).collect();
    *items = order.into_iter().filter_map(|i| slots[i].take()).collect();
    Ok(())
}

fn merge_sort_indices<T, F>(items: &[T], mut order: Vec<usize>, cmp: &mut F) -> Result<Vec<usize>>
where
    T: fmt::Debug,
    F: FnMut(&T, &T) -> Option<Ordering>,
{
    if order.len() <= 1 {
        return Ok(order);
    }
    let right = order.split_off(order.len() / 2);
    let left = merge_sort_indices(items, order, cmp)?;
    let right = merge_sort_indices(items, right, cmp)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let (a, b) = (&items[left[i]], &items[right[j]]);
        match cmp(a, b) {
            Some(Ordering::Greater) => {
                merged.push(right[j]);
                j += 1;
            }
            Some(_) => {
                merged.push(left[i]);
                i += 1;
            }
            None => return Err(BoxError::Incomparable(format!("{:?} and {:?}", a, b))),
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    Ok(merged)
}

/// Sorts values and drops duplicates.
pub fn sorted_unique(mut values: Vec<Value>) -> Result<Vec<Value>> {
    try_sort_by(&mut values, |a, b| a.try_cmp(b))?;
    values.dedup();
    Ok(values)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            _ => false,
        }
    }
}

fn fmt_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{:.1}", x)
    } else {
        write!(f, "{}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => fmt_float(f, *x),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}': {}", k, v.repr())?;
                }
                f.write_str("}")
            }
            Value::Array(a) => {
                if a.ndim() == 0 {
                    return write!(f, "{}", a.data.value_at(0));
                }
                f.write_str("[")?;
                for (i, item) in a.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::None)
    }
}

impl From<NdArray> for Value {
    fn from(a: NdArray) -> Self {
        Value::Array(a)
    }
}

impl From<Record> for Value {
    fn from(map: Record) -> Self {
        Value::Map(map)
    }
}

/// Builds a `Record` from `key => value` pairs.
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert($crate::Key::from($key), $crate::Value::from($value)); )+
        record
    }};
}
