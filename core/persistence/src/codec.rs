//! FILENAME: core/persistence/src/codec.rs
//! JSON document format for result rows.
//!
//! Layout:
//! ```json
//! { "version": 1,
//!   "variables": [ { "name": "force", "unit": "N", ... } ],
//!   "rows": [ { "index": 0, "independent": {...}, "dependent": {...} } ] }
//! ```
//! Keys are written as their canonical strings; a key listed in `variables`
//! is re-hydrated as that Variable. Arrays are tagged objects carrying their
//! element type and shape. Non-finite floats outside arrays are tagged too;
//! inside arrays they travel as `null`.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};

use resultbox::{ArrayData, DType, Key, NdArray, Record, ResultBox, ResultRow, Value, Variable};

use crate::error::PersistenceError;

/// Current document version.
pub const FORMAT_VERSION: u32 = 1;

/// Name of the JSON entry inside a compressed archive.
pub const ARCHIVE_ENTRY: &str = "rows.json";

const ARRAY_TAG: &str = "__ndarray__";
const FLOAT_TAG: &str = "__float__";

// ============================================================================
// DOCUMENT
// ============================================================================

/// A persisted box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    #[serde(default)]
    pub variables: Vec<Variable>,
    pub rows: Vec<StoredRow>,
}

/// One persisted row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRow {
    pub index: usize,
    #[serde(default)]
    pub independent: Map<String, Json>,
    #[serde(default)]
    pub dependent: Map<String, Json>,
}

/// Either a versioned document or a bare list of rows.
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Document(Document),
    Rows(Vec<StoredRow>),
}

// ============================================================================
// ENCODING
// ============================================================================

/// Builds the document for a sequence of rows.
pub fn encode_rows<'a>(rows: impl IntoIterator<Item = &'a ResultRow>) -> Document {
    let mut variables: Vec<Variable> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stored = Vec::new();
    for row in rows {
        collect_variables(&row.independent, &mut variables, &mut seen);
        collect_variables(&row.dependent, &mut variables, &mut seen);
        stored.push(StoredRow {
            index: row.index,
            independent: encode_record(&row.independent),
            dependent: encode_record(&row.dependent),
        });
    }
    Document {
        version: FORMAT_VERSION,
        variables,
        rows: stored,
    }
}

fn collect_variables(record: &Record, out: &mut Vec<Variable>, seen: &mut HashSet<String>) {
    for (key, value) in record {
        if let Some(variable) = key.variable() {
            if seen.insert(key.to_string()) {
                out.push(variable.as_ref().clone());
            }
        }
        if let Value::Map(inner) = value {
            collect_variables(inner, out, seen);
        }
    }
}

fn encode_record(record: &Record) -> Map<String, Json> {
    record
        .iter()
        .map(|(k, v)| (k.to_string(), encode_value(v)))
        .collect()
}

/// Converts a value to JSON.
pub fn encode_value(value: &Value) -> Json {
    match value {
        Value::None => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(x) => match Number::from_f64(*x) {
            Some(n) => Json::Number(n),
            None => tagged([(FLOAT_TAG, Json::from(float_name(*x)))]),
        },
        Value::Text(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(encode_value).collect()),
        Value::Map(record) => Json::Object(encode_record(record)),
        Value::Array(array) => tagged([
            (ARRAY_TAG, nested(array)),
            ("dtype", Json::from(array.dtype().name())),
            ("shape", Json::from(array.shape().to_vec())),
        ]),
    }
}

fn tagged<const N: usize>(entries: [(&str, Json); N]) -> Json {
    Json::Object(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn float_name(x: f64) -> &'static str {
    if x.is_nan() {
        "NaN"
    } else if x > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// Array elements as nested JSON lists, NaN as null.
fn nested(array: &NdArray) -> Json {
    if array.ndim() == 0 {
        return array.scalar().map(|v| array_element(&v)).unwrap_or(Json::Null);
    }
    Json::Array(
        array
            .items()
            .iter()
            .map(|item| match item {
                Value::Array(inner) => nested(inner),
                scalar => array_element(scalar),
            })
            .collect(),
    )
}

fn array_element(value: &Value) -> Json {
    match value {
        Value::Int(i) => Json::from(*i),
        Value::Float(x) => Number::from_f64(*x).map(Json::Number).unwrap_or(Json::Null),
        _ => Json::Null,
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Rebuilds rows from a document.
pub fn decode_rows(document: Document) -> Result<Vec<ResultRow>, PersistenceError> {
    if document.version != FORMAT_VERSION {
        return Err(PersistenceError::InvalidFormat(format!(
            "unsupported document version {}",
            document.version
        )));
    }
    let variables: HashMap<String, Arc<Variable>> = document
        .variables
        .into_iter()
        .map(|v| (v.key().to_string(), Arc::new(v)))
        .collect();
    document
        .rows
        .into_iter()
        .map(|row| {
            Ok(ResultRow::new(
                row.index,
                decode_record(&row.independent, &variables)?,
                decode_record(&row.dependent, &variables)?,
            ))
        })
        .collect()
}

fn decode_record(
    map: &Map<String, Json>,
    variables: &HashMap<String, Arc<Variable>>,
) -> Result<Record, PersistenceError> {
    map.iter()
        .map(|(k, v)| {
            let key = match variables.get(k) {
                Some(variable) => Key::from(variable),
                None => Key::from(k.as_str()),
            };
            Ok((key, decode_value(v, variables)?))
        })
        .collect()
}

fn decode_value(json: &Json, variables: &HashMap<String, Arc<Variable>>) -> Result<Value, PersistenceError> {
    Ok(match json {
        Json::Null => Value::None,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::List(
            items
                .iter()
                .map(|item| decode_value(item, variables))
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(map) => {
            if let Some(data) = map.get(ARRAY_TAG) {
                Value::Array(decode_array(data, map)?)
            } else if let Some(tag) = map.get(FLOAT_TAG) {
                Value::Float(decode_float(tag)?)
            } else {
                Value::Map(decode_record(map, variables)?)
            }
        }
    })
}

fn decode_float(tag: &Json) -> Result<f64, PersistenceError> {
    match tag.as_str() {
        Some("NaN") => Ok(f64::NAN),
        Some("Infinity") => Ok(f64::INFINITY),
        Some("-Infinity") => Ok(f64::NEG_INFINITY),
        _ => Err(PersistenceError::InvalidFormat(format!("bad float tag {}", tag))),
    }
}

fn decode_array(data: &Json, map: &Map<String, Json>) -> Result<NdArray, PersistenceError> {
    let dtype_name = map.get("dtype").and_then(Json::as_str).unwrap_or("float64");
    let dtype = DType::from_name(dtype_name)
        .ok_or_else(|| PersistenceError::InvalidFormat(format!("unknown dtype {}", dtype_name)))?;

    let mut elements = Vec::new();
    let mut inferred = Vec::new();
    flatten(data, 0, &mut inferred, &mut elements)?;
    let shape = match map.get("shape") {
        Some(shape) => serde_json::from_value::<Vec<usize>>(shape.clone())?,
        None => inferred,
    };

    let array_data = match dtype {
        DType::Int64 => ArrayData::Int(
            elements
                .iter()
                .map(|e| {
                    e.as_i64().ok_or_else(|| {
                        PersistenceError::InvalidFormat(format!("{} in an int64 array", e))
                    })
                })
                .collect::<Result<_, _>>()?,
        ),
        DType::Float64 => ArrayData::Float(
            elements
                .iter()
                .map(|e| e.as_f64().unwrap_or(f64::NAN))
                .collect(),
        ),
    };
    NdArray::new(shape, array_data).map_err(|e| PersistenceError::InvalidFormat(e.to_string()))
}

/// Collects leaf elements row-major and the shape implied by the nesting.
fn flatten<'a>(
    json: &'a Json,
    depth: usize,
    shape: &mut Vec<usize>,
    out: &mut Vec<&'a Json>,
) -> Result<(), PersistenceError> {
    match json {
        Json::Array(items) => {
            match shape.get(depth) {
                Some(&n) if n != items.len() => {
                    return Err(PersistenceError::InvalidFormat(
                        "ragged nested array".to_string(),
                    ))
                }
                Some(_) => {}
                None => shape.push(items.len()),
            }
            for item in items {
                flatten(item, depth + 1, shape, out)?;
            }
        }
        leaf => out.push(leaf),
    }
    Ok(())
}

// ============================================================================
// TEXT AND BYTES
// ============================================================================

pub fn to_json_string(result_box: &ResultBox) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&encode_rows(result_box.iter()))?)
}

/// Reads a document, or a bare list of rows as written by older versions.
pub fn from_json_str(json: &str) -> Result<Vec<ResultRow>, PersistenceError> {
    match serde_json::from_str::<Stored>(json)? {
        Stored::Document(document) => decode_rows(document),
        Stored::Rows(rows) => decode_rows(Document {
            version: FORMAT_VERSION,
            variables: Vec::new(),
            rows,
        }),
    }
}

/// A ZIP archive holding the deflated JSON document.
pub fn to_bytes(result_box: &ResultBox) -> Result<Vec<u8>, PersistenceError> {
    let json = to_json_string(result_box)?;
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    writer.start_file(ARCHIVE_ENTRY, options)?;
    writer.write_all(json.as_bytes())?;
    Ok(writer.finish()?.into_inner())
}

pub fn from_bytes(bytes: &[u8]) -> Result<Vec<ResultRow>, PersistenceError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut json = String::new();
    archive.by_name(ARCHIVE_ENTRY)?.read_to_string(&mut json)?;
    from_json_str(&json)
}
