//! FILENAME: core/resultbox/src/combiner.rs
//! Incrementally maintained view of rows merged by independent mapping.
//!
//! Each row is observed once when it is appended. Rows whose independent
//! mappings fingerprint identically share one CombinedRecord, and the
//! dependent entries of later rows overwrite earlier ones key by key.

use std::hash::Hasher;

use rustc_hash::{FxHashMap, FxHasher};

use crate::row::{CombinedRecord, ResultRow};
use crate::value::{Record, Value};

// ============================================================================
// FINGERPRINT
// ============================================================================

/// Content digest of an independent mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

/// Fingerprints a mapping independently of its insertion order.
///
/// Entries are visited sorted by key. Text is hashed as its UTF-8 bytes,
/// nested mappings recurse, and every other value is hashed through its
/// string form.
pub fn fingerprint(record: &Record) -> Fingerprint {
    let mut hasher = FxHasher::default();
    write_record(&mut hasher, record);
    Fingerprint(hasher.finish())
}

fn write_record(hasher: &mut FxHasher, record: &Record) {
    let mut entries: Vec<_> = record.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        write_token(hasher, key.as_str().as_bytes());
        write_value(hasher, value);
    }
}

fn write_value(hasher: &mut FxHasher, value: &Value) {
    match value {
        Value::Text(s) => write_token(hasher, s.as_bytes()),
        Value::Map(inner) => {
            hasher.write_u8(b'{');
            write_record(hasher, inner);
            hasher.write_u8(b'}');
        }
        other => write_token(hasher, other.to_string().as_bytes()),
    }
}

/// Equality under the same rules the fingerprint hashes by.
fn identical(a: &Record, b: &Record) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, x)| b.get(key.as_str()).map_or(false, |y| identical_value(x, y)))
}

fn identical_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Map(x), Value::Map(y)) => identical(x, y),
        (Value::Text(_), _) | (_, Value::Text(_)) | (Value::Map(_), _) | (_, Value::Map(_)) => false,
        (x, y) => x.to_string() == y.to_string(),
    }
}

// 0xff never occurs in UTF-8, so tokens cannot run together.
fn write_token(hasher: &mut FxHasher, bytes: &[u8]) {
    hasher.write(bytes);
    hasher.write_u8(0xff);
}

// ============================================================================
// COMBINER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Combiner {
    positions: FxHashMap<Fingerprint, Vec<usize>>,
    records: Vec<CombinedRecord>,
}

impl Combiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays rows into a fresh combiner.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a ResultRow>) -> Self {
        let mut combiner = Combiner::new();
        for row in rows {
            combiner.observe(row);
        }
        combiner
    }

    /// Folds one row into its combined record. Returns the record position.
    pub fn observe(&mut self, row: &ResultRow) -> usize {
        self.fold(fingerprint(&row.independent), row)
    }

    fn fold(&mut self, fp: Fingerprint, row: &ResultRow) -> usize {
        let bucket = self.positions.entry(fp).or_default();
        let hit = bucket
            .iter()
            .copied()
            .find(|&p| identical(&self.records[p].independent, &row.independent));
        let position = match hit {
            Some(position) => position,
            None => {
                let position = self.records.len();
                self.records
                    .push(CombinedRecord::new(row.independent.clone()));
                bucket.push(position);
                position
            }
        };
        let record = &mut self.records[position];
        for (key, value) in &row.dependent {
            record.dependent.insert(key.clone(), value.clone());
        }
        position
    }

    /// Combined records in first-seen order.
    pub fn combined(&self) -> &[CombinedRecord] {
        &self.records
    }

    /// One flat mapping per combined record.
    pub fn minimal(&self) -> Vec<Record> {
        self.records.iter().map(|r| r.minimal()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
