//! FILENAME: core/resultbox/src/store.rs
//! A Store owns Variable identity for an analysis session.
//!
//! Variables are registered once and never removed. Lookups are by canonical
//! key, by fuzzy nearest key, by external identifier, or by axis label.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{BoxError, Result};
use crate::key::Key;
use crate::value::{Record, Value};
use crate::variable::Variable;

#[derive(Debug, Clone)]
pub struct Store {
    variables: IndexMap<String, Arc<Variable>>,
    /// Reject a variable whose key is already registered.
    pub enforce_unique: bool,
}

impl Default for Store {
    fn default() -> Self {
        Store {
            variables: IndexMap::new(),
            enforce_unique: true,
        }
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable and returns the shared handle used as a key.
    pub fn add(&mut self, variable: Variable) -> Result<Arc<Variable>> {
        let key = variable.key().to_string();
        if self.enforce_unique && self.variables.contains_key(&key) {
            return Err(BoxError::DuplicateKey(key));
        }
        let shared = Arc::new(variable);
        self.variables.insert(key, Arc::clone(&shared));
        Ok(shared)
    }

    /// Creates and registers a variable with a name and optional unit.
    pub fn new_variable(&mut self, name: &str, unit: Option<&str>) -> Result<Arc<Variable>> {
        let mut variable = Variable::new(name);
        if let Some(unit) = unit {
            variable = variable.with_unit(unit);
        }
        self.add(variable)
    }

    pub fn get(&self, key: &str) -> Result<Arc<Variable>> {
        self.variables
            .get(key)
            .cloned()
            .ok_or_else(|| BoxError::KeyNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Variable>> {
        self.variables.values()
    }

    /// The variable whose key is most similar to `key`.
    /// Equal scores resolve to the earliest registered variable.
    pub fn nearest(&self, key: &str) -> Option<Arc<Variable>> {
        let mut best: Option<(f64, &Arc<Variable>)> = None;
        for (candidate, variable) in &self.variables {
            let score = similarity(key, candidate);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, variable));
            }
        }
        best.map(|(_, v)| Arc::clone(v))
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<Arc<Variable>> {
        self.variables
            .values()
            .find(|v| v.identifier() == Some(identifier))
            .cloned()
    }

    /// Resolves a `"name:"` label marker to its variable.
    pub fn by_label(&self, label: &str) -> Option<Arc<Variable>> {
        if !label.ends_with(':') {
            return None;
        }
        self.variables
            .values()
            .find(|v| v.label() == label)
            .cloned()
    }

    /// Splits values of component variables into one entry per component.
    ///
    /// A value is split only when its length equals the number of components.
    /// Nested maps are expanded recursively and stay under their own key.
    pub fn expand_record(&self, record: &Record) -> Record {
        let mut out = Record::with_capacity(record.len());
        for (key, value) in record {
            if let Value::Map(inner) = value {
                out.insert(key.clone(), Value::Map(self.expand_record(inner)));
                continue;
            }
            let subkeys = self
                .variables
                .get(key.as_str())
                .and_then(|v| v.subkeys());
            match subkeys {
                Some(subkeys) if value.len() == Some(subkeys.len()) => {
                    for (subkey, part) in subkeys.into_iter().zip(value.elements()) {
                        out.insert(Key::from(subkey), part);
                    }
                }
                _ => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        out
    }

    /// Expands every record in a list.
    pub fn expand_records(&self, records: &[Record]) -> Vec<Record> {
        records.iter().map(|r| self.expand_record(r)).collect()
    }
}

// ============================================================================
// SIMILARITY
// ============================================================================

/// Ratcliff/Obershelp similarity in `[0, 1]`: twice the number of matching
/// characters divided by the total length of both strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_common_block(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

/// Longest common substring as (start in a, start in b, length); earliest wins.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut cur = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let k = prev[j] + 1;
                cur[j + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_add_and_get() {
        let mut store = Store::new();
        let a = store.new_variable("a", Some("mm")).unwrap();
        assert_eq!(a.key(), "a [mm]");
        assert_eq!(store.get("a [mm]").unwrap(), a);
        assert!(matches!(store.get("a"), Err(BoxError::KeyNotFound(_))));
    }

    #[test]
    fn test_duplicate_rejected_when_unique() {
        let mut store = Store::new();
        store.add(Variable::new("a")).unwrap();
        let err = store.add(Variable::new("a")).unwrap_err();
        assert_eq!(err, BoxError::DuplicateKey("a".to_string()));

        store.enforce_unique = false;
        assert!(store.add(Variable::new("a").with_doc("again")).is_ok());
        assert_eq!(store.get("a").unwrap().doc(), "again");
    }

    #[test]
    fn test_nearest() {
        let mut store = Store::new();
        store.new_variable("velocity", Some("m/s")).unwrap();
        store.new_variable("pressure", Some("Pa")).unwrap();
        store.new_variable("temperature", Some("K")).unwrap();
        assert_eq!(store.nearest("pressur").unwrap().key(), "pressure [Pa]");
        assert_eq!(store.nearest("temp").unwrap().key(), "temperature [K]");
        assert!(Store::new().nearest("x").is_none());
    }

    #[test]
    fn test_similarity_matches_gestalt_ratio() {
        assert_eq!(similarity("abcd", "abcd"), 1.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
        // "ab" and "d" match: 2 * 3 / 8
        assert!((similarity("abcd", "abxd") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_by_identifier_and_label() {
        let mut store = Store::new();
        store
            .add(Variable::new("pos").with_components(["x", "y"]).with_identifier("P1"))
            .unwrap();
        assert_eq!(store.by_identifier("P1").unwrap().name(), "pos");
        assert_eq!(store.by_label("pos:").unwrap().name(), "pos");
        assert!(store.by_label("pos").is_none());
    }

    #[test]
    fn test_expand_record() {
        let mut store = Store::new();
        let pos = store
            .add(Variable::new("pos").with_unit("m").with_components(["x", "y"]))
            .unwrap();
        let rec = record! {
            &pos => vec![1.0, 2.0],
            "other" => 5,
            "nested" => record! { &pos => vec![3.0, 4.0] },
        };
        let out = store.expand_record(&rec);
        assert_eq!(out.get("pos - x [m]"), Some(&Value::Float(1.0)));
        assert_eq!(out.get("pos - y [m]"), Some(&Value::Float(2.0)));
        assert_eq!(out.get("other"), Some(&Value::Int(5)));
        let nested = out.get("nested").and_then(|v| v.as_map()).unwrap();
        assert_eq!(nested.get("pos - x [m]"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_expand_skips_wrong_length() {
        let mut store = Store::new();
        let pos = store
            .add(Variable::new("pos").with_components(["x", "y"]))
            .unwrap();
        let rec = record! { &pos => vec![1, 2, 3] };
        let out = store.expand_record(&rec);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("pos"));
    }
}
