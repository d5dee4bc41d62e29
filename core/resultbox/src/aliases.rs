//! FILENAME: core/resultbox/src/aliases.rs
//! Alternative names for keys.
//!
//! Each alias maps to the key it stands for. Translation swaps aliases for
//! their keys inside records, lists and key specifiers; anything that is not
//! an alias passes through unchanged.

use indexmap::IndexMap;

use crate::key::Key;
use crate::row::ResultRow;
use crate::value::{Record, Value};

#[derive(Debug, Clone, Default)]
pub struct Aliases {
    map: IndexMap<String, Key>,
}

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, A, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, K)>,
        A: Into<String>,
        K: Into<Key>,
    {
        let mut aliases = Aliases::new();
        for (alias, key) in pairs {
            aliases.insert(alias, key);
        }
        aliases
    }

    pub fn insert(&mut self, alias: impl Into<String>, key: impl Into<Key>) {
        self.map.insert(alias.into(), key.into());
    }

    pub fn get(&self, alias: &str) -> Option<&Key> {
        self.map.get(alias)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn translate_key(&self, key: &Key) -> Key {
        self.map.get(key.as_str()).cloned().unwrap_or_else(|| key.clone())
    }

    pub fn translate_keys(&self, keys: &[Key]) -> Vec<Key> {
        keys.iter().map(|k| self.translate_key(k)).collect()
    }

    /// Translates mapping keys, recursing through nested maps and lists.
    pub fn translate_value(&self, value: &Value) -> Value {
        self.translate_inner(value, false)
    }

    pub fn translate_record(&self, record: &Record) -> Record {
        record
            .iter()
            .map(|(k, v)| (self.translate_key(k), self.translate_value(v)))
            .collect()
    }

    pub fn translate_row(&self, row: &ResultRow) -> ResultRow {
        ResultRow::new(
            row.index,
            self.translate_record(&row.independent),
            self.translate_record(&row.dependent),
        )
    }

    pub fn translate_rows<'a>(&self, rows: impl IntoIterator<Item = &'a ResultRow>) -> Vec<ResultRow> {
        rows.into_iter().map(|r| self.translate_row(r)).collect()
    }

    /// Translates text values as well as keys, leaving top-level keys alone.
    pub fn translate_value_strings(&self, record: &Record) -> Record {
        record
            .iter()
            .map(|(k, v)| (k.clone(), self.translate_inner(v, true)))
            .collect()
    }

    fn translate_inner(&self, value: &Value, strings: bool) -> Value {
        match value {
            Value::Map(inner) => Value::Map(
                inner
                    .iter()
                    .map(|(k, v)| (self.translate_key(k), self.translate_inner(v, strings)))
                    .collect(),
            ),
            Value::List(items) => {
                Value::List(items.iter().map(|v| self.translate_inner(v, strings)).collect())
            }
            Value::Text(s) if strings => match self.map.get(s.as_str()) {
                Some(key) => Value::Text(key.as_str().to_string()),
                None => value.clone(),
            },
            other => other.clone(),
        }
    }
}
