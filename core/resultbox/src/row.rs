//! FILENAME: core/resultbox/src/row.rs
//! Result rows, combined records, and the `Entry` view shared by both.

use std::sync::Arc;

use crate::key::Key;
use crate::value::{Record, Value};

// ============================================================================
// RESULT ROW
// ============================================================================

/// One appended observation. `index` equals its position in the owning box.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub index: usize,
    pub independent: Record,
    pub dependent: Record,
}

impl ResultRow {
    pub fn new(index: usize, independent: Record, dependent: Record) -> Self {
        ResultRow {
            index,
            independent,
            dependent,
        }
    }
}

// ============================================================================
// COMBINED RECORD
// ============================================================================

/// All rows sharing one independent mapping, with their dependent entries
/// merged (last write wins).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedRecord {
    pub independent: Record,
    pub dependent: Record,
}

impl CombinedRecord {
    pub fn new(independent: Record) -> Self {
        CombinedRecord {
            independent,
            dependent: Record::new(),
        }
    }

    /// Independent entries overlaid with dependent entries.
    pub fn minimal(&self) -> Record {
        overlay(&self.independent, &self.dependent)
    }
}

fn overlay(base: &Record, top: &Record) -> Record {
    let mut out = base.clone();
    for (k, v) in top {
        out.insert(k.clone(), v.clone());
    }
    out
}

// ============================================================================
// ENTRY
// ============================================================================

/// Read access common to rows, combined records and flat records.
///
/// A flat record has no independent/dependent split, so both views return
/// the same mapping.
pub trait Entry {
    fn independent(&self) -> &Record;

    fn dependent(&self) -> &Record;

    fn index(&self) -> Option<usize> {
        None
    }

    fn independent_value(&self, key: &str) -> Option<&Value> {
        self.independent().get(key)
    }

    fn dependent_value(&self, key: &str) -> Option<&Value> {
        self.dependent().get(key)
    }

    fn contains(&self, key: &str) -> bool {
        self.independent().contains_key(key) || self.dependent().contains_key(key)
    }

    fn contains_all(&self, keys: &[Key]) -> bool {
        keys.iter().all(|k| self.contains(k.as_str()))
    }

    /// Independent value, falling back to dependent.
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.independent_value(key)
            .or_else(|| self.dependent_value(key))
    }

    /// Dependent value, falling back to independent.
    fn lookup_dependent_first(&self, key: &str) -> Option<&Value> {
        self.dependent_value(key)
            .or_else(|| self.independent_value(key))
    }

    fn to_minimal(&self) -> Record {
        overlay(self.independent(), self.dependent())
    }
}

impl Entry for ResultRow {
    fn independent(&self) -> &Record {
        &self.independent
    }

    fn dependent(&self) -> &Record {
        &self.dependent
    }

    fn index(&self) -> Option<usize> {
        Some(self.index)
    }
}

impl Entry for CombinedRecord {
    fn independent(&self) -> &Record {
        &self.independent
    }

    fn dependent(&self) -> &Record {
        &self.dependent
    }

    fn to_minimal(&self) -> Record {
        self.minimal()
    }
}

impl Entry for Record {
    fn independent(&self) -> &Record {
        self
    }

    fn dependent(&self) -> &Record {
        self
    }

    fn to_minimal(&self) -> Record {
        self.clone()
    }
}

impl<E: Entry + ?Sized> Entry for Arc<E> {
    fn independent(&self) -> &Record {
        (**self).independent()
    }

    fn dependent(&self) -> &Record {
        (**self).dependent()
    }

    fn index(&self) -> Option<usize> {
        (**self).index()
    }
}

impl<E: Entry + ?Sized> Entry for &E {
    fn independent(&self) -> &Record {
        (**self).independent()
    }

    fn dependent(&self) -> &Record {
        (**self).dependent()
    }

    fn index(&self) -> Option<usize> {
        (**self).index()
    }
}
