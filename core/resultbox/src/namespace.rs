//! FILENAME: core/resultbox/src/namespace.rs
//! Named registries of Stores or Aliases.
//!
//! A caller owns a Namespace and hands out entries by name. Asking for an
//! entry without a name creates an anonymous, auto-numbered one.

use indexmap::IndexMap;

use crate::aliases::Aliases;
use crate::error::{BoxError, Result};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Namespace<T> {
    entries: IndexMap<String, T>,
    counter: usize,
    active: Option<String>,
}

pub type StoreNamespace = Namespace<Store>;
pub type AliasNamespace = Namespace<Aliases>;

impl<T> Default for Namespace<T> {
    fn default() -> Self {
        Namespace {
            entries: IndexMap::new(),
            counter: 0,
            active: None,
        }
    }
}

impl<T: Default + Clone> Namespace<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named entry, creating it if needed. With no name, a new
    /// anonymous entry is created under the next free number.
    pub fn get(&mut self, name: Option<&str>) -> &mut T {
        let name = match name {
            Some(name) => name.to_string(),
            None => loop {
                let candidate = self.counter.to_string();
                self.counter += 1;
                if !self.entries.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        self.entries.entry(name).or_default()
    }

    /// Creates (or replaces) an entry with a fresh default value.
    pub fn create(&mut self, name: &str) -> &mut T {
        let slot = self.entries.entry(name.to_string()).or_default();
        *slot = T::default();
        slot
    }

    /// Copies an existing entry under a new name.
    pub fn duplicate(&mut self, name: &str, new_name: &str) -> Result<&mut T> {
        let copy = self
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| BoxError::KeyNotFound(format!("{} not found in name space", name)))?;
        let slot = self.entries.entry(new_name.to_string()).or_default();
        *slot = copy;
        Ok(slot)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selects the active entry; `None` clears the selection.
    pub fn set_active(&mut self, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) if !self.entries.contains_key(name) => Err(BoxError::KeyNotFound(
                format!("{} not found in name space", name),
            )),
            _ => {
                self.active = name.map(str::to_string);
                Ok(())
            }
        }
    }

    pub fn active(&self) -> Option<&T> {
        self.active.as_ref().and_then(|name| self.entries.get(name))
    }

    pub fn active_mut(&mut self) -> Option<&mut T> {
        match &self.active {
            Some(name) => self.entries.get_mut(name),
            None => None,
        }
    }
}
