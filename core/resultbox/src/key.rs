//! FILENAME: core/resultbox/src/key.rs
//! Mapping keys: either a plain name or a shared Variable.
//!
//! Equality, hashing and ordering only look at the canonical key string,
//! so `Key::from("d")` and a unit-less `Variable::new("d")` are the same key.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::variable::Variable;

#[derive(Clone)]
pub enum Key {
    Name(String),
    Var(Arc<Variable>),
}

impl Key {
    pub fn as_str(&self) -> &str {
        match self {
            Key::Name(name) => name,
            Key::Var(var) => var.key(),
        }
    }

    /// The attached Variable, if this key carries metadata.
    pub fn variable(&self) -> Option<&Arc<Variable>> {
        match self {
            Key::Name(_) => None,
            Key::Var(var) => Some(var),
        }
    }

    /// Components declared by the attached Variable.
    pub fn components(&self) -> Option<&[String]> {
        self.variable().and_then(|v| v.components())
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with str's Hash for the Borrow<str> lookups
        self.as_str().hash(state)
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<Variable> for Key {
    fn from(var: Variable) -> Self {
        Key::Var(Arc::new(var))
    }
}

impl From<Arc<Variable>> for Key {
    fn from(var: Arc<Variable>) -> Self {
        Key::Var(var)
    }
}

impl From<&Arc<Variable>> for Key {
    fn from(var: &Arc<Variable>) -> Self {
        Key::Var(Arc::clone(var))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_name_and_variable_are_interchangeable() {
        let name = Key::from("d");
        let var = Key::from(Variable::new("d"));
        assert_eq!(name, var);

        let mut map: IndexMap<Key, i32> = IndexMap::new();
        map.insert(var, 3);
        assert_eq!(map.get("d"), Some(&3));
        assert_eq!(map.get(&name), Some(&3));
    }

    #[test]
    fn test_unit_is_part_of_identity() {
        let a = Key::from(Variable::new("f").with_unit("N"));
        assert_ne!(a, Key::from("f"));
        assert_eq!(a, Key::from("f [N]"));
        assert_eq!(a.as_str(), "f [N]");
    }

    #[test]
    fn test_ordering_by_canonical_string() {
        let mut keys = vec![Key::from("b"), Key::from(Variable::new("a")), Key::from("c")];
        keys.sort();
        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
