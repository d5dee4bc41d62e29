//! FILENAME: core/resultbox/src/variable.rs
//! Variables describe the data stored against them.
//!
//! A variable is defined once (name, unit, optional x/y/z style components,
//! documentation) and then used as a key every time data for it is added.
//! Identity is the canonical key: the name, followed by ` [unit]` when a
//! unit is set. Two variables with the same name and unit are interchangeable.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SEP: &str = " - ";

fn default_sep() -> String {
    DEFAULT_SEP.to_string()
}

/// The serializable attributes of a Variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableAttrs {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub components: Option<Vec<String>>,
    #[serde(default = "default_sep")]
    pub sep: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Metadata for a named quantity. Immutable once shared through a `Key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VariableAttrs", into = "VariableAttrs")]
pub struct Variable {
    attrs: VariableAttrs,
    key: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_attrs(VariableAttrs {
            name: name.into(),
            doc: None,
            unit: None,
            components: None,
            sep: default_sep(),
            category: None,
            tags: None,
            identifier: None,
        })
    }

    pub fn from_attrs(attrs: VariableAttrs) -> Self {
        let key = append_unit(&attrs.name, attrs.unit.as_deref());
        Variable { attrs, key }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.attrs.doc = Some(doc.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.attrs.unit = Some(unit.into());
        self.key = append_unit(&self.attrs.name, self.attrs.unit.as_deref());
        self
    }

    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs.components = Some(components.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.attrs.sep = sep.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.attrs.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.attrs.identifier = Some(identifier.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.attrs.name
    }

    /// The documentation string, falling back to the name.
    pub fn doc(&self) -> &str {
        self.attrs.doc.as_deref().unwrap_or(&self.attrs.name)
    }

    pub fn unit(&self) -> Option<&str> {
        self.attrs.unit.as_deref()
    }

    pub fn components(&self) -> Option<&[String]> {
        self.attrs.components.as_deref()
    }

    pub fn sep(&self) -> &str {
        &self.attrs.sep
    }

    pub fn category(&self) -> Option<&str> {
        self.attrs.category.as_deref()
    }

    pub fn tags(&self) -> Option<&[String]> {
        self.attrs.tags.as_deref()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.attrs.identifier.as_deref()
    }

    pub fn attrs(&self) -> &VariableAttrs {
        &self.attrs
    }

    /// The canonical key, e.g. `"force [N]"`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The full key of one component, e.g. `"a - x [mm]"`.
    /// Returns None if the variable has no such component.
    pub fn component_key(&self, component: &str) -> Option<String> {
        let components = self.components()?;
        if !components.iter().any(|c| c == component) {
            return None;
        }
        let name = format!("{}{}{}", self.attrs.name, self.attrs.sep, component);
        Some(append_unit(&name, self.unit()))
    }

    /// Keys for every component, in declaration order.
    pub fn subkeys(&self) -> Option<Vec<String>> {
        let components = self.components()?;
        Some(
            components
                .iter()
                .map(|c| {
                    let name = format!("{}{}{}", self.attrs.name, self.attrs.sep, c);
                    append_unit(&name, self.unit())
                })
                .collect(),
        )
    }

    /// The variable name with a trailing colon. Used as the axis name for
    /// component labels in tables.
    pub fn label(&self) -> String {
        format!("{}:", self.attrs.name)
    }

    /// Display label for one component along a component axis, e.g. `"x [mm]"`.
    pub fn component_label(&self, component: &str) -> String {
        append_unit(component, self.unit())
    }
}

impl From<VariableAttrs> for Variable {
    fn from(attrs: VariableAttrs) -> Self {
        Variable::from_attrs(attrs)
    }
}

impl From<Variable> for VariableAttrs {
    fn from(variable: Variable) -> Self {
        variable.attrs
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

fn append_unit(name: &str, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{} [{}]", name, unit),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xyz() -> Variable {
        Variable::new("a")
            .with_doc("b")
            .with_unit("mm")
            .with_components(["x", "y", "z"])
    }

    #[test]
    fn test_key_includes_unit() {
        let v = Variable::new("a").with_doc("b").with_unit("mm");
        assert_eq!(v.key(), "a [mm]");
        assert_eq!(v.to_string(), "a [mm]");
        assert_eq!(v.doc(), "b");
    }

    #[test]
    fn test_doc_defaults_to_name() {
        let v = Variable::new("speed");
        assert_eq!(v.doc(), "speed");
        assert_eq!(v.key(), "speed");
    }

    #[test]
    fn test_component_key() {
        let v = xyz();
        assert_eq!(v.component_key("x").as_deref(), Some("a - x [mm]"));
        assert_eq!(v.component_key("w"), None);
        assert_eq!(v.key(), "a [mm]");
    }

    #[test]
    fn test_subkeys() {
        let v = xyz();
        assert_eq!(
            v.subkeys().unwrap(),
            vec!["a - x [mm]", "a - y [mm]", "a - z [mm]"]
        );
        assert!(Variable::new("plain").subkeys().is_none());
    }

    #[test]
    fn test_labels() {
        let v = xyz();
        assert_eq!(v.label(), "a:");
        assert_eq!(v.component_label("y"), "y [mm]");
    }

    #[test]
    fn test_serde_round_trip_restores_key() {
        let v = xyz().with_category("geometry").with_tags(["t1"]).with_identifier("id-7");
        let json = serde_json::to_string(&v).unwrap();
        let back: Variable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.key(), "a [mm]");
        assert_eq!(back.identifier(), Some("id-7"));
    }
}
