//! FILENAME: core/pivot-engine/src/definition.rs
//! Table Definition - What a table should show.
//!
//! These types DESCRIBE a table over a ResultBox: which keys become values,
//! which become the row and column axes, and how collisions aggregate.
//! Aliases and a Store may be borrowed for translation and component
//! expansion.

use serde::{Deserialize, Serialize};

use resultbox::utils::interp::InterpOptions;
use resultbox::{Aliases, Key, Store, Variable};

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for values that fall into the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    Count,
    Average,
    Min,
    Max,
    CountNumbers,
    StdDev,
    StdDevP,
    Var,
    VarP,
    Product,
    /// First value seen; works for any value type.
    First,
    /// Last value seen; works for any value type.
    Last,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Average
    }
}

impl AggregationType {
    /// Whether every input must be numeric.
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            AggregationType::Count | AggregationType::First | AggregationType::Last
        )
    }
}

/// Sort order for axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
    DataSourceOrder,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Ascending
    }
}

// ============================================================================
// FIELDS
// ============================================================================

/// One level of the row or column axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A key looked up in each record.
    Key(Key),
    /// A Variable's component label, e.g. `"d:"`. Each record is unfolded
    /// into one sub-row per component; requires a Store.
    Components(String),
}

impl Field {
    /// The component level of a Variable.
    pub fn components_of(variable: &Variable) -> Self {
        Field::Components(variable.label())
    }

    /// Level name as shown in the table header.
    pub fn name(&self) -> &str {
        match self {
            Field::Key(key) => key.as_str(),
            Field::Components(label) => label,
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        if s.ends_with(':') {
            Field::Components(s.to_string())
        } else {
            Field::Key(Key::from(s))
        }
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::from(s.as_str())
    }
}

impl From<Key> for Field {
    fn from(key: Key) -> Self {
        Field::Key(key)
    }
}

impl From<&Key> for Field {
    fn from(key: &Key) -> Self {
        Field::Key(key.clone())
    }
}

// ============================================================================
// TABLE SPEC
// ============================================================================

/// The complete description of a pivot table.
#[derive(Debug, Clone, Default)]
pub struct TableSpec<'a> {
    /// Keys whose values fill the cells. More than one adds an outer
    /// column level naming the value key.
    pub values: Vec<Key>,

    /// Column axis levels (outer to inner).
    pub columns: Vec<Field>,

    /// Row axis levels (outer to inner). Inferred from the data when `None`.
    pub index: Option<Vec<Field>>,

    pub aggregation: AggregationType,

    pub sort_order: SortOrder,

    /// Translates record keys and the fields above before tabulating.
    pub aliases: Option<&'a Aliases>,

    /// Resolves `Field::Components` labels and expands Variable values.
    pub store: Option<&'a Store>,
}

impl<'a> TableSpec<'a> {
    pub fn new<V, C>(values: V, columns: C) -> Self
    where
        V: IntoIterator,
        V::Item: Into<Key>,
        C: IntoIterator,
        C::Item: Into<Field>,
    {
        TableSpec {
            values: values.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            ..TableSpec::default()
        }
    }

    pub fn with_index<I>(mut self, index: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Field>,
    {
        self.index = Some(index.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationType) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_aliases(mut self, aliases: &'a Aliases) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn with_store(mut self, store: &'a Store) -> Self {
        self.store = Some(store);
        self
    }

    /// `values`/`index`/`columns` as text, for error messages.
    pub fn describe(&self) -> (String, String, String) {
        let join = |names: Vec<&str>| format!("[{}]", names.join(", "));
        let values = join(self.values.iter().map(|k| k.as_str()).collect());
        let index = match &self.index {
            Some(index) => join(index.iter().map(|f| f.name()).collect()),
            None => "(inferred)".to_string(),
        };
        let columns = join(self.columns.iter().map(|f| f.name()).collect());
        (values, index, columns)
    }
}

// ============================================================================
// VECTOR TABLE SPEC
// ============================================================================

/// Where the common sample points go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orient {
    /// Sample points down the rows, one column per record (and component).
    Rows,
    /// The transpose of `Rows`.
    Cols,
}

impl Default for Orient {
    fn default() -> Self {
        Orient::Rows
    }
}

/// A table of vector values resampled onto common sample points.
#[derive(Debug, Clone)]
pub struct VectorTableSpec {
    /// Key of the sampled values in each record.
    pub values: Key,

    /// Key of each record's sample points.
    pub index: Key,

    /// Common sample points. When `None`, records must share identical
    /// sample points or a spanning range is built.
    pub index_vals: Option<Vec<f64>>,

    pub orient: Orient,

    /// Component names for 2D values. Defaults to the Variable's components.
    pub components: Option<Vec<String>>,

    /// Use combined records rather than raw rows.
    pub combine: bool,

    /// Spacing of the spanning range; inferred when `None`.
    pub step: Option<f64>,

    pub interp: InterpOptions,
}

impl VectorTableSpec {
    pub fn new(values: impl Into<Key>, index: impl Into<Key>) -> Self {
        VectorTableSpec {
            values: values.into(),
            index: index.into(),
            index_vals: None,
            orient: Orient::Rows,
            components: None,
            combine: true,
            step: None,
            interp: InterpOptions::default(),
        }
    }

    pub fn with_index_vals(mut self, index_vals: Vec<f64>) -> Self {
        self.index_vals = Some(index_vals);
        self
    }

    pub fn with_orient(mut self, orient: Orient) -> Self {
        self.orient = orient;
        self
    }

    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components = Some(components.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_combine(mut self, combine: bool) -> Self {
        self.combine = combine;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
}
