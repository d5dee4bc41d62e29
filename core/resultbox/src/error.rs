//! FILENAME: core/resultbox/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoxError {
    /// An array does not line up with the number of keys or components it is paired with.
    #[error("Shape mismatch for {context}: expected an axis of length {expected}, got shape {shape:?}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        shape: Vec<usize>,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Key \"{0}\" already exists. Names must be unique.")]
    DuplicateKey(String),

    #[error("No rows matched: {0}")]
    EmptyResult(String),

    #[error("No rows in source")]
    EmptySource,

    #[error("Ambiguous interpolation input: {0}")]
    AmbiguousInterpolationInput(String),

    /// Values that have no total order between them (e.g. text against numbers).
    #[error("Values cannot be ordered: {0}")]
    Incomparable(String),

    #[error("Values for \"{key}\" are 2D; a component index must be selected")]
    ComponentRequired { key: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, BoxError>;

impl BoxError {
    pub fn shape(context: impl Into<String>, expected: usize, shape: Vec<usize>) -> Self {
        BoxError::ShapeMismatch {
            context: context.into(),
            expected,
            shape,
        }
    }
}
