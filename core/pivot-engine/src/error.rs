//! FILENAME: core/pivot-engine/src/error.rs

use resultbox::BoxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error(transparent)]
    Box(#[from] BoxError),

    /// A failure while pivoting, with the requested values and levels for context.
    #[error("Pivot failed (values={values}, index={index}, columns={columns}): {source}")]
    Pivot {
        values: String,
        index: String,
        columns: String,
        #[source]
        source: BoxError,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
