//! FILENAME: core/persistence/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("No handler registered as \"{0}\"")]
    NoHandler(String),
}
