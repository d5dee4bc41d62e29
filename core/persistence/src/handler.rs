//! FILENAME: core/persistence/src/handler.rs
//! File handlers: one per on-disk format.

use std::fs;
use std::path::Path;

use resultbox::{ResultBox, ResultRow};

use crate::codec::{from_bytes, from_json_str, to_bytes, to_json_string};
use crate::error::PersistenceError;

/// Reads and writes boxes in one format.
pub trait Handler {
    /// File extension without the dot.
    fn extension(&self) -> &str;

    /// Whether this handler should process `path`.
    fn suitable(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension())
    }

    fn save(&self, result_box: &ResultBox, path: &Path) -> Result<(), PersistenceError>;

    fn load(&self, path: &Path) -> Result<Vec<ResultRow>, PersistenceError>;
}

// ============================================================================
// PLAIN JSON
// ============================================================================

/// Plain JSON text (`.box`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

impl Handler for JsonHandler {
    fn extension(&self) -> &str {
        "box"
    }

    fn save(&self, result_box: &ResultBox, path: &Path) -> Result<(), PersistenceError> {
        fs::write(path, to_json_string(result_box)?)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Vec<ResultRow>, PersistenceError> {
        from_json_str(&fs::read_to_string(path)?)
    }
}

// ============================================================================
// COMPRESSED JSON
// ============================================================================

/// A ZIP archive with one deflated JSON entry (`.cbox`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipJsonHandler;

impl Handler for ZipJsonHandler {
    fn extension(&self) -> &str {
        "cbox"
    }

    fn save(&self, result_box: &ResultBox, path: &Path) -> Result<(), PersistenceError> {
        fs::write(path, to_bytes(result_box)?)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Vec<ResultRow>, PersistenceError> {
        from_bytes(&fs::read(path)?)
    }
}
