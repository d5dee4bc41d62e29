//! FILENAME: core/persistence/src/lib.rs
//! ResultBox Persistence Module
//!
//! Saves and loads boxes as plain JSON (`.box`) or as a ZIP archive holding
//! deflated JSON (`.cbox`). Handlers are chosen by a `Manager`; `save` and
//! `load` use a default one.

mod error;
pub mod codec;
pub mod handler;
pub mod manager;

use std::path::{Path, PathBuf};

pub use codec::{
    decode_rows, encode_rows, encode_value, from_bytes, from_json_str, to_bytes, to_json_string,
    Document, StoredRow, ARCHIVE_ENTRY, FORMAT_VERSION,
};
pub use error::PersistenceError;
pub use handler::{Handler, JsonHandler, ZipJsonHandler};
pub use manager::Manager;

use resultbox::ResultBox;

/// Saves with the default manager. Returns the path written.
pub fn save(result_box: &ResultBox, target: impl AsRef<Path>) -> Result<PathBuf, PersistenceError> {
    Manager::new().save(result_box, target, None)
}

/// Loads with the default manager.
pub fn load(source: impl AsRef<Path>) -> Result<ResultBox, PersistenceError> {
    Manager::new().load(source, None)
}
