//! FILENAME: core/persistence/src/manager.rs
//! Manager - Picks a handler for each save or load.
//!
//! Resolution order:
//! 1. The handler named in the call
//! 2. The handler set with `specify`
//! 3. A registered handler suitable for the path
//! 4. The default handler, with its extension appended to the path

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use resultbox::{ResultBox, ResultRow};

use crate::error::PersistenceError;
use crate::handler::{Handler, JsonHandler, ZipJsonHandler};

/// Registered handlers by key.
pub struct Manager {
    handlers: IndexMap<String, Box<dyn Handler>>,
    specified: Option<String>,
    /// Key of the handler used when no other applies.
    pub default_handler: String,
}

impl Default for Manager {
    fn default() -> Self {
        let mut manager = Manager {
            handlers: IndexMap::new(),
            specified: None,
            default_handler: "cbox".to_string(),
        };
        manager.add_handler("box", JsonHandler);
        manager.add_handler("cbox", ZipJsonHandler);
        manager
    }
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any with the same key.
    pub fn add_handler(&mut self, key: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.insert(key.into(), Box::new(handler));
    }

    pub fn remove_handler(&mut self, key: &str) -> Option<Box<dyn Handler>> {
        if self.specified.as_deref() == Some(key) {
            self.specified = None;
        }
        self.handlers.shift_remove(key)
    }

    /// Uses the named handler for every later call, or clears the choice.
    pub fn specify(&mut self, key: Option<&str>) {
        self.specified = key.map(str::to_string);
    }

    pub fn handler_keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    fn resolve(&self, path: &Path, key: Option<&str>) -> Result<(&dyn Handler, PathBuf), PersistenceError> {
        let named = key.or(self.specified.as_deref());
        if let Some(key) = named {
            let handler = self
                .handlers
                .get(key)
                .ok_or_else(|| PersistenceError::NoHandler(key.to_string()))?;
            return Ok((handler.as_ref(), path.to_path_buf()));
        }
        if let Some(handler) = self.handlers.values().find(|h| h.suitable(path)) {
            return Ok((handler.as_ref(), path.to_path_buf()));
        }
        let handler = self
            .handlers
            .get(&self.default_handler)
            .ok_or_else(|| PersistenceError::NoHandler(self.default_handler.clone()))?;
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(handler.extension());
        Ok((handler.as_ref(), PathBuf::from(name)))
    }

    /// Writes a box and returns the path actually written.
    pub fn save(
        &self,
        result_box: &ResultBox,
        target: impl AsRef<Path>,
        handler: Option<&str>,
    ) -> Result<PathBuf, PersistenceError> {
        let (handler, path) = self.resolve(target.as_ref(), handler)?;
        handler.save(result_box, &path)?;
        log::info!(
            target: "PERSIST",
            "Saved {} rows to {}",
            result_box.len(),
            path.display()
        );
        Ok(path)
    }

    /// Reads the raw rows.
    pub fn load_rows(
        &self,
        source: impl AsRef<Path>,
        handler: Option<&str>,
    ) -> Result<Vec<ResultRow>, PersistenceError> {
        let (handler, path) = self.resolve(source.as_ref(), handler)?;
        let rows = handler.load(&path)?;
        log::info!(target: "PERSIST", "Loaded {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Reads rows and rebuilds the box around them.
    pub fn load(&self, source: impl AsRef<Path>, handler: Option<&str>) -> Result<ResultBox, PersistenceError> {
        Ok(ResultBox::from_rows(self.load_rows(source, handler)?))
    }
}
