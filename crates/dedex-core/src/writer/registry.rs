//! Name-based writer lookup.

use super::{DexWriter, JavaWriter, PlainTextWriter};
use crate::error::{Error, Result};

/// Creates a fresh writer instance
pub type WriterFactory = fn() -> Box<dyn DexWriter>;

#[derive(Debug, Clone)]
struct WriterEntry {
    name: &'static str,
    key: String,
    factory: WriterFactory,
}

/// Ordered set of available writers; the first one is the default
#[derive(Debug, Clone)]
pub struct WriterRegistry {
    entries: Vec<WriterEntry>,
}

impl Default for WriterRegistry {
    /// Plain text (default) and Java
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("Plain Text", || Box::new(PlainTextWriter::new()));
        registry.register("Java", || Box::new(JavaWriter::new()));
        registry
    }
}

/// Normalizes a writer name for lookup: trimmed, lower-cased, spaces removed
pub fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "")
}

impl WriterRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a writer; a later registration with the same key replaces the earlier one
    pub fn register(&mut self, name: &'static str, factory: WriterFactory) {
        let key = lookup_key(name);
        let entry = WriterEntry { name, key, factory };
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Canonical writer names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Lookup keys in registration order
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    /// Name of the default writer, if any is registered
    pub fn default_name(&self) -> Option<&'static str> {
        self.entries.first().map(|e| e.name)
    }

    /// Resolves a canonical name or alias to the canonical name
    pub fn resolve(&self, name: &str) -> Result<&'static str> {
        self.find(name).map(|e| e.name)
    }

    /// Creates the writer registered under `name`
    pub fn create(&self, name: &str) -> Result<Box<dyn DexWriter>> {
        self.find(name).map(|e| (e.factory)())
    }

    /// Creates the default writer
    pub fn create_default(&self) -> Result<Box<dyn DexWriter>> {
        self.entries
            .first()
            .map(|e| (e.factory)())
            .ok_or_else(|| Error::WriterNotFound("<default>".to_string()))
    }

    fn find(&self, name: &str) -> Result<&WriterEntry> {
        let key = lookup_key(name);
        self.entries
            .iter()
            .find(|e| e.key == key)
            .ok_or_else(|| Error::WriterNotFound(name.trim().to_string()))
    }
}
