//! Resolved run configuration.

use crate::display::DisplayOptions;
use crate::error::Result;
use crate::pattern::{ClassPattern, MATCH_ALL};
use std::path::{Path, PathBuf};

/// Configuration assembled from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Glob selecting the classes to render
    pub class_pattern: String,
    /// What each writer renders
    pub display_options: DisplayOptions,
    /// Per-class file output root; `None` writes to the console
    pub output_directory: Option<PathBuf>,
    /// Canonical writer name; `None` selects the registry default
    pub writer: Option<&'static str>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            class_pattern: MATCH_ALL.to_string(),
            display_options: DisplayOptions::default(),
            output_directory: None,
            writer: None,
        }
    }
}

impl ResolvedConfig {
    /// Creates a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the class pattern
    pub fn class_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.class_pattern = pattern.into();
        self
    }

    /// Sets the display options
    pub fn display_options(mut self, options: DisplayOptions) -> Self {
        self.display_options = options;
        self
    }

    /// Sets the output directory
    pub fn output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    /// Sets the writer by canonical name
    pub fn writer(mut self, name: &'static str) -> Self {
        self.writer = Some(name);
        self
    }

    /// Compiles the class pattern
    pub fn compile_pattern(&self) -> Result<ClassPattern> {
        ClassPattern::new(&self.class_pattern)
    }

    /// The output directory, if per-class files are requested
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_directory.as_deref()
    }
}
