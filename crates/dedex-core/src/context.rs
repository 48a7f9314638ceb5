//! Per-run state: the temporary files created while resolving inputs.
//!
//! Temporary extractions live until the end of the run. [`RunContext::cleanup`]
//! deletes them; dropping the context does the same for anything still
//! recorded, so error paths and panics cannot leak them.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};

/// Prefix of every temporary extraction
const TEMP_PREFIX: &str = "dedex-";

/// State owned by a single run
#[derive(Debug)]
pub struct RunContext {
    temp_dir: PathBuf,
    temp_files: Vec<TempPath>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Creates a context that extracts into the system temp directory
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    /// Creates a context that extracts into `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: dir.into(),
            temp_files: Vec::new(),
        }
    }

    /// Directory holding temporary extractions
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Allocates a new uniquely named temporary file
    pub(crate) fn create_temp_file(&self, suffix: &str) -> io::Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(suffix)
            .tempfile_in(&self.temp_dir)
    }

    /// Takes ownership of a temporary file until cleanup
    pub(crate) fn track(&mut self, path: TempPath) {
        debug!("Tracking temporary file {}", path.display());
        self.temp_files.push(path);
    }

    /// Paths of the temporary files not yet deleted
    pub fn temp_files(&self) -> impl Iterator<Item = &Path> {
        self.temp_files.iter().map(|p| &**p)
    }

    /// Deletes every recorded temporary file and returns how many were removed.
    ///
    /// Failures are logged; each file is attempted exactly once.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.temp_files.drain(..) {
            let shown = path.display().to_string();
            match path.close() {
                Ok(()) => {
                    debug!("Removed temporary file {}", shown);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove temporary file {}: {}", shown, e),
            }
        }
        removed
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        self.cleanup();
    }
}
