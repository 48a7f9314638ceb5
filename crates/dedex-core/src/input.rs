//! Input resolution.
//!
//! Positional arguments are classified by extension (case-insensitive):
//!
//! - `.dex` files are used in place;
//! - `.apk` archives have their `classes.dex` member streamed into a
//!   temporary file, which the [`RunContext`] deletes at the end of the run;
//! - anything else is ignored.

use crate::context::RunContext;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use zip::result::ZipError;
use zip::ZipArchive;

/// Extension of a bare container
pub const CONTAINER_EXTENSION: &str = "dex";

/// Extension of an archive holding a container
pub const ARCHIVE_EXTENSION: &str = "apk";

/// Archive member holding the container
pub const ARCHIVE_MEMBER: &str = "classes.dex";

/// Buffer size used when extracting archive members
const CHUNK_SIZE: usize = 4096;

/// How a positional argument is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A container file used directly
    Container,
    /// An archive whose container member is extracted first
    Archive,
}

impl InputKind {
    /// Classifies a path by its extension; `None` means the path is ignored
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            CONTAINER_EXTENSION => Some(InputKind::Container),
            ARCHIVE_EXTENSION => Some(InputKind::Archive),
            _ => None,
        }
    }
}

/// A resolved input ready for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEntry {
    path: PathBuf,
    source: PathBuf,
    display_name: String,
    temporary: bool,
}

impl InputEntry {
    /// An input read in place
    pub fn direct(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            display_name: file_name(&path),
            source: path.clone(),
            path,
            temporary: false,
        }
    }

    /// A container extracted from `archive` into the temporary file `path`
    pub fn extracted(path: impl Into<PathBuf>, archive: impl Into<PathBuf>) -> Self {
        let archive = archive.into();
        Self {
            path: path.into(),
            display_name: file_name(&archive),
            source: archive,
            temporary: true,
        }
    }

    /// File the container is read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path given on the command line (the archive for extracted inputs)
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Name shown in output banners
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether `path` is a temporary extraction
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turns positional arguments into [`InputEntry`] values
#[derive(Debug)]
pub struct InputResolver<'a> {
    ctx: &'a mut RunContext,
}

impl<'a> InputResolver<'a> {
    /// Creates a resolver that records temporary files in `ctx`
    pub fn new(ctx: &'a mut RunContext) -> Self {
        Self { ctx }
    }

    /// Resolves one positional argument.
    ///
    /// Returns `Ok(None)` for arguments with an unrecognized extension.
    /// Missing files and archives without a container yield recoverable
    /// errors; a failure while extracting is fatal.
    pub fn resolve(&mut self, arg: &str) -> Result<Option<InputEntry>> {
        let path = Path::new(arg);
        match InputKind::classify(path) {
            Some(InputKind::Container) => {
                if !path.is_file() {
                    return Err(Error::InputNotFound(path.to_path_buf()));
                }
                debug!("Input {}", path.display());
                Ok(Some(InputEntry::direct(path)))
            }
            Some(InputKind::Archive) => self.extract(path).map(Some),
            None => {
                trace!("Ignoring argument {}", arg);
                Ok(None)
            }
        }
    }

    fn extract(&mut self, archive_path: &Path) -> Result<InputEntry> {
        if !archive_path.is_file() {
            return Err(Error::InputNotFound(archive_path.to_path_buf()));
        }

        let file = File::open(archive_path).map_err(|e| Error::file_read(archive_path, e))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| Error::invalid_archive(archive_path, e))?;

        let mut member = match archive.by_name(ARCHIVE_MEMBER) {
            Ok(member) => member,
            Err(ZipError::FileNotFound) => {
                return Err(Error::MissingArchiveMember {
                    archive: archive_path.to_path_buf(),
                    member: ARCHIVE_MEMBER.to_string(),
                })
            }
            Err(e) => return Err(Error::invalid_archive(archive_path, e)),
        };

        let extraction_error = |source: io::Error| Error::Extraction {
            archive: archive_path.to_path_buf(),
            member: ARCHIVE_MEMBER.to_string(),
            source,
        };

        let temp = self
            .ctx
            .create_temp_file(".dex")
            .map_err(extraction_error)?;
        let (mut out, temp_path) = temp.into_parts();
        let path = temp_path.to_path_buf();
        self.ctx.track(temp_path);

        let bytes = copy_in_chunks(&mut member, &mut out).map_err(extraction_error)?;
        debug!(
            "Extracted {} ({} bytes) from {} to {}",
            ARCHIVE_MEMBER,
            bytes,
            archive_path.display(),
            path.display()
        );

        Ok(InputEntry::extracted(path, archive_path))
    }
}

/// Copies `reader` into `writer` one fixed-size chunk at a time
fn copy_in_chunks(reader: &mut impl Read, writer: &mut impl Write) -> io::Result<u64> {
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..read])?;
        total += read as u64;
    }

    writer.flush()?;
    Ok(total)
}
