//! Error types for the dedex-core library.
//!
//! Errors fall into three groups which drive how a run reacts to them:
//!
//! - configuration errors (bad option values, unknown writer) abort the run
//!   before any input is opened;
//! - per-input errors (missing file, archive without a container member,
//!   corrupt container) are reported and the input is skipped;
//! - everything else (extraction and output I/O) is fatal for the run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dedex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all dedex operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An option name the scanner does not know
    #[error("unsupported argument {0}")]
    UnsupportedArgument(String),

    /// An option name at the end of the token list
    #[error("missing value for option {0}")]
    MissingOptionValue(String),

    /// `-c` was given an empty pattern
    #[error("class pattern must not be empty")]
    EmptyClassPattern,

    /// The class pattern could not be compiled
    #[error("invalid class pattern '{pattern}': {source}")]
    InvalidClassPattern {
        /// Pattern as given on the command line
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Unknown keyword in a `-d` list
    #[error("unsupported display option {0}")]
    UnsupportedDisplayOption(String),

    /// `-o` points at something that is not an existing directory
    #[error("directory doesn't exist {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// `-w` names a writer that is not registered
    #[error("writer {0} not found")]
    WriterNotFound(String),

    /// No positional argument resolved to an input
    #[error("no input files")]
    NoInputs,

    /// A positional input does not exist
    #[error("couldn't find file {}", .0.display())]
    InputNotFound(PathBuf),

    /// An archive without the embedded container member
    #[error("no {member} in {}", .archive.display())]
    MissingArchiveMember {
        /// Archive that was searched
        archive: PathBuf,
        /// Member name that was looked up
        member: String,
    },

    /// The archive could not be opened or read as a zip file
    #[error("invalid archive '{}': {source}", .path.display())]
    InvalidArchive {
        /// Archive path
        path: PathBuf,
        /// Underlying zip error
        #[source]
        source: zip::result::ZipError,
    },

    /// Streaming an archive member into its temporary file failed
    #[error("failed to extract {member} from '{}': {source}", .archive.display())]
    Extraction {
        /// Archive being extracted
        archive: PathBuf,
        /// Member being extracted
        member: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed container data
    #[error("invalid dex data at offset {offset}: {details}")]
    InvalidContainer {
        /// Byte offset where the problem was found
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// Failed to read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output
    #[error("failed to write '{path}': {source}")]
    FileWrite {
        /// Destination that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create an output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A class name that would escape the output directory
    #[error("path traversal detected: '{path}' would escape output directory")]
    PathTraversal {
        /// The suspicious path
        path: PathBuf,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Creates a new invalid container error
    pub fn invalid_container(offset: usize, details: impl Into<String>) -> Self {
        Self::InvalidContainer {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new invalid archive error
    pub fn invalid_archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::InvalidArchive {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors that only affect a single input.
    ///
    /// The run reports these and moves on to the next input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound(_)
                | Self::MissingArchiveMember { .. }
                | Self::InvalidArchive { .. }
                | Self::InvalidContainer { .. }
                | Self::FileRead { .. }
        )
    }

    /// Returns true for errors caused by bad command-line configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedArgument(_)
                | Self::MissingOptionValue(_)
                | Self::EmptyClassPattern
                | Self::InvalidClassPattern { .. }
                | Self::UnsupportedDisplayOption(_)
                | Self::DirectoryNotFound(_)
                | Self::WriterNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::path_traversal("/etc/passwd");
        assert!(err.to_string().contains("path traversal"));
        assert!(err.to_string().contains("/etc/passwd"));

        let err = Error::WriterNotFound("klingon".into());
        assert_eq!(err.to_string(), "writer klingon not found");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::InputNotFound("a.dex".into()).is_recoverable());
        assert!(Error::invalid_container(0, "bad magic").is_recoverable());
        assert!(!Error::path_traversal("/test").is_recoverable());
        assert!(!Error::WriterNotFound("x".into()).is_recoverable());
    }

    #[test]
    fn test_is_configuration() {
        assert!(Error::UnsupportedDisplayOption("bogus".into()).is_configuration());
        assert!(Error::DirectoryNotFound("/nope".into()).is_configuration());
        assert!(!Error::NoInputs.is_configuration());
        assert!(!Error::InputNotFound("a.dex".into()).is_configuration());
    }
}
