//! # dedex-core
//!
//! A library for dumping the classes of Dalvik executables (`.dex`) and of
//! the `classes.dex` embedded in Android packages (`.apk`).
//!
//! This crate provides the core functionality for:
//! - Scanning `dedex`-style command-line tokens into a run configuration
//! - Extracting containers from archives into tracked temporary files
//! - Reading the classes of a container
//! - Rendering classes through named writers, to the console or a file tree
//!
//! ## Architecture
//!
//! - [`args`]: Two-state argument scanner and usage text
//! - [`input`]: Classification of positional arguments and archive extraction
//! - [`dex`]: Container reader and class model
//! - [`writer`]: Writer trait, built-in writers and the registry
//! - [`output`]: Console and per-class file routing
//! - [`orchestrator`]: The per-input processing loop
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use dedex_core::{run, WriterRegistry};
//!
//! let registry = WriterRegistry::default();
//! let args = ["-c", "com.example.*", "-d", "methods", "app.apk"];
//! let summary = run(args, &registry, std::io::stdout().lock())?;
//! println!("{} classes written", summary.classes_written);
//! # Ok::<(), dedex_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod args;
pub mod config;
pub mod context;
pub mod dex;
pub mod display;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod output;
pub mod pattern;
pub mod writer;

// Re-export primary types for convenience
pub use args::{usage, ArgumentParser, OptionName, ParsedArgs, ScanState};
pub use config::ResolvedConfig;
pub use context::RunContext;
pub use dex::{ClassDef, Dex, DexClass};
pub use display::{DisplayFlag, DisplayOptions, DisplayPreset};
pub use error::{Error, Result};
pub use input::{InputEntry, InputResolver};
pub use orchestrator::{run, run_with, Orchestrator, RunSummary};
pub use output::{OutputMode, OutputRouter};
pub use pattern::ClassPattern;
pub use writer::{DexWriter, WriterRegistry};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
