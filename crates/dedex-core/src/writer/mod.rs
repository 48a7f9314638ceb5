//! Output writers.
//!
//! A writer turns one [`DexClass`] into text, rendering only the parts
//! selected by [`DisplayOptions`]. Writers are looked up by name through the
//! [`WriterRegistry`].
//!
//! ## Extensibility
//!
//! Implement [`DexWriter`] and register a factory:
//!
//! ```no_run
//! use dedex_core::writer::{DexWriter, WriterRegistry};
//! use dedex_core::{Dex, DexClass, DisplayOptions};
//! use std::io::{self, Write};
//!
//! #[derive(Debug)]
//! struct NamesOnly;
//!
//! impl DexWriter for NamesOnly {
//!     fn name(&self) -> &'static str { "Names Only" }
//!     fn extension(&self) -> &'static str { ".lst" }
//!     fn attach(&mut self, _dex: &Dex) {}
//!     fn write_class(&self, class: &DexClass, _: &DisplayOptions, out: &mut dyn Write) -> io::Result<()> {
//!         writeln!(out, "{}", class.name)
//!     }
//! }
//!
//! let mut registry = WriterRegistry::new();
//! registry.register("Names Only", || Box::new(NamesOnly));
//! ```

mod java;
mod plain;
mod registry;

use crate::dex::{CodeItem, Dex, DexClass};
use crate::display::DisplayOptions;
use std::fmt;
use std::io::{self, Write};

pub use java::JavaWriter;
pub use plain::PlainTextWriter;
pub use registry::{lookup_key, WriterFactory, WriterRegistry};

/// Code units shown per line of an opcode listing
const UNITS_PER_LINE: usize = 8;

/// Trait for rendering classes as text
pub trait DexWriter: fmt::Debug {
    /// Canonical display name, e.g. `Plain Text`
    fn name(&self) -> &'static str;

    /// File extension (with leading dot) used in per-class output
    fn extension(&self) -> &'static str;

    /// Binds the writer to the container whose classes follow
    fn attach(&mut self, dex: &Dex);

    /// Renders one class
    fn write_class(
        &self,
        class: &DexClass,
        options: &DisplayOptions,
        out: &mut dyn Write,
    ) -> io::Result<()>;
}

/// Formats bytecode as lines of `offset: unit unit ...` in hex
pub(crate) fn opcode_lines(code: &CodeItem) -> Vec<String> {
    code.instructions
        .chunks(UNITS_PER_LINE)
        .enumerate()
        .map(|(line, units)| {
            let hex = units
                .iter()
                .map(|unit| format!("{:04x}", unit))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{:04x}: {}", line * UNITS_PER_LINE, hex)
        })
        .collect()
}
