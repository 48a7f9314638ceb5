//! Indented plain text outline of a class.

use super::{opcode_lines, DexWriter};
use crate::dex::{Dex, DexClass, DexMethod, MemberKind};
use crate::display::{DisplayFlag, DisplayOptions};
use std::io::{self, Write};

const INDENT: &str = "  ";

/// Writes classes as a plain text outline
#[derive(Debug, Default)]
pub struct PlainTextWriter {
    dex_version: Option<String>,
}

impl PlainTextWriter {
    /// Creates an unattached writer
    pub fn new() -> Self {
        Self::default()
    }

    fn write_method(
        &self,
        method: &DexMethod,
        options: &DisplayOptions,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if options.contains(DisplayFlag::MethodAnnotations) {
            for annotation in &method.annotations {
                writeln!(out, "{0}{0}@{1}", INDENT, annotation)?;
            }
        }

        let mut words = method.access_flags.modifiers(MemberKind::Method);
        words.push(&method.return_type);
        writeln!(
            out,
            "{0}{0}{1} {2}({3})",
            INDENT,
            words.join(" "),
            method.name,
            method.parameters.join(", ")
        )?;

        if options.contains(DisplayFlag::OpCodes) {
            if let Some(code) = &method.code {
                writeln!(out, "{0}{0}{0}registers: {1}", INDENT, code.registers)?;
                for line in opcode_lines(code) {
                    writeln!(out, "{0}{0}{0}{1}", INDENT, line)?;
                }
            }
        }
        Ok(())
    }
}

impl DexWriter for PlainTextWriter {
    fn name(&self) -> &'static str {
        "Plain Text"
    }

    fn extension(&self) -> &'static str {
        ".txt"
    }

    fn attach(&mut self, dex: &Dex) {
        self.dex_version = Some(dex.version().to_string());
    }

    fn write_class(
        &self,
        class: &DexClass,
        options: &DisplayOptions,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if options.contains(DisplayFlag::ClassName) {
            writeln!(out, "Class {}", class.name)?;
        }

        if options.contains(DisplayFlag::ClassAnnotations) && !class.annotations.is_empty() {
            writeln!(out, "{}Annotations:", INDENT)?;
            for annotation in &class.annotations {
                writeln!(out, "{0}{0}@{1}", INDENT, annotation)?;
            }
        }

        if options.contains(DisplayFlag::ClassDetails) {
            let modifiers = class.access_flags.modifiers(MemberKind::Class);
            writeln!(
                out,
                "{}Access: {}",
                INDENT,
                modifiers
                    .into_iter()
                    .chain(std::iter::once(class.access_flags.class_keyword()))
                    .collect::<Vec<_>>()
                    .join(" ")
            )?;
            if let Some(superclass) = &class.superclass {
                writeln!(out, "{}Extends: {}", INDENT, superclass)?;
            }
            if !class.interfaces.is_empty() {
                writeln!(out, "{}Implements: {}", INDENT, class.interfaces.join(", "))?;
            }
            if let Some(source) = &class.source_file {
                writeln!(out, "{}Source: {}", INDENT, source)?;
            }
            if let Some(version) = &self.dex_version {
                writeln!(out, "{}Dex version: {}", INDENT, version)?;
            }
        }

        if options.contains(DisplayFlag::Fields) && !class.fields.is_empty() {
            writeln!(out, "{}Fields:", INDENT)?;
            for field in &class.fields {
                let mut words = field.access_flags.modifiers(MemberKind::Field);
                words.push(&field.type_name);
                words.push(&field.name);
                writeln!(out, "{0}{0}{1}", INDENT, words.join(" "))?;
            }
        }

        let show_methods = options.contains(DisplayFlag::Methods)
            || options.contains(DisplayFlag::MethodAnnotations);
        if show_methods && !class.methods.is_empty() {
            writeln!(out, "{}Methods:", INDENT)?;
            for method in &class.methods {
                self.write_method(method, options, out)?;
            }
        }

        writeln!(out)
    }
}
