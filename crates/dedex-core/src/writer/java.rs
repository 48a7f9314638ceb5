//! Java-like declaration skeletons.
//!
//! Produces something that reads like Java source: package, annotations,
//! class header, field declarations and method signatures. Method bodies
//! are only emitted when opcodes are requested, holding the bytecode
//! listing as comments.

use super::{opcode_lines, DexWriter};
use crate::dex::{Dex, DexClass, DexMethod, MemberKind};
use crate::display::{DisplayFlag, DisplayOptions};
use std::io::{self, Write};

const INDENT: &str = "    ";

/// Writes classes as Java declarations
#[derive(Debug, Default)]
pub struct JavaWriter {
    dex_version: Option<String>,
}

impl JavaWriter {
    /// Creates an unattached writer
    pub fn new() -> Self {
        Self::default()
    }

    fn write_header(
        &self,
        class: &DexClass,
        options: &DisplayOptions,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let details = options.contains(DisplayFlag::ClassDetails);

        let mut words = Vec::new();
        if details {
            words = class.access_flags.modifiers(MemberKind::Class);
        }
        words.push(class.access_flags.class_keyword());
        words.push(class.simple_name());

        if details {
            let is_interface = class.access_flags.class_keyword() != "class"
                && class.access_flags.class_keyword() != "enum";
            if let Some(superclass) = &class.superclass {
                if superclass != "java.lang.Object" && !is_interface {
                    words.push("extends");
                    words.push(superclass);
                }
            }
            if !class.interfaces.is_empty() {
                words.push(if is_interface { "extends" } else { "implements" });
            }
        }

        write!(out, "{}", words.join(" "))?;
        if details && !class.interfaces.is_empty() {
            write!(out, " {}", class.interfaces.join(", "))?;
        }
        writeln!(out, " {{")
    }

    fn write_method(
        &self,
        class: &DexClass,
        method: &DexMethod,
        options: &DisplayOptions,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if options.contains(DisplayFlag::MethodAnnotations) {
            for annotation in &method.annotations {
                writeln!(out, "{}@{}", INDENT, annotation)?;
            }
        }

        let modifiers = method.access_flags.modifiers(MemberKind::Method);
        let params = method
            .parameters
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("{} arg{}", ty, i))
            .collect::<Vec<_>>()
            .join(", ");

        let signature = if method.name == "<clinit>" {
            "static".to_string()
        } else if method.is_constructor() {
            let mut words = modifiers;
            words.push(class.simple_name());
            format!("{}({})", words.join(" "), params)
        } else {
            let mut words = modifiers;
            words.push(&method.return_type);
            words.push(&method.name);
            format!("{}({})", words.join(" "), params)
        };

        let code = method
            .code
            .as_ref()
            .filter(|_| options.contains(DisplayFlag::OpCodes));
        match code {
            Some(code) => {
                writeln!(out, "{}{} {{", INDENT, signature)?;
                writeln!(out, "{0}{0}// registers: {1}", INDENT, code.registers)?;
                for line in opcode_lines(code) {
                    writeln!(out, "{0}{0}// {1}", INDENT, line)?;
                }
                writeln!(out, "{}}}", INDENT)
            }
            None => writeln!(out, "{}{};", INDENT, signature),
        }
    }
}

impl DexWriter for JavaWriter {
    fn name(&self) -> &'static str {
        "Java"
    }

    fn extension(&self) -> &'static str {
        ".java"
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
        if options.contains(DisplayFlag::ClassDetails) {
            if let Some(source) = &class.source_file {
                writeln!(out, "// Source: {}", source)?;
            }
            if let Some(version) = &self.dex_version {
                writeln!(out, "// Dex version: {}", version)?;
            }
        }

        if !class.package().is_empty() {
            writeln!(out, "package {};", class.package())?;
            writeln!(out)?;
        }

        if options.contains(DisplayFlag::ClassAnnotations) {
            for annotation in &class.annotations {
                writeln!(out, "@{}", annotation)?;
            }
        }

        self.write_header(class, options, out)?;

        if options.contains(DisplayFlag::Fields) {
            for field in &class.fields {
                let mut words = field.access_flags.modifiers(MemberKind::Field);
                words.push(&field.type_name);
                words.push(&field.name);
                writeln!(out, "{}{};", INDENT, words.join(" "))?;
            }
        }

        if options.contains(DisplayFlag::Methods) {
            for (i, method) in class.methods.iter().enumerate() {
                if i > 0 || (options.contains(DisplayFlag::Fields) && !class.fields.is_empty()) {
                    writeln!(out)?;
                }
                self.write_method(class, method, options, out)?;
            }
        }

        writeln!(out, "}}")?;
        writeln!(out)
    }
}
