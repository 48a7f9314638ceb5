//! Command-line scanning.
//!
//! Tokens are consumed left to right by a two-state machine. A token starting
//! with `-` names an option; the next token is always that option's value.
//! Any other token is a positional input and is resolved immediately.
//!
//! ```text
//!                  "-x"
//!   AwaitingOption ----> AwaitingValue(x)
//!        ^  |                  |
//!        |  | other            | value
//!        |  v                  |
//!      positional <------------+
//! ```

use crate::config::ResolvedConfig;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::input::{InputEntry, InputResolver};
use crate::writer::WriterRegistry;
use std::fmt;
use std::path::Path;
use tracing::{trace, warn};

/// Options understood by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionName {
    /// `-c <pattern>`
    ClassPattern,
    /// `-d <list>`
    Display,
    /// `-o <dir>`
    OutputDirectory,
    /// `-w <name>`
    Writer,
}

impl OptionName {
    /// Parses an option token such as `-c`
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "-c" => Ok(OptionName::ClassPattern),
            "-d" => Ok(OptionName::Display),
            "-o" => Ok(OptionName::OutputDirectory),
            "-w" => Ok(OptionName::Writer),
            _ => Err(Error::UnsupportedArgument(token.to_string())),
        }
    }

    /// The token spelling of this option
    pub fn flag(self) -> &'static str {
        match self {
            OptionName::ClassPattern => "-c",
            OptionName::Display => "-d",
            OptionName::OutputDirectory => "-o",
            OptionName::Writer => "-w",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// The next token is an option name or a positional input
    AwaitingOptionOrPositional,
    /// The next token is the value of this option
    AwaitingValue(OptionName),
}

/// Result of a complete scan
#[derive(Debug)]
pub struct ParsedArgs {
    /// The resolved configuration
    pub config: ResolvedConfig,
    /// Inputs in command-line order
    pub inputs: Vec<InputEntry>,
}

/// Builds a [`ResolvedConfig`] and input list from raw tokens
#[derive(Debug)]
pub struct ArgumentParser<'a> {
    registry: &'a WriterRegistry,
    resolver: InputResolver<'a>,
    state: ScanState,
    config: ResolvedConfig,
    inputs: Vec<InputEntry>,
}

impl<'a> ArgumentParser<'a> {
    /// Creates a parser; temporary extractions are recorded in `ctx`
    pub fn new(registry: &'a WriterRegistry, ctx: &'a mut RunContext) -> Self {
        Self {
            registry,
            resolver: InputResolver::new(ctx),
            state: ScanState::AwaitingOptionOrPositional,
            config: ResolvedConfig::default(),
            inputs: Vec::new(),
        }
    }

    /// Current scanner state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Configuration accumulated so far
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Inputs resolved so far
    pub fn inputs(&self) -> &[InputEntry] {
        &self.inputs
    }

    /// Scans every token and finishes
    pub fn parse<I, S>(mut self, tokens: I) -> Result<ParsedArgs>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            self.feed(token.as_ref())?;
        }
        self.finish()
    }

    /// Consumes a single token
    pub fn feed(&mut self, token: &str) -> Result<()> {
        match self.state {
            ScanState::AwaitingValue(option) => {
                trace!("Value for {}: {}", option, token);
                self.apply(option, token)?;
                self.state = ScanState::AwaitingOptionOrPositional;
            }
            ScanState::AwaitingOptionOrPositional if token.starts_with('-') => {
                self.state = ScanState::AwaitingValue(OptionName::from_token(token)?);
            }
            ScanState::AwaitingOptionOrPositional => self.positional(token)?,
        }
        Ok(())
    }

    /// Ends the scan.
    ///
    /// Fails if an option is still waiting for its value or if no input
    /// was resolved.
    pub fn finish(self) -> Result<ParsedArgs> {
        if let ScanState::AwaitingValue(option) = self.state {
            return Err(Error::MissingOptionValue(option.flag().to_string()));
        }
        if self.inputs.is_empty() {
            return Err(Error::NoInputs);
        }
        Ok(ParsedArgs {
            config: self.config,
            inputs: self.inputs,
        })
    }

    fn apply(&mut self, option: OptionName, value: &str) -> Result<()> {
        match option {
            OptionName::ClassPattern => {
                if value.is_empty() {
                    return Err(Error::EmptyClassPattern);
                }
                self.config.class_pattern = value.to_string();
            }
            OptionName::Display => self.config.display_options.add_list(value)?,
            OptionName::OutputDirectory => {
                let dir = Path::new(value.trim());
                if !dir.is_dir() {
                    return Err(Error::DirectoryNotFound(dir.to_path_buf()));
                }
                self.config.output_directory = Some(dir.to_path_buf());
            }
            OptionName::Writer => {
                self.config.writer = Some(self.registry.resolve(value.trim())?);
            }
        }
        Ok(())
    }

    fn positional(&mut self, token: &str) -> Result<()> {
        match self.resolver.resolve(token) {
            Ok(Some(entry)) => self.inputs.push(entry),
            Ok(None) => {}
            Err(e) if e.is_recoverable() => warn!("{}", e),
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

/// Usage text listing every registered writer
pub fn usage(registry: &WriterRegistry) -> String {
    format!(
        "Usage:\n\
         \tdedex [options] <file.dex|apk> [file2.dex ... fileN.dex]\n\
         \n\
         \t-c <pattern>. Display only classes matching the pattern. * is a wildcard\n\
         \t-d <display[,display...]>. Options are All, Classes, Methods, Fields, OpCodes\n\
         \t-o <directory>. Write classes to individual files in the output directory\n\
         \t-w <language>. One of {}\n",
        registry.keys().join(", ")
    )
}
