//! Display options: which parts of a class a writer renders.
//!
//! Options are built from presets named on the command line (`-d classes,methods`)
//! and only ever accumulate.

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A single category of class detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DisplayFlag {
    /// The class name line
    ClassName,
    /// Annotations on the class
    ClassAnnotations,
    /// Access flags, superclass, interfaces and source file
    ClassDetails,
    /// Annotations on methods
    MethodAnnotations,
    /// Method signatures
    Methods,
    /// Field declarations
    Fields,
    /// Method bytecode
    OpCodes,
}

impl DisplayFlag {
    /// Every flag, in rendering order
    pub const ALL: [DisplayFlag; 7] = [
        DisplayFlag::ClassName,
        DisplayFlag::ClassAnnotations,
        DisplayFlag::ClassDetails,
        DisplayFlag::MethodAnnotations,
        DisplayFlag::Methods,
        DisplayFlag::Fields,
        DisplayFlag::OpCodes,
    ];
}

/// Named groups of flags accepted by `-d`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPreset {
    /// Class annotations, name and details
    Classes,
    /// Method annotations and signatures
    Methods,
    /// Fields
    Fields,
    /// Method signatures and bytecode
    OpCodes,
    /// Everything
    All,
}

impl DisplayPreset {
    /// Keywords accepted on the command line
    pub const KEYWORDS: [&'static str; 5] = ["all", "classes", "methods", "fields", "opcodes"];

    /// Returns the flags this preset stands for
    pub fn flags(self) -> &'static [DisplayFlag] {
        use DisplayFlag::*;
        match self {
            DisplayPreset::Classes => &[ClassAnnotations, ClassName, ClassDetails],
            DisplayPreset::Methods => &[MethodAnnotations, Methods],
            DisplayPreset::Fields => &[Fields],
            DisplayPreset::OpCodes => &[Methods, OpCodes],
            DisplayPreset::All => &DisplayFlag::ALL,
        }
    }
}

impl FromStr for DisplayPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "classes" => Ok(DisplayPreset::Classes),
            "methods" => Ok(DisplayPreset::Methods),
            "fields" => Ok(DisplayPreset::Fields),
            "opcodes" => Ok(DisplayPreset::OpCodes),
            "all" => Ok(DisplayPreset::All),
            _ => Err(Error::UnsupportedDisplayOption(s.to_string())),
        }
    }
}

/// A set of display flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    flags: BTreeSet<DisplayFlag>,
}

impl Default for DisplayOptions {
    /// Class name only
    fn default() -> Self {
        Self::empty().with(DisplayFlag::ClassName)
    }
}

impl DisplayOptions {
    /// Creates a set with no flags
    pub fn empty() -> Self {
        Self {
            flags: BTreeSet::new(),
        }
    }

    /// Creates a set with every flag
    pub fn all() -> Self {
        let mut options = Self::empty();
        options.add_preset(DisplayPreset::All);
        options
    }

    /// Adds a flag and returns the set
    pub fn with(mut self, flag: DisplayFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Unions a preset's flags into the set
    pub fn add_preset(&mut self, preset: DisplayPreset) {
        self.flags.extend(preset.flags().iter().copied());
    }

    /// Unions another set into this one
    pub fn union(&mut self, other: &DisplayOptions) {
        self.flags.extend(other.flags.iter().copied());
    }

    /// Parses a comma separated preset list and unions every entry into the set.
    ///
    /// Nothing is added if any entry is unknown.
    pub fn add_list(&mut self, list: &str) -> Result<()> {
        let mut parsed = DisplayOptions::empty();
        for entry in list.split(',') {
            parsed.add_preset(entry.parse()?);
        }
        self.union(&parsed);
        Ok(())
    }

    /// Returns true if the flag is set
    pub fn contains(&self, flag: DisplayFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Iterates over the set flags in rendering order
    pub fn iter(&self) -> impl Iterator<Item = DisplayFlag> + '_ {
        self.flags.iter().copied()
    }
}

impl fmt::Display for DisplayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .iter()
            .map(|flag| format!("{:?}", flag))
            .collect::<Vec<_>>();
        write!(f, "{}", names.join("|"))
    }
}
