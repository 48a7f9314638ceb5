//! Glob-style class name matching.
//!
//! `*` matches any (possibly empty) sequence of characters; every other
//! character matches itself. Matching is anchored at both ends, so
//! `com.example` does not match `com.example.Main`.

use crate::error::{Error, Result};
use regex::Regex;

/// Pattern that matches every class
pub const MATCH_ALL: &str = "*";

/// A compiled class name pattern
#[derive(Debug, Clone)]
pub struct ClassPattern {
    pattern: String,
    regex: Regex,
}

impl ClassPattern {
    /// Compiles a glob pattern into a full-string matcher
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::EmptyClassPattern);
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("^{}$", body)).map_err(|source| {
            Error::InvalidClassPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Returns the pattern as written
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Tests a fully qualified class name against the pattern
    pub fn is_match(&self, class_name: &str) -> bool {
        self.regex.is_match(class_name)
    }
}

impl Default for ClassPattern {
    fn default() -> Self {
        Self::new(MATCH_ALL).expect("match-all pattern always compiles")
    }
}
