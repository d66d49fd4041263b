//! SQL `LIKE` patterns compiled to case-insensitive regexes.

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// A compiled `LIKE` pattern.
///
/// `%` matches zero or more characters and `_` exactly one; every other
/// character matches itself, ignoring case.
#[derive(Debug, Clone)]
pub struct LikePattern {
    pattern: String,
    regex: Regex,
}

impl LikePattern {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if the pattern is empty or cannot be
    /// compiled.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidFilter(
                "LIKE pattern cannot be null or empty".to_string(),
            ));
        }
        let regex = RegexBuilder::new(&like_to_regex(pattern))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| Error::InvalidFilter(format!("Invalid LIKE pattern: {pattern} ({e})")))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// True if the whole of `value` matches.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

fn like_to_regex(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len() * 2 + 2);
    result.push('^');
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => result.push_str(".*"),
            '_' => result.push('.'),
            _ => result.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    result.push('$');
    result
}
