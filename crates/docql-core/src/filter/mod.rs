//! Document filters.
//!
//! A filter such as `{"tags": {"$contains": "web"}}` is parsed into
//! [`FilterExpression`]s, each pairing a [`FilterPath`] with a validated
//! [`Condition`]. Conditions either push down to the store as a predicate on
//! a value column or are evaluated in memory against the document's rows.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docql_core::filter::FilterParser;
//! use docql_core::row::TableProperties;
//!
//! let props = TableProperties::default();
//! let expressions = FilterParser::new(&props).parse_str(r#"{"a.b": {"$eq": 1}}"#)?;
//! ```

mod condition;
mod like;
mod operation;
mod parser;
mod provider;

#[cfg(test)]
mod tests;

pub use condition::{Condition, PushDown, QueryValue};
pub use like::LikePattern;
pub use operation::{FilterOpCode, FilterOperation};
pub use parser::FilterParser;
pub use provider::{ConditionProvider, ProvidedCondition};

use std::fmt;

use crate::error::{Error, Result};
use crate::row::{array_index_segment, is_array_index_segment, parse_array_index, ShreddedRow};

/// Ordered field names locating a value inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterPath {
    segments: Vec<String>,
}

impl FilterPath {
    /// Creates a path from already-split segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if the path or any segment is empty.
    pub fn new(segments: Vec<String>) -> Result<Self> {
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(Error::InvalidFilter(format!(
                "invalid filter path {segments:?}: segments must not be empty"
            )));
        }
        Ok(Self { segments })
    }

    /// Parses a dot-separated path. `\.` stands for a literal dot and `[N]`
    /// addresses array element `N`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if any segment is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'.') => {
                    current.push('.');
                    chars.next();
                }
                '.' => segments.push(normalize_segment(std::mem::take(&mut current))),
                _ => current.push(c),
            }
        }
        segments.push(normalize_segment(current));

        Self::new(segments).map_err(|_| {
            Error::InvalidFilter(format!("invalid filter path '{raw}': empty segment"))
        })
    }

    /// All segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment.
    #[must_use]
    pub fn field(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Every segment but the last.
    #[must_use]
    pub fn parent_path(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

fn normalize_segment(segment: String) -> String {
    match parse_array_index(&segment) {
        Some(index) => array_index_segment(index),
        None => segment,
    }
}

impl fmt::Display for FilterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.replace('.', "\\."))?;
        }
        Ok(())
    }
}

/// A condition applied at a path.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    path: FilterPath,
    condition: Condition,
    order_index: usize,
}

impl FilterExpression {
    /// Creates an expression.
    #[must_use]
    pub fn new(path: FilterPath, condition: Condition, order_index: usize) -> Self {
        Self {
            path,
            condition,
            order_index,
        }
    }

    /// Path the condition applies to.
    #[must_use]
    pub fn path(&self) -> &FilterPath {
        &self.path
    }

    /// The condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Position within the parsed filter.
    #[must_use]
    pub fn order_index(&self) -> usize {
        self.order_index
    }

    /// True if `row` is one of the rows the condition is evaluated on.
    ///
    /// `$contains` looks at array elements directly under the path,
    /// `$containsKey` at anything under `path.key`, `$exists` at anything under
    /// the path and every other operation at the path itself.
    #[must_use]
    pub fn matches_path(&self, row: &ShreddedRow) -> bool {
        let segments = self.path.segments();
        match self.condition.op_code() {
            FilterOpCode::Contains => {
                row.path.len() == segments.len() + 1
                    && row.path_starts_with(segments)
                    && is_array_index_segment(&row.leaf)
            }
            FilterOpCode::ContainsKey => {
                let key = self.condition.target_key().unwrap_or_default();
                row.path_starts_with(segments)
                    && row.path.get(segments.len()).is_some_and(|s| s == key)
            }
            FilterOpCode::Exists => row.path_starts_with(segments),
            _ => row.path.as_slice() == segments,
        }
    }

    /// Evaluates the expression against every row of one document.
    ///
    /// A document with no row at the path satisfies the expression only when
    /// the condition evaluates true on missing fields.
    #[must_use]
    pub fn test_document(&self, rows: &[ShreddedRow]) -> bool {
        let mut candidates = rows.iter().filter(|row| self.matches_path(row)).peekable();
        if candidates.peek().is_none() {
            return self.condition.is_evaluate_on_missing_fields();
        }
        candidates.any(|row| self.condition.test(row))
    }
}
