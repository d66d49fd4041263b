//! Shredded-row layout.
//!
//! A document is stored as one row per scalar leaf. Each row carries the
//! document key, the materialized path split over `p0..p{max_depth-1}`, the
//! leaf segment and exactly one typed value.

use serde::{Deserialize, Serialize};

use crate::config::DocqlConfig;

/// LIKE pattern matching any array index segment.
pub const ARRAY_INDEX_LIKE_PATTERN: &str = "[%]";

/// Formats an array position as a path segment (`[000003]`).
#[must_use]
pub fn array_index_segment(index: usize) -> String {
    format!("[{index:06}]")
}

/// Returns true if `segment` is an array index segment such as `[000000]`.
#[must_use]
pub fn is_array_index_segment(segment: &str) -> bool {
    parse_array_index(segment).is_some()
}

/// Parses an array index segment back into its position.
#[must_use]
pub fn parse_array_index(segment: &str) -> Option<usize> {
    let inner = segment.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// Which typed value column a row or literal uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `text_value`.
    String,
    /// `dbl_value`.
    Double,
    /// `bool_value`.
    Boolean,
    /// `vector_value`.
    Vector,
}

/// Column names of the shredded document table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProperties {
    /// Keyspace the collection tables live in.
    pub keyspace: String,
    /// Partition key column.
    pub key_column: String,
    /// Prefix of the path columns.
    pub path_prefix: String,
    /// Number of path columns.
    pub max_depth: usize,
    /// Leaf column.
    pub leaf_column: String,
    /// String value column.
    pub text_value_column: String,
    /// Double value column.
    pub dbl_value_column: String,
    /// Boolean value column.
    pub bool_value_column: String,
    /// Vector value column.
    pub vector_value_column: String,
    /// Write timestamp column.
    pub write_time_column: String,
}

impl Default for TableProperties {
    fn default() -> Self {
        DocqlConfig::default().table_properties()
    }
}

impl TableProperties {
    /// Name of the path column at `index` (`p{index}`).
    #[must_use]
    pub fn path_column_name(&self, index: usize) -> String {
        format!("{}{index}", self.path_prefix)
    }

    /// Parses a path column name back into its index.
    #[must_use]
    pub fn path_column_index(&self, column: &str) -> Option<usize> {
        let index: usize = column.strip_prefix(&self.path_prefix)?.parse().ok()?;
        (index < self.max_depth).then_some(index)
    }

    /// Every column in table order.
    #[must_use]
    pub fn all_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.max_depth + 6);
        columns.push(self.key_column.clone());
        columns.extend((0..self.max_depth).map(|i| self.path_column_name(i)));
        columns.push(self.leaf_column.clone());
        columns.push(self.text_value_column.clone());
        columns.push(self.dbl_value_column.clone());
        columns.push(self.bool_value_column.clone());
        columns.push(self.vector_value_column.clone());
        columns
    }

    /// The value column holding values of `value_type`.
    #[must_use]
    pub fn value_column(&self, value_type: ValueType) -> &str {
        match value_type {
            ValueType::String => &self.text_value_column,
            ValueType::Double => &self.dbl_value_column,
            ValueType::Boolean => &self.bool_value_column,
            ValueType::Vector => &self.vector_value_column,
        }
    }
}

/// The single typed value of a shredded row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowValue {
    /// String leaf.
    String(String),
    /// Numeric leaf.
    Double(f64),
    /// Boolean leaf.
    Boolean(bool),
    /// Embedding.
    Vector(Vec<f32>),
}

impl RowValue {
    /// Type of the populated column.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Double(_) => ValueType::Double,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Vector(_) => ValueType::Vector,
        }
    }
}

/// One physical row of a shredded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShreddedRow {
    /// Owning document.
    pub document_key: String,
    /// Materialized path segments, without trailing empty segments.
    pub path: Vec<String>,
    /// Last path segment.
    pub leaf: String,
    /// Typed value.
    pub value: RowValue,
    /// Write timestamp, higher wins.
    pub write_time: i64,
}

impl ShreddedRow {
    /// Creates a row; the leaf is derived from the last path segment.
    #[must_use]
    pub fn new(
        document_key: impl Into<String>,
        path: Vec<String>,
        value: RowValue,
        write_time: i64,
    ) -> Self {
        let leaf = path.last().cloned().unwrap_or_default();
        Self {
            document_key: document_key.into(),
            path,
            leaf,
            value,
            write_time,
        }
    }

    /// Segment stored in path column `index`; empty past the materialized depth.
    #[must_use]
    pub fn path_segment(&self, index: usize) -> &str {
        self.path.get(index).map_or("", String::as_str)
    }

    /// True if the row's path begins with `prefix`.
    #[must_use]
    pub fn path_starts_with(&self, prefix: &[String]) -> bool {
        self.path.len() >= prefix.len() && self.path.iter().zip(prefix).all(|(a, b)| a == b)
    }

    /// String value, if this is a string row.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            RowValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Double value, if this is a numeric row.
    #[must_use]
    pub fn double_value(&self) -> Option<f64> {
        match self.value {
            RowValue::Double(d) => Some(d),
            _ => None,
        }
    }

    /// Boolean value, if this is a boolean row.
    #[must_use]
    pub fn boolean_value(&self) -> Option<bool> {
        match self.value {
            RowValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Vector value, if this is an embedding row.
    #[must_use]
    pub fn vector_value(&self) -> Option<&[f32]> {
        match &self.value {
            RowValue::Vector(v) => Some(v),
            _ => None,
        }
    }
}
