//! Splits a JSON document into shredded rows.

use serde_json::Value;

use super::{EMPTY_ARRAY_MARKER, EMPTY_OBJECT_MARKER};
use crate::config::DocqlConfig;
use crate::error::{Error, Result};
use crate::row::{array_index_segment, RowValue, ShreddedRow};

/// Turns documents into one row per scalar leaf.
#[derive(Debug, Clone)]
pub struct JsonShredder {
    max_depth: usize,
    vector_field: Option<String>,
}

impl JsonShredder {
    /// Shredder for paths up to `max_depth` segments, without a vector field.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            vector_field: None,
        }
    }

    /// Shredder following the document section of `config`.
    #[must_use]
    pub fn from_config(config: &DocqlConfig) -> Self {
        Self::new(config.document.max_depth).with_vector_field(&config.document.vector_field)
    }

    /// Stores a numeric array at top-level `field` as one vector row.
    #[must_use]
    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = Some(field.into());
        self
    }

    /// Shreds `document` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] if the key is empty, the document is
    /// not an object, a field name contains `[` or `]`, or a path exceeds the
    /// maximum depth.
    pub fn shred(&self, key: &str, document: &Value, write_time: i64) -> Result<Vec<ShreddedRow>> {
        if key.is_empty() {
            return Err(Error::InvalidDocument("document key must not be empty".to_string()));
        }
        let Value::Object(fields) = document else {
            return Err(Error::InvalidDocument(
                "document must be a JSON object".to_string(),
            ));
        };

        let mut rows = Vec::new();
        let mut path = Vec::new();
        for (field, value) in fields {
            check_field_name(&path, field)?;
            self.descend(key, &mut path, field.clone(), value, write_time, &mut rows)?;
        }
        Ok(rows)
    }

    fn descend(
        &self,
        key: &str,
        path: &mut Vec<String>,
        segment: String,
        value: &Value,
        write_time: i64,
        rows: &mut Vec<ShreddedRow>,
    ) -> Result<()> {
        path.push(segment);
        if path.len() > self.max_depth {
            return Err(Error::InvalidDocument(format!(
                "path '{}' exceeds the maximum depth of {}",
                path.join("."),
                self.max_depth
            )));
        }
        self.walk(key, path, value, write_time, rows)?;
        path.pop();
        Ok(())
    }

    fn walk(
        &self,
        key: &str,
        path: &mut Vec<String>,
        value: &Value,
        write_time: i64,
        rows: &mut Vec<ShreddedRow>,
    ) -> Result<()> {
        let leaf = match value {
            Value::Null => return Ok(()),
            Value::Bool(b) => RowValue::Boolean(*b),
            Value::Number(n) => RowValue::Double(n.as_f64().unwrap_or_default()),
            Value::String(s) => RowValue::String(s.clone()),
            Value::Object(fields) if fields.is_empty() => {
                RowValue::String(EMPTY_OBJECT_MARKER.to_string())
            }
            Value::Array(items) if items.is_empty() => {
                RowValue::String(EMPTY_ARRAY_MARKER.to_string())
            }
            Value::Array(items) => {
                if let Some(vector) = self.as_vector(path, items) {
                    RowValue::Vector(vector)
                } else {
                    for (index, item) in items.iter().enumerate() {
                        let segment = array_index_segment(index);
                        self.descend(key, path, segment, item, write_time, rows)?;
                    }
                    return Ok(());
                }
            }
            Value::Object(fields) => {
                for (field, item) in fields {
                    check_field_name(path, field)?;
                    self.descend(key, path, field.clone(), item, write_time, rows)?;
                }
                return Ok(());
            }
        };
        rows.push(ShreddedRow::new(key, path.clone(), leaf, write_time));
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn as_vector(&self, path: &[String], items: &[Value]) -> Option<Vec<f32>> {
        let field = self.vector_field.as_deref()?;
        if path.len() != 1 || path[0] != field {
            return None;
        }
        items
            .iter()
            .map(|item| item.as_f64().map(|f| f as f32))
            .collect()
    }
}

/// Brackets are reserved for array index segments.
fn check_field_name(path: &[String], field: &str) -> Result<()> {
    if field.contains(['[', ']']) {
        let location = if path.is_empty() {
            String::new()
        } else {
            format!(" under '{}'", path.join("."))
        };
        return Err(Error::InvalidDocument(format!(
            "field name '{field}'{location} must not contain '[' or ']'"
        )));
    }
    Ok(())
}
