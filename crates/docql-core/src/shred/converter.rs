//! Rebuilds JSON documents from shredded rows.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::{EMPTY_ARRAY_MARKER, EMPTY_OBJECT_MARKER};
use crate::row::{parse_array_index, RowValue, ShreddedRow};

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Reassembles documents from their rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl JsonConverter {
    /// Rebuilds one document. When rows share a path the latest write wins,
    /// and a newer row replaces an older value it overlaps with.
    #[must_use]
    pub fn to_document(rows: &[ShreddedRow]) -> Value {
        let mut latest: HashMap<&[String], &ShreddedRow> = HashMap::new();
        for row in rows {
            latest
                .entry(row.path.as_slice())
                .and_modify(|current| {
                    if row.write_time >= current.write_time {
                        *current = row;
                    }
                })
                .or_insert(row);
        }

        let mut ordered: Vec<&ShreddedRow> = latest.into_values().collect();
        ordered.sort_by(|a, b| a.write_time.cmp(&b.write_time).then_with(|| a.path.cmp(&b.path)));

        let mut root = Value::Object(Map::new());
        for row in ordered {
            insert(&mut root, &row.path, leaf_value(&row.value));
        }
        root
    }

    /// Groups rows by document key, keeping first-seen order.
    #[must_use]
    pub fn group_by_document(rows: Vec<ShreddedRow>) -> Vec<(String, Vec<ShreddedRow>)> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<ShreddedRow>)> = Vec::new();
        for row in rows {
            if let Some(&index) = positions.get(&row.document_key) {
                groups[index].1.push(row);
            } else {
                positions.insert(row.document_key.clone(), groups.len());
                groups.push((row.document_key.clone(), vec![row]));
            }
        }
        groups
    }
}

fn insert(node: &mut Value, path: &[String], value: Value) {
    let Some((segment, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if let Some(index) = parse_array_index(segment) {
        if !node.is_array() {
            *node = Value::Array(Vec::new());
        }
        if let Value::Array(items) = node {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            insert(&mut items[index], rest, value);
        }
    } else {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(fields) = node {
            let child = fields.entry(segment.clone()).or_insert(Value::Null);
            insert(child, rest, value);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn leaf_value(value: &RowValue) -> Value {
    match value {
        RowValue::String(s) if s == EMPTY_ARRAY_MARKER => Value::Array(Vec::new()),
        RowValue::String(s) if s == EMPTY_OBJECT_MARKER => Value::Object(Map::new()),
        RowValue::String(s) => Value::String(s.clone()),
        RowValue::Boolean(b) => Value::Bool(*b),
        RowValue::Double(d) => {
            if d.fract() == 0.0 && d.abs() < MAX_SAFE_INTEGER {
                Value::Number(Number::from(*d as i64))
            } else {
                Number::from_f64(*d).map_or(Value::Null, Value::Number)
            }
        }
        RowValue::Vector(v) => Value::Array(
            v.iter()
                .map(|f| {
                    // Shortest decimal form, so 0.1f32 reads back as 0.1.
                    format!("{f:?}")
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map_or(Value::Null, Value::Number)
                })
                .collect(),
        ),
    }
}
