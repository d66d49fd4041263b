//! In-process shredded document table.

use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use super::QueryExecutor;
use crate::config::DocqlConfig;
use crate::cql::{BuiltCondition, CqlValue, Predicate, Query};
use crate::error::{Error, Result};
use crate::filter::LikePattern;
use crate::row::{ShreddedRow, TableProperties};
use crate::shred::JsonShredder;
use crate::similarity::SimilarityFunction;

/// One collection table held in memory.
///
/// Rows are evaluated against the structured statement of each query, so
/// every predicate the compiler emits is honoured: path and value equality,
/// ordering comparisons, `LIKE`, `IN`, ANN ordering and `LIMIT`.
#[derive(Debug)]
pub struct MemoryTable {
    keyspace: String,
    table: String,
    props: TableProperties,
    shredder: JsonShredder,
    similarity: SimilarityFunction,
    clock: AtomicI64,
    rows: RwLock<Vec<ShreddedRow>>,
}

impl MemoryTable {
    /// Creates an empty table laid out per `config`.
    #[must_use]
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>, config: &DocqlConfig) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            props: config.table_properties(),
            shredder: JsonShredder::from_config(config),
            similarity: config.document.similarity,
            clock: AtomicI64::new(0),
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Table layout.
    #[must_use]
    pub fn table_properties(&self) -> &TableProperties {
        &self.props
    }

    /// Shreds and stores `document`, replacing any earlier version.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] if the document cannot be shredded.
    pub fn write_document(&self, key: &str, document: &Value) -> Result<usize> {
        let write_time = self.clock.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let shredded = self.shredder.shred(key, document, write_time)?;
        let count = shredded.len();

        let mut rows = self.rows.write();
        rows.retain(|row| row.document_key != key);
        rows.extend(shredded);

        tracing::debug!(key, rows = count, "Wrote document");
        Ok(count)
    }

    /// Removes a document; returns true if it existed.
    pub fn delete_document(&self, key: &str) -> bool {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| row.document_key != key);
        rows.len() != before
    }

    /// Number of stored rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn document_count(&self) -> usize {
        let rows = self.rows.read();
        let mut keys: Vec<&str> = rows.iter().map(|r| r.document_key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    fn column_value(&self, row: &ShreddedRow, column: &str) -> Result<Option<CqlValue>> {
        let props = &self.props;
        if let Some(index) = props.path_column_index(column) {
            return Ok(Some(CqlValue::String(row.path_segment(index).to_string())));
        }
        let value = if column == props.key_column {
            Some(CqlValue::String(row.document_key.clone()))
        } else if column == props.leaf_column {
            Some(CqlValue::String(row.leaf.clone()))
        } else if column == props.text_value_column {
            row.string_value().map(CqlValue::from)
        } else if column == props.dbl_value_column {
            row.double_value().map(CqlValue::Double)
        } else if column == props.bool_value_column {
            row.boolean_value().map(CqlValue::Boolean)
        } else if column == props.vector_value_column {
            row.vector_value().map(|v| CqlValue::Vector(v.to_vec()))
        } else if column == props.write_time_column {
            Some(CqlValue::BigInt(row.write_time))
        } else {
            return Err(Error::Execution(format!("undefined column name {column}")));
        };
        Ok(value)
    }
}

struct Restriction<'q> {
    condition: &'q BuiltCondition,
    value: &'q CqlValue,
    like: Option<LikePattern>,
}

impl Restriction<'_> {
    fn test(&self, actual: Option<&CqlValue>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.condition.predicate {
            Predicate::Eq => compare(actual, self.value) == Some(Ordering::Equal),
            Predicate::NotEq => compare(actual, self.value).is_some_and(Ordering::is_ne),
            Predicate::Gt => compare(actual, self.value) == Some(Ordering::Greater),
            Predicate::Gte => compare(actual, self.value).is_some_and(Ordering::is_ge),
            Predicate::Lt => compare(actual, self.value) == Some(Ordering::Less),
            Predicate::Lte => compare(actual, self.value).is_some_and(Ordering::is_le),
            Predicate::Like => match (&self.like, actual.as_str()) {
                (Some(pattern), Some(text)) => pattern.matches(text),
                _ => false,
            },
            Predicate::In => match self.value {
                CqlValue::List(items) => items
                    .iter()
                    .any(|item| compare(actual, item) == Some(Ordering::Equal)),
                _ => false,
            },
        }
    }
}

fn compare(a: &CqlValue, b: &CqlValue) -> Option<Ordering> {
    match (a, b) {
        (CqlValue::String(a), CqlValue::String(b)) => Some(a.cmp(b)),
        (CqlValue::Boolean(a), CqlValue::Boolean(b)) => Some(a.cmp(b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

impl QueryExecutor for MemoryTable {
    fn execute(&self, query: &Query) -> Result<Vec<ShreddedRow>> {
        let select = &query.select;
        if select.keyspace != self.keyspace || select.table != self.table {
            return Err(Error::Execution(format!(
                "table {}.{} does not exist",
                select.keyspace, select.table
            )));
        }

        let mut values = query.values.iter();
        let mut restrictions = Vec::with_capacity(select.conditions.len());
        for condition in &select.conditions {
            let value = values.next().ok_or_else(|| {
                Error::Execution(format!("no value bound for {condition}"))
            })?;
            let like = match condition.predicate {
                Predicate::Like => {
                    let pattern = value.as_str().ok_or_else(|| {
                        Error::Execution(format!("LIKE on {} needs a text value", condition.column))
                    })?;
                    Some(LikePattern::compile(pattern)?)
                }
                _ => None,
            };
            restrictions.push(Restriction {
                condition,
                value,
                like,
            });
        }
        let ann = match &select.ann_column {
            Some(column) => match values.next() {
                Some(CqlValue::Vector(v)) => Some((column.as_str(), v.as_slice())),
                _ => {
                    return Err(Error::Execution(
                        "ANN OF needs a vector value".to_string(),
                    ))
                }
            },
            None => None,
        };
        let limit = if select.limited {
            let bound = values.next().and_then(CqlValue::as_usize);
            Some(bound.ok_or_else(|| Error::Execution("LIMIT needs a count".to_string()))?)
        } else {
            None
        };

        let rows = self.rows.read();
        let mut selected = Vec::new();
        for row in rows.iter() {
            let mut keep = true;
            for restriction in &restrictions {
                let actual = self.column_value(row, &restriction.condition.column)?;
                if !restriction.test(actual.as_ref()) {
                    keep = false;
                    break;
                }
            }
            if keep {
                selected.push(row.clone());
            }
        }
        drop(rows);

        if let Some((column, target)) = ann {
            let mut scored = Vec::with_capacity(selected.len());
            for row in selected {
                if let Some(CqlValue::Vector(v)) = self.column_value(&row, column)? {
                    let score = self.similarity.score(target, &v);
                    scored.push((row, score));
                }
            }
            self.similarity.sort_results(&mut scored);
            selected = scored.into_iter().map(|(row, _)| row).collect();
        }
        if let Some(limit) = limit {
            selected.truncate(limit);
        }

        tracing::trace!(query = %query.cql, rows = selected.len(), "Executed in memory");
        Ok(selected)
    }
}
