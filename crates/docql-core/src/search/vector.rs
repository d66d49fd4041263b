//! Fluent builder for ANN queries.

use serde_json::Value;

use crate::cql::{BuiltCondition, Consistency, CqlValue, Predicate, Query, Select};
use crate::error::{Error, Result};

/// Builds `SELECT … ORDER BY col ANN OF ? LIMIT ?`.
///
/// Filters are ANDed before the ordering and bound in the order they were
/// added; the vector and the limit are always the last two values.
///
/// # Example
///
/// ```
/// use docql_core::search::VectorSearchQueryBuilder;
///
/// let query = VectorSearchQueryBuilder::new()
///     .from("ks", "docs")
///     .select(["key", "text_value"])
///     .order_by_ann("vector_value", vec![0.1, 0.2])
///     .limit(5)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     query.cql,
///     "SELECT key, text_value FROM ks.docs ORDER BY vector_value ANN OF ? LIMIT ?"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct VectorSearchQueryBuilder {
    keyspace: Option<String>,
    table: Option<String>,
    columns: Vec<String>,
    filters: Vec<(BuiltCondition, CqlValue)>,
    vector_column: Option<String>,
    vector: Option<Vec<f32>>,
    limit: Option<i64>,
    consistency: Consistency,
}

impl VectorSearchQueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target table.
    #[must_use]
    pub fn from(mut self, keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self.table = Some(table.into());
        self
    }

    /// Sets the selected columns; none selects `*`.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds `column = ?` bound to the JSON value converted to its storage type.
    #[must_use]
    pub fn filter(self, column: impl Into<String>, value: &Value) -> Self {
        self.filter_value(column, Predicate::Eq, CqlValue::from_json(value))
    }

    /// Adds `column <predicate> ?` bound to `value`.
    #[must_use]
    pub fn filter_value(
        mut self,
        column: impl Into<String>,
        predicate: Predicate,
        value: CqlValue,
    ) -> Self {
        self.filters
            .push((BuiltCondition::new(column, predicate), value));
        self
    }

    /// Orders by similarity of `column` to `vector`.
    #[must_use]
    pub fn order_by_ann(mut self, column: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vector_column = Some(column.into());
        self.vector = Some(vector);
        self
    }

    /// Sets the number of rows the index returns.
    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the consistency level.
    #[must_use]
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }

    /// Renders the query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryState`] if the table, the vector column, a
    /// non-empty vector or a positive limit is missing.
    pub fn build(&self) -> Result<Query> {
        let (Some(keyspace), Some(table)) = (&self.keyspace, &self.table) else {
            return Err(Error::QueryState("table must be specified".to_string()));
        };
        let (Some(column), Some(vector)) = (&self.vector_column, &self.vector) else {
            return Err(Error::QueryState(
                "vector column and value must be specified".to_string(),
            ));
        };
        if vector.is_empty() {
            return Err(Error::QueryState("vector must not be empty".to_string()));
        }
        let limit = match self.limit {
            Some(limit) if limit > 0 => i32::try_from(limit).map_err(|_| {
                Error::QueryState(format!("limit {limit} is out of range"))
            })?,
            _ => {
                return Err(Error::QueryState(
                    "limit must be specified and positive".to_string(),
                ))
            }
        };

        let mut select = Select::new(keyspace.clone(), table.clone());
        select.columns.clone_from(&self.columns);
        let mut values = Vec::with_capacity(self.filters.len() + 2);
        for (condition, value) in &self.filters {
            select.conditions.push(condition.clone());
            values.push(value.clone());
        }
        select.ann_column = Some(column.clone());
        select.limited = true;
        values.push(CqlValue::Vector(vector.clone()));
        values.push(CqlValue::Int(limit));

        Query::new(select, values, self.consistency)
    }
}
