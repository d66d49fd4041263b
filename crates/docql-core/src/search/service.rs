//! Vector search over a collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::context::ExecutionContext;
use super::planner::{DocumentSearch, DocumentSearchPlanner};
use super::vector::VectorSearchQueryBuilder;
use crate::config::DocqlConfig;
use crate::cql::{CqlValue, Predicate, Query};
use crate::error::{Error, Result};
use crate::filter::{FilterExpression, FilterParser};
use crate::row::TableProperties;
use crate::storage::QueryExecutor;

/// Body of a vector search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchRequest {
    /// Query vector.
    pub vector: Vec<f32>,
    /// Maximum number of documents; the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Optional document filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

impl VectorSearchRequest {
    /// Request for the `limit` documents nearest to `vector`.
    #[must_use]
    pub fn new(vector: Vec<f32>, limit: i64) -> Self {
        Self {
            vector,
            limit: Some(limit),
            filter: None,
        }
    }

    /// Restricts the search to documents matching `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Checks a vector against the configured dimension.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] naming both lengths.
pub fn validate_vector_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() == expected {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected,
            actual: vector.len(),
        })
    }
}

/// A validated vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchPlan {
    /// ANN query without the candidate key restriction.
    pub query: Query,
    /// Parsed filter; empty when the request has none.
    pub filter: Vec<FilterExpression>,
    /// Effective limit.
    pub limit: i64,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorSearchHit {
    /// Document key.
    pub key: String,
    /// Similarity to the query vector; higher is closer.
    pub score: f32,
    /// Rebuilt document.
    pub document: Value,
}

/// Runs vector searches against collection tables.
#[derive(Debug, Clone)]
pub struct VectorSearchService<'a> {
    config: &'a DocqlConfig,
    props: TableProperties,
}

impl<'a> VectorSearchService<'a> {
    /// Creates a service for `config`.
    #[must_use]
    pub fn new(config: &'a DocqlConfig) -> Self {
        Self {
            config,
            props: config.table_properties(),
        }
    }

    /// Validates `request` and builds its ANN query.
    ///
    /// The dimension check runs before anything is built.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVector`] for an empty or non-finite vector,
    /// [`Error::InvalidRequest`] for an out-of-range limit,
    /// [`Error::DimensionMismatch`] for a wrong-sized vector and
    /// [`Error::InvalidFilter`] for a bad filter.
    pub fn plan(
        &self,
        keyspace: &str,
        collection: &str,
        request: &VectorSearchRequest,
    ) -> Result<VectorSearchPlan> {
        if request.vector.is_empty() {
            return Err(Error::InvalidVector("query vector must not be empty".to_string()));
        }
        if request.vector.iter().any(|f| !f.is_finite()) {
            return Err(Error::InvalidVector(
                "query vector must only contain finite numbers".to_string(),
            ));
        }
        let limit = self.effective_limit(request.limit)?;
        validate_vector_dimension(&request.vector, self.config.document.vector_dimension)?;

        let filter = match &request.filter {
            Some(filter) => FilterParser::new(&self.props).parse(filter)?,
            None => Vec::new(),
        };
        let query = self.ann_query(keyspace, collection, &request.vector, limit, None)?;

        Ok(VectorSearchPlan {
            query,
            filter,
            limit,
        })
    }

    /// Runs `request` and returns the nearest documents, closest first.
    ///
    /// A filter is resolved to candidate keys first and applied as a
    /// `key IN ?` restriction on the ANN query.
    ///
    /// # Errors
    ///
    /// Any validation error from [`Self::plan`] or an execution error.
    pub fn search(
        &self,
        executor: &dyn QueryExecutor,
        keyspace: &str,
        collection: &str,
        request: &VectorSearchRequest,
        ctx: &ExecutionContext,
    ) -> Result<Vec<VectorSearchHit>> {
        let plan = self.plan(keyspace, collection, request)?;
        let search = DocumentSearch::new(DocumentSearchPlanner::new(
            &self.props,
            keyspace,
            collection,
            self.config.queries.read_consistency,
        ));

        let query = if plan.filter.is_empty() {
            plan.query
        } else {
            let candidates = search.find_keys(executor, &plan.filter, ctx)?;
            if candidates.is_empty() {
                tracing::debug!("Vector search filter matched no documents");
                return Ok(Vec::new());
            }
            self.ann_query(keyspace, collection, &request.vector, plan.limit, Some(candidates))?
        };

        let rows = executor.execute(&query)?;
        ctx.trace_query(&query.cql, rows.len());

        let similarity = self.config.document.similarity;
        let mut seen = HashSet::with_capacity(rows.len());
        let mut ranked: Vec<(String, f32)> = Vec::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(row.document_key.as_str()) {
                continue;
            }
            let score = row
                .vector_value()
                .map_or(0.0, |v| similarity.score(&request.vector, v));
            ranked.push((row.document_key.clone(), score));
        }

        let keys: Vec<String> = ranked.iter().map(|(key, _)| key.clone()).collect();
        let mut documents: HashMap<String, Value> =
            search.fetch(executor, &keys, ctx)?.into_iter().collect();

        Ok(ranked
            .into_iter()
            .filter_map(|(key, score)| {
                documents.remove(&key).map(|document| VectorSearchHit {
                    key,
                    score,
                    document,
                })
            })
            .collect())
    }

    fn effective_limit(&self, requested: Option<i64>) -> Result<i64> {
        let max = i64::try_from(self.config.search.max_limit).unwrap_or(i64::MAX);
        let limit = match requested {
            Some(limit) => limit,
            None => i64::try_from(self.config.search.default_limit).unwrap_or(max),
        };
        if (1..=max).contains(&limit) {
            Ok(limit)
        } else {
            Err(Error::InvalidRequest(format!(
                "limit must be between 1 and {max}, got {limit}"
            )))
        }
    }

    fn ann_query(
        &self,
        keyspace: &str,
        collection: &str,
        vector: &[f32],
        limit: i64,
        candidates: Option<Vec<String>>,
    ) -> Result<Query> {
        let props = &self.props;
        let mut builder = VectorSearchQueryBuilder::new()
            .from(keyspace, collection)
            .select(props.all_columns());
        if let Some(keys) = candidates {
            builder = builder.filter_value(
                &props.key_column,
                Predicate::In,
                CqlValue::List(keys.into_iter().map(CqlValue::String).collect()),
            );
        }
        builder = builder.filter_value(
            props.path_column_name(0),
            Predicate::Eq,
            CqlValue::String(self.config.document.vector_field.clone()),
        );
        if props.max_depth > 1 {
            builder = builder.filter_value(
                props.path_column_name(1),
                Predicate::Eq,
                CqlValue::String(String::new()),
            );
        }
        builder
            .order_by_ann(&props.vector_value_column, vector.to_vec())
            .limit(limit)
            .consistency(self.config.queries.read_consistency)
            .build()
    }
}
