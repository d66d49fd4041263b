//! Turns filter expressions into storage queries and evaluates them.

use serde_json::Value;
use std::collections::BTreeSet;

use super::builder::{
    ContainsFilterExpressionSearchQueryBuilder, FilterExpressionSearchQueryBuilder,
    SearchQueryBuilder,
};
use super::context::ExecutionContext;
use crate::cql::{BuiltCondition, Consistency, CqlValue, Predicate, Query, Select};
use crate::error::{Error, Result};
use crate::filter::{FilterExpression, FilterOpCode};
use crate::row::TableProperties;
use crate::shred::JsonConverter;
use crate::storage::QueryExecutor;

/// How one filter expression is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPlan {
    /// The query alone selects the matching rows.
    PushDown {
        /// Query returning only matching rows.
        query: Query,
    },
    /// Candidate rows are fetched and tested per document.
    InMemory {
        /// Query returning the rows to test.
        candidate_query: Query,
        /// Expression evaluated on every candidate document.
        expression: FilterExpression,
    },
}

impl SearchPlan {
    /// The query this plan executes.
    #[must_use]
    pub fn query(&self) -> &Query {
        match self {
            Self::PushDown { query } => query,
            Self::InMemory {
                candidate_query, ..
            } => candidate_query,
        }
    }

    /// Returns true if the storage engine does all the filtering.
    #[must_use]
    pub const fn is_push_down(&self) -> bool {
        matches!(self, Self::PushDown { .. })
    }
}

/// Plans queries against one collection table.
#[derive(Debug, Clone)]
pub struct DocumentSearchPlanner<'a> {
    props: &'a TableProperties,
    keyspace: String,
    table: String,
    consistency: Consistency,
}

impl<'a> DocumentSearchPlanner<'a> {
    /// Creates a planner for `keyspace.table`.
    #[must_use]
    pub fn new(
        props: &'a TableProperties,
        keyspace: impl Into<String>,
        table: impl Into<String>,
        consistency: Consistency,
    ) -> Self {
        Self {
            props,
            keyspace: keyspace.into(),
            table: table.into(),
            consistency,
        }
    }

    /// Table layout the planner writes queries against.
    #[must_use]
    pub fn table_properties(&self) -> &TableProperties {
        self.props
    }

    /// Chooses the plan for `expression`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if a `$contains` path is too deep to
    /// address its array elements.
    pub fn plan(&self, expression: &FilterExpression) -> Result<SearchPlan> {
        let pushes_down = expression.condition().try_push_down(self.props).is_some();

        let plan = if pushes_down {
            let query = if expression.condition().op_code() == FilterOpCode::Contains {
                ContainsFilterExpressionSearchQueryBuilder::new(self.props, expression)?
                    .build_query(&self.keyspace, &self.table, self.consistency)?
            } else {
                FilterExpressionSearchQueryBuilder::new(self.props, expression).build_query(
                    &self.keyspace,
                    &self.table,
                    self.consistency,
                )?
            };
            SearchPlan::PushDown { query }
        } else if expression.condition().is_evaluate_on_missing_fields() {
            SearchPlan::InMemory {
                candidate_query: self.full_scan()?,
                expression: expression.clone(),
            }
        } else {
            SearchPlan::InMemory {
                candidate_query: FilterExpressionSearchQueryBuilder::new(self.props, expression)
                    .build_query(&self.keyspace, &self.table, self.consistency)?,
                expression: expression.clone(),
            }
        };

        tracing::debug!(
            path = %expression.path(),
            op = %expression.condition().op_code(),
            push_down = plan.is_push_down(),
            "Planned filter expression"
        );
        Ok(plan)
    }

    /// Every row of the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryState`] if the statement and its values disagree.
    pub fn full_scan(&self) -> Result<Query> {
        let mut select = Select::new(&self.keyspace, &self.table);
        select.columns = self.props.all_columns();
        Query::new(select, Vec::new(), self.consistency)
    }

    /// Every row of the documents named in `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryState`] if the statement and its values disagree.
    pub fn fetch_documents(&self, keys: &[String]) -> Result<Query> {
        let mut select = Select::new(&self.keyspace, &self.table);
        select.columns = self.props.all_columns();
        select
            .conditions
            .push(BuiltCondition::new(&self.props.key_column, Predicate::In));
        let keys = CqlValue::List(keys.iter().cloned().map(CqlValue::String).collect());
        Query::new(select, vec![keys], self.consistency)
    }
}

/// Resolves filters to document keys through a [`QueryExecutor`].
#[derive(Debug, Clone)]
pub struct DocumentSearch<'a> {
    planner: DocumentSearchPlanner<'a>,
}

impl<'a> DocumentSearch<'a> {
    /// Creates a search over the planner's table.
    #[must_use]
    pub fn new(planner: DocumentSearchPlanner<'a>) -> Self {
        Self { planner }
    }

    /// The underlying planner.
    #[must_use]
    pub fn planner(&self) -> &DocumentSearchPlanner<'a> {
        &self.planner
    }

    /// Keys of the documents matching every expression, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if `expressions` is empty, or any
    /// planning or execution error.
    pub fn find_keys(
        &self,
        executor: &dyn QueryExecutor,
        expressions: &[FilterExpression],
        ctx: &ExecutionContext,
    ) -> Result<Vec<String>> {
        if expressions.is_empty() {
            return Err(Error::InvalidFilter(
                "at least one filter expression is required".to_string(),
            ));
        }
        let mut ordered: Vec<&FilterExpression> = expressions.iter().collect();
        ordered.sort_by_key(|e| e.order_index());

        let mut matched: Option<BTreeSet<String>> = None;
        for expression in ordered {
            let keys = self.resolve(executor, expression, ctx)?;
            let narrowed = match matched {
                None => keys,
                Some(previous) => previous.intersection(&keys).cloned().collect(),
            };
            if narrowed.is_empty() {
                return Ok(Vec::new());
            }
            matched = Some(narrowed);
        }
        Ok(matched.unwrap_or_default().into_iter().collect())
    }

    /// Matching documents, rebuilt from their rows, in key order.
    ///
    /// # Errors
    ///
    /// Same as [`Self::find_keys`].
    pub fn find_documents(
        &self,
        executor: &dyn QueryExecutor,
        expressions: &[FilterExpression],
        ctx: &ExecutionContext,
    ) -> Result<Vec<(String, Value)>> {
        let keys = self.find_keys(executor, expressions, ctx)?;
        self.fetch(executor, &keys, ctx)
    }

    /// Rebuilds the documents named in `keys`, keeping their order. Keys with
    /// no rows are skipped.
    ///
    /// # Errors
    ///
    /// Any execution error.
    pub fn fetch(
        &self,
        executor: &dyn QueryExecutor,
        keys: &[String],
        ctx: &ExecutionContext,
    ) -> Result<Vec<(String, Value)>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.planner.fetch_documents(keys)?;
        let rows = executor.execute(&query)?;
        ctx.trace_query(&query.cql, rows.len());

        let mut groups = JsonConverter::group_by_document(rows);
        let mut documents = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(index) = groups.iter().position(|(k, _)| k == key) {
                let (key, rows) = groups.swap_remove(index);
                documents.push((key, JsonConverter::to_document(&rows)));
            }
        }
        Ok(documents)
    }

    fn resolve(
        &self,
        executor: &dyn QueryExecutor,
        expression: &FilterExpression,
        ctx: &ExecutionContext,
    ) -> Result<BTreeSet<String>> {
        let plan = self.planner.plan(expression)?;
        let rows = executor.execute(plan.query())?;
        ctx.trace_query(&plan.query().cql, rows.len());

        Ok(match plan {
            SearchPlan::PushDown { .. } => rows.into_iter().map(|row| row.document_key).collect(),
            SearchPlan::InMemory { expression, .. } => JsonConverter::group_by_document(rows)
                .into_iter()
                .filter(|(_, rows)| expression.test_document(rows))
                .map(|(key, _)| key)
                .collect(),
        })
    }
}
