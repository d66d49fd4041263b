//! Path-aware query builders for single filter expressions.
//!
//! Bind order is positional and fixed: path segment values in path order,
//! then the array index pattern (CONTAINS only), then the empty trailing
//! segment, then the value predicate's literal.

use crate::cql::{BuiltCondition, Consistency, CqlValue, Predicate, Query, Select};
use crate::error::{Error, Result};
use crate::filter::{FilterExpression, FilterOpCode};
use crate::row::{TableProperties, ARRAY_INDEX_LIKE_PATTERN};

/// Builds the query selecting the rows a filter expression applies to.
pub trait SearchQueryBuilder {
    /// Table layout the predicates are written against.
    fn table_properties(&self) -> &TableProperties;

    /// WHERE predicates and their bound values, in bind order.
    fn resolve(&self) -> (Vec<BuiltCondition>, Vec<CqlValue>);

    /// Renders the full query over every table column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryState`] if predicates and values disagree.
    fn build_query(&self, keyspace: &str, table: &str, consistency: Consistency) -> Result<Query> {
        let (conditions, values) = self.resolve();
        let mut select = Select::new(keyspace, table);
        select.columns = self.table_properties().all_columns();
        select.allow_filtering = !conditions.is_empty();
        select.conditions = conditions;
        Query::new(select, values, consistency)
    }
}

/// Pins every path column of the expression's path and the first unused one,
/// then adds the condition's value predicate when it pushes down.
///
/// `$exists` leaves the trailing column open so nested values count, and
/// `$containsKey` pins it to the key instead.
#[derive(Debug, Clone, Copy)]
pub struct FilterExpressionSearchQueryBuilder<'a> {
    props: &'a TableProperties,
    expression: &'a FilterExpression,
}

impl<'a> FilterExpressionSearchQueryBuilder<'a> {
    /// Creates the builder.
    #[must_use]
    pub fn new(props: &'a TableProperties, expression: &'a FilterExpression) -> Self {
        Self { props, expression }
    }
}

impl SearchQueryBuilder for FilterExpressionSearchQueryBuilder<'_> {
    fn table_properties(&self) -> &TableProperties {
        self.props
    }

    fn resolve(&self) -> (Vec<BuiltCondition>, Vec<CqlValue>) {
        let mut predicates = Vec::new();
        let mut values = Vec::new();
        let segments = self.expression.path().segments();

        for (i, segment) in segments.iter().enumerate() {
            predicates.push(BuiltCondition::new(self.props.path_column_name(i), Predicate::Eq));
            values.push(CqlValue::String(segment.clone()));
        }

        let next = segments.len();
        if next < self.props.max_depth {
            let condition = self.expression.condition();
            let trailing = match condition.op_code() {
                FilterOpCode::Exists => None,
                FilterOpCode::ContainsKey => condition.target_key(),
                _ => Some(""),
            };
            if let Some(trailing) = trailing {
                predicates.push(BuiltCondition::new(
                    self.props.path_column_name(next),
                    Predicate::Eq,
                ));
                values.push(CqlValue::String(trailing.to_string()));
            }
        }

        if let Some(push_down) = self.expression.condition().try_push_down(self.props) {
            predicates.push(push_down.condition);
            values.push(push_down.value);
        }

        (predicates, values)
    }
}

/// Restricts a `$contains` match to array elements directly under the path.
///
/// The column after the array field must hold an index segment (`LIKE
/// '[%]'`) and the one after that must be empty, so a value equal to the
/// literal somewhere else in the document never matches.
#[derive(Debug, Clone, Copy)]
pub struct ContainsFilterExpressionSearchQueryBuilder<'a> {
    props: &'a TableProperties,
    expression: &'a FilterExpression,
}

impl<'a> ContainsFilterExpressionSearchQueryBuilder<'a> {
    /// Creates the builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if the condition is not `$contains`
    /// or the path leaves no column for the array index.
    pub fn new(props: &'a TableProperties, expression: &'a FilterExpression) -> Result<Self> {
        if expression.condition().op_code() != FilterOpCode::Contains {
            return Err(Error::InvalidFilter(format!(
                "ContainsFilterExpressionSearchQueryBuilder only accepts CONTAINS conditions, got {}",
                expression.condition().op_code()
            )));
        }
        if expression.path().depth() >= props.max_depth {
            return Err(Error::InvalidFilter(format!(
                "path '{}' leaves no column for an array index",
                expression.path()
            )));
        }
        Ok(Self { props, expression })
    }
}

impl SearchQueryBuilder for ContainsFilterExpressionSearchQueryBuilder<'_> {
    fn table_properties(&self) -> &TableProperties {
        self.props
    }

    fn resolve(&self) -> (Vec<BuiltCondition>, Vec<CqlValue>) {
        let mut predicates = Vec::new();
        let mut values = Vec::new();
        let path = self.expression.path();

        for (i, segment) in path.parent_path().iter().enumerate() {
            predicates.push(BuiltCondition::new(self.props.path_column_name(i), Predicate::Eq));
            values.push(CqlValue::String(segment.clone()));
        }

        let field_column = path.parent_path().len();
        predicates.push(BuiltCondition::new(
            self.props.path_column_name(field_column),
            Predicate::Eq,
        ));
        values.push(CqlValue::String(path.field().to_string()));

        let index_column = field_column + 1;
        predicates.push(BuiltCondition::new(
            self.props.path_column_name(index_column),
            Predicate::Like,
        ));
        values.push(CqlValue::String(ARRAY_INDEX_LIKE_PATTERN.to_string()));

        let after_index = index_column + 1;
        if after_index < self.props.max_depth {
            predicates.push(BuiltCondition::new(
                self.props.path_column_name(after_index),
                Predicate::Eq,
            ));
            values.push(CqlValue::String(String::new()));
        }

        if let Some(push_down) = self.expression.condition().try_push_down(self.props) {
            predicates.push(push_down.condition);
            values.push(push_down.value);
        }

        (predicates, values)
    }
}
