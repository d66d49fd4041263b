//! Parses JSON filter objects into ordered filter expressions.

use serde_json::{Map, Value};
use tracing::debug;

use super::provider::{ConditionProvider, ProvidedCondition};
use super::{FilterExpression, FilterPath};
use crate::error::{Error, Result};
use crate::row::TableProperties;

const NOT_OPERATOR: &str = "$not";

/// Parser for `{"<path>": {"$op": literal, …}, …}` filters.
#[derive(Debug, Clone, Copy)]
pub struct FilterParser {
    max_depth: usize,
}

impl FilterParser {
    /// Parser for paths addressable by `props`.
    #[must_use]
    pub fn new(props: &TableProperties) -> Self {
        Self {
            max_depth: props.max_depth,
        }
    }

    /// Parses a filter given as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] for malformed JSON or any error
    /// [`FilterParser::parse`] reports.
    pub fn parse_str(&self, raw: &str) -> Result<Vec<FilterExpression>> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidFilter(format!("filter is not valid JSON: {e}")))?;
        self.parse(&value)
    }

    /// Parses a filter object. The order index of each expression is its
    /// position in the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] for an empty filter, a non-object
    /// operator block, an unknown operator, a path deeper than the table
    /// allows or a literal the operator does not support, and
    /// [`Error::UnsupportedOperation`] for `$not` around an operator without a
    /// negated form.
    pub fn parse(&self, filter: &Value) -> Result<Vec<FilterExpression>> {
        let fields = filter
            .as_object()
            .ok_or_else(|| Error::InvalidFilter("filter must be a JSON object".to_string()))?;
        if fields.is_empty() {
            return Err(Error::InvalidFilter("filter must not be empty".to_string()));
        }

        let mut expressions = Vec::new();
        for (raw_path, operators) in fields {
            let path = FilterPath::parse(raw_path)?;
            if path.depth() > self.max_depth {
                return Err(Error::InvalidFilter(format!(
                    "path '{raw_path}' is deeper than the maximum depth of {}",
                    self.max_depth
                )));
            }
            let operators = operator_block(raw_path, operators)?;
            for (operator, literal) in operators {
                if operator == NOT_OPERATOR {
                    for (inner, inner_literal) in operator_block(raw_path, literal)? {
                        let provider = ConditionProvider::for_operator(inner, true)?;
                        let order_index = expressions.len();
                        expressions.push(self.expression(
                            &path,
                            &provider,
                            inner_literal,
                            order_index,
                        )?);
                    }
                } else {
                    let provider = ConditionProvider::for_operator(operator, false)?;
                    let order_index = expressions.len();
                    expressions.push(self.expression(&path, &provider, literal, order_index)?);
                }
            }
        }

        debug!(count = expressions.len(), "Parsed filter expressions");
        Ok(expressions)
    }

    #[allow(clippy::unused_self)]
    fn expression(
        &self,
        path: &FilterPath,
        provider: &ConditionProvider,
        literal: &Value,
        order_index: usize,
    ) -> Result<FilterExpression> {
        match provider.create_condition(literal)? {
            ProvidedCondition::Condition(condition) => {
                Ok(FilterExpression::new(path.clone(), condition, order_index))
            }
            ProvidedCondition::Unsupported => Err(Error::InvalidFilter(format!(
                "operator {} does not support the value {literal} at path '{path}'",
                provider.op_code()
            ))),
        }
    }
}

fn operator_block<'a>(raw_path: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    match value.as_object() {
        Some(block) if !block.is_empty() => Ok(block),
        _ => Err(Error::InvalidFilter(format!(
            "condition for path '{raw_path}' must be a non-empty object of operators"
        ))),
    }
}
