//! Condition providers turn one operator node into a [`Condition`].

use serde_json::Value;

use super::condition::{Condition, QueryValue};
use super::operation::{FilterOpCode, FilterOperation};
use crate::error::{Error, Result};

/// Outcome of [`ConditionProvider::create_condition`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProvidedCondition {
    /// The literal was accepted.
    Condition(Condition),
    /// The literal's shape is not supported by the operator.
    Unsupported,
}

impl ProvidedCondition {
    /// The condition, if one was produced.
    #[must_use]
    pub fn into_condition(self) -> Option<Condition> {
        match self {
            Self::Condition(condition) => Some(condition),
            Self::Unsupported => None,
        }
    }
}

/// Builds conditions for a single operator.
///
/// Negation is resolved when the provider is created, so a provider for
/// `$not` + `$eq` produces `$ne` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionProvider {
    op_code: FilterOpCode,
}

impl ConditionProvider {
    /// Creates the provider for `op_code`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] when `negated` is requested for
    /// an operator without a negated form.
    pub fn new(op_code: FilterOpCode, negated: bool) -> Result<Self> {
        let op_code = if negated {
            FilterOperation::of(op_code).negate()?.op_code()
        } else {
            op_code
        };
        Ok(Self { op_code })
    }

    /// Creates the provider for a raw operator token such as `$contains`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] for an unknown token and
    /// [`Error::UnsupportedOperation`] for an unsupported negation.
    pub fn for_operator(raw: &str, negated: bool) -> Result<Self> {
        let op_code = FilterOpCode::from_operator(raw).ok_or_else(|| {
            Error::InvalidFilter(format!("operator {raw} is not supported"))
        })?;
        Self::new(op_code, negated)
    }

    /// Op-code of the conditions this provider creates.
    #[must_use]
    pub const fn op_code(&self) -> FilterOpCode {
        self.op_code
    }

    /// Builds a condition from the operator's JSON literal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] when the literal has a supported
    /// shape but an invalid value, such as an empty `LIKE` pattern.
    pub fn create_condition(&self, node: &Value) -> Result<ProvidedCondition> {
        let condition = match self.op_code {
            FilterOpCode::Eq | FilterOpCode::Ne => match QueryValue::from_json(node) {
                Some(value) => Condition::value(self.op_code, value)?,
                None => return Ok(ProvidedCondition::Unsupported),
            },
            FilterOpCode::Gt | FilterOpCode::Gte | FilterOpCode::Lt | FilterOpCode::Lte => {
                match QueryValue::from_json(node) {
                    Some(value @ (QueryValue::String(_) | QueryValue::Double(_))) => {
                        Condition::value(self.op_code, value)?
                    }
                    _ => return Ok(ProvidedCondition::Unsupported),
                }
            }
            FilterOpCode::Like => match node {
                Value::String(pattern) => Condition::like(pattern, false)?,
                _ => return Ok(ProvidedCondition::Unsupported),
            },
            FilterOpCode::Contains => match QueryValue::from_json(node) {
                Some(value) => Condition::contains(value),
                None => return Ok(ProvidedCondition::Unsupported),
            },
            FilterOpCode::ContainsKey => match node {
                Value::String(key) => Condition::contains_key(key.as_str())?,
                _ => return Ok(ProvidedCondition::Unsupported),
            },
            FilterOpCode::Exists => match node {
                Value::Bool(true) => Condition::exists(),
                _ => return Ok(ProvidedCondition::Unsupported),
            },
        };
        Ok(ProvidedCondition::Condition(condition))
    }
}
