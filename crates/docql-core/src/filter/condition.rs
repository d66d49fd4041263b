//! Conditions bind an operation to a literal.
//!
//! A condition knows how to render itself as a push-down predicate on the
//! matching value column and how to test a single shredded row in memory. It
//! holds no path; the owning [`FilterExpression`](super::FilterExpression)
//! supplies it.

use serde_json::Value;

use super::like::LikePattern;
use super::operation::{unsupported_negation, FilterOpCode, FilterOperation};
use crate::cql::{BuiltCondition, CqlValue, Predicate};
use crate::error::{Error, Result};
use crate::row::{ShreddedRow, TableProperties, ValueType};

/// Scalar literal of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// String literal.
    String(String),
    /// Numeric literal, widened to double.
    Double(f64),
    /// Boolean literal.
    Boolean(bool),
}

impl QueryValue {
    /// Converts a scalar JSON value; `null`, arrays and objects yield `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => n.as_f64().map(Self::Double),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Value column this literal is compared against.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Double(_) => ValueType::Double,
            Self::Boolean(_) => ValueType::Boolean,
        }
    }

    /// The literal as a bound value.
    #[must_use]
    pub fn to_cql(&self) -> CqlValue {
        match self {
            Self::String(s) => CqlValue::String(s.clone()),
            Self::Double(d) => CqlValue::Double(*d),
            Self::Boolean(b) => CqlValue::Boolean(*b),
        }
    }
}

/// A predicate fragment and the value bound to its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PushDown {
    /// `column OP ?`.
    pub condition: BuiltCondition,
    /// Value for the marker.
    pub value: CqlValue,
}

#[derive(Debug, Clone, PartialEq)]
enum ConditionKind {
    Value {
        operation: &'static FilterOperation,
        value: QueryValue,
    },
    Like {
        pattern: LikePattern,
        negated: bool,
    },
    Contains {
        value: QueryValue,
    },
    ContainsKey {
        key: String,
    },
    Exists,
}

/// A validated filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    kind: ConditionKind,
}

impl Condition {
    /// Comparison condition (`$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if `op_code` is not a comparison, or a
    /// boolean is used with an ordering operation.
    pub fn value(op_code: FilterOpCode, value: QueryValue) -> Result<Self> {
        match op_code {
            FilterOpCode::Eq | FilterOpCode::Ne => {}
            FilterOpCode::Gt | FilterOpCode::Gte | FilterOpCode::Lt | FilterOpCode::Lte => {
                if let QueryValue::Boolean(_) = value {
                    return Err(Error::InvalidFilter(format!(
                        "{op_code} does not support boolean values"
                    )));
                }
            }
            _ => {
                return Err(Error::InvalidFilter(format!(
                    "{op_code} is not a comparison operation"
                )))
            }
        }
        Ok(Self {
            kind: ConditionKind::Value {
                operation: FilterOperation::of(op_code),
                value,
            },
        })
    }

    /// `LIKE` condition. A negated condition never pushes down and holds on
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] for an empty or uncompilable pattern.
    pub fn like(pattern: &str, negated: bool) -> Result<Self> {
        Ok(Self {
            kind: ConditionKind::Like {
                pattern: LikePattern::compile(pattern)?,
                negated,
            },
        })
    }

    /// Array-containment condition.
    #[must_use]
    pub fn contains(value: QueryValue) -> Self {
        Self {
            kind: ConditionKind::Contains { value },
        }
    }

    /// Object-key condition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilter`] if `key` is empty.
    pub fn contains_key(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidFilter(
                "CONTAINS KEY query value cannot be null or empty".to_string(),
            ));
        }
        Ok(Self {
            kind: ConditionKind::ContainsKey { key },
        })
    }

    /// Field-presence condition.
    #[must_use]
    pub const fn exists() -> Self {
        Self {
            kind: ConditionKind::Exists,
        }
    }

    /// Op-code of the underlying operation.
    #[must_use]
    pub fn op_code(&self) -> FilterOpCode {
        match &self.kind {
            ConditionKind::Value { operation, .. } => operation.op_code(),
            ConditionKind::Like { .. } => FilterOpCode::Like,
            ConditionKind::Contains { .. } => FilterOpCode::Contains,
            ConditionKind::ContainsKey { .. } => FilterOpCode::ContainsKey,
            ConditionKind::Exists => FilterOpCode::Exists,
        }
    }

    /// True for a negated `LIKE`.
    #[must_use]
    pub fn is_negated(&self) -> bool {
        matches!(self.kind, ConditionKind::Like { negated: true, .. })
    }

    /// The literal this condition compares against.
    #[must_use]
    pub fn query_value(&self) -> QueryValue {
        match &self.kind {
            ConditionKind::Value { value, .. } | ConditionKind::Contains { value } => value.clone(),
            ConditionKind::Like { pattern, .. } => QueryValue::String(pattern.as_str().to_string()),
            ConditionKind::ContainsKey { key } => QueryValue::String(key.clone()),
            ConditionKind::Exists => QueryValue::Boolean(true),
        }
    }

    /// The key a `$containsKey` condition looks for.
    #[must_use]
    pub fn target_key(&self) -> Option<&str> {
        match &self.kind {
            ConditionKind::ContainsKey { key } => Some(key),
            _ => None,
        }
    }

    /// Whether a document lacking the field satisfies the condition.
    #[must_use]
    pub fn is_evaluate_on_missing_fields(&self) -> bool {
        match &self.kind {
            ConditionKind::Value { operation, .. } => operation.is_evaluate_on_missing_fields(),
            ConditionKind::Like { negated, .. } => *negated,
            ConditionKind::Contains { .. } => {
                FilterOperation::of(FilterOpCode::Contains).is_evaluate_on_missing_fields()
            }
            ConditionKind::ContainsKey { .. } => {
                FilterOperation::of(FilterOpCode::ContainsKey).is_evaluate_on_missing_fields()
            }
            ConditionKind::Exists => false,
        }
    }

    /// Renders the value predicate, or `None` when the condition can only be
    /// evaluated in memory.
    ///
    /// `CONTAINS` yields a plain equality on the value column; restricting it
    /// to array elements is the query builder's job.
    #[must_use]
    pub fn try_push_down(&self, props: &TableProperties) -> Option<PushDown> {
        match &self.kind {
            ConditionKind::Value { operation, value } => {
                let predicate = operation.predicate()?;
                Some(push_down(props, value, predicate))
            }
            ConditionKind::Like { negated: true, .. } => None,
            ConditionKind::Like { pattern, .. } => Some(PushDown {
                condition: BuiltCondition::new(&props.text_value_column, Predicate::Like),
                value: CqlValue::String(pattern.as_str().to_string()),
            }),
            ConditionKind::Contains { value } => Some(push_down(props, value, Predicate::Eq)),
            ConditionKind::ContainsKey { .. } | ConditionKind::Exists => None,
        }
    }

    /// Tests one row already selected by path.
    #[must_use]
    pub fn test(&self, row: &ShreddedRow) -> bool {
        match &self.kind {
            ConditionKind::Value { operation, value } => test_typed(operation, value, row),
            ConditionKind::Contains { value } => {
                test_typed(FilterOperation::of(FilterOpCode::Contains), value, row)
            }
            ConditionKind::Like { pattern, negated } => match row.string_value() {
                Some(s) => pattern.matches(s) != *negated,
                None => *negated,
            },
            ConditionKind::ContainsKey { .. } | ConditionKind::Exists => true,
        }
    }

    /// The condition with inverted semantics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for `LIKE`, `CONTAINS`,
    /// `CONTAINS KEY` and `EXISTS`.
    pub fn negate(&self) -> Result<Self> {
        match &self.kind {
            ConditionKind::Value { operation, value } => Ok(Self {
                kind: ConditionKind::Value {
                    operation: operation.negate()?,
                    value: value.clone(),
                },
            }),
            ConditionKind::Like { .. } => Err(unsupported_negation("LIKE")),
            ConditionKind::Contains { .. } => Err(unsupported_negation("CONTAINS")),
            ConditionKind::ContainsKey { .. } => Err(unsupported_negation("CONTAINS KEY")),
            ConditionKind::Exists => Err(unsupported_negation("EXISTS")),
        }
    }
}

fn push_down(props: &TableProperties, value: &QueryValue, predicate: Predicate) -> PushDown {
    PushDown {
        condition: BuiltCondition::new(props.value_column(value.value_type()), predicate),
        value: value.to_cql(),
    }
}

fn test_typed(operation: &FilterOperation, value: &QueryValue, row: &ShreddedRow) -> bool {
    let present = match value {
        QueryValue::String(s) => row
            .string_value()
            .map(|db| operation.test_string(Some(db), Some(s))),
        QueryValue::Double(d) => row
            .double_value()
            .map(|db| operation.test_double(Some(db), Some(*d))),
        QueryValue::Boolean(b) => row
            .boolean_value()
            .map(|db| operation.test_boolean(Some(db), Some(*b))),
    };
    present.unwrap_or_else(|| operation.is_evaluate_on_missing_fields())
}
