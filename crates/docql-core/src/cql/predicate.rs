//! WHERE-clause predicates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a WHERE-clause predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `LIKE`
    Like,
    /// `IN`
    In,
}

impl Predicate {
    /// Operator token as written in a query.
    #[must_use]
    pub const fn as_cql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cql())
    }
}

/// A predicate over one column with a bind marker on the right-hand side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuiltCondition {
    /// Column name.
    pub column: String,
    /// Operator.
    pub predicate: Predicate,
}

impl BuiltCondition {
    /// Creates a condition `column predicate ?`.
    #[must_use]
    pub fn new(column: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            column: column.into(),
            predicate,
        }
    }
}

impl fmt::Display for BuiltCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ?", self.column, self.predicate)
    }
}
