//! Filter operations: one shared, stateless policy per op-code.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::cql::Predicate;
use crate::error::{Error, Result};

/// Operation code of a filter operator.
///
/// Discriminants index the operation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOpCode {
    /// `$eq`
    Eq,
    /// `$ne`
    Ne,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
    /// `$like`
    Like,
    /// `$contains`
    Contains,
    /// `$containsKey`
    ContainsKey,
    /// `$exists`
    Exists,
}

impl FilterOpCode {
    /// Every op-code, in registry order.
    pub const ALL: [Self; 10] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::Contains,
        Self::ContainsKey,
        Self::Exists,
    ];

    /// The JSON operator token (`$eq`, `$containsKey`, …).
    #[must_use]
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Like => "$like",
            Self::Contains => "$contains",
            Self::ContainsKey => "$containsKey",
            Self::Exists => "$exists",
        }
    }

    /// Looks up an op-code by its JSON operator token.
    #[must_use]
    pub fn from_operator(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.operator() == raw)
    }
}

impl fmt::Display for FilterOpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator())
    }
}

/// Comparison semantics of one op-code.
///
/// Instances live in a static registry and are obtained through
/// [`FilterOperation::of`].
#[derive(Debug, PartialEq, Eq)]
pub struct FilterOperation {
    op_code: FilterOpCode,
    predicate: Option<Predicate>,
    evaluate_on_missing_fields: bool,
}

static REGISTRY: [FilterOperation; 10] = [
    FilterOperation::new(FilterOpCode::Eq, Some(Predicate::Eq), false),
    FilterOperation::new(FilterOpCode::Ne, None, true),
    FilterOperation::new(FilterOpCode::Gt, Some(Predicate::Gt), false),
    FilterOperation::new(FilterOpCode::Gte, Some(Predicate::Gte), false),
    FilterOperation::new(FilterOpCode::Lt, Some(Predicate::Lt), false),
    FilterOperation::new(FilterOpCode::Lte, Some(Predicate::Lte), false),
    FilterOperation::new(FilterOpCode::Like, Some(Predicate::Like), false),
    FilterOperation::new(FilterOpCode::Contains, Some(Predicate::Eq), false),
    FilterOperation::new(FilterOpCode::ContainsKey, None, false),
    FilterOperation::new(FilterOpCode::Exists, None, false),
];

impl FilterOperation {
    const fn new(
        op_code: FilterOpCode,
        predicate: Option<Predicate>,
        evaluate_on_missing_fields: bool,
    ) -> Self {
        Self {
            op_code,
            predicate,
            evaluate_on_missing_fields,
        }
    }

    /// The shared operation for `op_code`.
    #[must_use]
    pub fn of(op_code: FilterOpCode) -> &'static Self {
        &REGISTRY[op_code as usize]
    }

    /// Op-code.
    #[must_use]
    pub const fn op_code(&self) -> FilterOpCode {
        self.op_code
    }

    /// Storage predicate used when pushing this operation down, if any.
    #[must_use]
    pub const fn predicate(&self) -> Option<Predicate> {
        self.predicate
    }

    /// Whether a document lacking the field satisfies the operation.
    #[must_use]
    pub const fn is_evaluate_on_missing_fields(&self) -> bool {
        self.evaluate_on_missing_fields
    }

    /// Tests a stored string against a filter string.
    ///
    /// `LIKE` never matches here; its compiled pattern lives on the
    /// [`Condition`](super::Condition), see [`Condition::test`](super::Condition::test).
    #[must_use]
    pub fn test_string(&self, db_value: Option<&str>, filter_value: Option<&str>) -> bool {
        if self.tests_presence_only() {
            return db_value.is_some();
        }
        let (Some(db), Some(filter)) = (db_value, filter_value) else {
            return false;
        };
        if self.op_code == FilterOpCode::Like {
            return false;
        }
        self.compare(db.cmp(filter))
    }

    /// Tests a stored double against a filter number.
    #[must_use]
    pub fn test_double(&self, db_value: Option<f64>, filter_value: Option<f64>) -> bool {
        if self.tests_presence_only() {
            return db_value.is_some();
        }
        let (Some(db), Some(filter)) = (db_value, filter_value) else {
            return false;
        };
        if self.op_code == FilterOpCode::Like {
            return false;
        }
        db.partial_cmp(&filter).is_some_and(|ord| self.compare(ord))
    }

    /// Tests a stored boolean against a filter boolean.
    ///
    /// Booleans are unordered; only equality operations can match.
    #[must_use]
    pub fn test_boolean(&self, db_value: Option<bool>, filter_value: Option<bool>) -> bool {
        if self.tests_presence_only() {
            return db_value.is_some();
        }
        let (Some(db), Some(filter)) = (db_value, filter_value) else {
            return false;
        };
        match self.op_code {
            FilterOpCode::Eq | FilterOpCode::Contains => db == filter,
            FilterOpCode::Ne => db != filter,
            _ => false,
        }
    }

    /// The operation with inverted semantics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for `LIKE`, `CONTAINS`,
    /// `CONTAINS KEY` and `EXISTS`, which have no negated push-down form.
    pub fn negate(&self) -> Result<&'static Self> {
        let negated = match self.op_code {
            FilterOpCode::Eq => FilterOpCode::Ne,
            FilterOpCode::Ne => FilterOpCode::Eq,
            FilterOpCode::Gt => FilterOpCode::Lte,
            FilterOpCode::Lte => FilterOpCode::Gt,
            FilterOpCode::Gte => FilterOpCode::Lt,
            FilterOpCode::Lt => FilterOpCode::Gte,
            FilterOpCode::Like => return Err(unsupported_negation("LIKE")),
            FilterOpCode::Contains => return Err(unsupported_negation("CONTAINS")),
            FilterOpCode::ContainsKey => return Err(unsupported_negation("CONTAINS KEY")),
            FilterOpCode::Exists => return Err(unsupported_negation("EXISTS")),
        };
        Ok(Self::of(negated))
    }

    const fn tests_presence_only(&self) -> bool {
        matches!(self.op_code, FilterOpCode::ContainsKey | FilterOpCode::Exists)
    }

    fn compare(&self, ord: Ordering) -> bool {
        match self.op_code {
            FilterOpCode::Eq | FilterOpCode::Contains => ord == Ordering::Equal,
            FilterOpCode::Ne => ord != Ordering::Equal,
            FilterOpCode::Gt => ord == Ordering::Greater,
            FilterOpCode::Gte => ord != Ordering::Less,
            FilterOpCode::Lt => ord == Ordering::Less,
            FilterOpCode::Lte => ord != Ordering::Greater,
            FilterOpCode::Like | FilterOpCode::ContainsKey | FilterOpCode::Exists => false,
        }
    }
}

pub(crate) fn unsupported_negation(operator: &str) -> Error {
    Error::UnsupportedOperation(format!("NOT {operator} is not supported"))
}
