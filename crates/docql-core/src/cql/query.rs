//! Query descriptors handed to the storage collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::predicate::BuiltCondition;
use super::value::CqlValue;
use crate::error::{Error, Result};

/// Storage consistency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Consistency {
    /// `ANY`
    Any,
    /// `ONE`
    One,
    /// `TWO`
    Two,
    /// `THREE`
    Three,
    /// `QUORUM`
    Quorum,
    /// `ALL`
    All,
    /// `LOCAL_QUORUM`
    #[default]
    LocalQuorum,
    /// `EACH_QUORUM`
    EachQuorum,
    /// `SERIAL`
    Serial,
    /// `LOCAL_SERIAL`
    LocalSerial,
    /// `LOCAL_ONE`
    LocalOne,
}

impl Consistency {
    /// Level name as the driver spells it.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
            Self::LocalOne => "LOCAL_ONE",
        }
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured form of a `SELECT` statement.
///
/// Every condition, the ANN vector and the limit are bind markers, consumed
/// from the bound values in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Select {
    /// Keyspace.
    pub keyspace: String,
    /// Table.
    pub table: String,
    /// Selected columns; empty selects `*`.
    pub columns: Vec<String>,
    /// WHERE conditions, ANDed.
    pub conditions: Vec<BuiltCondition>,
    /// Vector column for `ORDER BY … ANN OF ?`.
    pub ann_column: Option<String>,
    /// Whether a `LIMIT ?` marker is present.
    pub limited: bool,
    /// Whether `ALLOW FILTERING` is appended.
    pub allow_filtering: bool,
}

impl Select {
    /// Selects `*` from `keyspace.table`.
    #[must_use]
    pub fn new(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            ann_column: None,
            limited: false,
            allow_filtering: false,
        }
    }

    /// Number of bind markers in the rendered text.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.conditions.len() + usize::from(self.ann_column.is_some()) + usize::from(self.limited)
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.columns.is_empty() {
            f.write_str("*")?;
        } else {
            f.write_str(&self.columns.join(", "))?;
        }
        write!(f, " FROM {}.{}", self.keyspace, self.table)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            f.write_str(if i == 0 { " WHERE " } else { " AND " })?;
            write!(f, "{condition}")?;
        }
        if let Some(column) = &self.ann_column {
            write!(f, " ORDER BY {column} ANN OF ?")?;
        }
        if self.limited {
            f.write_str(" LIMIT ?")?;
        }
        if self.allow_filtering {
            f.write_str(" ALLOW FILTERING")?;
        }
        Ok(())
    }
}

/// Query text with positional bind markers, its bound values and consistency.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Rendered query text.
    pub cql: String,
    /// Values for the bind markers, in order.
    pub values: Vec<CqlValue>,
    /// Consistency level.
    pub consistency: Consistency,
    /// The statement `cql` was rendered from.
    pub select: Select,
}

impl Query {
    /// Renders `select` and pairs it with its bound values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryState`] if the number of values differs from the
    /// number of bind markers.
    pub fn new(select: Select, values: Vec<CqlValue>, consistency: Consistency) -> Result<Self> {
        let expected = select.marker_count();
        if values.len() != expected {
            return Err(Error::QueryState(format!(
                "expected {expected} bound values, got {}",
                values.len()
            )));
        }
        Ok(Self {
            cql: select.to_string(),
            values,
            consistency,
            select,
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cql)
    }
}
