//! Inlines bound ANN vectors as query literals.
//!
//! Some storage drivers reject a vector bound to `ORDER BY col ANN OF ?`.
//! The rewriter decodes the raw parameter bytes, writes the vector into the
//! query text and drops the parameter from the bound values.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::cql::Query;
use crate::error::{Error, Result};

static ANN_PARAMETER: OnceLock<Regex> = OnceLock::new();

fn ann_parameter() -> &'static Regex {
    ANN_PARAMETER.get_or_init(|| {
        Regex::new(r#"(?i)\bORDER\s+BY\s+("?\w+"?)\s+ANN\s+OF\s+\?"#)
            .unwrap_or_else(|e| unreachable!("ANN pattern is a valid regex: {e}"))
    })
}

/// A statement as the driver sees it: text plus raw positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Query text with `?` markers.
    pub query: String,
    /// Serialized parameter values, in marker order.
    pub values: Vec<Bytes>,
    /// Whether the driver already bound the values to a prepared statement.
    pub bound: bool,
}

impl Statement {
    /// Creates an unbound statement.
    #[must_use]
    pub fn new(query: impl Into<String>, values: Vec<Bytes>) -> Self {
        Self {
            query: query.into(),
            values,
            bound: false,
        }
    }

    /// Serializes a compiled query's values.
    #[must_use]
    pub fn from_query(query: &Query) -> Self {
        Self::new(
            query.cql.clone(),
            query.values.iter().map(crate::cql::CqlValue::encode).collect(),
        )
    }
}

/// Byte layouts a serialized float vector can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorLayout {
    /// `4×N` bytes of big-endian floats.
    Flat,
    /// An `i32` element count, then `4×N` bytes of floats.
    CountPrefixed,
    /// An `i32` element count, then each float preceded by its `i32` size.
    Collection,
}

impl VectorLayout {
    /// Guesses the layout from the buffer's length and prefixes.
    ///
    /// A leading count `c > 0` selects `Collection` when the length is
    /// `4 + 8c` and every size prefix is 4, or `CountPrefixed` when the length
    /// is `4 + 4c`. Anything else is read as flat floats.
    #[must_use]
    pub fn detect(buf: &[u8]) -> Self {
        if buf.len() < 4 {
            return Self::Flat;
        }
        let mut header = &buf[..4];
        let Some(count) = usize::try_from(header.get_i32()).ok().filter(|c| *c > 0) else {
            return Self::Flat;
        };

        let collection_len = count.checked_mul(8).and_then(|n| n.checked_add(4));
        if collection_len == Some(buf.len()) {
            let sizes_ok = buf[4..]
                .chunks_exact(8)
                .all(|element| element[..4] == 4i32.to_be_bytes());
            if sizes_ok {
                return Self::Collection;
            }
        }

        let prefixed_len = count.checked_mul(4).and_then(|n| n.checked_add(4));
        if prefixed_len == Some(buf.len()) {
            return Self::CountPrefixed;
        }
        Self::Flat
    }

    /// Serializes `vector` in this layout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn encode(self, vector: &[f32]) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + vector.len() * 8);
        match self {
            Self::Flat => vector.iter().for_each(|f| buf.put_f32(*f)),
            Self::CountPrefixed => {
                buf.put_i32(vector.len() as i32);
                vector.iter().for_each(|f| buf.put_f32(*f));
            }
            Self::Collection => {
                buf.put_i32(vector.len() as i32);
                for f in vector {
                    buf.put_i32(4);
                    buf.put_f32(*f);
                }
            }
        }
        buf.freeze()
    }

    /// Reads the floats out of `buf`, assuming this layout.
    #[must_use]
    pub fn decode(self, buf: &[u8]) -> Vec<f32> {
        let mut cursor = buf;
        if self != Self::Flat {
            if cursor.remaining() < 4 {
                return Vec::new();
            }
            cursor.advance(4);
        }
        match self {
            Self::Flat | Self::CountPrefixed => {
                if cursor.len() % 4 != 0 {
                    tracing::warn!(
                        len = buf.len(),
                        "Vector buffer is not a multiple of 4 bytes, ignoring the tail"
                    );
                }
                let mut out = Vec::with_capacity(cursor.len() / 4);
                while cursor.remaining() >= 4 {
                    out.push(cursor.get_f32());
                }
                out
            }
            Self::Collection => {
                let mut out = Vec::with_capacity(cursor.len() / 8);
                while cursor.remaining() >= 8 {
                    cursor.advance(4);
                    out.push(cursor.get_f32());
                }
                out
            }
        }
    }
}

impl fmt::Display for VectorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Flat => "flat",
            Self::CountPrefixed => "prefixed",
            Self::Collection => "collection",
        })
    }
}

impl FromStr for VectorLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "prefixed" => Ok(Self::CountPrefixed),
            "collection" => Ok(Self::Collection),
            other => Err(Error::InvalidRequest(format!(
                "unknown vector layout '{other}', expected flat, prefixed or collection"
            ))),
        }
    }
}

/// Decodes a serialized float vector, sniffing its layout.
#[must_use]
pub fn decode_float_vector(buf: &[u8]) -> Vec<f32> {
    VectorLayout::detect(buf).decode(buf)
}

/// Renders a vector as a query literal, e.g. `[0.1, 0.2]`.
#[must_use]
pub fn format_vector_literal(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(|f| format!("{f:?}")).collect();
    format!("[{}]", parts.join(", "))
}

/// Rewrites `ORDER BY col ANN OF ?` into `ORDER BY col ANN OF [..]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorQueryRewriter;

impl VectorQueryRewriter {
    /// Returns true if `query` orders by a bound ANN parameter.
    #[must_use]
    pub fn has_parameterized_ann(query: &str) -> bool {
        ann_parameter().is_match(query)
    }

    /// Positions, among all `?` markers, of the bound ANN parameters.
    #[must_use]
    pub fn parameter_indices(query: &str) -> Vec<usize> {
        ann_parameter()
            .find_iter(query)
            .map(|m| query[..m.start()].matches('?').count())
            .collect()
    }

    /// Rewrites the statement, or returns it untouched when it is already
    /// bound, has no ANN parameter, or cannot be rewritten.
    #[must_use]
    pub fn process(statement: Statement) -> Statement {
        if statement.bound || !Self::has_parameterized_ann(&statement.query) {
            return statement;
        }
        match Self::rewrite(&statement) {
            Ok(rewritten) => {
                tracing::debug!(
                    removed = statement.values.len() - rewritten.values.len(),
                    "Inlined ANN vector parameters"
                );
                rewritten
            }
            Err(e) => {
                tracing::warn!(error = %e, "Vector rewrite failed, keeping the original statement");
                statement
            }
        }
    }

    /// Inlines every ANN parameter of `statement`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVector`] if a marker has no bound value or its
    /// bytes do not decode to finite floats.
    pub fn rewrite(statement: &Statement) -> Result<Statement> {
        let query = statement.query.as_str();
        let mut text = String::with_capacity(query.len());
        let mut removed = Vec::new();
        let mut last = 0;

        for caps in ann_parameter().captures_iter(query) {
            let (Some(whole), Some(column)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let index = query[..whole.start()].matches('?').count();
            let raw = statement.values.get(index).ok_or_else(|| {
                Error::InvalidVector(format!(
                    "no bound value at position {index} for the ANN parameter"
                ))
            })?;
            let vector = decode_float_vector(raw);
            if vector.iter().any(|f| !f.is_finite()) {
                return Err(Error::InvalidVector(format!(
                    "ANN parameter at position {index} holds non-finite floats"
                )));
            }

            text.push_str(&query[last..whole.start()]);
            text.push_str("ORDER BY ");
            text.push_str(column.as_str());
            text.push_str(" ANN OF ");
            text.push_str(&format_vector_literal(&vector));
            last = whole.end();
            removed.push(index);
        }
        text.push_str(&query[last..]);

        let values = statement
            .values
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, v)| v.clone())
            .collect();

        Ok(Statement {
            query: text,
            values,
            bound: statement.bound,
        })
    }
}
