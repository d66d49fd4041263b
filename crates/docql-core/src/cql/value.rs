//! Typed values bound to query markers.

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use std::fmt::Write as _;

/// A value in the storage engine's type system.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// Unset or null.
    Null,
    /// `text`.
    String(String),
    /// `int`.
    Int(i32),
    /// `bigint`.
    BigInt(i64),
    /// `float`.
    Float(f32),
    /// `double`.
    Double(f64),
    /// `boolean`.
    Boolean(bool),
    /// `vector<float, n>`.
    Vector(Vec<f32>),
    /// `list<…>`.
    List(Vec<CqlValue>),
    /// `map<…, …>`, in insertion order.
    Map(Vec<(CqlValue, CqlValue)>),
}

impl CqlValue {
    /// Converts a JSON value, recursing through arrays and objects.
    ///
    /// Integral numbers become `BigInt`, other numbers `Double`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::BigInt)
                .or_else(|| n.as_f64().map(Self::Double))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(fields) => Self::Map(
                fields
                    .iter()
                    .map(|(k, v)| (Self::String(k.clone()), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as a query literal.
    #[must_use]
    pub fn to_literal(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Int(i) => i.to_string(),
            Self::BigInt(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Double(d) => format!("{d:?}"),
            Self::Boolean(b) => b.to_string(),
            Self::Vector(v) => crate::search::format_vector_literal(v),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Self::to_literal).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Map(entries) => {
                let mut out = String::from("{");
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: {}", k.to_literal(), v.to_literal());
                }
                out.push('}');
                out
            }
        }
    }

    /// Serializes the value the way the native protocol carries a bound value.
    ///
    /// All numbers are big-endian. Collections carry an `i32` element count
    /// followed by `i32`-length-prefixed elements.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.freeze()
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Self::Null => {}
            Self::String(s) => buf.put_slice(s.as_bytes()),
            Self::Int(i) => buf.put_i32(*i),
            Self::BigInt(i) => buf.put_i64(*i),
            Self::Float(f) => buf.put_f32(*f),
            Self::Double(d) => buf.put_f64(*d),
            Self::Boolean(b) => buf.put_u8(u8::from(*b)),
            Self::Vector(v) => v.iter().for_each(|f| buf.put_f32(*f)),
            Self::List(items) => {
                put_count(buf, items.len());
                for item in items {
                    put_element(buf, item);
                }
            }
            Self::Map(entries) => {
                put_count(buf, entries.len());
                for (k, v) in entries {
                    put_element(buf, k);
                    put_element(buf, v);
                }
            }
        }
    }

    /// Text content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(f64::from(*i)),
            Self::BigInt(i) => Some(*i as f64),
            Self::Float(f) => Some(f64::from(*f)),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Boolean content.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Non-negative integral content as a count.
    #[must_use]
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Self::Int(i) => usize::try_from(*i).ok(),
            Self::BigInt(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn put_count(buf: &mut BytesMut, count: usize) {
    buf.put_i32(count as i32);
}

fn put_element(buf: &mut BytesMut, value: &CqlValue) {
    if matches!(value, CqlValue::Null) {
        buf.put_i32(-1);
        return;
    }
    let encoded = value.encode();
    put_count(buf, encoded.len());
    buf.put_slice(&encoded);
}

impl From<&str> for CqlValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CqlValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for CqlValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for CqlValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for CqlValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<f32>> for CqlValue {
    fn from(value: Vec<f32>) -> Self {
        Self::Vector(value)
    }
}
