//! Reply value types

use bytes::Bytes;
use std::fmt;

/// A decoded reply
///
/// Covers the RESP2 shapes plus the few RESP3 additions a native client can
/// surface (doubles, booleans, maps).
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple strings: +OK\r\n
    SimpleString(String),

    /// Error reply reported by the store: -ERR message\r\n
    Error(String),

    /// Integers: :1000\r\n
    Integer(i64),

    /// Bulk strings: $6\r\nfoobar\r\n
    BulkString(Bytes),

    /// Null bulk string or null array
    Null,

    /// Arrays: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),

    /// RESP3 double
    Double(f64),

    /// RESP3 boolean
    Boolean(bool),

    /// RESP3 map, kept in reply order
    Map(Vec<(RespValue, RespValue)>),
}

impl RespValue {
    /// Create a simple string
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Create an error
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Create an integer
    pub fn integer(i: i64) -> Self {
        RespValue::Integer(i)
    }

    /// Create a bulk string from bytes
    pub fn bulk_string(b: impl Into<Bytes>) -> Self {
        RespValue::BulkString(b.into())
    }

    /// Create a null value
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Create an array
    pub fn array(v: Vec<RespValue>) -> Self {
        RespValue::Array(v)
    }

    /// The canonical `+OK` reply
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Try to extract array elements
    pub fn as_array(&self) -> Option<&Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Consume into array elements
    pub fn into_array(self) -> Option<Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to extract bulk string bytes
    pub fn as_bulk_string(&self) -> Option<&Bytes> {
        match self {
            RespValue::BulkString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Bytes of a bulk or simple string
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            RespValue::BulkString(bytes) => Some(bytes),
            RespValue::SimpleString(s) => Some(Bytes::from(s)),
            _ => None,
        }
    }

    /// Try to extract integer value
    ///
    /// Bulk strings holding a decimal integer are accepted too, the way
    /// cursors and some RESP3 downgrades come back.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(i) => Some(*i),
            RespValue::BulkString(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
            RespValue::Boolean(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Text of a simple string, bulk string or error
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) | RespValue::Error(s) => Some(s),
            RespValue::BulkString(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// True for `+OK`
    pub fn is_ok(&self) -> bool {
        matches!(self, RespValue::SimpleString(s) if s == "OK")
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "SimpleString({})", s),
            RespValue::Error(e) => write!(f, "Error({})", e),
            RespValue::Integer(i) => write!(f, "Integer({})", i),
            RespValue::BulkString(b) => write!(f, "BulkString({} bytes)", b.len()),
            RespValue::Null => write!(f, "Null"),
            RespValue::Array(arr) => write!(f, "Array({} elements)", arr.len()),
            RespValue::Double(d) => write!(f, "Double({})", d),
            RespValue::Boolean(b) => write!(f, "Boolean({})", b),
            RespValue::Map(m) => write!(f, "Map({} entries)", m.len()),
        }
    }
}

impl From<redis::Value> for RespValue {
    fn from(value: redis::Value) -> Self {
        match value {
            redis::Value::Nil => RespValue::Null,
            redis::Value::Int(i) => RespValue::Integer(i),
            redis::Value::BulkString(data) => RespValue::BulkString(Bytes::from(data)),
            redis::Value::Array(items) | redis::Value::Set(items) => {
                RespValue::Array(items.into_iter().map(RespValue::from).collect())
            }
            redis::Value::SimpleString(s) => RespValue::SimpleString(s),
            redis::Value::Okay => RespValue::ok(),
            redis::Value::Map(entries) => RespValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (RespValue::from(k), RespValue::from(v)))
                    .collect(),
            ),
            redis::Value::Double(d) => RespValue::Double(d),
            redis::Value::Boolean(b) => RespValue::Boolean(b),
            redis::Value::VerbatimString { text, .. } => RespValue::BulkString(Bytes::from(text)),
            other => RespValue::SimpleString(format!("{:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_from_bulk_string() {
        assert_eq!(RespValue::bulk_string("42").as_integer(), Some(42));
        assert_eq!(RespValue::bulk_string("x").as_integer(), None);
    }

    #[test]
    fn test_from_redis_value() {
        let value = redis::Value::Array(vec![
            redis::Value::BulkString(b"17".to_vec()),
            redis::Value::Array(vec![redis::Value::BulkString(b"k".to_vec())]),
        ]);
        let converted = RespValue::from(value);
        assert_eq!(
            converted,
            RespValue::array(vec![
                RespValue::bulk_string("17"),
                RespValue::array(vec![RespValue::bulk_string("k")]),
            ])
        );
        assert!(RespValue::from(redis::Value::Okay).is_ok());
        assert!(RespValue::from(redis::Value::Nil).is_null());
    }
}
