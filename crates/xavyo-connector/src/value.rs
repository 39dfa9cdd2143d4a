//! Attribute values
//!
//! The set of types an attribute may carry is closed: every value is one of
//! the [`AttributeValue`] variants. Dynamic input (JSON from a REST target or
//! a configuration file) goes through `TryFrom<serde_json::Value>`, which
//! rejects anything outside that set.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde_json::Value;

use crate::error::{ConnectorError, ConnectorResult};
use crate::guarded::GuardedString;

/// A single attribute value.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Char(char),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    /// Encrypted string (passwords and other secrets).
    Guarded(GuardedString),
}

impl AttributeValue {
    /// Name of the value type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Int(_) => "int",
            AttributeValue::Long(_) => "long",
            AttributeValue::Float(_) => "float",
            AttributeValue::Double(_) => "double",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Bytes(_) => "bytes",
            AttributeValue::Char(_) => "char",
            AttributeValue::BigInteger(_) => "big_integer",
            AttributeValue::BigDecimal(_) => "big_decimal",
            AttributeValue::Guarded(_) => "guarded_string",
        }
    }

    /// Get as a string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether values of this type have a natural ordering.
    pub fn is_orderable(&self) -> bool {
        !matches!(
            self,
            AttributeValue::Boolean(_) | AttributeValue::Bytes(_) | AttributeValue::Guarded(_)
        )
    }

    /// Order two values of the same type.
    ///
    /// Mixed types and unordered types are an [`ConnectorError::InvalidData`].
    pub fn compare(&self, other: &AttributeValue) -> ConnectorResult<Ordering> {
        use AttributeValue as V;
        match (self, other) {
            (V::String(a), V::String(b)) => Ok(a.cmp(b)),
            (V::Int(a), V::Int(b)) => Ok(a.cmp(b)),
            (V::Long(a), V::Long(b)) => Ok(a.cmp(b)),
            (V::Float(a), V::Float(b)) => Ok(a.total_cmp(b)),
            (V::Double(a), V::Double(b)) => Ok(a.total_cmp(b)),
            (V::Char(a), V::Char(b)) => Ok(a.cmp(b)),
            (V::BigInteger(a), V::BigInteger(b)) => Ok(a.cmp(b)),
            (V::BigDecimal(a), V::BigDecimal(b)) => Ok(a.cmp(b)),
            _ => Err(ConnectorError::invalid_data(format!(
                "cannot compare {} with {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        use AttributeValue as V;
        match (self, other) {
            (V::String(a), V::String(b)) => a == b,
            (V::Int(a), V::Int(b)) => a == b,
            (V::Long(a), V::Long(b)) => a == b,
            // Bitwise so that Eq and Hash stay consistent (NaN == NaN).
            (V::Float(a), V::Float(b)) => a.to_bits() == b.to_bits(),
            (V::Double(a), V::Double(b)) => a.to_bits() == b.to_bits(),
            (V::Boolean(a), V::Boolean(b)) => a == b,
            (V::Bytes(a), V::Bytes(b)) => a == b,
            (V::Char(a), V::Char(b)) => a == b,
            (V::BigInteger(a), V::BigInteger(b)) => a == b,
            (V::BigDecimal(a), V::BigDecimal(b)) => a == b,
            (V::Guarded(a), V::Guarded(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttributeValue::String(v) => v.hash(state),
            AttributeValue::Int(v) => v.hash(state),
            AttributeValue::Long(v) => v.hash(state),
            AttributeValue::Float(v) => v.to_bits().hash(state),
            AttributeValue::Double(v) => v.to_bits().hash(state),
            AttributeValue::Boolean(v) => v.hash(state),
            AttributeValue::Bytes(v) => v.hash(state),
            AttributeValue::Char(v) => v.hash(state),
            AttributeValue::BigInteger(v) => v.hash(state),
            AttributeValue::BigDecimal(v) => v.hash(state),
            AttributeValue::Guarded(v) => v.hash(state),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(v) => f.write_str(v),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Long(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Double(v) => write!(f, "{v}"),
            AttributeValue::Boolean(v) => write!(f, "{v}"),
            AttributeValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            AttributeValue::Char(v) => write!(f, "{v}"),
            AttributeValue::BigInteger(v) => write!(f, "{v}"),
            AttributeValue::BigDecimal(v) => write!(f, "{v}"),
            AttributeValue::Guarded(_) => f.write_str("********"),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Long(i)
    }
}

impl From<f32> for AttributeValue {
    fn from(f: f32) -> Self {
        AttributeValue::Float(f)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        AttributeValue::Double(f)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Bytes(bytes)
    }
}

impl From<char> for AttributeValue {
    fn from(c: char) -> Self {
        AttributeValue::Char(c)
    }
}

impl From<BigInt> for AttributeValue {
    fn from(i: BigInt) -> Self {
        AttributeValue::BigInteger(i)
    }
}

impl From<BigDecimal> for AttributeValue {
    fn from(d: BigDecimal) -> Self {
        AttributeValue::BigDecimal(d)
    }
}

impl From<GuardedString> for AttributeValue {
    fn from(g: GuardedString) -> Self {
        AttributeValue::Guarded(g)
    }
}

impl TryFrom<Value> for AttributeValue {
    type Error = ConnectorError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(AttributeValue::String(s)),
            Value::Bool(b) => Ok(AttributeValue::Boolean(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(AttributeValue::Long(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(AttributeValue::BigInteger(BigInt::from(u)))
                } else if let Some(f) = n.as_f64() {
                    Ok(AttributeValue::Double(f))
                } else {
                    Err(ConnectorError::InvalidAttributeValue {
                        message: format!("unrepresentable number {n}"),
                    })
                }
            }
            Value::Null => Err(ConnectorError::InvalidAttributeValue {
                message: "null is not an attribute value".to_string(),
            }),
            Value::Array(_) => Err(ConnectorError::InvalidAttributeValue {
                message: "nested arrays are not supported".to_string(),
            }),
            Value::Object(_) => Err(ConnectorError::InvalidAttributeValue {
                message: "objects are not supported".to_string(),
            }),
        }
    }
}
