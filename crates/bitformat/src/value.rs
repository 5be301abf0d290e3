//! Values produced by decoding and consumed by encoding.

use std::collections::BTreeMap;

use crate::errors::CodecError;

/// A decoded record: field name to value.
pub type Record = BTreeMap<String, Value>;

/// A single field value.
///
/// Unsigned numeric and bit fields decode to [Value::UInt], signed ones to
/// [Value::Int], floats to [Value::Float]. Encoding is lenient and accepts any
/// numeric variant (or a numeric string) as long as it fits the field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Value {
    UInt(u64),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Bytes(Vec<u8>),
    Record(Record),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::UInt(_) => "unsigned integer",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Bytes(_) => "bytes",
            Value::Record(_) => "record",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Coerces the value to an integer. Floats are truncated toward zero and
    /// strings are parsed after trimming whitespace.
    pub fn to_integer(&self) -> Result<i128, CodecError> {
        match self {
            Value::UInt(v) => Ok(i128::from(*v)),
            Value::Int(v) => Ok(i128::from(*v)),
            Value::Float(v) => float_to_integer(*v),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(v) = s.parse::<i128>() {
                    return Ok(v);
                }
                s.parse::<f64>()
                    .map_err(|_| CodecError::NotANumber(s.to_string()))
                    .and_then(float_to_integer)
            }
            other => Err(CodecError::TypeMismatch {
                expected: "number",
                found: other.kind_name(),
            }),
        }
    }

    /// Coerces the value to a float. Strings are parsed after trimming whitespace.
    pub fn to_float(&self) -> Result<f64, CodecError> {
        match self {
            Value::UInt(v) => Ok(*v as f64),
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CodecError::NotANumber(s.clone())),
            other => Err(CodecError::TypeMismatch {
                expected: "number",
                found: other.kind_name(),
            }),
        }
    }

    /// Interprets the value as raw bytes: either [Value::Bytes] or an array of
    /// integers in `0..=255`.
    pub fn to_byte_vec(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let v = item.to_integer().map_err(|e| e.in_element(index))?;
                    u8::try_from(v).map_err(|_| {
                        CodecError::OutOfRange {
                            kind: "u8",
                            value: v.to_string(),
                        }
                        .in_element(index)
                    })
                })
                .collect(),
            other => Err(CodecError::TypeMismatch {
                expected: "bytes",
                found: other.kind_name(),
            }),
        }
    }
}

fn float_to_integer(v: f64) -> Result<i128, CodecError> {
    if !v.is_finite() {
        return Err(CodecError::OutOfRange {
            kind: "integer",
            value: v.to_string(),
        });
    }

    Ok(v.trunc() as i128)
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

value_from!(UInt as u64: u8, u16, u32, u64);
value_from!(Int as i64: i8, i16, i32, i64);
value_from!(Float as f64: f32, f64);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}
