//! # Feed Values
//!
//! The typed value a nebula agrees on, and its single wire codec.
//!
//! Integers are always eight bytes, big-endian two's complement. Any other
//! width is rejected on decode.

use crate::errors::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared value type of a feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed 64-bit integer.
    Int64,
    /// UTF-8 string.
    String,
    /// Opaque bytes.
    Bytes,
}

impl ValueType {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int64 => "int64",
            ValueType::String => "string",
            ValueType::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int64" => Ok(ValueType::Int64),
            "string" => Ok(ValueType::String),
            "bytes" => Ok(ValueType::Bytes),
            other => Err(ValueError::UnknownType(other.to_string())),
        }
    }
}

/// A feed value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Integer value.
    Int64(i64),
    /// String value.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// The value's type.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int64(_) => ValueType::Int64,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
        }
    }

    /// Canonical bytes. This is what gets committed, revealed and hashed.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Value::Int64(v) => v.to_be_bytes().to_vec(),
            Value::String(s) => s.as_bytes().to_vec(),
            Value::Bytes(b) => b.clone(),
        }
    }

    /// Decode canonical bytes for the declared type.
    pub fn decode(value_type: ValueType, bytes: &[u8]) -> Result<Self, ValueError> {
        match value_type {
            ValueType::Int64 => {
                let raw: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| ValueError::InvalidIntWidth(bytes.len()))?;
                Ok(Value::Int64(i64::from_be_bytes(raw)))
            }
            ValueType::String => std::str::from_utf8(bytes)
                .map(|s| Value::String(s.to_string()))
                .map_err(|_| ValueError::InvalidUtf8),
            ValueType::Bytes => Ok(Value::Bytes(bytes.to_vec())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_codec_is_fixed_width() {
        let bytes = Value::Int64(-2).encode();
        assert_eq!(bytes, vec![0xff; 7].into_iter().chain([0xfe]).collect::<Vec<_>>());
        assert_eq!(Value::decode(ValueType::Int64, &bytes).unwrap(), Value::Int64(-2));
    }

    #[test]
    fn test_int_codec_rejects_other_widths() {
        assert_eq!(
            Value::decode(ValueType::Int64, &[]),
            Err(ValueError::InvalidIntWidth(0))
        );
        assert_eq!(
            Value::decode(ValueType::Int64, &[0u8; 4]),
            Err(ValueError::InvalidIntWidth(4))
        );
    }

    #[test]
    fn test_string_codec_requires_utf8() {
        assert_eq!(
            Value::decode(ValueType::String, b"btc").unwrap(),
            Value::String("btc".into())
        );
        assert_eq!(
            Value::decode(ValueType::String, &[0xff, 0xfe]),
            Err(ValueError::InvalidUtf8)
        );
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!("int64".parse::<ValueType>().unwrap(), ValueType::Int64);
        assert_eq!(ValueType::Bytes.to_string(), "bytes");
        assert!("float".parse::<ValueType>().is_err());
    }
}
