// ABOUTME: Decoder for the MySQL binary JSON (JSONB) column format.
// ABOUTME: Turns raw column bytes into an owned JSON value tree without reading past the buffer.

//! # mysql-jsonb
//!
//! A decoder for the binary JSON representation MySQL uses for `JSON`
//! columns, as delivered by the binary wire protocol and the binlog.
//!
//! ## Quick Start
//!
//! ```rust
//! use mysql_jsonb::{decode, jsonb};
//!
//! // A small array holding one Int16: [123]
//! let bytes = [0x02, 0x01, 0x00, 0x07, 0x00, 0x05, 0x7b, 0x00];
//! let value = decode(&bytes, bytes.len()).unwrap();
//! assert_eq!(value, jsonb!([123]));
//! assert_eq!(value.to_string(), "[123]");
//! ```
//!
//! ## Materializing into Rust types
//!
//! ```rust
//! use mysql_jsonb::from_slice;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Flags {
//!     on: bool,
//! }
//!
//! // {"on": true} as a small object
//! let bytes = [
//!     0x00, 0x01, 0x00, 0x0d, 0x00, // header: 1 element, 13 bytes
//!     0x0c, 0x00, 0x02, 0x00,       // key at 12, length 2
//!     0x04, 0x01, 0x00,             // literal true, inline
//!     b'o', b'n',
//! ];
//! let flags: Flags = from_slice(&bytes, bytes.len()).unwrap();
//! assert!(flags.on);
//! ```
//!
//! ## Format notes
//!
//! - Every read is checked against the declared length; malformed offsets
//!   produce [`Error::TruncatedData`] rather than a panic.
//! - Container field widths (2 or 4 bytes) are chosen by the container's tag.
//! - Relative offsets count from the container's own tag byte.
//! - Opaque values (embedded DECIMAL, DATE, TIME, DATETIME, ...) surface as
//!   strings in their canonical text form.
//!
//! ## Resource Limits
//!
//! Default limits, adjustable through [`DecoderConfig`]:
//! - Maximum document size: 1 GiB
//! - Maximum nesting depth: 100
//! - Maximum decoded values: one per usable byte of the document

pub mod de;
pub mod decoder;
pub mod error;
pub mod opaque;
pub mod reader;
mod trace;
pub mod types;
pub mod value;

// Re-export commonly used items at the crate root
pub use de::{from_slice, from_value};
pub use decoder::{ContainerHeader, Decoder, DecoderConfig, DuplicateKeyMode};
pub use error::{Error, Result};
pub use reader::Reader;
pub use types::{limits, literal, type_code, TypeInfo, TypeKind};
pub use value::{Map, Value};

// The jsonb! macro is automatically exported at crate root via #[macro_export]

use serde::{Deserialize, Serialize};

/// Decode a JSONB document into a `Value`.
///
/// Only the first `declared_length` bytes of `data` are considered.
///
/// # Example
///
/// ```rust
/// use mysql_jsonb::{decode, Value};
///
/// let bytes = [0x05, 0x2a, 0x00]; // Int16(42)
/// assert_eq!(decode(&bytes, bytes.len()).unwrap(), Value::Int(42));
/// ```
pub fn decode(data: &[u8], declared_length: usize) -> Result<Value> {
    Decoder::new(data, declared_length).decode()
}

/// Decode a JSONB document into a `Value` with custom configuration.
pub fn decode_with_config(
    data: &[u8],
    declared_length: usize,
    config: DecoderConfig,
) -> Result<Value> {
    Decoder::with_config(data, declared_length, config).decode()
}

// Implement Serialize for Value
impl Serialize for Value {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Double(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                use serde::ser::SerializeMap;
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (key, val) in map {
                    m.serialize_entry(key, val)?;
                }
                m.end()
            }
        }
    }
}

// Implement Deserialize for Value
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> serde::de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "any valid JSON value")
            }

            fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
                Ok(Value::Int(v))
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
                Ok(Value::UInt(v))
            }

            fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
                Ok(Value::Double(v))
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
                Ok(Value::String(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
                Ok(Value::String(v))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: serde::Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<Value, D::Error> {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Value, A::Error> {
                let mut arr = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    arr.push(elem);
                }
                Ok(Value::Array(arr))
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Value, A::Error> {
                let mut obj = Map::new();
                while let Some((key, val)) = map.next_entry()? {
                    obj.insert(key, val);
                }
                Ok(Value::Object(obj))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
