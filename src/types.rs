// ABOUTME: Defines JSONB type tags, literal codes and the static type table.
// ABOUTME: Tag values match the MySQL binary JSON storage format byte values.

use crate::error::{Error, Result};

/// Type tags for JSONB values.
pub mod type_code {
    pub const SMALL_OBJECT: u8 = 0x00;
    pub const LARGE_OBJECT: u8 = 0x01;
    pub const SMALL_ARRAY: u8 = 0x02;
    pub const LARGE_ARRAY: u8 = 0x03;
    pub const LITERAL: u8 = 0x04;
    pub const INT16: u8 = 0x05;
    pub const UINT16: u8 = 0x06;
    pub const INT32: u8 = 0x07;
    pub const UINT32: u8 = 0x08;
    pub const INT64: u8 = 0x09;
    pub const UINT64: u8 = 0x0a;
    pub const DOUBLE: u8 = 0x0b;
    pub const STRING: u8 = 0x0c;
    pub const OPAQUE: u8 = 0x0f;
}

/// Codes carried by a `LITERAL` value.
pub mod literal {
    pub const NULL: u32 = 0x00;
    pub const TRUE: u32 = 0x01;
    pub const FALSE: u32 = 0x02;
}

/// MySQL column type codes that appear as the sub-type of an opaque value.
pub mod field_type {
    pub const TIMESTAMP: u8 = 7;
    pub const DATE: u8 = 10;
    pub const TIME: u8 = 11;
    pub const DATETIME: u8 = 12;
    pub const NEWDECIMAL: u8 = 246;
}

/// Semantic kind of a type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    SmallObject,
    LargeObject,
    SmallArray,
    LargeArray,
    Literal,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    Opaque,
}

/// Descriptor for one entry of the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub kind: TypeKind,
    /// Stored inside a small container's 2-byte value slot.
    pub inline_small: bool,
    /// Stored inside a large container's 4-byte value slot.
    pub inline_large: bool,
}

impl TypeInfo {
    const fn new(kind: TypeKind, inline_small: bool, inline_large: bool) -> Self {
        Self {
            kind,
            inline_small,
            inline_large,
        }
    }

    /// Whether a value of this type lives in the value slot of a container of the given class.
    #[inline]
    #[must_use]
    pub const fn is_inlined(&self, large: bool) -> bool {
        if large {
            self.inline_large
        } else {
            self.inline_small
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::SmallObject
                | TypeKind::LargeObject
                | TypeKind::SmallArray
                | TypeKind::LargeArray
        )
    }
}

static TYPE_TABLE: [Option<TypeInfo>; 16] = [
    Some(TypeInfo::new(TypeKind::SmallObject, false, false)),
    Some(TypeInfo::new(TypeKind::LargeObject, false, false)),
    Some(TypeInfo::new(TypeKind::SmallArray, false, false)),
    Some(TypeInfo::new(TypeKind::LargeArray, false, false)),
    Some(TypeInfo::new(TypeKind::Literal, true, true)),
    Some(TypeInfo::new(TypeKind::Int16, true, true)),
    Some(TypeInfo::new(TypeKind::UInt16, true, true)),
    Some(TypeInfo::new(TypeKind::Int32, false, true)),
    Some(TypeInfo::new(TypeKind::UInt32, false, true)),
    Some(TypeInfo::new(TypeKind::Int64, false, false)),
    Some(TypeInfo::new(TypeKind::UInt64, false, false)),
    Some(TypeInfo::new(TypeKind::Double, false, false)),
    Some(TypeInfo::new(TypeKind::String, false, false)),
    None,
    None,
    Some(TypeInfo::new(TypeKind::Opaque, false, false)),
];

/// Look up the descriptor for a type tag.
pub fn type_info(tag: u8) -> Result<&'static TypeInfo> {
    TYPE_TABLE
        .get(usize::from(tag))
        .and_then(Option::as_ref)
        .ok_or(Error::UnknownTypeTag(tag))
}

/// Default resource limits.
pub mod limits {
    /// Maximum document size in bytes (the server's 1 GiB packet ceiling)
    pub const MAX_DOCUMENT_SIZE: usize = 1 << 30;

    /// Maximum container nesting depth, matching the server's own document limit
    pub const MAX_DEPTH: usize = 100;

    /// Maximum bytes in a variable-length prefix (enough for a 32-bit length)
    pub const MAX_VAR_LEN_BYTES: usize = 5;
}
