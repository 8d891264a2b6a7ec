// ABOUTME: MySQL JSONB decoder: scalar and container decoding over a bounds-checked reader.
// ABOUTME: Containers are offset-addressed, so decoding recurses by position rather than streaming.

#![allow(clippy::missing_errors_doc)]

use crate::error::{Error, Result};
use crate::opaque;
use crate::reader::Reader;
use crate::trace::trace;
use crate::types::{limits, literal, type_code, type_info, TypeInfo, TypeKind};
use crate::value::{Map, Value};

/// Validate and convert bytes to a UTF-8 string.
/// Uses simdutf8 for SIMD-accelerated validation when the feature is enabled.
#[cfg(feature = "simd-utf8")]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| Error::InvalidEncoding)
}

#[cfg(not(feature = "simd-utf8"))]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

/// How to handle a key that appears twice in one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyMode {
    /// Fail with `Error::DuplicateKey` (default)
    #[default]
    Error,
    /// Keep the first value, ignore subsequent duplicates
    KeepFirst,
    /// Keep the last value, overwrite earlier values
    KeepLast,
}

/// Configuration options for the decoder.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum container nesting depth
    pub max_depth: usize,
    /// Maximum usable document size in bytes
    pub max_document_size: usize,
    /// How to handle duplicate keys (default: Error)
    pub duplicate_key_mode: DuplicateKeyMode,
    /// Cross-check container sizes and offsets against the entry tables (default: true).
    ///
    /// When off, a container's stored size only has to fit in the buffer, and
    /// its elements may be read from anywhere in the enclosing range.
    pub strict_sizes: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: limits::MAX_DEPTH,
            max_document_size: limits::MAX_DOCUMENT_SIZE,
            duplicate_key_mode: DuplicateKeyMode::default(),
            strict_sizes: true,
        }
    }
}

/// Decoded metadata for one array or object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Absolute position of the container's tag byte. Relative offsets count from here.
    pub start: usize,
    pub element_count: usize,
    /// Bytes following the tag byte, header included.
    pub total_size: usize,
    pub is_large: bool,
    pub is_object: bool,
}

impl ContainerHeader {
    /// Read the header of the container whose tag byte sits at `start`.
    ///
    /// The size class comes from `tag` alone.
    pub fn read(reader: &Reader<'_>, start: usize, tag: u8) -> Result<Self> {
        let (is_large, is_object) = match type_info(tag)?.kind {
            TypeKind::SmallObject => (false, true),
            TypeKind::LargeObject => (true, true),
            TypeKind::SmallArray => (false, false),
            TypeKind::LargeArray => (true, false),
            _ => return Err(Error::UnknownTypeTag(tag)),
        };
        let width = Self::field_width(is_large);
        let element_count = reader.read_uint_at(start + 1, is_large)?;
        let total_size = reader.read_uint_at(start + 1 + width, is_large)?;

        match start.checked_add(1).and_then(|s| s.checked_add(total_size)) {
            Some(end) if end <= reader.limit() => {}
            _ => return Err(Error::TruncatedData),
        }

        Ok(Self {
            start,
            element_count,
            total_size,
            is_large,
            is_object,
        })
    }

    /// Width of count, size, offset and value-slot fields.
    #[inline]
    #[must_use]
    pub const fn field_width(is_large: bool) -> usize {
        if is_large {
            4
        } else {
            2
        }
    }

    #[inline]
    fn width(&self) -> usize {
        Self::field_width(self.is_large)
    }

    /// Relative position of the first key-entry (or value-entry, for arrays).
    #[inline]
    fn header_end(&self) -> usize {
        1 + 2 * self.width()
    }

    #[inline]
    fn key_entry_size(&self) -> usize {
        self.width() + 2
    }

    #[inline]
    fn value_entry_size(&self) -> usize {
        1 + self.width()
    }

    /// Relative position of the first value-entry.
    fn value_table(&self) -> Result<usize> {
        if !self.is_object {
            return Ok(self.header_end());
        }
        self.element_count
            .checked_mul(self.key_entry_size())
            .and_then(|keys| keys.checked_add(self.header_end()))
            .ok_or(Error::TruncatedData)
    }

    /// Relative position just past the value-entry table, where the data region begins.
    pub fn tables_end(&self) -> Result<usize> {
        self.element_count
            .checked_mul(self.value_entry_size())
            .and_then(|values| values.checked_add(self.value_table().ok()?))
            .ok_or(Error::TruncatedData)
    }

    /// Absolute position just past the container's last byte.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start.saturating_add(1).saturating_add(self.total_size)
    }
}

/// A JSONB decoder over one buffer. Holds all per-call state.
pub struct Decoder<'a> {
    reader: Reader<'a>,
    config: DecoderConfig,
    depth: usize,
    /// Values still allowed before the document must be sharing entries.
    value_budget: usize,
}

/// Where an entry's value bytes live.
#[derive(Debug, Clone, Copy)]
enum Location {
    /// Inside the value slot at this absolute position.
    Inline(usize),
    /// At this absolute position in the container's data region.
    Offset(usize),
}

impl<'a> Decoder<'a> {
    /// Create a new decoder over the first `declared_length` bytes of `data`.
    #[must_use]
    pub fn new(data: &'a [u8], declared_length: usize) -> Self {
        Self::with_config(data, declared_length, DecoderConfig::default())
    }

    /// Create a new decoder with custom configuration.
    #[must_use]
    pub fn with_config(data: &'a [u8], declared_length: usize, config: DecoderConfig) -> Self {
        Self {
            reader: Reader::new(data, declared_length),
            config,
            depth: 0,
            value_budget: 0,
        }
    }

    /// Get the decoder configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Check document size limit (called once at start of decoding).
    #[inline]
    pub fn check_document_size(&self) -> Result<()> {
        if self.reader.limit() > self.config.max_document_size {
            return Err(Error::MaxDocumentSizeExceeded);
        }
        Ok(())
    }

    /// Decode the whole document.
    pub fn decode(&mut self) -> Result<Value> {
        self.check_document_size()?;
        let reader = self.reader;
        let tag = reader.read_u8_at(0)?;
        // Every value owns at least one byte of its own, so a well-formed
        // document never holds more values than it has bytes.
        self.value_budget = reader.limit();
        self.spend_value()?;
        let info = type_info(tag)?;
        if info.is_container() {
            self.decode_container(&reader, 0, tag)
        } else {
            // A root literal is a single byte after the tag.
            decode_scalar(&reader, info, 1, 1)
        }
    }

    fn spend_value(&mut self) -> Result<()> {
        self.value_budget = self.value_budget.checked_sub(1).ok_or(Error::TooManyValues)?;
        Ok(())
    }

    fn decode_container(&mut self, reader: &Reader<'_>, start: usize, tag: u8) -> Result<Value> {
        if self.depth >= self.config.max_depth {
            return Err(Error::MaxDepthExceeded);
        }
        self.depth += 1;
        let result = self.decode_container_body(reader, start, tag);
        self.depth -= 1;
        result
    }

    fn decode_container_body(
        &mut self,
        reader: &Reader<'_>,
        start: usize,
        tag: u8,
    ) -> Result<Value> {
        let header = ContainerHeader::read(reader, start, tag)?;
        trace!(
            start,
            tag,
            count = header.element_count,
            size = header.total_size,
            "decoding container"
        );

        if header.element_count == 0 {
            return Ok(if header.is_object {
                Value::Object(Map::new())
            } else {
                Value::Array(Vec::new())
            });
        }

        let tables_end = header.tables_end()?;
        reader.check(start, tables_end)?;

        let strict = self.config.strict_sizes;
        let scope = if strict {
            let required = tables_end - 1;
            if header.total_size < required {
                return Err(Error::InconsistentContainerSize {
                    declared: header.total_size,
                    required,
                });
            }
            reader.scoped(header.end())
        } else {
            *reader
        };

        if header.is_object {
            self.decode_object(&scope, &header, tables_end)
        } else {
            self.decode_array(&scope, &header, tables_end)
        }
    }

    fn decode_array(
        &mut self,
        reader: &Reader<'_>,
        header: &ContainerHeader,
        tables_end: usize,
    ) -> Result<Value> {
        let mut arr = Vec::with_capacity(header.element_count);
        for i in 0..header.element_count {
            arr.push(self.decode_entry(reader, header, tables_end, i)?);
        }
        Ok(Value::Array(arr))
    }

    fn decode_object(
        &mut self,
        reader: &Reader<'_>,
        header: &ContainerHeader,
        tables_end: usize,
    ) -> Result<Value> {
        let mut map = Map::with_capacity(header.element_count);
        for i in 0..header.element_count {
            let key = self.decode_key(reader, header, tables_end, i)?;
            let value = self.decode_entry(reader, header, tables_end, i)?;
            if map.contains_key(&key) {
                match self.config.duplicate_key_mode {
                    DuplicateKeyMode::Error => return Err(Error::DuplicateKey(key)),
                    DuplicateKeyMode::KeepFirst => continue,
                    DuplicateKeyMode::KeepLast => {}
                }
            }
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }

    /// Turn a relative offset into an absolute one.
    fn resolve(
        &self,
        header: &ContainerHeader,
        tables_end: usize,
        relative: usize,
    ) -> Result<usize> {
        if self.config.strict_sizes && relative < tables_end {
            return Err(Error::InvalidOffset(relative));
        }
        header.start.checked_add(relative).ok_or(Error::TruncatedData)
    }

    fn decode_key(
        &self,
        reader: &Reader<'_>,
        header: &ContainerHeader,
        tables_end: usize,
        index: usize,
    ) -> Result<String> {
        let entry = header.start + header.header_end() + index * header.key_entry_size();
        let key_offset = reader.read_uint_at(entry, header.is_large)?;
        let key_length = usize::from(reader.read_u16_at(entry + header.width())?);
        let pos = self.resolve(header, tables_end, key_offset)?;
        let bytes = reader.read_bytes_at(pos, key_length)?;
        Ok(validate_utf8(bytes)?.to_owned())
    }

    fn decode_entry(
        &mut self,
        reader: &Reader<'_>,
        header: &ContainerHeader,
        tables_end: usize,
        index: usize,
    ) -> Result<Value> {
        self.spend_value()?;
        let entry = header.start + header.value_table()? + index * header.value_entry_size();
        let tag = reader.read_u8_at(entry)?;
        let info = type_info(tag)?;
        let slot = entry + 1;

        let location = if info.is_inlined(header.is_large) {
            Location::Inline(slot)
        } else {
            let relative = reader.read_uint_at(slot, header.is_large)?;
            Location::Offset(self.resolve(header, tables_end, relative)?)
        };

        match location {
            Location::Inline(pos) => decode_scalar(reader, info, pos, header.width()),
            Location::Offset(pos) if info.is_container() => {
                let found = reader.read_u8_at(pos)?;
                if found != tag {
                    return Err(Error::TagMismatch { expected: tag, found });
                }
                self.decode_container(reader, pos, tag)
            }
            Location::Offset(pos) => decode_scalar(reader, info, pos, header.width()),
        }
    }
}

/// Decode a scalar whose bytes start at `pos`.
///
/// `literal_width` is the number of bytes holding a literal code: the value-slot
/// width inside containers, one byte at the document root.
fn decode_scalar(
    reader: &Reader<'_>,
    info: &TypeInfo,
    pos: usize,
    literal_width: usize,
) -> Result<Value> {
    match info.kind {
        TypeKind::Literal => {
            let code = match literal_width {
                1 => u32::from(reader.read_u8_at(pos)?),
                2 => u32::from(reader.read_u16_at(pos)?),
                _ => reader.read_u32_at(pos)?,
            };
            match code {
                literal::NULL => Ok(Value::Null),
                literal::TRUE => Ok(Value::Bool(true)),
                literal::FALSE => Ok(Value::Bool(false)),
                _ => Err(Error::InvalidLiteral(code)),
            }
        }
        TypeKind::Int16 => Ok(Value::Int(i64::from(reader.read_i16_at(pos)?))),
        TypeKind::UInt16 => Ok(Value::UInt(u64::from(reader.read_u16_at(pos)?))),
        TypeKind::Int32 => Ok(Value::Int(i64::from(reader.read_i32_at(pos)?))),
        TypeKind::UInt32 => Ok(Value::UInt(u64::from(reader.read_u32_at(pos)?))),
        TypeKind::Int64 => Ok(Value::Int(reader.read_i64_at(pos)?)),
        TypeKind::UInt64 => Ok(Value::UInt(reader.read_u64_at(pos)?)),
        TypeKind::Double => Ok(Value::Double(reader.read_f64_at(pos)?)),
        TypeKind::String => {
            let (len, prefix) = reader.read_var_len_at(pos)?;
            let bytes = reader.read_bytes_at(pos + prefix, len)?;
            Ok(Value::String(validate_utf8(bytes)?.to_owned()))
        }
        TypeKind::Opaque => {
            let field_type = reader.read_u8_at(pos)?;
            let (len, prefix) = reader.read_var_len_at(pos + 1)?;
            let payload = reader.read_bytes_at(pos + 1 + prefix, len)?;
            Ok(Value::String(opaque::render(field_type, payload)?))
        }
        TypeKind::SmallObject
        | TypeKind::LargeObject
        | TypeKind::SmallArray
        | TypeKind::LargeArray => Err(Error::UnknownTypeTag(container_tag(info.kind))),
    }
}

fn container_tag(kind: TypeKind) -> u8 {
    match kind {
        TypeKind::SmallObject => type_code::SMALL_OBJECT,
        TypeKind::LargeObject => type_code::LARGE_OBJECT,
        TypeKind::SmallArray => type_code::SMALL_ARRAY,
        _ => type_code::LARGE_ARRAY,
    }
}
