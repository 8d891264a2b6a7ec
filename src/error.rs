// ABOUTME: Error types for MySQL JSONB decoding.
// ABOUTME: Every variant is terminal for the decode call that produced it.

use std::fmt;

/// The result type for JSONB operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a JSONB document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read, or a size declared by the document, would run past the usable bytes.
    TruncatedData,

    /// Type tag byte not present in the type table.
    UnknownTypeTag(u8),

    /// Literal code other than null, true or false.
    InvalidLiteral(u32),

    /// Key or string bytes are not valid UTF-8.
    InvalidEncoding,

    /// A container's stored size is too small for the tables it claims to hold.
    InconsistentContainerSize {
        /// `total_size_bytes` as stored in the header.
        declared: usize,
        /// Bytes needed for the header and entry tables.
        required: usize,
    },

    /// The tag stored at a nested container's offset disagrees with its value-entry.
    TagMismatch {
        /// Tag recorded in the value-entry.
        expected: u8,
        /// Tag found at the referenced offset.
        found: u8,
    },

    /// A relative offset points into the container's header or entry tables.
    InvalidOffset(usize),

    /// A variable-length prefix is too long or does not fit in 32 bits.
    InvalidLength,

    /// An opaque payload could not be rendered for its declared column type.
    InvalidOpaque(String),

    /// An object repeats a key.
    DuplicateKey(String),

    /// Container nesting too deep.
    MaxDepthExceeded,

    /// Document exceeds the configured size limit.
    MaxDocumentSizeExceeded,

    /// More values were reached than the document has bytes, so entries must share data.
    TooManyValues,

    /// Custom error message (for serde integration).
    Custom(String),
}

impl Error {
    /// Returns a stable, machine-friendly name for the error kind.
    #[must_use] pub fn error_type(&self) -> &'static str {
        match self {
            Error::TruncatedData => "truncated_data",
            Error::UnknownTypeTag(_) => "unknown_type_tag",
            Error::InvalidLiteral(_) => "invalid_literal",
            Error::InvalidEncoding => "invalid_encoding",
            Error::InconsistentContainerSize { .. } => "inconsistent_container_size",
            Error::TagMismatch { .. } => "tag_mismatch",
            Error::InvalidOffset(_) => "invalid_offset",
            Error::InvalidLength => "invalid_length",
            Error::InvalidOpaque(_) => "invalid_opaque",
            Error::DuplicateKey(_) => "duplicate_key",
            Error::MaxDepthExceeded => "max_depth_exceeded",
            Error::MaxDocumentSizeExceeded => "max_document_size_exceeded",
            Error::TooManyValues => "too_many_values",
            Error::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TruncatedData => write!(f, "unexpected end of data"),
            Error::UnknownTypeTag(tag) => write!(f, "unknown type tag: 0x{tag:02x}"),
            Error::InvalidLiteral(code) => write!(f, "invalid literal code: 0x{code:02x}"),
            Error::InvalidEncoding => write!(f, "invalid UTF-8 sequence"),
            Error::InconsistentContainerSize { declared, required } => write!(
                f,
                "container size {declared} is smaller than the {required} bytes its tables need"
            ),
            Error::TagMismatch { expected, found } => write!(
                f,
                "container tag mismatch: entry says 0x{expected:02x}, data says 0x{found:02x}"
            ),
            Error::InvalidOffset(offset) => {
                write!(f, "offset {offset} points into container tables")
            }
            Error::InvalidLength => write!(f, "invalid variable-length prefix"),
            Error::InvalidOpaque(msg) => write!(f, "invalid opaque value: {msg}"),
            Error::DuplicateKey(key) => write!(f, "duplicate key in object: {key:?}"),
            Error::MaxDepthExceeded => write!(f, "maximum container depth exceeded"),
            Error::MaxDocumentSizeExceeded => write!(f, "maximum document size exceeded"),
            Error::TooManyValues => write!(f, "more values than the document has bytes"),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidEncoding
    }
}
