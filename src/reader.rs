// ABOUTME: Bounds-checked positional reader over a JSONB byte buffer.
// ABOUTME: Every byte the decoder touches is fetched through this type.

use crate::error::{Error, Result};
use crate::types::limits;

/// Positional little-endian reader limited to a declared usable prefix of a buffer.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    data: &'a [u8],
    limit: usize,
}

macro_rules! read_le {
    ($(#[$meta:meta])* $name:ident, $ty:ty) => {
        $(#[$meta])*
        #[inline]
        pub fn $name(&self, offset: usize) -> Result<$ty> {
            let bytes = self.read_bytes_at(offset, std::mem::size_of::<$ty>())?;
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            buf.copy_from_slice(bytes);
            Ok(<$ty>::from_le_bytes(buf))
        }
    };
}

impl<'a> Reader<'a> {
    /// Create a reader over the first `declared_length` bytes of `data`.
    ///
    /// A declared length larger than the buffer is clamped; reads past the
    /// physical end fail like any other out-of-range read.
    #[must_use]
    pub fn new(data: &'a [u8], declared_length: usize) -> Self {
        Self {
            data,
            limit: declared_length.min(data.len()),
        }
    }

    /// Number of usable bytes.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// A copy of this reader that refuses reads at or beyond `end`.
    #[must_use]
    pub fn scoped(&self, end: usize) -> Self {
        Self {
            data: self.data,
            limit: end.min(self.limit),
        }
    }

    /// Check that `len` bytes starting at `offset` are readable.
    #[inline]
    pub fn check(&self, offset: usize, len: usize) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(Error::TruncatedData),
        }
    }

    /// Read exactly `len` bytes at `offset`.
    #[inline]
    pub fn read_bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        self.check(offset, len)?;
        Ok(&self.data[offset..offset + len])
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8_at(&self, offset: usize) -> Result<u8> {
        self.check(offset, 1)?;
        Ok(self.data[offset])
    }

    read_le!(read_u16_at, u16);
    read_le!(read_i16_at, i16);
    read_le!(read_u32_at, u32);
    read_le!(read_i32_at, i32);
    read_le!(read_u64_at, u64);
    read_le!(read_i64_at, i64);
    read_le!(
        /// Read an IEEE 754 double.
        read_f64_at,
        f64
    );

    /// Read a 2- or 4-byte unsigned field, as used by container headers and entries.
    #[inline]
    pub fn read_uint_at(&self, offset: usize, large: bool) -> Result<usize> {
        if large {
            Ok(self.read_u32_at(offset)? as usize)
        } else {
            Ok(usize::from(self.read_u16_at(offset)?))
        }
    }

    /// Decode a variable-length prefix.
    /// Returns (length, bytes consumed by the prefix).
    pub fn read_var_len_at(&self, offset: usize) -> Result<(usize, usize)> {
        let mut length: u64 = 0;
        for i in 0..limits::MAX_VAR_LEN_BYTES {
            let byte = self.read_u8_at(offset + i)?;
            length |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                if length > u64::from(u32::MAX) {
                    return Err(Error::InvalidLength);
                }
                return Ok((length as usize, i + 1));
            }
        }
        Err(Error::InvalidLength)
    }
}
