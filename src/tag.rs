//! Wire tags and the skip function.
//!
//! Every encoded value starts with a one-byte [`Tag`]. Fixed-width payloads
//! follow directly; variable payloads (STRING, OBJECT, ARRAY, BIG_INTEGER,
//! BIG_DECIMAL) carry a 4-byte little-endian length prefix first.
//!
//! | Tag | Name | Payload |
//! |---|---|---|
//! | 1 | INTEGER | 4 bytes LE |
//! | 2 | LONG | 8 bytes LE |
//! | 3 | FLOAT | 4 bytes LE, IEEE-754 bits |
//! | 4 | DOUBLE | 8 bytes LE, IEEE-754 bits |
//! | 5 | NULL | none |
//! | 6 | TRUE | none |
//! | 7 | FALSE | none |
//! | 8 | STRING | u32 LE length + UTF-8 |
//! | 9 | OBJECT | u32 LE length + key/value pairs |
//! | 10 | ARRAY | u32 LE length + elements |
//! | 11 | BYTE | 1 byte |
//! | 12 | SHORT | 2 bytes LE |
//! | 13 | BIG_INTEGER | u32 LE length + big-endian two's complement |
//! | 14 | BIG_DECIMAL | u32 LE length + canonical decimal text |
//!
//! BIG_INTEGER is the only big-endian payload.
//!
//! ```rust
//! use sprig_bson::tag::{value_span, Tag};
//!
//! // "hi" as a STRING: tag, length 2, two bytes
//! let bytes = [8, 2, 0, 0, 0, b'h', b'i'];
//! assert_eq!(value_span(&bytes, 0).unwrap(), 7);
//! assert_eq!(Tag::from_u8(bytes[0]), Some(Tag::String));
//! ```

use crate::error::{Error, Result};
use bytes::Buf;
use std::fmt;

/// Size of the tag byte plus a 4-byte length prefix.
pub const HEADER_LEN: usize = 5;

/// Type discriminator prefixing every encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Integer = 1,
    Long = 2,
    Float = 3,
    Double = 4,
    Null = 5,
    True = 6,
    False = 7,
    String = 8,
    Object = 9,
    Array = 10,
    Byte = 11,
    Short = 12,
    BigInteger = 13,
    BigDecimal = 14,
}

impl Tag {
    /// Maps a wire byte to its tag.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Tag> {
        Some(match byte {
            1 => Tag::Integer,
            2 => Tag::Long,
            3 => Tag::Float,
            4 => Tag::Double,
            5 => Tag::Null,
            6 => Tag::True,
            7 => Tag::False,
            8 => Tag::String,
            9 => Tag::Object,
            10 => Tag::Array,
            11 => Tag::Byte,
            12 => Tag::Short,
            13 => Tag::BigInteger,
            14 => Tag::BigDecimal,
            _ => return None,
        })
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Payload width for fixed-size tags, `None` for length-prefixed ones.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Tag::Null | Tag::True | Tag::False => Some(0),
            Tag::Byte => Some(1),
            Tag::Short => Some(2),
            Tag::Integer | Tag::Float => Some(4),
            Tag::Long | Tag::Double => Some(8),
            Tag::String | Tag::Object | Tag::Array | Tag::BigInteger | Tag::BigDecimal => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Tag::Object | Tag::Array)
    }

    /// Upper-case wire name, as used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Tag::Integer => "INTEGER",
            Tag::Long => "LONG",
            Tag::Float => "FLOAT",
            Tag::Double => "DOUBLE",
            Tag::Null => "NULL",
            Tag::True => "BOOLEAN_TRUE",
            Tag::False => "BOOLEAN_FALSE",
            Tag::String => "STRING",
            Tag::Object => "OBJECT",
            Tag::Array => "ARRAY",
            Tag::Byte => "BYTE",
            Tag::Short => "SHORT",
            Tag::BigInteger => "BIG_INTEGER",
            Tag::BigDecimal => "BIG_DECIMAL",
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        Tag::from_u8(byte).ok_or_else(|| Error::structure(format!("Unknown type tag {}", byte)))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the `len` bytes of `buf` starting at `at`, or a bounds error.
#[inline]
pub(crate) fn window(buf: &[u8], at: usize, len: usize) -> Result<&[u8]> {
    at.checked_add(len)
        .and_then(|end| buf.get(at..end))
        .ok_or_else(|| Error::bounds(at, len, buf.len()))
}

pub(crate) fn read_u8(buf: &[u8], at: usize) -> Result<u8> {
    buf.get(at)
        .copied()
        .ok_or_else(|| Error::bounds(at, 1, buf.len()))
}

pub(crate) fn read_i16_le(buf: &[u8], at: usize) -> Result<i16> {
    let mut reader = window(buf, at, 2)?;
    Ok(reader.get_i16_le())
}

pub(crate) fn read_i32_le(buf: &[u8], at: usize) -> Result<i32> {
    let mut reader = window(buf, at, 4)?;
    Ok(reader.get_i32_le())
}

pub(crate) fn read_i64_le(buf: &[u8], at: usize) -> Result<i64> {
    let mut reader = window(buf, at, 8)?;
    Ok(reader.get_i64_le())
}

pub(crate) fn read_u32_le(buf: &[u8], at: usize) -> Result<u32> {
    let mut reader = window(buf, at, 4)?;
    Ok(reader.get_u32_le())
}

/// Reads the u32 length prefix of the variable-size value whose tag is at `at`.
pub(crate) fn read_length(buf: &[u8], at: usize) -> Result<usize> {
    let at = at
        .checked_add(1)
        .ok_or_else(|| Error::bounds(at, HEADER_LEN, buf.len()))?;
    let length = read_u32_le(buf, at)?;
    usize::try_from(length).map_err(|_| Error::bounds(at, usize::MAX, buf.len()))
}

/// Total byte span (tag included) of the value whose tag byte sits at `at`.
///
/// Only the tag and, for variable-size tags, the length prefix are read. The
/// caller still has to check that the span fits its enclosing region.
///
/// # Errors
///
/// Returns [`Error::Bounds`] when the tag or length prefix is out of range and
/// [`Error::Structure`] for an unknown tag byte.
pub fn value_span(buf: &[u8], at: usize) -> Result<usize> {
    let tag = Tag::try_from(read_u8(buf, at)?)?;
    match tag.fixed_width() {
        Some(width) => Ok(width + 1),
        None => read_length(buf, at)?
            .checked_add(HEADER_LEN)
            .ok_or_else(|| Error::bounds(at, usize::MAX, buf.len())),
    }
}
