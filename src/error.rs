//! Error types for the binary codec and the JSON streaming parser.
//!
//! Every fallible operation in this crate returns [`Result<T>`]. Nothing is
//! logged; the error value is the whole diagnostic.
//!
//! ## Error Categories
//!
//! - **Bounds**: a read or a construction would leave the backing buffer
//! - **EmptyValue** / **NullInput**: a zero-length or absent buffer
//! - **Structure**: the bytes are in range but do not form the expected shape
//! - **UnsupportedType**: a native shape with no wire tag
//! - **Syntax**: malformed JSON text, with the offending character and its
//!   1-based position
//!
//! ## Examples
//!
//! ```rust
//! use sprig_bson::{from_json, Error};
//!
//! let err = from_json("[1,,2]").unwrap_err();
//! assert_eq!(err.to_string(), "Unknown/No value found at position : 4");
//! assert_eq!(err.position(), Some(4));
//! assert!(matches!(err, Error::Syntax { .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while encoding, decoding or parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A region or a read falls outside the backing buffer.
    #[error("offset {offset} with length {length} is out of bounds for a buffer of {capacity} bytes")]
    Bounds {
        offset: usize,
        length: usize,
        capacity: usize,
    },

    /// A binary value cannot be built from zero bytes.
    #[error("binary value cannot be empty")]
    EmptyValue,

    /// A buffer was required but none was given.
    #[error("input buffer is required")]
    NullInput,

    /// The bytes are readable but malformed for the requested view.
    #[error("{0}")]
    Structure(String),

    /// Unsupported native shape for encoding
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Malformed JSON text.
    ///
    /// `position` is 1-based and counts characters, not bytes.
    #[error("{msg}")]
    Syntax {
        msg: String,
        symbol: Option<char>,
        position: Option<usize>,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a bounds error for the region `offset..offset + length`.
    pub fn bounds(offset: usize, length: usize, capacity: usize) -> Self {
        Error::Bounds {
            offset,
            length,
            capacity,
        }
    }

    /// Creates a structure error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sprig_bson::Error;
    ///
    /// let err = Error::structure("object payload does not pair up");
    /// assert_eq!(err.to_string(), "object payload does not pair up");
    /// ```
    pub fn structure<T: fmt::Display>(msg: T) -> Self {
        Error::Structure(msg.to_string())
    }

    /// Creates a syntax error whose message ends in the position suffix.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sprig_bson::Error;
    ///
    /// let err = Error::syntax("Expected ':'", Some(','), 5);
    /// assert_eq!(err.to_string(), "Expected ':' at position : 5");
    /// ```
    pub fn syntax(msg: &str, symbol: Option<char>, position: usize) -> Self {
        Error::Syntax {
            msg: format!("{} at position : {}", msg, position),
            symbol,
            position: Some(position),
        }
    }

    /// Creates a syntax error reporting an unexpected character.
    pub fn unknown_symbol(symbol: char, position: usize) -> Self {
        Error::syntax(&format!("Unknown symbol '{}'", symbol), Some(symbol), position)
    }

    /// Creates a syntax error that has no single position, such as an
    /// unterminated container detected at the end of input.
    pub fn syntax_message(msg: &str) -> Self {
        Error::Syntax {
            msg: msg.to_string(),
            symbol: None,
            position: None,
        }
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// The 1-based character position of a syntax error, if it has one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Syntax { position, .. } => *position,
            _ => None,
        }
    }

    /// The offending character of a syntax error, if it has one.
    #[must_use]
    pub fn symbol(&self) -> Option<char> {
        match self {
            Error::Syntax { symbol, .. } => *symbol,
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_message_format() {
        let err = Error::unknown_symbol('x', 4);
        assert_eq!(err.to_string(), "Unknown symbol 'x' at position : 4");
        assert_eq!(err.symbol(), Some('x'));
        assert_eq!(err.position(), Some(4));
    }

    #[test]
    fn test_positionless_syntax() {
        let err = Error::syntax_message("Array not terminated");
        assert_eq!(err.to_string(), "Array not terminated");
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_bounds_display() {
        let err = Error::bounds(8, 4, 10);
        assert_eq!(
            err.to_string(),
            "offset 8 with length 4 is out of bounds for a buffer of 10 bytes"
        );
        assert_eq!(err.position(), None);
    }
}
