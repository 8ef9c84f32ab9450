//! # sprig_bson
//!
//! A compact tagged binary format for JSON-shaped documents, with a
//! single-pass JSON parser that writes it directly.
//!
//! ## What is in the box?
//!
//! - **Wire format**: every value is a one-byte [`Tag`] followed by a fixed
//!   width payload or a 4-byte length and a variable payload. See [`tag`].
//! - **Zero-copy views**: a [`Bson`] is a `(buffer, offset, length)` triple
//!   over shared [`bytes::Bytes`]; children are slices of their parent.
//! - **Streaming JSON parser**: [`JsonParser`] turns JSON text into a [`Bson`]
//!   in one pass, narrowing every number to its most compact tag.
//! - **Pluggable keys**: a [`KeySubstitutor`] decides how OBJECT keys are
//!   stored, as plain strings or as interned integer codes.
//! - **Serde bridge**: [`to_bson`] and [`from_bson`] move any
//!   `Serialize`/`Deserialize` type in and out of the binary form.
//!
//! ## Quick Start
//!
//! ```rust
//! use sprig_bson::{from_json, to_json_string, Value};
//!
//! let doc = from_json(r#"{"name": "sprig", "sizes": [127, 128, 2.5]}"#).unwrap();
//!
//! // Compact JSON back out
//! assert_eq!(
//!     to_json_string(&doc).unwrap(),
//!     r#"{"name":"sprig","sizes":[127,128,2.5]}"#
//! );
//!
//! // Native values
//! let value = doc.to_value().unwrap();
//! assert_eq!(value.as_object().unwrap().get("name"), Some(&Value::from("sprig")));
//! ```
//!
//! ### Typed data
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use sprig_bson::{from_bson, to_bson};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let user = User { id: 123, name: "Alice".to_string(), active: true };
//! let b = to_bson(&user).unwrap();
//! let back: User = from_bson(&b).unwrap();
//! assert_eq!(user, back);
//! ```
//!
//! ### Raw bytes
//!
//! ```rust
//! use sprig_bson::{from_json, Bson};
//!
//! let doc = from_json("[1, 2]").unwrap();
//! let bytes = doc.serialize();
//! assert_eq!(&bytes[..], &[10, 4, 0, 0, 0, 11, 1, 11, 2]);
//!
//! let again = Bson::deserialize(Some(bytes)).unwrap();
//! assert_eq!(doc, again);
//! ```

pub mod bson;
pub mod de;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod key;
pub mod macros;
pub mod map;
pub mod options;
pub mod parser;
pub mod ser;
pub mod tag;
pub mod value;

pub use bson::{Bson, MAX_VALUE_DEPTH};
pub use de::{from_value, ValueDeserializer};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use extract::{Element, Elements};
pub use key::{DefaultKeySubstitutor, IndexedKeySubstitutor, KeySubstitutor};
pub use map::ObjectMap;
pub use options::ParserOptions;
pub use parser::JsonParser;
pub use ser::{to_value, ValueSerializer};
pub use tag::Tag;
pub use value::{Number, Value};

use serde::{de::DeserializeOwned, Serialize};

/// Parses JSON text into a binary value, with keys stored as strings.
///
/// Empty text parses to NULL.
///
/// # Examples
///
/// ```rust
/// use sprig_bson::{from_json, Tag};
///
/// assert_eq!(from_json("127").unwrap().tag().unwrap(), Tag::Byte);
/// assert_eq!(from_json("128").unwrap().tag().unwrap(), Tag::Short);
/// assert!(from_json("").unwrap().is_null());
/// ```
///
/// # Errors
///
/// Returns [`Error::Syntax`] for malformed text, with the offending character
/// and its 1-based position.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_json(text: &str) -> Result<Bson> {
    JsonParser::new().parse(text)
}

/// Parses JSON text with custom parser options.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for malformed text or when a configured limit is
/// exceeded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_json_with_options(text: &str, options: ParserOptions) -> Result<Bson> {
    JsonParser::new().with_options(options).parse(text)
}

/// Compact JSON text of a binary value whose keys are stored as strings.
///
/// # Errors
///
/// Returns an error if the bytes are malformed or a key is not a STRING.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_string(bson: &Bson) -> Result<String> {
    bson.to_json_string(&DefaultKeySubstitutor)
}

/// Encodes a native [`Value`] with keys stored as strings.
///
/// # Examples
///
/// ```rust
/// use sprig_bson::{encode, Value};
///
/// let b = encode(&Value::from(24i8)).unwrap();
/// assert_eq!(b.as_bytes(), &[11, 24]);
/// ```
///
/// # Errors
///
/// Returns an error if a payload is too long for its 4-byte length prefix.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(value: &Value) -> Result<Bson> {
    Encoder::new().encode(value)
}

/// Serializes any `T: Serialize` straight to a binary value.
///
/// # Examples
///
/// ```rust
/// use sprig_bson::{to_bson, Tag};
///
/// assert_eq!(to_bson(&127u64).unwrap().tag().unwrap(), Tag::Byte);
/// assert_eq!(to_bson(&vec!["a", "b"]).unwrap().tag().unwrap(), Tag::Array);
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] for shapes with no wire form, such as
/// maps keyed by numbers or enum variants carrying data.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bson<T>(value: &T) -> Result<Bson>
where
    T: ?Sized + Serialize,
{
    encode(&to_value(value)?)
}

/// Deserializes an instance of `T` from a binary value whose keys are stored
/// as strings.
///
/// # Errors
///
/// Returns an error if the bytes are malformed or do not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_bson<T>(bson: &Bson) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(bson.to_value()?)
}
