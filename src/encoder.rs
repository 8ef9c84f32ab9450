//! Native values to the binary format.
//!
//! The [`Encoder`] matches exhaustively on [`Value`], so every shape it is
//! handed has a tag. Integer widths are taken as given: `Number::Long(1)` is
//! written as a LONG. Use [`Number::narrowed`] to pick the smallest width.
//! Shapes that have no tag are turned away earlier, by the serde bridge, with
//! [`Error::UnsupportedType`].
//!
//! ```rust
//! use sprig_bson::{bson, Encoder};
//!
//! let doc = Encoder::new().encode(&bson!({"a": 1, "b": 2.5})).unwrap();
//! assert_eq!(doc.as_bytes()[0], 9);
//! ```

use crate::bson::Bson;
use crate::error::{Error, Result};
use crate::key::{DefaultKeySubstitutor, KeySubstitutor};
use crate::tag::Tag;
use crate::value::{self, Number, Value};
use bytes::{BufMut, BytesMut};

/// Writes [`Value`]s, asking its key substitutor for every OBJECT key.
#[derive(Debug, Clone, Default)]
pub struct Encoder<K = DefaultKeySubstitutor> {
    key_codec: K,
}

impl Encoder {
    /// An encoder that writes keys as STRING values.
    #[must_use]
    pub fn new() -> Self {
        Encoder {
            key_codec: DefaultKeySubstitutor,
        }
    }

    #[must_use]
    pub fn encode_i8(v: i8) -> Bson {
        fixed(Tag::Byte, &v.to_le_bytes())
    }

    #[must_use]
    pub fn encode_i16(v: i16) -> Bson {
        fixed(Tag::Short, &v.to_le_bytes())
    }

    #[must_use]
    pub fn encode_i32(v: i32) -> Bson {
        fixed(Tag::Integer, &v.to_le_bytes())
    }

    #[must_use]
    pub fn encode_i64(v: i64) -> Bson {
        fixed(Tag::Long, &v.to_le_bytes())
    }

    #[must_use]
    pub fn encode_f32(v: f32) -> Bson {
        fixed(Tag::Float, &v.to_bits().to_le_bytes())
    }

    #[must_use]
    pub fn encode_f64(v: f64) -> Bson {
        fixed(Tag::Double, &v.to_bits().to_le_bytes())
    }

    pub fn encode_str(v: &str) -> Result<Bson> {
        let mut out = BytesMut::with_capacity(v.len() + crate::tag::HEADER_LEN);
        put_text(Tag::String, v, &mut out)?;
        Bson::from_bytes(out.freeze())
    }
}

impl<K: KeySubstitutor> Encoder<K> {
    pub fn with_key_substitutor(key_codec: K) -> Self {
        Encoder { key_codec }
    }

    pub fn key_substitutor(&self) -> &K {
        &self.key_codec
    }

    /// Encodes `value` into a fresh buffer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sprig_bson::{Encoder, Number, Value};
    ///
    /// let b = Encoder::new().encode(&Value::Number(Number::Short(-2))).unwrap();
    /// assert_eq!(b.as_bytes(), &[12, 0xFE, 0xFF]);
    /// ```
    pub fn encode(&self, value: &Value) -> Result<Bson> {
        let mut out = BytesMut::new();
        self.write(value, &mut out)?;
        Bson::from_bytes(out.freeze())
    }

    /// Appends the encoding of `value` to `out`.
    pub fn write(&self, value: &Value, out: &mut BytesMut) -> Result<()> {
        match value {
            Value::Null => out.put_u8(Tag::Null.as_u8()),
            Value::Bool(true) => out.put_u8(Tag::True.as_u8()),
            Value::Bool(false) => out.put_u8(Tag::False.as_u8()),
            Value::Number(n) => put_number(n, out)?,
            Value::String(s) => put_text(Tag::String, s, out)?,
            Value::Array(items) => {
                let start = open_container(Tag::Array, out);
                for item in items {
                    self.write(item, out)?;
                }
                close_container(start, out)?;
            }
            Value::Object(map) => {
                let start = open_container(Tag::Object, out);
                for (key, item) in map {
                    out.put_slice(self.key_codec.encode_key(key)?.as_bytes());
                    self.write(item, out)?;
                }
                close_container(start, out)?;
            }
        }
        Ok(())
    }
}

fn fixed(tag: Tag, payload: &[u8]) -> Bson {
    let mut out = BytesMut::with_capacity(payload.len() + 1);
    out.put_u8(tag.as_u8());
    out.put_slice(payload);
    let length = out.len();
    Bson::from_parts(out.freeze(), 0, length)
}

fn put_number(n: &Number, out: &mut BytesMut) -> Result<()> {
    out.put_u8(n.tag().as_u8());
    match n {
        Number::Byte(v) => out.put_i8(*v),
        Number::Short(v) => out.put_i16_le(*v),
        Number::Integer(v) => out.put_i32_le(*v),
        Number::Long(v) => out.put_i64_le(*v),
        Number::Float(v) => out.put_u32_le(v.to_bits()),
        Number::Double(v) => out.put_u64_le(v.to_bits()),
        Number::BigInteger(v) => put_payload(&v.to_signed_bytes_be(), out)?,
        Number::BigDecimal(v) => put_payload(value::decimal_text(v).as_bytes(), out)?,
    }
    Ok(())
}

fn payload_length(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        Error::structure(format!(
            "Payload of {} bytes does not fit a 4-byte length prefix",
            len
        ))
    })
}

/// Length prefix and bytes; the tag is already written.
fn put_payload(bytes: &[u8], out: &mut BytesMut) -> Result<()> {
    out.put_u32_le(payload_length(bytes.len())?);
    out.put_slice(bytes);
    Ok(())
}

/// Writes a STRING-shaped value: tag, u32 length, UTF-8 bytes.
pub(crate) fn put_text(tag: Tag, text: &str, out: &mut BytesMut) -> Result<()> {
    out.put_u8(tag.as_u8());
    put_payload(text.as_bytes(), out)
}

/// Writes the tag and a placeholder length; returns where the length sits.
pub(crate) fn open_container(tag: Tag, out: &mut BytesMut) -> usize {
    out.put_u8(tag.as_u8());
    let at = out.len();
    out.put_u32_le(0);
    at
}

/// Back-fills the length reserved by [`open_container`].
pub(crate) fn close_container(at: usize, out: &mut BytesMut) -> Result<()> {
    let length = payload_length(out.len() - at - 4)?;
    out[at..at + 4].copy_from_slice(&length.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndexedKeySubstitutor, ObjectMap};
    use bigdecimal::BigDecimal;
    use num_bigint::BigInt;
    use std::str::FromStr;

    fn encode(v: Value) -> Vec<u8> {
        Encoder::new().encode(&v).unwrap().as_bytes().to_vec()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode(Value::Null), vec![5]);
        assert_eq!(encode(Value::Bool(true)), vec![6]);
        assert_eq!(encode(Value::Bool(false)), vec![7]);
        assert_eq!(encode(Value::from(-1i8)), vec![11, 0xFF]);
        assert_eq!(encode(Value::from(1i64)), vec![2, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode(Value::from("hi")), vec![8, 2, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn test_width_helpers_match_encode() {
        assert_eq!(Encoder::encode_i8(7).as_bytes(), &encode(Value::from(7i8))[..]);
        assert_eq!(Encoder::encode_i16(7).as_bytes(), &[12, 7, 0]);
        assert_eq!(Encoder::encode_i32(7).as_bytes(), &[1, 7, 0, 0, 0]);
        assert_eq!(Encoder::encode_i64(7).len(), 9);
        assert_eq!(
            Encoder::encode_f64(0.5).as_bytes(),
            &encode(Value::from(0.5f64))[..]
        );
        assert_eq!(Encoder::encode_f32(0.5).as_bytes()[0], 3);
        assert_eq!(
            Encoder::encode_str("x").unwrap().as_bytes(),
            &[8, 1, 0, 0, 0, b'x']
        );
    }

    #[test]
    fn test_big_numbers() {
        let big = BigInt::from(-256);
        assert_eq!(
            encode(Value::from(big)),
            vec![13, 2, 0, 0, 0, 0xFF, 0x00]
        );
        let dec = BigDecimal::from_str("1.50").unwrap();
        assert_eq!(
            encode(Value::from(dec)),
            vec![14, 4, 0, 0, 0, b'1', b'.', b'5', b'0']
        );
    }

    #[test]
    fn test_nested_lengths() {
        let v = Value::Array(vec![Value::Array(vec![Value::Null]), Value::Bool(true)]);
        assert_eq!(
            encode(v),
            vec![10, 7, 0, 0, 0, 10, 1, 0, 0, 0, 5, 6]
        );
    }

    #[test]
    fn test_object_uses_key_codec() {
        let mut map = ObjectMap::new();
        map.insert("k".to_string(), Value::from(24i8));
        let v = Value::Object(map);
        assert_eq!(
            encode(v.clone()),
            vec![9, 8, 0, 0, 0, 8, 1, 0, 0, 0, b'k', 11, 24]
        );

        let keys = IndexedKeySubstitutor::new();
        let b = Encoder::with_key_substitutor(&keys).encode(&v).unwrap();
        assert_eq!(b.as_bytes(), &[9, 7, 0, 0, 0, 1, 0, 0, 0, 0, 11, 24]);
        assert_eq!(b.to_value_with(&keys).unwrap(), v);
    }
}
