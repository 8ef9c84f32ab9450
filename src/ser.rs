//! Text projection and the serde input side.
//!
//! Two ways out of and into the native world live here:
//!
//! - The compact JSON writer behind [`Bson::to_json_string`]. Numbers print
//!   in their native form, reals always keep a fraction or exponent so they
//!   read back as reals, and strings are quoted without escaping.
//! - [`ValueSerializer`], a serde [`Serializer`](ser::Serializer) that turns
//!   any `T: Serialize` into a [`Value`] ready for the [`Encoder`](crate::Encoder).
//!
//! ## Usage
//!
//! ```rust
//! use serde::Serialize;
//! use sprig_bson::{to_bson, to_json_string};
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: f64 }
//!
//! let b = to_bson(&Point { x: 1, y: 2.0 }).unwrap();
//! assert_eq!(to_json_string(&b).unwrap(), r#"{"x":1,"y":2.0}"#);
//! ```

use crate::bson::Bson;
use crate::extract::{Element, Elements};
use crate::key::KeySubstitutor;
use crate::{Error, Number, ObjectMap, Result, Value};
use num_bigint::BigInt;
use serde::ser::Impossible;
use serde::{ser, Serialize};
use std::fmt::Write;

/// A container whose closing bracket is still owed.
enum Open {
    Array(Elements, bool),
    Object(std::vec::IntoIter<(Bson, Bson)>, bool),
}

/// Appends the compact JSON text of `bson` to `out`.
///
/// Nesting is tracked on an explicit stack, so any document the parser
/// accepts can be written back whatever its depth.
pub(crate) fn write_json<K: KeySubstitutor + ?Sized>(
    bson: &Bson,
    key_codec: &K,
    out: &mut String,
) -> Result<()> {
    let mut open: Vec<Open> = Vec::new();
    let mut next = Some(bson.clone());
    loop {
        if let Some(current) = next.take() {
            match current.value()? {
                Element::Scalar(v) => write!(out, "{}", v).map_err(Error::custom)?,
                Element::Array(elements) => {
                    out.push('[');
                    open.push(Open::Array(elements, true));
                }
                Element::Object(object) => {
                    out.push('{');
                    let entries = object.as_object_entries()?;
                    open.push(Open::Object(entries.into_iter(), true));
                }
            }
        }

        let Some(top) = open.last_mut() else {
            return Ok(());
        };
        match top {
            Open::Array(elements, first) => match elements.next() {
                Some(child) => {
                    if !std::mem::take(first) {
                        out.push(',');
                    }
                    next = Some(child?);
                }
                None => {
                    out.push(']');
                    open.pop();
                }
            },
            Open::Object(entries, first) => match entries.next() {
                Some((k, v)) => {
                    if !std::mem::take(first) {
                        out.push(',');
                    }
                    out.push('"');
                    out.push_str(&key_codec.decode_key(&k)?);
                    out.push_str("\":");
                    next = Some(v);
                }
                None => {
                    out.push('}');
                    open.pop();
                }
            },
        }
    }
}

/// Serializes any `T: Serialize` into a [`Value`].
///
/// Integers are narrowed to the smallest fitting width, so `300u64` becomes
/// SHORT. Enum variants carrying data and maps with non-string keys have no
/// wire shape and fail with [`Error::UnsupportedType`].
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: ObjectMap,
    current_key: Option<String>,
}

fn integer(v: i64) -> Result<Value> {
    Ok(Value::Number(Number::narrowed(v)))
}

fn big_integer(v: impl Into<BigInt>) -> Result<Value> {
    Ok(Value::Number(Number::from_bigint(v.into())))
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = Impossible<Value, Error>;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = Impossible<Value, Error>;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        integer(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        integer(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        integer(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        integer(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        big_integer(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        integer(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        integer(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        integer(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        big_integer(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        big_integer(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(Number::Float(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(Number::Double(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        let vec = v
            .iter()
            .map(|&b| Value::Number(Number::narrowed(i64::from(b))))
            .collect();
        Ok(Value::Array(vec))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::unsupported_type("newtype variants"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::unsupported_type("tuple variants"))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::with_capacity(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::unsupported_type("struct variants"))
    }
}

impl SerializeVec {
    fn with_capacity(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }
}

impl SerializeMap {
    fn with_capacity(capacity: usize) -> Self {
        SerializeMap {
            map: ObjectMap::with_capacity(capacity),
            current_key: None,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_value(key)? {
            Value::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            other => Err(Error::unsupported_type(&format!(
                "map key of type {}",
                other.tag()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

/// Converts any `T: Serialize` into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_json, DefaultKeySubstitutor};
    use std::collections::BTreeMap;

    fn json(text: &str) -> String {
        from_json(text)
            .unwrap()
            .to_json_string(&DefaultKeySubstitutor)
            .unwrap()
    }

    #[test]
    fn test_json_writer_compact() {
        assert_eq!(json(" [ 1 , true , null ] "), "[1,true,null]");
        assert_eq!(json(r#"{ "a" : { "b" : [ ] } }"#), r#"{"a":{"b":[]}}"#);
        assert_eq!(json("{}"), "{}");
        assert_eq!(json(""), "null");
    }

    #[test]
    fn test_json_writer_keeps_reals_real() {
        assert_eq!(
            json("[1.0, 2.5, 1e39]"),
            "[1.0,2.5,1000000000000000000000000000000000000000.0]"
        );
        let text = json("1e400");
        assert_eq!(
            from_json(&text).unwrap().to_value().unwrap(),
            from_json("1e400").unwrap().to_value().unwrap()
        );
    }

    #[test]
    fn test_json_writer_does_not_escape() {
        assert_eq!(json(r#"["a\tb"]"#), r#"["a\tb"]"#);
    }

    #[test]
    fn test_integers_are_narrowed() {
        assert_eq!(to_value(&1u64).unwrap(), Value::Number(Number::Byte(1)));
        assert_eq!(to_value(&300i64).unwrap(), Value::Number(Number::Short(300)));
        assert_eq!(
            to_value(&u64::MAX).unwrap(),
            Value::Number(Number::BigInteger(BigInt::from(u64::MAX)))
        );
        assert_eq!(
            to_value(&(i64::MIN as i128)).unwrap(),
            Value::Number(Number::Long(i64::MIN))
        );
    }

    #[test]
    fn test_non_string_keys_are_unsupported() {
        let mut map = BTreeMap::new();
        map.insert(1, "one");
        assert!(matches!(to_value(&map), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_data_carrying_variants_are_unsupported() {
        #[derive(Serialize)]
        enum Shape {
            Circle(f64),
            Rect { w: f64, h: f64 },
            Empty,
        }
        assert!(matches!(
            to_value(&Shape::Circle(1.0)),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(
            to_value(&Shape::Rect { w: 1.0, h: 2.0 }),
            Err(Error::UnsupportedType(_))
        ));
        assert_eq!(to_value(&Shape::Empty).unwrap(), Value::from("Empty"));
    }
}
