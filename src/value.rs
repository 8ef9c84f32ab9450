//! Native value representation.
//!
//! [`Value`] is the closed set of shapes the [`Encoder`](crate::Encoder)
//! accepts and that [`Bson::to_value`](crate::Bson::to_value) produces. Each
//! [`Number`] variant corresponds to exactly one numeric wire tag, so the
//! caller (or the JSON parser) decides the width.
//!
//! ## Creating Values
//!
//! ```rust
//! use sprig_bson::{Number, Value};
//!
//! let null = Value::Null;
//! let byte = Value::from(7i8);
//! let narrowed = Value::Number(Number::narrowed(128));
//! assert_eq!(narrowed, Value::Number(Number::Short(128)));
//!
//! use sprig_bson::bson;
//! let obj = bson!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert!(obj.is_object());
//! ```
//!
//! ## Extracting Values
//!
//! ```rust
//! use sprig_bson::Value;
//! use std::convert::TryFrom;
//!
//! let value = Value::from(42);
//! let num: i64 = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```

use crate::tag::Tag;
use crate::ObjectMap;
use bigdecimal::{BigDecimal, ToPrimitive};
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Any value that can be written to the wire format.
///
/// # Examples
///
/// ```rust
/// use sprig_bson::{Number, Value};
///
/// let num = Value::Number(Number::Integer(42));
/// let text = Value::String("hello".to_string());
///
/// assert!(Value::Null.is_null());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(ObjectMap),
}

/// A numeric value with an explicit wire width.
///
/// # Examples
///
/// ```rust
/// use sprig_bson::Number;
/// use sprig_bson::tag::Tag;
///
/// assert_eq!(Number::Byte(1).tag(), Tag::Byte);
/// assert_eq!(Number::narrowed(-129), Number::Short(-129));
/// assert_eq!(Number::Float(2.5).as_f64(), Some(2.5));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
}

impl Number {
    /// Picks the smallest of BYTE, SHORT, INTEGER and LONG that holds `v`.
    #[must_use]
    pub fn narrowed(v: i64) -> Number {
        if let Ok(b) = i8::try_from(v) {
            Number::Byte(b)
        } else if let Ok(s) = i16::try_from(v) {
            Number::Short(s)
        } else if let Ok(i) = i32::try_from(v) {
            Number::Integer(i)
        } else {
            Number::Long(v)
        }
    }

    /// Narrows `v` when it fits in 64 bits, otherwise keeps BIG_INTEGER.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sprig_bson::Number;
    /// use num_bigint::BigInt;
    ///
    /// let big: BigInt = "9223372036854775808".parse().unwrap();
    /// assert!(matches!(Number::from_bigint(big), Number::BigInteger(_)));
    /// assert_eq!(Number::from_bigint(BigInt::from(32768)), Number::Integer(32768));
    /// ```
    #[must_use]
    pub fn from_bigint(v: BigInt) -> Number {
        match i64::try_from(&v) {
            Ok(n) => Number::narrowed(n),
            Err(_) => Number::BigInteger(v),
        }
    }

    /// The wire tag this number is written with.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        match self {
            Number::Byte(_) => Tag::Byte,
            Number::Short(_) => Tag::Short,
            Number::Integer(_) => Tag::Integer,
            Number::Long(_) => Tag::Long,
            Number::Float(_) => Tag::Float,
            Number::Double(_) => Tag::Double,
            Number::BigInteger(_) => Tag::BigInteger,
            Number::BigDecimal(_) => Tag::BigDecimal,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Number::Byte(_)
                | Number::Short(_)
                | Number::Integer(_)
                | Number::Long(_)
                | Number::BigInteger(_)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_real(&self) -> bool {
        !self.is_integer()
    }

    /// Returns the value as `i64` for integral variants that fit.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Byte(v) => Some(i64::from(*v)),
            Number::Short(v) => Some(i64::from(*v)),
            Number::Integer(v) => Some(i64::from(*v)),
            Number::Long(v) => Some(*v),
            Number::BigInteger(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `f64`; arbitrary precision variants may round.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Number::Byte(v) => Some(f64::from(*v)),
            Number::Short(v) => Some(f64::from(*v)),
            Number::Integer(v) => Some(f64::from(*v)),
            Number::Long(v) => Some(*v as f64),
            Number::Float(v) => Some(f64::from(*v)),
            Number::Double(v) => Some(*v),
            Number::BigInteger(v) => v.to_f64(),
            Number::BigDecimal(v) => v.to_f64(),
        }
    }

    /// Returns the value as an arbitrary precision integer for integral variants.
    #[must_use]
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Number::BigInteger(v) => Some(v.clone()),
            other => other.as_i64().map(BigInt::from),
        }
    }
}

/// Writes `text` and makes sure it still reads back as a real literal.
fn write_real(f: &mut fmt::Formatter<'_>, text: &str, suffix: &str) -> fmt::Result {
    f.write_str(text)?;
    if text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        f.write_str(suffix)?;
    }
    Ok(())
}

/// Canonical text of a decimal: plain notation, or `d.dddE±n` when the
/// scale is negative or the adjusted exponent is below -6.
pub(crate) fn decimal_text(v: &BigDecimal) -> String {
    let (unscaled, scale) = v.as_bigint_and_exponent();
    let digits = unscaled.magnitude().to_string();
    let sign = if unscaled.sign() == Sign::Minus { "-" } else { "" };
    let adjusted = digits.len() as i64 - 1 - scale;

    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    if scale > 0 && adjusted >= -6 {
        // Bounded by the digit count plus six here.
        let scale = scale as usize;
        return if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            format!("{}{}.{}", sign, int, frac)
        } else {
            format!("{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        };
    }

    let (lead, rest) = digits.split_at(1);
    let point = if rest.is_empty() { "" } else { "." };
    let plus = if adjusted >= 0 { "+" } else { "" };
    format!("{}{}{}{}E{}{}", sign, lead, point, rest, plus, adjusted)
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Byte(v) => write!(f, "{}", v),
            Number::Short(v) => write!(f, "{}", v),
            Number::Integer(v) => write!(f, "{}", v),
            Number::Long(v) => write!(f, "{}", v),
            Number::BigInteger(v) => write!(f, "{}", v),
            Number::Float(v) => write_real(f, &v.to_string(), ".0"),
            Number::Double(v) => write_real(f, &v.to_string(), ".0"),
            // An exponent keeps the decimal's scale intact when read back.
            Number::BigDecimal(v) => write_real(f, &decimal_text(v), "e0"),
        }
    }
}

impl From<i8> for Number {
    fn from(value: i8) -> Self {
        Number::Byte(value)
    }
}

impl From<i16> for Number {
    fn from(value: i16) -> Self {
        Number::Short(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Long(value)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::BigInteger(value)
    }
}

impl From<BigDecimal> for Number {
    fn from(value: BigDecimal) -> Self {
        Number::BigDecimal(value)
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// The wire tag this value is written with.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Null,
            Value::Bool(true) => Tag::True,
            Value::Bool(false) => Tag::False,
            Value::Number(n) => n.tag(),
            Value::String(_) => Tag::String,
            Value::Array(_) => Tag::Array,
            Value::Object(_) => Tag::Object,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(Number::as_f64)
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Compact JSON text. Strings are quoted as-is, without escaping.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(obj) => {
                write!(f, "{{")?;
                for (i, (k, v)) in obj.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "\"{}\":{}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Byte(v)) => serializer.serialize_i8(*v),
            Value::Number(Number::Short(v)) => serializer.serialize_i16(*v),
            Value::Number(Number::Integer(v)) => serializer.serialize_i32(*v),
            Value::Number(Number::Long(v)) => serializer.serialize_i64(*v),
            Value::Number(Number::Float(v)) => serializer.serialize_f32(*v),
            Value::Number(Number::Double(v)) => serializer.serialize_f64(*v),
            Value::Number(Number::BigInteger(v)) => serializer.serialize_str(&v.to_string()),
            Value::Number(Number::BigDecimal(v)) => serializer.serialize_str(&decimal_text(v)),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any encodable value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::narrowed(value)))
            }

            fn visit_i128<E>(self, value: i128) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::from_bigint(BigInt::from(value))))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::from_bigint(BigInt::from(value))))
            }

            fn visit_u128<E>(self, value: u128) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::from_bigint(BigInt::from(value))))
            }

            fn visit_f32<E>(self, value: f32) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::Float(value)))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::Double(value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ObjectMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::custom(format!("expected number, found {:?}", value)))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Number(Number::Byte(value))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Number(Number::Short(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Long(value))
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Number(Number::Short(i16::from(value)))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Number(Number::Integer(i32::from(value)))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Long(i64::from(value)))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Double(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Number(Number::BigInteger(value))
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Value::Number(Number::BigDecimal(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ObjectMap> for Value {
    fn from(value: ObjectMap) -> Self {
        Value::Object(value)
    }
}
