//! Zero-copy view over one encoded value.
//!
//! A [`Bson`] is a `(buffer, offset, length)` triple over a reference-counted
//! [`Bytes`] buffer. Children handed out by [`Bson::elements`],
//! [`Bson::as_object_entries`] and friends share the parent's buffer, so
//! walking a document never copies the bytes underneath it.
//!
//! ```rust
//! use sprig_bson::{from_json, DefaultKeySubstitutor, Value};
//!
//! let doc = from_json(r#"{"a":1,"b":[true,null]}"#).unwrap();
//! let map = doc.as_map(&DefaultKeySubstitutor).unwrap();
//! assert_eq!(map.get("a"), Some(&Value::from(1i8)));
//! assert_eq!(doc.to_json_string(&DefaultKeySubstitutor).unwrap(), r#"{"a":1,"b":[true,null]}"#);
//! ```

use crate::error::{Error, Result};
use crate::extract::{self, Element, Elements};
use crate::key::{DefaultKeySubstitutor, KeySubstitutor};
use crate::tag::{self, Tag, HEADER_LEN};
use crate::value::Value;
use crate::ObjectMap;
use bytes::Bytes;
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};

const NULL_BYTES: [u8; 1] = [Tag::Null as u8];

/// Deepest container nesting [`Bson::to_value_with`] turns into a native tree.
pub const MAX_VALUE_DEPTH: usize = 1024;

/// A container whose native form is still being filled in.
enum Pending {
    List(Elements, Vec<Value>),
    Map(std::vec::IntoIter<(Bson, Bson)>, ObjectMap, Option<String>),
}

impl Pending {
    fn into_value(self) -> Value {
        match self {
            Pending::List(_, values) => Value::Array(values),
            Pending::Map(_, map, _) => Value::Object(map),
        }
    }
}

/// An immutable, tagged byte region in the wire format.
#[derive(Clone)]
pub struct Bson {
    buf: Bytes,
    offset: usize,
    length: usize,
}

impl Bson {
    /// Creates a view over `length` bytes of `buf` starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyValue`] for an empty buffer or a zero length and
    /// [`Error::Bounds`] when the region leaves the buffer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use sprig_bson::{Bson, Error};
    ///
    /// let buf = Bytes::from_static(&[0xFF, 6, 0xFF]);
    /// let b = Bson::new(buf.clone(), 1, 1).unwrap();
    /// assert_eq!(b.as_bytes(), &[6]);
    ///
    /// assert!(matches!(Bson::new(buf, 2, 2), Err(Error::Bounds { .. })));
    /// ```
    pub fn new(buf: Bytes, offset: usize, length: usize) -> Result<Self> {
        if buf.is_empty() || length == 0 {
            return Err(Error::EmptyValue);
        }
        match offset.checked_add(length) {
            Some(end) if end <= buf.len() => Ok(Bson::from_parts(buf, offset, length)),
            _ => Err(Error::bounds(offset, length, buf.len())),
        }
    }

    /// Creates a view over the whole of `buf`.
    pub fn from_bytes(buf: impl Into<Bytes>) -> Result<Self> {
        let buf = buf.into();
        let length = buf.len();
        Bson::new(buf, 0, length)
    }

    /// Callers guarantee `offset + length <= buf.len()` and `length > 0`.
    pub(crate) fn from_parts(buf: Bytes, offset: usize, length: usize) -> Self {
        Bson {
            buf,
            offset,
            length,
        }
    }

    /// The single byte `[NULL]`.
    #[must_use]
    pub fn null() -> Self {
        Bson::from_parts(Bytes::from_static(&NULL_BYTES), 0, 1)
    }

    /// Re-reads a value from raw bytes, as produced by [`Bson::serialize`].
    ///
    /// # Errors
    ///
    /// [`Error::NullInput`] for `None`, [`Error::EmptyValue`] for no bytes.
    pub fn deserialize(bytes: Option<Bytes>) -> Result<Self> {
        match bytes {
            None => Err(Error::NullInput),
            Some(buf) => Bson::from_bytes(buf),
        }
    }

    /// The raw bytes of this value's region, tag included.
    ///
    /// The returned [`Bytes`] shares the backing buffer.
    #[must_use]
    pub fn serialize(&self) -> Bytes {
        self.buf.slice(self.offset..self.offset + self.length)
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + self.length]
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the region in bytes. Never zero.
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub(crate) fn buffer(&self) -> &Bytes {
        &self.buf
    }

    /// The raw tag byte.
    #[inline]
    #[must_use]
    pub fn tag_byte(&self) -> u8 {
        self.as_bytes()[0]
    }

    /// The wire tag, or a structure error for an unknown tag byte.
    pub fn tag(&self) -> Result<Tag> {
        Tag::try_from(self.tag_byte())
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.tag_byte() == Tag::Null as u8
    }

    /// Decodes this value through the extractor for its tag.
    pub fn value(&self) -> Result<Element> {
        extract::extract(self)
    }

    /// Walks the children of an ARRAY or the raw key/value segments of an
    /// OBJECT.
    pub fn elements(&self) -> Result<Elements> {
        let tag = self.tag()?;
        if !tag.is_container() {
            return Err(Error::structure(format!(
                "Expected an ARRAY or OBJECT but found {}",
                tag
            )));
        }
        let region = self.as_bytes();
        let length = tag::read_length(region, 0)?;
        tag::window(region, HEADER_LEN, length)?;
        let start = self.offset + HEADER_LEN;
        Ok(Elements::new(self.buf.clone(), start, start + length))
    }

    fn expect(&self, expected: Tag) -> Result<()> {
        let tag = self.tag()?;
        if tag == expected {
            Ok(())
        } else {
            Err(Error::structure(format!(
                "Expected {} but found {}",
                expected, tag
            )))
        }
    }

    /// The key/value pairs of an OBJECT, in stored order.
    ///
    /// Keys are returned as opaque binary values; decoding them is up to the
    /// key substitutor the caller chooses.
    ///
    /// # Errors
    ///
    /// [`Error::Structure`] when this is not an OBJECT or its segments do not
    /// pair up, [`Error::Bounds`] when a segment overruns the payload.
    pub fn as_object_entries(&self) -> Result<Vec<(Bson, Bson)>> {
        self.expect(Tag::Object)?;
        let segments = self.elements()?.collect::<Result<Vec<_>>>()?;
        if segments.len() % 2 != 0 {
            return Err(Error::structure(format!(
                "OBJECT payload holds {} segments, which do not pair up",
                segments.len()
            )));
        }
        let mut entries = Vec::with_capacity(segments.len() / 2);
        let mut iter = segments.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            entries.push((k, v));
        }
        Ok(entries)
    }

    /// The OBJECT as a binary-keyed map. A repeated key keeps its first
    /// position and its last value.
    pub fn as_bson_map(&self) -> Result<IndexMap<Bson, Bson>> {
        Ok(self.as_object_entries()?.into_iter().collect())
    }

    /// Decodes an OBJECT into native values, nested containers included.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sprig_bson::{from_json, DefaultKeySubstitutor, Value};
    ///
    /// let doc = from_json(r#"{"a":1,"a":2}"#).unwrap();
    /// let map = doc.as_map(&DefaultKeySubstitutor).unwrap();
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get("a"), Some(&Value::from(2i8)));
    /// ```
    pub fn as_map<K: KeySubstitutor + ?Sized>(&self, key_codec: &K) -> Result<ObjectMap> {
        self.expect(Tag::Object)?;
        match self.to_value_with(key_codec)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::structure(format!(
                "Expected OBJECT but decoded {}",
                other.tag()
            ))),
        }
    }

    /// Decodes an ARRAY into native values, nested containers included.
    pub fn as_list<K: KeySubstitutor + ?Sized>(&self, key_codec: &K) -> Result<Vec<Value>> {
        self.expect(Tag::Array)?;
        match self.to_value_with(key_codec)? {
            Value::Array(list) => Ok(list),
            other => Err(Error::structure(format!(
                "Expected ARRAY but decoded {}",
                other.tag()
            ))),
        }
    }

    /// Decodes this value and everything under it, reading keys as plain
    /// strings.
    pub fn to_value(&self) -> Result<Value> {
        self.to_value_with(&DefaultKeySubstitutor)
    }

    /// Decodes this value and everything under it with the given key codec.
    ///
    /// The walk keeps its own stack, so it does not use the call stack.
    /// Containers nested deeper than [`MAX_VALUE_DEPTH`] fail with
    /// [`Error::Structure`], since a native tree that deep could not be
    /// dropped or compared without overflowing the call stack.
    pub fn to_value_with<K: KeySubstitutor + ?Sized>(&self, key_codec: &K) -> Result<Value> {
        let mut open: Vec<Pending> = Vec::new();
        let mut current = self.clone();
        loop {
            let mut finished = match current.value()? {
                Element::Scalar(v) => Some(v),
                Element::Array(items) => {
                    open.push(Pending::List(items, Vec::new()));
                    None
                }
                Element::Object(object) => {
                    let entries = object.as_object_entries()?;
                    let map = ObjectMap::with_capacity(entries.len());
                    open.push(Pending::Map(entries.into_iter(), map, None));
                    None
                }
            };
            if open.len() > MAX_VALUE_DEPTH {
                return Err(Error::structure(format!(
                    "Nesting depth exceeds {} levels",
                    MAX_VALUE_DEPTH
                )));
            }

            // Hand finished values up until some container has a child left.
            loop {
                if let Some(v) = finished.take() {
                    match open.last_mut() {
                        None => return Ok(v),
                        Some(Pending::List(_, values)) => values.push(v),
                        Some(Pending::Map(_, map, key)) => {
                            if let Some(k) = key.take() {
                                map.insert(k, v);
                            }
                        }
                    }
                }
                let child = match open.last_mut() {
                    Some(Pending::List(items, _)) => items.next().transpose()?,
                    Some(Pending::Map(entries, _, key)) => match entries.next() {
                        Some((k, v)) => {
                            *key = Some(key_codec.decode_key(&k)?);
                            Some(v)
                        }
                        None => None,
                    },
                    None => return Err(Error::structure("Decode stack is out of balance")),
                };
                match child {
                    Some(child) => {
                        current = child;
                        break;
                    }
                    None => finished = open.pop().map(Pending::into_value),
                }
            }
        }
    }

    /// Looks up `key` in an OBJECT without decoding the other members.
    ///
    /// The last occurrence of a repeated key wins.
    pub fn get<K: KeySubstitutor + ?Sized>(&self, key: &str, key_codec: &K) -> Result<Option<Bson>> {
        let mut found = None;
        for (k, v) in self.as_object_entries()? {
            if key_codec.decode_key(&k)? == key {
                found = Some(v);
            }
        }
        Ok(found)
    }

    /// Compact JSON text, with keys decoded through `key_codec`.
    pub fn to_json_string<K: KeySubstitutor + ?Sized>(&self, key_codec: &K) -> Result<String> {
        let mut out = String::with_capacity(self.length);
        crate::ser::write_json(self, key_codec, &mut out)?;
        Ok(out)
    }
}

impl PartialEq for Bson {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Bson {}

impl Hash for Bson {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

const ROW: usize = 16;

/// Hex dump of the region, sixteen bytes to a row.
impl fmt::Debug for Bson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BSON Object :")?;
        writeln!(f, "[ offset: {}, length: {}]", self.offset, self.length)?;
        for row in self.as_bytes().chunks(ROW) {
            for byte in row {
                write!(f, "{:02X} ", byte)?;
            }
            for _ in row.len()..ROW {
                f.write_str("   ")?;
            }
            f.write_str(" - ")?;
            for &byte in row {
                let c = if byte.is_ascii_graphic() || byte == b' ' {
                    byte as char
                } else {
                    '.'
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl From<Bson> for Bytes {
    fn from(b: Bson) -> Self {
        b.serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(b: &Bson) -> u64 {
        let mut h = DefaultHasher::new();
        b.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_construction_checks() {
        assert!(matches!(
            Bson::from_bytes(Bytes::new()),
            Err(Error::EmptyValue)
        ));
        let buf = Bytes::from_static(&[5, 6, 7]);
        assert!(matches!(
            Bson::new(buf.clone(), 1, 0),
            Err(Error::EmptyValue)
        ));
        assert!(matches!(
            Bson::new(buf.clone(), 3, 1),
            Err(Error::Bounds { .. })
        ));
        assert!(matches!(
            Bson::new(buf.clone(), usize::MAX, 2),
            Err(Error::Bounds { .. })
        ));
        assert!(Bson::new(buf, 2, 1).unwrap().tag().unwrap() == Tag::False);
    }

    #[test]
    fn test_deserialize_inputs() {
        assert!(matches!(Bson::deserialize(None), Err(Error::NullInput)));
        assert!(matches!(
            Bson::deserialize(Some(Bytes::new())),
            Err(Error::EmptyValue)
        ));
        let b = Bson::deserialize(Some(Bytes::from_static(&[6]))).unwrap();
        assert_eq!(b.to_value().unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_equality_ignores_backing_buffer() {
        let a = Bson::new(Bytes::from_static(&[0, 0, 11, 24]), 2, 2).unwrap();
        let b = Bson::from_bytes(Bytes::from_static(&[11, 24])).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, Bson::from_bytes(Bytes::from_static(&[11, 25])).unwrap());
    }

    #[test]
    fn test_serialize_is_region_only() {
        let b = Bson::new(Bytes::from_static(&[9, 9, 6, 9]), 2, 1).unwrap();
        assert_eq!(&b.serialize()[..], &[6]);
    }

    #[test]
    fn test_object_entries_and_odd_payload() {
        // {"k": 24}
        let ok = Bson::from_bytes(vec![9, 8, 0, 0, 0, 8, 1, 0, 0, 0, b'k', 11, 24]).unwrap();
        let entries = ok.as_object_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.as_bytes(), &[11, 24]);

        let odd = Bson::from_bytes(vec![9, 3, 0, 0, 0, 5, 5, 5]).unwrap();
        assert!(matches!(odd.as_object_entries(), Err(Error::Structure(_))));
    }

    #[test]
    fn test_non_object_is_structure_error() {
        let b = Bson::from_bytes(vec![10, 0, 0, 0, 0]).unwrap();
        assert!(matches!(b.as_object_entries(), Err(Error::Structure(_))));
        assert!(b.as_list(&DefaultKeySubstitutor).unwrap().is_empty());
        let s = Bson::null();
        assert!(matches!(s.elements(), Err(Error::Structure(_))));
    }

    #[test]
    fn test_debug_hex_dump() {
        let b = Bson::from_bytes(vec![8, 5, 0, 0, 0, b'h', b'e', b'l', b'l', b'o']).unwrap();
        assert_eq!(
            format!("{:?}", b),
            "BSON Object :\n[ offset: 0, length: 10]\n\
             08 05 00 00 00 68 65 6C 6C 6F                    - .....hello\n"
        );
    }
}
