//! Key substitution for OBJECT members.
//!
//! The encoder and the JSON parser never write a key themselves; they ask a
//! [`KeySubstitutor`] for the binary form of each key, and the readers ask it
//! to turn that binary form back into text. [`DefaultKeySubstitutor`] writes
//! keys as STRING values. [`IndexedKeySubstitutor`] interns keys and writes a
//! small INTEGER code in their place.
//!
//! ```rust
//! use sprig_bson::{IndexedKeySubstitutor, JsonParser};
//!
//! let keys = IndexedKeySubstitutor::new();
//! let doc = JsonParser::with_key_substitutor(&keys)
//!     .parse(r#"{"name":"a","tags":["b"]}"#)
//!     .unwrap();
//! assert_eq!(keys.len(), 2);
//! assert_eq!(doc.to_json_string(&keys).unwrap(), r#"{"name":"a","tags":["b"]}"#);
//! ```

use crate::bson::Bson;
use crate::encoder;
use crate::error::{Error, Result};
use crate::extract::Element;
use crate::tag::Tag;
use crate::value::{Number, Value};
use bytes::{BufMut, Bytes, BytesMut};
use indexmap::IndexSet;
use std::sync::RwLock;

/// Encodes and decodes OBJECT keys.
pub trait KeySubstitutor {
    /// The binary value written in the key slot for `key`.
    fn encode_key(&self, key: &str) -> Result<Bson>;

    /// The text of a key read back from a key slot.
    fn decode_key(&self, key: &Bson) -> Result<String>;

    fn key_to_bytes(&self, key: &str) -> Result<Bytes> {
        Ok(self.encode_key(key)?.serialize())
    }

    fn key_from_bytes(&self, bytes: &[u8]) -> Result<String> {
        self.decode_key(&Bson::from_bytes(Bytes::copy_from_slice(bytes))?)
    }
}

impl<K: KeySubstitutor + ?Sized> KeySubstitutor for &K {
    fn encode_key(&self, key: &str) -> Result<Bson> {
        (**self).encode_key(key)
    }

    fn decode_key(&self, key: &Bson) -> Result<String> {
        (**self).decode_key(key)
    }
}

/// Keys as plain STRING values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultKeySubstitutor;

impl KeySubstitutor for DefaultKeySubstitutor {
    fn encode_key(&self, key: &str) -> Result<Bson> {
        let mut out = BytesMut::with_capacity(key.len() + crate::tag::HEADER_LEN);
        encoder::put_text(Tag::String, key, &mut out)?;
        Bson::from_bytes(out.freeze())
    }

    fn decode_key(&self, key: &Bson) -> Result<String> {
        match key.value()? {
            Element::Scalar(Value::String(s)) => Ok(s),
            _ => Err(Error::structure(format!(
                "Expected a STRING key but found {}",
                key.tag()?
            ))),
        }
    }
}

/// Interns keys and writes each one as the INTEGER index of its first
/// appearance.
///
/// The table only grows. It is shared behind a lock, so a single instance can
/// serve several parsers at once.
#[derive(Debug, Default)]
pub struct IndexedKeySubstitutor {
    keys: RwLock<IndexSet<String>>,
}

impl IndexedKeySubstitutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a known key table; duplicates keep their first index.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexedKeySubstitutor {
            keys: RwLock::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Number of interned keys.
    pub fn len(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the key table in code order.
    pub fn keys(&self) -> Vec<String> {
        self.keys
            .read()
            .map(|k| k.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn code_of(&self, key: &str) -> Result<usize> {
        let known = self.keys.read().map_err(|_| poisoned())?.get_index_of(key);
        match known {
            Some(code) => Ok(code),
            None => {
                let mut keys = self.keys.write().map_err(|_| poisoned())?;
                Ok(keys.insert_full(key.to_string()).0)
            }
        }
    }
}

fn poisoned() -> Error {
    Error::custom("key table lock poisoned")
}

impl KeySubstitutor for IndexedKeySubstitutor {
    fn encode_key(&self, key: &str) -> Result<Bson> {
        let code = self.code_of(key)?;
        let code = i32::try_from(code)
            .map_err(|_| Error::structure(format!("Key table is full at {} keys", code)))?;
        let mut out = BytesMut::with_capacity(5);
        out.put_u8(Tag::Integer.as_u8());
        out.put_i32_le(code);
        Bson::from_bytes(out.freeze())
    }

    fn decode_key(&self, key: &Bson) -> Result<String> {
        let code = match key.value()? {
            Element::Scalar(Value::Number(Number::Integer(code))) => code,
            _ => {
                return Err(Error::structure(format!(
                    "Expected an INTEGER key code but found {}",
                    key.tag()?
                )))
            }
        };
        let keys = self.keys.read().map_err(|_| poisoned())?;
        usize::try_from(code)
            .ok()
            .and_then(|i| keys.get_index(i))
            .cloned()
            .ok_or_else(|| Error::structure(format!("Unknown key code {}", code)))
    }
}
