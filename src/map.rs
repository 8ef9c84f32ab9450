//! Insertion-ordered mapping for native object values.
//!
//! [`ObjectMap`] wraps an [`IndexMap`] so that encoding a mapping writes its
//! pairs in the order they were inserted, and so that decoding an OBJECT
//! yields its keys in wire order. Re-inserting an existing key replaces the
//! value in place, which is how duplicate keys resolve to the last occurrence.
//!
//! ## Examples
//!
//! ```rust
//! use sprig_bson::{ObjectMap, Value};
//!
//! let mut map = ObjectMap::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//! map.insert("name".to_string(), Value::from("Bob"));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Bob"));
//! assert_eq!(map.keys().next().map(String::as_str), Some("name"));
//! ```

use crate::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of string keys to native values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectMap(IndexMap<String, Value>);

impl ObjectMap {
    /// Creates an empty `ObjectMap`.
    #[must_use]
    pub fn new() -> Self {
        ObjectMap(IndexMap::new())
    }

    /// Creates an empty `ObjectMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ObjectMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, keeping the key's original position if it
    /// was already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sprig_bson::{ObjectMap, Value};
    ///
    /// let mut map = ObjectMap::new();
    /// assert!(map.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for ObjectMap {
    fn from(map: HashMap<String, Value>) -> Self {
        ObjectMap(map.into_iter().collect())
    }
}

impl From<ObjectMap> for HashMap<String, Value> {
    fn from(map: ObjectMap) -> Self {
        map.0.into_iter().collect()
    }
}

impl IntoIterator for ObjectMap {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for ObjectMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        ObjectMap(IndexMap::from_iter(iter))
    }
}
