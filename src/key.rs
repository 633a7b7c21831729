//! The order key itself: an opaque, byte-wise sortable string.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// A string that encodes an item's position among its siblings.
///
/// Keys compare byte-wise, so storing them in a column with binary
/// collation and sorting by that column yields the user-defined order.
/// A key says nothing about which collection it belongs to; never compare
/// keys from different collections.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OrderKey(String);

impl OrderKey {
    /// Wrap a stored key. No validation happens here; the allocator checks
    /// symbols when the key is used as a bound.
    pub fn new(key: impl Into<String>) -> OrderKey {
        return OrderKey(key.into());
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    /// Length in symbols. Every supported alphabet is ASCII, so this is
    /// also the byte length.
    #[inline]
    pub fn len(&self) -> usize {
        return self.0.len();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }

    pub fn into_string(self) -> String {
        return self.0;
    }
}

impl Deref for OrderKey {
    type Target = str;

    fn deref(&self) -> &str {
        return &self.0;
    }
}

impl AsRef<str> for OrderKey {
    fn as_ref(&self) -> &str {
        return &self.0;
    }
}

impl Borrow<str> for OrderKey {
    fn borrow(&self) -> &str {
        return &self.0;
    }
}

impl From<String> for OrderKey {
    fn from(key: String) -> OrderKey {
        return OrderKey(key);
    }
}

impl From<&str> for OrderKey {
    fn from(key: &str) -> OrderKey {
        return OrderKey(key.to_owned());
    }
}

impl From<OrderKey> for String {
    fn from(key: OrderKey) -> String {
        return key.0;
    }
}

impl PartialEq<str> for OrderKey {
    fn eq(&self, other: &str) -> bool {
        return self.0 == other;
    }
}

impl PartialEq<&str> for OrderKey {
    fn eq(&self, other: &&str) -> bool {
        return self.0 == *other;
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

impl fmt::Debug for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "OrderKey({:?})", self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn ordering_is_bytewise() {
        let mut keys: Vec<OrderKey> = ["n", "a", "mn", "m", "aan", "Z"]
            .into_iter()
            .map(OrderKey::from)
            .collect();
        keys.sort();
        let sorted: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(sorted, vec!["Z", "a", "aan", "m", "mn", "n"]);
    }

    #[test]
    fn prefix_sorts_first() {
        assert!(OrderKey::from("m") < OrderKey::from("mn"));
        assert!(OrderKey::from("mn") < OrderKey::from("n"));
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = FxHashMap::default();
        map.insert(OrderKey::from("ak"), 1);
        assert_eq!(map.get("ak"), Some(&1));
        assert_eq!(map.get("au"), None);
    }

    #[test]
    fn display_and_debug() {
        let key = OrderKey::from("mn");
        assert_eq!(key.to_string(), "mn");
        assert_eq!(format!("{:?}", key), "OrderKey(\"mn\")");
        assert_eq!(key, "mn");
        assert_eq!(key.len(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_string() {
        let key = OrderKey::from("aan");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"aan\"");
        let back: OrderKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        let keys: Vec<OrderKey> = serde_json::from_str(r#"["a", "ak"]"#).unwrap();
        assert_eq!(keys, vec![OrderKey::from("a"), OrderKey::from("ak")]);
    }
}
