//! An in-memory ordered collection keyed by order keys.
//!
//! `OrderedList` plays the part a persistence layer plays for a real
//! collection: it looks up the neighbors of the target slot, asks the
//! allocator for a key between them, and stores the item under that key.
//! Inserting or moving one item never re-keys its siblings, except when
//! the new key grows past the configured threshold. The list then
//! rebalances, and the returned [`Placement`] carries every sibling's
//! old to new key.
//!
//! The list's own rebalances leave one slot of head room: the first item
//! gets the key for index 1, not the minimum key, so prepending after a
//! rebalance still fits between the list head and negative infinity.
//!
//! Complexity (n items, k key length):
//! - push/insert/move: O(log n + k), O(n) when a rebalance triggers
//! - rebalance: O(n log n)

use std::collections::BTreeMap;
use std::ops::Bound;

use rustc_hash::FxHashMap;

use crate::allocator::KeyAllocator;
use crate::config::Config;
use crate::error::OrderError;
use crate::key::OrderKey;

/// Where an insert or move put its item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Key the item is stored under now.
    pub key: OrderKey,
    /// Set when placing the item rebalanced the list: the old to new key of
    /// every other item. A store writes these along with `key`.
    pub rekeyed: Option<FxHashMap<OrderKey, OrderKey>>,
}

impl Placement {
    fn new(key: OrderKey) -> Placement {
        return Placement { key, rekeyed: None };
    }

    /// The key a sibling previously stored under `old` lives under now.
    pub fn resolve<'a>(&'a self, old: &'a str) -> &'a str {
        return match self.rekeyed.as_ref().and_then(|m| m.get(old)) {
            Some(new) => new.as_str(),
            None => old,
        };
    }
}

/// Items kept in user-defined order.
#[derive(Clone, Debug)]
pub struct OrderedList<T> {
    config: Config,
    allocator: KeyAllocator,
    entries: BTreeMap<OrderKey, T>,
    rebalances: u64,
}

impl<T> Default for OrderedList<T> {
    fn default() -> OrderedList<T> {
        return OrderedList::new();
    }
}

impl<T> OrderedList<T> {
    /// Create an empty list with the default config.
    pub fn new() -> OrderedList<T> {
        return OrderedList::with_config(Config::default());
    }

    pub fn with_config(config: Config) -> OrderedList<T> {
        let config = config.normalized();
        return OrderedList {
            allocator: config.allocator(),
            config,
            entries: BTreeMap::new(),
            rebalances: 0,
        };
    }

    pub fn config(&self) -> &Config {
        return &self.config;
    }

    #[inline]
    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// How many times the keys were regenerated.
    pub fn rebalance_count(&self) -> u64 {
        return self.rebalances;
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        return self.entries.get(key);
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        return self.entries.get_mut(key);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        return self.entries.contains_key(key);
    }

    pub fn first(&self) -> Option<(&OrderKey, &T)> {
        return self.entries.first_key_value();
    }

    pub fn last(&self) -> Option<(&OrderKey, &T)> {
        return self.entries.last_key_value();
    }

    /// Items in order, with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (&OrderKey, &T)> {
        return self.entries.iter();
    }

    pub fn keys(&self) -> impl Iterator<Item = &OrderKey> {
        return self.entries.keys();
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        return self.entries.values();
    }

    /// Insert `value` ahead of every other item.
    pub fn push_front(&mut self, value: T) -> Result<Placement, OrderError> {
        let after = self.entries.keys().next().cloned();
        return self.place(None, after, value);
    }

    /// Insert `value` behind every other item.
    pub fn push_back(&mut self, value: T) -> Result<Placement, OrderError> {
        let before = self.entries.keys().next_back().cloned();
        return self.place(before, None, value);
    }

    /// Insert `value` directly before the item stored under `anchor`.
    pub fn insert_before(&mut self, anchor: &str, value: T) -> Result<Placement, OrderError> {
        let anchor = self.existing(anchor)?;
        let before = self.predecessor(&anchor);
        return self.place(before, Some(anchor), value);
    }

    /// Insert `value` directly after the item stored under `anchor`.
    pub fn insert_after(&mut self, anchor: &str, value: T) -> Result<Placement, OrderError> {
        let anchor = self.existing(anchor)?;
        let after = self.successor(&anchor);
        return self.place(Some(anchor), after, value);
    }

    /// Move the item under `key` directly before `anchor`.
    pub fn move_before(&mut self, key: &str, anchor: &str) -> Result<Placement, OrderError> {
        let key = self.existing(key)?;
        let anchor = self.existing(anchor)?;
        if key == anchor || self.successor(&key).as_ref() == Some(&anchor) {
            return Ok(Placement::new(key));
        }
        let value = self.take(&key)?;
        return self.insert_before(&anchor, value);
    }

    /// Move the item under `key` directly after `anchor`.
    pub fn move_after(&mut self, key: &str, anchor: &str) -> Result<Placement, OrderError> {
        let key = self.existing(key)?;
        let anchor = self.existing(anchor)?;
        if key == anchor || self.predecessor(&key).as_ref() == Some(&anchor) {
            return Ok(Placement::new(key));
        }
        let value = self.take(&key)?;
        return self.insert_after(&anchor, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        return self.entries.remove(key);
    }

    /// Give every item a fresh, evenly spaced key. Returns the old to new
    /// key mapping, which is what a store would write in one transaction.
    pub fn rebalance(&mut self) -> FxHashMap<OrderKey, OrderKey> {
        let count = self.entries.len();
        // Index 0 is the minimum key, which nothing can be prepended to.
        let fresh = self
            .allocator
            .rebalance_keys(count + 1, self.config.spacing)
            .into_iter()
            .skip(1);

        let mut mapping = FxHashMap::default();
        mapping.reserve(count);
        let entries = std::mem::take(&mut self.entries);
        for ((old, value), new) in entries.into_iter().zip(fresh) {
            mapping.insert(old, new.clone());
            self.entries.insert(new, value);
        }
        self.rebalances += 1;
        return mapping;
    }

    fn existing(&self, key: &str) -> Result<OrderKey, OrderError> {
        return match self.entries.get_key_value(key) {
            Some((key, _)) => Ok(key.clone()),
            None => Err(OrderError::UnknownKey(OrderKey::from(key))),
        };
    }

    fn predecessor(&self, key: &OrderKey) -> Option<OrderKey> {
        return self
            .entries
            .range::<OrderKey, _>(..key)
            .next_back()
            .map(|(k, _)| k.clone());
    }

    fn successor(&self, key: &OrderKey) -> Option<OrderKey> {
        return self
            .entries
            .range::<OrderKey, _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
    }

    fn take(&mut self, key: &OrderKey) -> Result<T, OrderError> {
        return self.entries.remove(key).ok_or_else(|| OrderError::UnknownKey(key.clone()));
    }

    /// Store `value` between two adjacent keys (or list ends).
    fn place(
        &mut self,
        before: Option<OrderKey>,
        after: Option<OrderKey>,
        value: T,
    ) -> Result<Placement, OrderError> {
        let key = self.allocator.between(before.as_deref(), after.as_deref())?;
        self.entries.insert(key.clone(), value);
        if !self.allocator.needs_rebalance(&key, self.config.threshold) {
            return Ok(Placement::new(key));
        }

        tracing::debug!(
            key = %key,
            len = key.len(),
            threshold = self.config.threshold,
            "key too long, rebalancing"
        );
        let mut mapping = self.rebalance();
        let placed = mapping.remove(&key).unwrap_or(key);
        return Ok(Placement { key: placed, rekeyed: Some(mapping) });
    }
}
