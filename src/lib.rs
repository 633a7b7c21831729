//! Orderkey - fractional order keys for user-sorted collections.
//!
//! Each item in an ordered collection stores one short string key. Sorting
//! by that key (byte-wise) gives the user's order, and a new key can be made
//! between any two neighbors without rewriting the others.
//!
//! # Quick Start
//!
//! ```
//! use orderkey::between;
//! use orderkey::start;
//!
//! let first = start();
//! let second = between(Some(first.as_str()), None).unwrap();
//! let middle = between(Some(first.as_str()), Some(second.as_str())).unwrap();
//! assert!(first < middle && middle < second);
//! ```
//!
//! The free functions use the lowercase `a`-`z` alphabet. Use
//! [`allocator::KeyAllocator`] for another [`alphabet::Alphabet`], and
//! [`list::OrderedList`] for an in-memory collection that keeps itself
//! ordered and rebalanced.

pub mod allocator;
pub mod alphabet;
pub mod config;
pub mod error;
pub mod key;
pub mod list;

pub use allocator::DEFAULT_SPACING;
pub use allocator::DEFAULT_THRESHOLD;
pub use allocator::KeyAllocator;
pub use alphabet::Alphabet;
pub use config::Config;
pub use error::OrderError;
pub use key::OrderKey;
pub use list::OrderedList;
pub use list::Placement;

use rustc_hash::FxHashMap;

const LOWERCASE: KeyAllocator = KeyAllocator::new(Alphabet::LOWERCASE);

/// Key for the first item of a new collection: `"n"`.
pub fn start() -> OrderKey {
    return LOWERCASE.start();
}

/// Key that sorts after all standard positions: `"z"`.
pub fn end() -> OrderKey {
    return LOWERCASE.end();
}

/// Key strictly between `before` and `after`; see [`KeyAllocator::between`].
pub fn between(before: Option<&str>, after: Option<&str>) -> Result<OrderKey, OrderError> {
    return LOWERCASE.between(before, after);
}

/// True iff `key` is longer than `threshold` (0 means 20).
pub fn needs_rebalance(key: &str, threshold: usize) -> bool {
    return LOWERCASE.needs_rebalance(key, threshold);
}

/// Fresh keys for a sorted collection; see [`KeyAllocator::rebalance`].
pub fn rebalance<S: AsRef<str>>(keys: &[S], spacing: usize) -> FxHashMap<OrderKey, OrderKey> {
    return LOWERCASE.rebalance(keys, spacing);
}
