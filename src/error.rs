//! Errors produced while allocating or placing order keys.

use thiserror::Error;

use crate::key::OrderKey;

/// Error returned by the allocator and by [`crate::list::OrderedList`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The bounds passed to `between` are equal or reversed.
    ///
    /// Usually a stale read: re-fetch the neighbors and retry.
    #[error("invalid order: before ({before:?}) must be less than after ({after:?})")]
    InvalidOrder { before: String, after: String },

    /// No key exists strictly between the bounds.
    ///
    /// Only happens when `after` is `before` followed by nothing but
    /// minimum symbols, e.g. `("a", "aa")` or `(None, "a")`.
    #[error("no key fits between {before:?} and {after:?}")]
    Exhausted { before: String, after: String },

    /// A bound contains a symbol the alphabet does not know.
    #[error("key {key:?} contains symbol {symbol:?} outside the alphabet")]
    ForeignSymbol { key: String, symbol: char },

    /// A custom alphabet table was rejected.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(&'static str),

    /// The list holds no item under this key.
    #[error("no item with key {0}")]
    UnknownKey(OrderKey),
}
