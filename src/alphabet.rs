//! Symbol tables that order keys are spelled with.
//!
//! An alphabet is a strictly ascending table of printable ASCII bytes.
//! Because the table is in byte order, comparing keys byte-wise is the
//! same as comparing them symbol by symbol in alphabet order.
//!
//! Three symbols are distinguished:
//! - `min`: the first symbol. Shorter keys sort as if padded below it.
//! - `max`: the last symbol.
//! - `mid`: the symbol at rank `len / 2`, used for initial placement and
//!   for extending a key, so that about half the alphabet lies on each side.

use std::fmt;

use crate::error::OrderError;

/// A totally ordered, finite set of key symbols.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alphabet {
    symbols: &'static [u8],
}

impl Alphabet {
    /// `a` through `z`. Middle symbol is `n`.
    pub const LOWERCASE: Alphabet = Alphabet {
        symbols: b"abcdefghijklmnopqrstuvwxyz",
    };

    /// `0`-`9` then `a`-`z`. Middle symbol is `i`.
    pub const BASE36: Alphabet = Alphabet {
        symbols: b"0123456789abcdefghijklmnopqrstuvwxyz",
    };

    /// `0`-`9`, `A`-`Z`, then `a`-`z`. Middle symbol is `V`.
    pub const BASE62: Alphabet = Alphabet {
        symbols: b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
    };

    /// Build an alphabet from a custom symbol table.
    ///
    /// The table must hold at least three printable ASCII symbols in
    /// strictly ascending byte order.
    pub fn new(symbols: &'static [u8]) -> Result<Alphabet, OrderError> {
        if symbols.len() < 3 {
            return Err(OrderError::InvalidAlphabet("needs at least three symbols"));
        }
        if !symbols.iter().all(|b| b.is_ascii_graphic()) {
            return Err(OrderError::InvalidAlphabet("symbols must be printable ascii"));
        }
        if !symbols.windows(2).all(|w| w[0] < w[1]) {
            return Err(OrderError::InvalidAlphabet("symbols must be strictly ascending"));
        }
        return Ok(Alphabet { symbols });
    }

    /// Look up one of the built-in alphabets by name.
    pub fn named(name: &str) -> Option<Alphabet> {
        return match name {
            "lowercase" => Some(Alphabet::LOWERCASE),
            "base36" => Some(Alphabet::BASE36),
            "base62" => Some(Alphabet::BASE62),
            _ => None,
        };
    }

    /// Number of symbols, i.e. the radix of the key numeral system.
    #[inline]
    pub fn len(&self) -> usize {
        return self.symbols.len();
    }

    #[inline]
    pub fn min(&self) -> u8 {
        return self.symbols[0];
    }

    #[inline]
    pub fn max(&self) -> u8 {
        return self.symbols[self.symbols.len() - 1];
    }

    #[inline]
    pub fn mid(&self) -> u8 {
        return self.symbols[self.mid_rank()];
    }

    #[inline]
    pub fn max_rank(&self) -> usize {
        return self.symbols.len() - 1;
    }

    #[inline]
    pub fn mid_rank(&self) -> usize {
        return self.symbols.len() / 2;
    }

    /// Position of `symbol` in the table, if present.
    #[inline]
    pub fn rank(&self, symbol: u8) -> Option<usize> {
        return self.symbols.binary_search(&symbol).ok();
    }

    /// Symbol at `rank`. Panics if `rank >= len()`.
    #[inline]
    pub fn symbol(&self, rank: usize) -> u8 {
        return self.symbols[rank];
    }

    /// Check that every symbol of `key` belongs to this alphabet.
    pub fn check(&self, key: &str) -> Result<(), OrderError> {
        for c in key.chars() {
            let known = u8::try_from(c).ok().and_then(|b| self.rank(b)).is_some();
            if !known {
                return Err(OrderError::ForeignSymbol {
                    key: key.to_owned(),
                    symbol: c,
                });
            }
        }
        return Ok(());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        return self.check(key).is_ok();
    }
}

impl Default for Alphabet {
    fn default() -> Alphabet {
        return Alphabet::LOWERCASE;
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "Alphabet({}..{}, mid {})",
            self.min() as char,
            self.max() as char,
            self.mid() as char,
        );
    }
}
