//! Allocation of order keys between neighbors, and bulk rebalancing.
//!
//! Keys are numerals in an open-ended positional system whose digits are the
//! alphabet's symbols. A shorter key sorts as if it were padded with a value
//! below the minimum symbol, so between two distinct keys there is (almost)
//! always room for another: when no single symbol fits, the new key is made
//! one symbol longer. Inserting never touches any sibling's key.
//!
//! The one exception is a gap of the form `(k, k + "a".."a")`: nothing sorts
//! strictly between `"a"` and `"aa"`. The allocator never produces keys that
//! end in the minimum symbol (apart from the rebalanced head key) so such
//! gaps only show up with hand-written bounds, and are reported as
//! [`OrderError::Exhausted`].
//!
//! Complexity:
//! - between: O(len(before) + len(after))
//! - rebalance: O(n * log(n * spacing))

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::alphabet::Alphabet;
use crate::error::OrderError;
use crate::key::OrderKey;

/// Keys longer than this are due for a rebalance.
pub const DEFAULT_THRESHOLD: usize = 20;

/// Numeral steps left between neighbors after a rebalance.
pub const DEFAULT_SPACING: usize = 10;

/// Stateless key allocator over a fixed alphabet.
///
/// Deterministic: two calls with the same bounds return the same key. Two
/// writers inserting into the same gap concurrently will therefore collide,
/// and must be serialized by the caller (unique column plus retry, or a
/// single writer per collection).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyAllocator {
    alphabet: Alphabet,
}

impl KeyAllocator {
    pub const fn new(alphabet: Alphabet) -> KeyAllocator {
        return KeyAllocator { alphabet };
    }

    #[inline]
    pub fn alphabet(&self) -> Alphabet {
        return self.alphabet;
    }

    /// Key for the first item of a brand-new collection.
    pub fn start(&self) -> OrderKey {
        return self.single(self.alphabet.mid());
    }

    /// A key that sorts after all standard positions. Meant as an upper
    /// bound, not to be stored.
    pub fn end(&self) -> OrderKey {
        return self.single(self.alphabet.max());
    }

    /// The smallest key the allocator hands out; a rebalance assigns it to
    /// the first item.
    pub fn min_key(&self) -> OrderKey {
        return self.single(self.alphabet.min());
    }

    /// Compute a key strictly between `before` and `after`.
    ///
    /// A missing or empty `before` means negative infinity, a missing or
    /// empty `after` means positive infinity.
    pub fn between(
        &self,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<OrderKey, OrderError> {
        let before = before.filter(|s| !s.is_empty());
        let after = after.filter(|s| !s.is_empty());
        if let Some(before) = before {
            self.alphabet.check(before)?;
        }
        if let Some(after) = after {
            self.alphabet.check(after)?;
        }

        return match (before, after) {
            (None, None) => Ok(self.start()),
            (Some(before), None) => Ok(self.append_mid(before.as_bytes())),
            (None, Some(after)) => self.below_suffix(b"", after.as_bytes()),
            (Some(before), Some(after)) => {
                if before >= after {
                    return Err(OrderError::InvalidOrder {
                        before: before.to_owned(),
                        after: after.to_owned(),
                    });
                }
                self.split(before.as_bytes(), after.as_bytes())
            }
        };
    }

    /// True iff `key` is longer than `threshold` symbols. A threshold of 0
    /// means [`DEFAULT_THRESHOLD`].
    pub fn needs_rebalance(&self, key: &str, threshold: usize) -> bool {
        let threshold = if threshold == 0 { DEFAULT_THRESHOLD } else { threshold };
        return key.len() > threshold;
    }

    /// Assign fresh, evenly spaced keys to `keys`, which must already be in
    /// sorted order. Returns a map from every input key to its replacement.
    ///
    /// The new keys, read in input order, are strictly increasing. If the
    /// input repeats a key, the map keeps the replacement of its last
    /// occurrence. A spacing of 0 means [`DEFAULT_SPACING`].
    pub fn rebalance<S: AsRef<str>>(
        &self,
        keys: &[S],
        spacing: usize,
    ) -> FxHashMap<OrderKey, OrderKey> {
        let fresh = self.rebalance_keys(keys.len(), spacing);
        let mut result = FxHashMap::default();
        result.reserve(keys.len());
        for (old, new) in keys.iter().zip(fresh) {
            result.insert(OrderKey::from(old.as_ref()), new);
        }
        return result;
    }

    /// The `count` keys a rebalance would hand out, in order.
    pub fn rebalance_keys(&self, count: usize, spacing: usize) -> Vec<OrderKey> {
        let spacing = normalize_spacing(spacing);
        let width = self.numeral_width(count, spacing);
        tracing::debug!(count, spacing, width, "rebalancing order keys");
        return (0..count)
            .map(|index| self.numeral_key(index as u128 * spacing as u128, width))
            .collect();
    }

    /// Key for ordinal `index` in a rebalance of `count` items.
    ///
    /// Index 0 is always [`KeyAllocator::min_key`]. Each later index sits
    /// `spacing` numeral steps above the previous one, with every key
    /// padded to the width the largest index needs.
    pub fn key_at(&self, index: usize, count: usize, spacing: usize) -> OrderKey {
        let spacing = normalize_spacing(spacing);
        let width = self.numeral_width(count.max(index.saturating_add(1)), spacing);
        return self.numeral_key(index as u128 * spacing as u128, width);
    }

    fn single(&self, symbol: u8) -> OrderKey {
        return OrderKey::from(String::from(symbol as char));
    }

    fn append_mid(&self, before: &[u8]) -> OrderKey {
        return self.build(&[before, &[self.alphabet.mid()]]);
    }

    fn build(&self, parts: &[&[u8]]) -> OrderKey {
        let mut key = String::with_capacity(parts.iter().map(|p| p.len()).sum());
        for part in parts {
            key.extend(part.iter().map(|&b| b as char));
        }
        return OrderKey::from(key);
    }

    #[inline]
    fn rank(&self, symbol: u8) -> usize {
        // Bounds were checked against the alphabet on entry.
        return self.alphabet.rank(symbol).unwrap_or(0);
    }

    /// Both bounds present and `before < after`.
    fn split(&self, before: &[u8], after: &[u8]) -> Result<OrderKey, OrderError> {
        let pos = before
            .iter()
            .zip(after)
            .take_while(|(b, a)| b == a)
            .count();

        // before is a prefix of after
        if pos == before.len() {
            return self.below_suffix(before, after);
        }

        // after being a prefix of before would mean after < before
        debug_assert!(pos < after.len());
        let low = self.rank(before[pos]);
        let high = self.rank(after[pos]);

        if high - low > 1 {
            return Ok(self.build(&[&before[..pos], &[self.alphabet.symbol(low + 1)]]));
        }

        // Adjacent symbols: anything that keeps before[..=pos] and grows
        // past before stays below after.
        if let Some(&next) = before.get(pos + 1) {
            let next = self.rank(next);
            if next < self.alphabet.max_rank() {
                return Ok(self.build(&[&before[..pos + 1], &[self.alphabet.symbol(next + 1)]]));
            }
        }
        return Ok(self.append_mid(before));
    }

    /// Key between `prefix` and `after`, where `after` starts with `prefix`
    /// and is strictly longer.
    fn below_suffix(&self, prefix: &[u8], after: &[u8]) -> Result<OrderKey, OrderError> {
        let suffix = &after[prefix.len()..];
        let Some(skip) = suffix.iter().position(|&s| self.rank(s) > 0) else {
            return Err(OrderError::Exhausted {
                before: bytes_to_string(prefix),
                after: bytes_to_string(after),
            });
        };

        let head = &suffix[..skip];
        let rank = self.rank(suffix[skip]);
        if rank > 1 {
            return Ok(self.build(&[prefix, head, &[self.alphabet.symbol(rank - 1)]]));
        }
        // Decrementing would leave a trailing minimum symbol.
        return Ok(self.build(&[prefix, head, &[self.alphabet.min(), self.alphabet.mid()]]));
    }

    /// Number of digits needed to write `(count - 1) * spacing`.
    fn numeral_width(&self, count: usize, spacing: usize) -> usize {
        let largest = count.saturating_sub(1) as u128 * spacing as u128;
        let radix = self.alphabet.len() as u128;
        let mut width = 1;
        let mut capacity = radix;
        while capacity <= largest {
            width += 1;
            capacity = capacity.saturating_mul(radix);
        }
        return width;
    }

    /// Fixed-width numeral for `value`, trailing minimum symbols trimmed.
    /// Trimming keeps the order of equal-width numerals and leaves room
    /// below every key but the zero one.
    fn numeral_key(&self, value: u128, width: usize) -> OrderKey {
        if value == 0 {
            return self.min_key();
        }
        let radix = self.alphabet.len() as u128;
        let mut digits: SmallVec<[u8; 16]> = SmallVec::with_capacity(width);
        let mut rest = value;
        for _ in 0..width {
            digits.push(self.alphabet.symbol((rest % radix) as usize));
            rest /= radix;
        }
        digits.reverse();
        while digits.last() == Some(&self.alphabet.min()) {
            digits.pop();
        }
        return self.build(&[&digits[..]]);
    }
}

fn normalize_spacing(spacing: usize) -> usize {
    return if spacing == 0 { DEFAULT_SPACING } else { spacing };
}

fn bytes_to_string(bytes: &[u8]) -> String {
    return bytes.iter().map(|&b| b as char).collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> KeyAllocator {
        return KeyAllocator::new(Alphabet::LOWERCASE);
    }

    fn between(before: &str, after: &str) -> Result<OrderKey, OrderError> {
        return abc().between(Some(before), Some(after));
    }

    fn assert_strictly_between(before: &str, after: &str) -> OrderKey {
        let key = between(before, after).unwrap();
        assert!(
            (before.is_empty() || before < key.as_str())
                && (after.is_empty() || key.as_str() < after),
            "between({:?}, {:?}) = {:?}",
            before,
            after,
            key,
        );
        return key;
    }

    // =========================================================================
    // Boundaries
    // =========================================================================

    #[test]
    fn start_and_end() {
        assert_eq!(abc().start(), "n");
        assert_eq!(abc().end(), "z");
        assert_eq!(abc().min_key(), "a");
    }

    #[test]
    fn empty_boundaries() {
        assert_eq!(between("", "").unwrap(), "n");
        assert_eq!(between("", "p").unwrap(), "o");
        assert_eq!(between("m", "").unwrap(), "mn");
        assert_eq!(abc().between(None, None).unwrap(), abc().start());
        assert_eq!(abc().between(None, Some("p")).unwrap(), "o");
        assert_eq!(abc().between(Some("m"), None).unwrap(), "mn");
    }

    #[test]
    fn before_absent_avoids_trailing_minimum() {
        assert_eq!(between("", "b").unwrap(), "an");
        assert_eq!(between("", "ab").unwrap(), "aan");
        assert_eq!(between("", "aac").unwrap(), "aab");
    }

    // =========================================================================
    // Splitting
    // =========================================================================

    #[test]
    fn simple_inserts() {
        assert_eq!(assert_strictly_between("a", "c"), "b");
        assert_eq!(assert_strictly_between("a", "b"), "an");
        assert_eq!(assert_strictly_between("m", "o"), "n");
        assert_eq!(assert_strictly_between("n", "z"), "o");
    }

    #[test]
    fn diverging_after_common_prefix() {
        assert_eq!(assert_strictly_between("abc", "abx"), "abd");
        assert_eq!(assert_strictly_between("abc", "abd"), "abcn");
    }

    #[test]
    fn adjacent_symbols_increment_deeper() {
        assert_eq!(assert_strictly_between("ab", "b"), "ac");
        assert_eq!(assert_strictly_between("abz", "b"), "ac");
        assert_eq!(assert_strictly_between("az", "b"), "azn");
        assert_eq!(assert_strictly_between("azz", "b"), "azzn");
    }

    #[test]
    fn prefix_cases() {
        assert_eq!(assert_strictly_between("a", "ab"), "aan");
        assert_eq!(assert_strictly_between("a", "az"), "ay");
        assert_eq!(assert_strictly_between("abc", "abcd"), "abcc");
        assert_eq!(assert_strictly_between("a", "aab"), "aaan");
    }

    #[test]
    fn invalid_order() {
        for (before, after) in [("a", "a"), ("b", "a"), ("abc", "ab")] {
            assert_eq!(
                between(before, after),
                Err(OrderError::InvalidOrder { before: before.into(), after: after.into() }),
            );
        }
    }

    #[test]
    fn exhausted_gaps() {
        assert!(matches!(between("a", "aa"), Err(OrderError::Exhausted { .. })));
        assert!(matches!(between("mn", "mnaaa"), Err(OrderError::Exhausted { .. })));
        assert!(matches!(abc().between(None, Some("a")), Err(OrderError::Exhausted { .. })));
        assert!(matches!(abc().between(None, Some("aaa")), Err(OrderError::Exhausted { .. })));
    }

    #[test]
    fn foreign_symbols() {
        assert!(matches!(between("A", "b"), Err(OrderError::ForeignSymbol { symbol: 'A', .. })));
        assert!(matches!(
            abc().between(Some("m"), Some("n9")),
            Err(OrderError::ForeignSymbol { .. })
        ));
    }

    #[test]
    fn dense_inserts_between_adjacent() {
        let mut before = OrderKey::from("a");
        let mut positions = vec![before.clone()];
        for _ in 0..50 {
            let mid = assert_strictly_between(&before, "b");
            positions.push(mid.clone());
            before = mid;
        }
        positions.push(OrderKey::from("b"));
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn dense_inserts_toward_lower_bound() {
        let mut after = OrderKey::from("b");
        for _ in 0..50 {
            after = assert_strictly_between("a", &after);
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(between("abc", "abd"), between("abc", "abd"));
        assert_eq!(abc().between(Some("q"), None), abc().between(Some("q"), None));
    }

    // =========================================================================
    // Rebalancing
    // =========================================================================

    #[test]
    fn needs_rebalance_threshold() {
        let abc = abc();
        assert!(!abc.needs_rebalance("a", 20));
        assert!(!abc.needs_rebalance("abcdefghij", 20));
        assert!(abc.needs_rebalance("abcdefghijklmnopqrstu", 20));
        assert!(abc.needs_rebalance("abcde", 3));
        assert!(abc.needs_rebalance("abcdefghijklmnopqrstu", 0));
        assert!(!abc.needs_rebalance("abcdefghijklmnopqrst", 0));
    }

    #[test]
    fn rebalance_small_collection() {
        let keys = abc().rebalance_keys(5, 10);
        let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "ak", "au", "be", "bo"]);
    }

    #[test]
    fn rebalance_single_symbol_when_it_fits() {
        let keys = abc().rebalance_keys(3, 10);
        let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "k", "u"]);
    }

    #[test]
    fn rebalance_maps_every_key_in_order() {
        let old = ["a", "aan", "aanm", "aanmz", "b"];
        let map = abc().rebalance(&old, 10);
        assert_eq!(map.len(), old.len());
        let new: Vec<&OrderKey> = old.iter().map(|k| &map[*k]).collect();
        assert!(new.windows(2).all(|w| w[0] < w[1]), "{:?}", new);
        assert_eq!(new[0], &abc().min_key());
    }

    #[test]
    fn rebalance_default_spacing() {
        assert_eq!(abc().rebalance_keys(4, 0), abc().rebalance_keys(4, DEFAULT_SPACING));
    }

    #[test]
    fn rebalance_empty() {
        assert!(abc().rebalance::<&str>(&[], 10).is_empty());
    }

    #[test]
    fn rebalanced_keys_are_short_and_sorted() {
        let keys = abc().rebalance_keys(10_000, 10);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        // 26^4 > 99_990
        assert!(keys.iter().all(|k| k.len() <= 4));
    }

    #[test]
    fn rebalanced_keys_leave_room() {
        let keys = abc().rebalance_keys(100, 10);
        for pair in keys.windows(2) {
            assert_strictly_between(&pair[0], &pair[1]);
        }
        assert_strictly_between("", &keys[1]);
    }

    #[test]
    fn key_at_matches_rebalance() {
        let keys = abc().rebalance_keys(30, 7);
        for (index, key) in keys.iter().enumerate() {
            assert_eq!(&abc().key_at(index, 30, 7), key);
        }
    }

    #[test]
    fn key_at_largest_index() {
        let last = abc().key_at(usize::MAX, 1, 10);
        assert!(abc().key_at(usize::MAX - 1, 1, 10) < last);
        assert!(abc().alphabet().contains_key(&last));
    }

    #[test]
    fn other_alphabets() {
        let b62 = KeyAllocator::new(Alphabet::BASE62);
        assert_eq!(b62.start(), "V");
        assert_eq!(b62.between(Some("0"), Some("1")).unwrap(), "0V");
        let key = b62.between(Some("Az"), Some("a")).unwrap();
        assert!("Az" < key.as_str() && key.as_str() < "a");
        let keys = b62.rebalance_keys(1000, 10);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
