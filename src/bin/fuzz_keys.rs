//! AFL fuzz harness for OrderedList
//!
//! Replays arbitrary insert/move/remove/rebalance sequences against both an
//! `OrderedList` and a plain `Vec`, and checks after every step that:
//! 1. The list holds the same items in the same order as the Vec
//! 2. Keys are strictly increasing and spelled in the list's alphabet
//! 3. No key is longer than the rebalance threshold
//! 4. An insert that rebalances reports a new key for every sibling

use afl::fuzz;
use orderkey::Alphabet;
use orderkey::Config;
use orderkey::OrderKey;
use orderkey::OrderedList;

/// Small so that rebalances happen often.
const THRESHOLD: usize = 6;

#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// Insert a new item at a fraction of the current length
    Insert { pos_frac: u8 },
    /// Move the item at one position next to the item at another
    Move { from_frac: u8, to_frac: u8, after: bool },
    /// Remove the item at a position
    Remove { pos_frac: u8 },
    /// Force a full rebalance
    Rebalance,
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        let (&tag, rest) = bytes.split_first()?;
        return match tag % 4 {
            0 if !rest.is_empty() => Some((FuzzOp::Insert { pos_frac: rest[0] }, &rest[1..])),
            1 if rest.len() >= 2 => {
                let op = FuzzOp::Move {
                    from_frac: rest[0],
                    to_frac: rest[1],
                    after: tag & 0x80 != 0,
                };
                Some((op, &rest[2..]))
            }
            2 if !rest.is_empty() => Some((FuzzOp::Remove { pos_frac: rest[0] }, &rest[1..])),
            3 => Some((FuzzOp::Rebalance, rest)),
            _ => None,
        };
    }
}

fn scale(frac: u8, len: usize) -> usize {
    return frac as usize * len / 256;
}

fn key_at(list: &OrderedList<u32>, index: usize) -> OrderKey {
    return list.keys().nth(index).cloned().expect("index within list");
}

fn check(list: &OrderedList<u32>, model: &[u32], alphabet: Alphabet) {
    let values: Vec<u32> = list.values().copied().collect();
    assert_eq!(values, model, "list diverged from model");

    let keys: Vec<&OrderKey> = list.keys().collect();
    for pair in keys.windows(2) {
        assert!(pair[0] < pair[1], "keys out of order: {:?}", pair);
    }
    for key in keys {
        assert!(alphabet.contains_key(key), "foreign symbol in {:?}", key);
        assert!(key.len() <= THRESHOLD, "key {:?} longer than threshold", key);
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        let config = Config { threshold: THRESHOLD, ..Config::default() };
        let mut list: OrderedList<u32> = OrderedList::with_config(config);
        let mut model: Vec<u32> = Vec::new();
        let mut next = 0u32;
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            match op {
                FuzzOp::Insert { pos_frac } => {
                    let pos = scale(pos_frac, model.len() + 1);
                    let placed = if pos == 0 {
                        list.push_front(next).expect("push_front")
                    } else {
                        let anchor = key_at(&list, pos - 1);
                        list.insert_after(&anchor, next).expect("insert_after")
                    };
                    if let Some(rekeyed) = &placed.rekeyed {
                        assert_eq!(rekeyed.len(), model.len(), "rebalance lost a sibling");
                    }
                    model.insert(pos, next);
                    next += 1;
                }

                FuzzOp::Move { from_frac, to_frac, after } => {
                    if model.is_empty() {
                        continue;
                    }
                    let from = scale(from_frac, model.len());
                    let to = scale(to_frac, model.len());
                    let key = key_at(&list, from);
                    let anchor = key_at(&list, to);
                    if after {
                        list.move_after(&key, &anchor).expect("move_after");
                    } else {
                        list.move_before(&key, &anchor).expect("move_before");
                    }
                    if from != to {
                        let item = model.remove(from);
                        let anchor_pos = if from < to { to - 1 } else { to };
                        let slot = if after { anchor_pos + 1 } else { anchor_pos };
                        model.insert(slot, item);
                    }
                }

                FuzzOp::Remove { pos_frac } => {
                    if model.is_empty() {
                        continue;
                    }
                    let pos = scale(pos_frac, model.len());
                    let key = key_at(&list, pos);
                    assert_eq!(list.remove(&key), Some(model.remove(pos)));
                }

                FuzzOp::Rebalance => {
                    list.rebalance();
                }
            }

            check(&list, &model, config.alphabet);
        }
    });
}
