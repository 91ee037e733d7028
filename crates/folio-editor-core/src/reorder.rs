//! Reordering of keyed sequences.

use folio_common::{Block, BlockId};

/// An item with a stable identity.
pub trait Keyed {
    type Key: PartialEq + Clone;

    fn key(&self) -> &Self::Key;
}

impl Keyed for Block {
    type Key = BlockId;

    fn key(&self) -> &BlockId {
        &self.id
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// Move the item at `from` to position `to`, shifting the items between.
///
/// Indices are clamped into range, so the result is always a permutation of
/// the input. The item is resolved to its key first and moved by key.
pub fn reorder<T: Keyed + Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = items.to_vec();
    if items.is_empty() {
        return out;
    }
    let from = clamp_index(from, items.len());
    let to = clamp_index(to, items.len());
    let key = items[from].key().clone();
    move_by_key(&mut out, &key, to);
    out
}

/// Move the item with `key` to position `to` (clamped) in place. Returns
/// false, leaving `items` untouched, when no item has that key.
pub fn move_by_key<T: Keyed>(items: &mut Vec<T>, key: &T::Key, to: usize) -> bool {
    let Some(from) = items.iter().position(|item| item.key() == key) else {
        return false;
    };
    let to = clamp_index(to, items.len());
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str);

    impl Keyed for Item {
        type Key = &'static str;

        fn key(&self) -> &&'static str {
            &self.0
        }
    }

    fn items(keys: &[&'static str]) -> Vec<Item> {
        keys.iter().map(|k| Item(*k)).collect()
    }

    #[test]
    fn test_move_forward_and_back() {
        let abc = items(&["a", "b", "c"]);
        assert_eq!(reorder(&abc, 0, 2), items(&["b", "c", "a"]));
        assert_eq!(reorder(&abc, 2, 0), items(&["c", "a", "b"]));
        assert_eq!(reorder(&abc, 1, 1), abc);
    }

    #[test]
    fn test_indices_are_clamped() {
        let abc = items(&["a", "b", "c"]);
        assert_eq!(reorder(&abc, 0, 99), items(&["b", "c", "a"]));
        assert_eq!(reorder(&abc, 99, 0), items(&["c", "a", "b"]));
        assert!(reorder::<Item>(&[], 3, 1).is_empty());
    }

    #[test]
    fn test_move_by_missing_key() {
        let mut abc = items(&["a", "b", "c"]);
        assert!(!move_by_key(&mut abc, &"z", 0));
        assert_eq!(abc, items(&["a", "b", "c"]));
    }
}
