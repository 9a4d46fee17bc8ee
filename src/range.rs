//! Bounded iteration over a [`Map`](crate::Map).
//!
//! Both iterators are driven by a [`Cursor`], so they keep working while the map is
//! modified between calls to `next`. They do not see a snapshot: keys inserted ahead
//! of the iterator are yielded, keys removed ahead of it are skipped, and nothing
//! behind it is revisited.

use core::iter::FusedIterator;
use core::ops::{Bound, RangeBounds};

use crate::cursor::Cursor;
use crate::less::{Less, Natural};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Not seeded yet.
    Fresh,
    Walking,
    Done,
}

/// `key` does not exceed `upper`.
fn within_upper<K, C: Less<K>>(less: &C, key: &K, upper: &Bound<K>) -> bool {
    match upper {
        Bound::Unbounded => true,
        Bound::Included(upper) => !less.less(upper, key),
        Bound::Excluded(upper) => less.less(key, upper),
    }
}

/// `key` does not fall short of `lower`.
fn within_lower<K, C: Less<K>>(less: &C, key: &K, lower: &Bound<K>) -> bool {
    match lower {
        Bound::Unbounded => true,
        Bound::Included(lower) => !less.less(key, lower),
        Bound::Excluded(lower) => less.less(lower, key),
    }
}

/// An ascending iterator over a sub-range of a map's entries.
///
/// This `struct` is created by [`Map::range`](crate::Map::range) and
/// [`Map::iter`](crate::Map::iter). Entries are yielded as clones.
///
/// # Examples
///
/// ```
/// use cursor_btree::Map;
///
/// let map: Map<u32, char> = (0..10).zip('a'..).collect();
/// let mut range = map.range(3..5);
/// assert_eq!(range.next(), Some((3, 'd')));
///
/// // The map may change between steps.
/// map.delete(&4);
/// assert_eq!(range.next(), None);
/// ```
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<K, V, C = Natural> {
    cursor: Cursor<K, V, C>,
    lower: Bound<K>,
    upper: Bound<K>,
    state: State,
}

impl<K: Clone, V, C> Range<K, V, C> {
    pub(crate) fn new(cursor: Cursor<K, V, C>, bounds: &impl RangeBounds<K>) -> Self {
        Self {
            cursor,
            lower: bounds.start_bound().cloned(),
            upper: bounds.end_bound().cloned(),
            state: State::Fresh,
        }
    }
}

impl<K: Clone, V: Clone, C: Less<K>> Iterator for Range<K, V, C> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let moved = match self.state {
            State::Done => return None,
            State::Fresh => {
                self.state = State::Walking;
                match &self.lower {
                    Bound::Unbounded => self.cursor.seek_first(),
                    Bound::Included(key) => self.cursor.seek_first_greater_or_equal(key),
                    Bound::Excluded(key) => self.cursor.seek_first_greater(key),
                }
            }
            State::Walking => self.cursor.move_next(),
        };

        let entry = if moved { self.cursor.entry() } else { None };
        match entry {
            Some((key, value)) if self.cursor.with_less(|less| within_upper(less, &key, &self.upper)) => Some((key, value)),
            _ => {
                self.state = State::Done;
                None
            }
        }
    }
}

impl<K: Clone, V: Clone, C: Less<K>> FusedIterator for Range<K, V, C> {}

/// A descending iterator over a sub-range of a map's entries.
///
/// This `struct` is created by [`Map::range_reverse`](crate::Map::range_reverse).
///
/// # Examples
///
/// ```
/// use cursor_btree::{Bound, Map};
///
/// let map: Map<u32, ()> = (0..10).map(|k| (k, ())).collect();
/// let keys: Vec<u32> = map
///     .range_reverse((Bound::Excluded(2), Bound::Included(5)))
///     .map(|(k, _)| k)
///     .collect();
/// assert_eq!(keys, [5, 4, 3]);
/// ```
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct RangeReverse<K, V, C = Natural> {
    cursor: Cursor<K, V, C>,
    lower: Bound<K>,
    upper: Bound<K>,
    state: State,
}

impl<K: Clone, V, C> RangeReverse<K, V, C> {
    pub(crate) fn new(cursor: Cursor<K, V, C>, bounds: &impl RangeBounds<K>) -> Self {
        Self {
            cursor,
            lower: bounds.start_bound().cloned(),
            upper: bounds.end_bound().cloned(),
            state: State::Fresh,
        }
    }
}

impl<K: Clone, V: Clone, C: Less<K>> Iterator for RangeReverse<K, V, C> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let moved = match self.state {
            State::Done => return None,
            State::Fresh => {
                self.state = State::Walking;
                match &self.upper {
                    Bound::Unbounded => self.cursor.seek_last(),
                    Bound::Included(key) => self.cursor.seek_last_less_or_equal(key),
                    Bound::Excluded(key) => self.cursor.seek_last_less(key),
                }
            }
            State::Walking => self.cursor.move_prev(),
        };

        let entry = if moved { self.cursor.entry() } else { None };
        match entry {
            Some((key, value)) if self.cursor.with_less(|less| within_lower(less, &key, &self.lower)) => Some((key, value)),
            _ => {
                self.state = State::Done;
                None
            }
        }
    }
}

impl<K: Clone, V: Clone, C: Less<K>> FusedIterator for RangeReverse<K, V, C> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::Map;
    use alloc::vec::Vec;
    use pretty_assertions::assert_eq;

    fn keys<I: Iterator<Item = (u32, u32)>>(iter: I) -> Vec<u32> {
        iter.map(|(k, _)| k).collect()
    }

    fn sample() -> Map<u32, u32> {
        (0..128).map(|k| (k, k)).collect()
    }

    #[test]
    fn inclusive_bounds_in_both_directions() {
        let map = sample();
        assert_eq!(keys(map.range(5..=16)), (5..=16).collect::<Vec<_>>());
        assert_eq!(keys(map.range_reverse(5..=16)), (5..=16).rev().collect::<Vec<_>>());
    }

    #[test]
    fn bound_kinds_are_honoured() {
        let map = sample();
        let between = (Bound::Excluded(10), Bound::Excluded(14));
        assert_eq!(keys(map.range(between)), [11, 12, 13]);
        assert_eq!(keys(map.range_reverse(between)), [13, 12, 11]);
        assert_eq!(keys(map.range(125..)), [125, 126, 127]);
        assert_eq!(keys(map.range_reverse(..3)), [2, 1, 0]);
        assert_eq!(map.range(..).count(), 128);
    }

    #[test]
    fn inverted_and_empty_bounds_yield_nothing() {
        let map = sample();
        assert_eq!(keys(map.range((Bound::Included(20), Bound::Included(10)))), Vec::<u32>::new());
        assert_eq!(keys(map.range_reverse((Bound::Included(20), Bound::Included(10)))), Vec::<u32>::new());
        assert_eq!(keys(map.range((Bound::Excluded(5), Bound::Excluded(5)))), Vec::<u32>::new());
        assert_eq!(keys(map.range(200..300)), Vec::<u32>::new());
    }

    #[test]
    fn ranges_are_fused() {
        let map = sample();
        let mut range = map.range(126..);
        assert_eq!(range.next(), Some((126, 126)));
        assert_eq!(range.next(), Some((127, 127)));
        assert_eq!(range.next(), None);
        map.put(128, 128);
        assert_eq!(range.next(), None);
    }

    #[test]
    fn mutation_ahead_of_the_iterator_is_observed() {
        let map = sample();
        let mut range = map.range(10..20);
        assert_eq!(range.next(), Some((10, 10)));

        map.delete(&11);
        map.delete(&10);
        map.put(1000, 0);
        map.put(12, 99);
        assert_eq!(range.next(), Some((12, 99)));

        // Rebuild the tree underneath the iterator entirely.
        for k in 0..128 {
            map.delete(&k);
        }
        for k in 0..64 {
            map.put(k * 2, k);
        }
        assert_eq!(keys(range), [14, 16, 18]);
    }
}
