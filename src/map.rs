use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::ops::RangeBounds;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::less::{Less, Natural};
use crate::range::{Range, RangeReverse};
use crate::raw::RawTree;

/// An ordered map based on a [B-Tree].
///
/// Keys are ordered by a comparator `C` implementing [`Less`], fixed when the map is
/// created. [`Map::new`] uses the keys' [`Ord`] implementation; [`Map::with_less`]
/// accepts any other ordering, closures included.
///
/// A `Map` is a handle: cloning it is cheap and the clone refers to the *same* entries.
/// For that reason every operation, mutating or not, takes `&self`. Cursors and range
/// iterators obtained from the map share it too, and keep working while the map is
/// modified; see [`Cursor`] for how they stay on track.
///
/// Lookups hand out clones ([`get`](Map::get), [`first`](Map::first), iteration) or
/// lend a reference to a closure ([`lookup`](Map::lookup)). Calling back into the same
/// map from inside such a closure panics.
///
/// It is a logic error for the comparator to not be a strict weak ordering, or for a
/// key's ordering to change while it is in the map. The behavior resulting from such a
/// logic error is not specified, but will not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use cursor_btree::Map;
///
/// let movie_reviews = Map::new();
/// movie_reviews.put("Office Space", "Deals with real issues in the workplace.");
/// movie_reviews.put("Pulp Fiction", "Masterpiece.");
/// movie_reviews.put("The Godfather", "Very enjoyable.");
/// movie_reviews.put("The Blues Brothers", "Eye lyked it a lot.");
///
/// if !movie_reviews.contains(&"Les Miserables") {
///     println!("We've got {} reviews, but Les Miserables ain't one.", movie_reviews.len());
/// }
///
/// // oops, this review has a lot of spelling mistakes, let's delete it.
/// movie_reviews.delete(&"The Blues Brothers");
///
/// for (movie, review) in &movie_reviews {
///     println!("{movie}: \"{review}\"");
/// }
/// ```
///
/// [B-Tree]: https://en.wikipedia.org/wiki/B-tree
pub struct Map<K, V, C = Natural> {
    tree: Rc<RefCell<RawTree<K, V, C>>>,
}

impl<K: Ord, V> Map<K, V> {
    /// Makes a new, empty `Map` ordered by [`Ord`].
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Map;
    ///
    /// let map = Map::new();
    /// map.put(1, "a");
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_less(Natural)
    }
}

impl<K, V, C: Less<K>> Map<K, V, C> {
    /// Makes a new, empty `Map` ordered by `less`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Map;
    ///
    /// // Closest to ten first, ties broken by value.
    /// let near_ten = Map::with_less(|a: &u32, b: &u32| (a.abs_diff(10), *a) < (b.abs_diff(10), *b));
    /// near_ten.put(3, "three");
    /// near_ten.put(12, "twelve");
    /// near_ten.put(9, "nine");
    /// assert_eq!(near_ten.first(), Some((9, "nine")));
    /// assert_eq!(near_ten.last(), Some((3, "three")));
    /// ```
    #[must_use]
    pub fn with_less(less: C) -> Self {
        Self {
            tree: Rc::new(RefCell::new(RawTree::new(less))),
        }
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present its value is replaced and the old value returned;
    /// the stored key is left alone. Otherwise `None` is returned.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Panics
    ///
    /// Panics if called from inside a closure lent a reference into this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Map;
    ///
    /// let map = Map::new();
    /// assert_eq!(map.put(37, "a"), None);
    /// assert_eq!(map.put(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some("b"));
    /// ```
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.tree.borrow_mut().insert(key, value)
    }

    /// Returns a clone of the value stored under `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Map;
    ///
    /// let map = Map::new();
    /// map.put(1, "a");
    /// assert_eq!(map.get(&1), Some("a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.tree.borrow().get(key).cloned()
    }

    /// Runs `f` on the value stored under `key` without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Map;
    ///
    /// let map = Map::new();
    /// map.put("greeting", String::from("hello"));
    /// assert_eq!(map.lookup(&"greeting", String::len), Some(5));
    /// assert_eq!(map.lookup(&"farewell", String::len), None);
    /// ```
    pub fn lookup<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.tree.borrow().get(key).map(f)
    }

    /// Returns `true` if the map contains a value for `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.tree.borrow().contains(key)
    }

    /// Removes `key` from the map, returning its value if it was present.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Panics
    ///
    /// Panics if called from inside a closure lent a reference into this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Map;
    ///
    /// let map = Map::new();
    /// map.put(1, "a");
    /// assert_eq!(map.delete(&1), Some("a"));
    /// assert_eq!(map.delete(&1), None);
    /// ```
    pub fn delete(&self, key: &K) -> Option<V> {
        self.tree.borrow_mut().remove(key).map(|(_, value)| value)
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.borrow().len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.borrow().is_empty()
    }

    /// Removes every entry.
    ///
    /// Outstanding cursors stay usable but find nothing until they are seeked again.
    pub fn clear(&self) {
        self.tree.borrow_mut().clear();
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Map;
    ///
    /// let map = Map::new();
    /// assert_eq!(map.first(), None);
    /// map.put(2, "b");
    /// map.put(1, "a");
    /// assert_eq!(map.first(), Some((1, "a")));
    /// ```
    #[must_use]
    pub fn first(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.tree.borrow().first().map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.tree.borrow().last().map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Returns a cursor positioned on the smallest key, or off the edge if the map is
    /// empty.
    pub fn cursor(&self) -> Cursor<K, V, C>
    where
        K: Clone,
    {
        let mut cursor = Cursor::new(Rc::clone(&self.tree));
        cursor.seek_first();
        cursor
    }

    /// Iterates over the entries whose keys fall within `bounds`, in ascending order.
    ///
    /// Bounds whose start sorts after their end produce an empty iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::{Bound, Map};
    ///
    /// let map: Map<i32, &str> = [(3, "a"), (5, "b"), (8, "c")].into();
    /// for (key, value) in map.range((Bound::Included(4), Bound::Included(8))) {
    ///     println!("{key}: {value}");
    /// }
    /// assert_eq!(map.range(4..).next(), Some((5, "b")));
    /// ```
    pub fn range(&self, bounds: impl RangeBounds<K>) -> Range<K, V, C>
    where
        K: Clone,
    {
        Range::new(Cursor::new(Rc::clone(&self.tree)), &bounds)
    }

    /// Iterates over the entries whose keys fall within `bounds`, in descending order.
    pub fn range_reverse(&self, bounds: impl RangeBounds<K>) -> RangeReverse<K, V, C>
    where
        K: Clone,
    {
        RangeReverse::new(Cursor::new(Rc::clone(&self.tree)), &bounds)
    }

    /// Iterates over every entry in ascending key order.
    pub fn iter(&self) -> Range<K, V, C>
    where
        K: Clone,
    {
        self.range(..)
    }

    /// Number of levels in the underlying tree. An empty map has height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        self.tree.borrow().height()
    }

    /// Checks the structural invariants of the underlying tree.
    ///
    /// Every public operation preserves them, so this only fails after a logic error
    /// such as a comparator that is not a strict weak ordering.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant found.
    pub fn validate(&self) -> Result<()> {
        self.tree.borrow().validate()
    }
}

impl<K, V, C> Clone for Map<K, V, C> {
    /// Returns another handle to the same map.
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
        }
    }
}

impl<K, V, C: Less<K> + Default> Default for Map<K, V, C> {
    fn default() -> Self {
        Self::with_less(C::default())
    }
}

impl<K, V, C> fmt::Debug for Map<K, V, C>
where
    K: Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    C: Less<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Less<K> + Default> FromIterator<(K, V)> for Map<K, V, C> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C: Less<K>> Extend<(K, V)> for Map<K, V, C> {
    /// The source may iterate over this same map; each entry is put on its own.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for Map<K, V> {
    /// Converts a `[(K, V); N]` into a `Map<K, V>`. Later duplicates win.
    fn from(arr: [(K, V); N]) -> Self {
        Self::from_iter(arr)
    }
}

impl<K: Clone, V: Clone, C: Less<K>> IntoIterator for &Map<K, V, C> {
    type Item = (K, V);
    type IntoIter = Range<K, V, C>;

    fn into_iter(self) -> Range<K, V, C> {
        self.iter()
    }
}
