use core::fmt;
use core::iter::FusedIterator;
use core::ops::RangeBounds;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::less::{Less, Natural};
use crate::map::Map;
use crate::range;

/// An ordered set based on a B-Tree.
///
/// A `Set<T, C>` is a [`Map<T, (), C>`](Map) and shares its handle semantics: clones
/// refer to the same elements, every operation takes `&self`, and cursors and range
/// iterators survive concurrent modification of the set.
///
/// # Examples
///
/// ```
/// use cursor_btree::Set;
///
/// let books = Set::new();
/// books.add("A Dance With Dragons");
/// books.add("To Kill a Mockingbird");
/// books.add("The Odyssey");
/// books.add("The Great Gatsby");
///
/// if !books.contains(&"The Winds of Winter") {
///     println!("We have {} books, but The Winds of Winter ain't one.", books.len());
/// }
///
/// books.delete(&"The Odyssey");
///
/// for book in &books {
///     println!("{book}");
/// }
/// ```
pub struct Set<T, C = Natural> {
    map: Map<T, (), C>,
}

impl<T: Ord> Set<T> {
    /// Makes a new, empty `Set` ordered by [`Ord`].
    #[must_use]
    pub fn new() -> Self {
        Self { map: Map::new() }
    }
}

impl<T, C: Less<T>> Set<T, C> {
    /// Makes a new, empty `Set` ordered by `less`.
    #[must_use]
    pub fn with_less(less: C) -> Self {
        Self {
            map: Map::with_less(less),
        }
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. An equivalent element already in
    /// the set is kept as is.
    ///
    /// # Panics
    ///
    /// Panics if called while the set is borrowed by one of its own closures.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Set;
    ///
    /// let set = Set::new();
    /// assert!(set.add(2));
    /// assert!(!set.add(2));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn add(&self, value: T) -> bool {
        self.map.put(value, ()).is_none()
    }

    /// Returns `true` if the set contains `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.map.contains(value)
    }

    /// Removes `value` from the set. Returns whether it was present.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Set;
    ///
    /// let set = Set::new();
    /// set.add(2);
    /// assert!(set.delete(&2));
    /// assert!(!set.delete(&2));
    /// ```
    pub fn delete(&self, value: &T) -> bool {
        self.map.delete(value).is_some()
    }

    /// Returns the number of elements in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes every element.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Returns the smallest element.
    #[must_use]
    pub fn first(&self) -> Option<T>
    where
        T: Clone,
    {
        self.map.first().map(|(value, ())| value)
    }

    /// Returns the largest element.
    #[must_use]
    pub fn last(&self) -> Option<T>
    where
        T: Clone,
    {
        self.map.last().map(|(value, ())| value)
    }

    /// Returns a cursor positioned on the smallest element.
    pub fn cursor(&self) -> Cursor<T, (), C>
    where
        T: Clone,
    {
        self.map.cursor()
    }

    /// Iterates over the elements within `bounds`, in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_btree::Set;
    ///
    /// let set: Set<u32> = [3, 5, 8].into();
    /// assert_eq!(set.range(4..).collect::<Vec<_>>(), [5, 8]);
    /// ```
    pub fn range(&self, bounds: impl RangeBounds<T>) -> Range<T, C>
    where
        T: Clone,
    {
        Range {
            inner: self.map.range(bounds),
        }
    }

    /// Iterates over the elements within `bounds`, in descending order.
    pub fn range_reverse(&self, bounds: impl RangeBounds<T>) -> RangeReverse<T, C>
    where
        T: Clone,
    {
        RangeReverse {
            inner: self.map.range_reverse(bounds),
        }
    }

    /// Iterates over every element in ascending order.
    pub fn iter(&self) -> Range<T, C>
    where
        T: Clone,
    {
        self.range(..)
    }

    /// Number of levels in the underlying tree.
    #[must_use]
    pub fn height(&self) -> usize {
        self.map.height()
    }

    /// Checks the structural invariants of the underlying tree.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant found.
    pub fn validate(&self) -> Result<()> {
        self.map.validate()
    }
}

impl<T, C> Clone for Set<T, C> {
    /// Returns another handle to the same set.
    fn clone(&self) -> Self {
        Self { map: self.map.clone() }
    }
}

impl<T, C: Less<T> + Default> Default for Set<T, C> {
    fn default() -> Self {
        Self { map: Map::default() }
    }
}

impl<T, C> fmt::Debug for Set<T, C>
where
    T: Clone + fmt::Debug,
    C: Less<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C: Less<T> + Default> FromIterator<T> for Set<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, C: Less<T>> Extend<T> for Set<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.map.extend(iter.into_iter().map(|value| (value, ())));
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for Set<T> {
    fn from(arr: [T; N]) -> Self {
        Self::from_iter(arr)
    }
}

impl<T: Clone, C: Less<T>> IntoIterator for &Set<T, C> {
    type Item = T;
    type IntoIter = Range<T, C>;

    fn into_iter(self) -> Range<T, C> {
        self.iter()
    }
}

/// An ascending iterator over a sub-range of a set's elements.
///
/// This `struct` is created by [`Set::range`] and [`Set::iter`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<T, C = Natural> {
    inner: range::Range<T, (), C>,
}

impl<T: Clone, C: Less<T>> Iterator for Range<T, C> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(value, ())| value)
    }
}

impl<T: Clone, C: Less<T>> FusedIterator for Range<T, C> {}

/// A descending iterator over a sub-range of a set's elements.
///
/// This `struct` is created by [`Set::range_reverse`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct RangeReverse<T, C = Natural> {
    inner: range::RangeReverse<T, (), C>,
}

impl<T: Clone, C: Less<T>> Iterator for RangeReverse<T, C> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(value, ())| value)
    }
}

impl<T: Clone, C: Less<T>> FusedIterator for RangeReverse<T, C> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::less::Descending;
    use alloc::format;
    use alloc::vec::Vec;
    use pretty_assertions::assert_eq;

    #[test]
    fn debug_lists_elements_in_order() {
        let set: Set<i32> = [3, 1, 2].into();
        assert_eq!(format!("{set:?}"), "{1, 2, 3}");
    }

    #[test]
    fn descending_set_walks_backwards() {
        let set: Set<i32, Descending<Natural>> = (0..20).collect();
        assert_eq!(set.first(), Some(19));
        assert_eq!(set.range(..=15).take(2).collect::<Vec<_>>(), [19, 18]);
        assert_eq!(set.range_reverse(..).take(2).collect::<Vec<_>>(), [0, 1]);
    }
}
