//! Orderings a tree can be built with.
//!
//! Trees never call [`Ord`] directly; every comparison goes through a [`Less`]
//! implementation chosen when the map or set is created. [`Natural`] forwards to `Ord`,
//! and any `Fn(&T, &T) -> bool` closure works as well:
//!
//! ```
//! use cursor_btree::Map;
//!
//! let by_magnitude = Map::with_less(|a: &i32, b: &i32| (a.abs(), *a) < (b.abs(), *b));
//! by_magnitude.put(-3, "minus three");
//! by_magnitude.put(2, "two");
//! by_magnitude.put(-1, "minus one");
//!
//! let keys: Vec<i32> = by_magnitude.iter().map(|(k, _)| k).collect();
//! assert_eq!(keys, [-1, 2, -3]);
//! ```

/// A strict weak ordering over `T`.
///
/// `less(a, b)` must be irreflexive and transitive, and incomparability must be
/// transitive. Two keys are considered the same key when neither is less than the
/// other. Breaking these rules is a logic error: the tree stays memory safe but its
/// contents and iteration order become unspecified.
pub trait Less<T: ?Sized> {
    /// Returns `true` if `a` sorts strictly before `b`.
    fn less(&self, a: &T, b: &T) -> bool;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Natural;

impl<T: ?Sized + Ord> Less<T> for Natural {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Reverses another ordering.
///
/// ```
/// use cursor_btree::{Map, less::{Descending, Natural}};
///
/// let map = Map::with_less(Descending(Natural));
/// map.put(1, "one");
/// map.put(3, "three");
/// map.put(2, "two");
/// assert_eq!(map.first(), Some((3, "three")));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Descending<C>(pub C);

impl<T: ?Sized, C: Less<T>> Less<T> for Descending<C> {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self.0.less(b, a)
    }
}

impl<T: ?Sized, F> Less<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}
