//! Stable cursors over a [`Map`](crate::Map) or [`Set`](crate::Set).
//!
//! A [`Cursor`] remembers the slot it points at *and* the key it found there. Mutating
//! the collection while a cursor is alive is allowed: splits, merges and rotations may
//! move entries to other slots, and the cursor notices (through the tree's generation
//! counter) and finds its way back by searching for the remembered key.
//!
//! ```
//! use cursor_btree::Map;
//!
//! let map: Map<i32, &str> = [(1, "a"), (2, "b"), (3, "c")].into();
//! let mut cursor = map.cursor();
//! assert_eq!(cursor.key(), Some(&1));
//!
//! // Deleting the entry under the cursor does not strand it.
//! map.delete(&1);
//! map.put(0, "z");
//! assert!(cursor.move_next());
//! assert_eq!(cursor.entry(), Some((2, "b")));
//! ```

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::iter::FusedIterator;

use tracing::trace;

use crate::less::{Less, Natural};
use crate::raw::{Position, RawTree};

/// Where a cursor last stood.
struct Anchor<K> {
    position: Position,
    key: K,
}

/// A movable position in a shared tree.
///
/// A cursor is either positioned on an entry or off the edge. Moving past either end
/// leaves it off the edge, where [`move_next`](Cursor::move_next) and
/// [`move_prev`](Cursor::move_prev) do nothing; any seek repositions it.
///
/// The cursor keeps the tree alive. Its key is a clone taken when it last moved, so
/// [`key`](Cursor::key) keeps answering even after that entry was deleted.
pub struct Cursor<K, V, C = Natural> {
    tree: Rc<RefCell<RawTree<K, V, C>>>,
    anchor: Option<Anchor<K>>,
    generation: u64,
}

impl<K, V, C> Cursor<K, V, C> {
    /// An unpositioned cursor.
    pub(crate) fn new(tree: Rc<RefCell<RawTree<K, V, C>>>) -> Self {
        let generation = tree.borrow().generation();
        Self {
            tree,
            anchor: None,
            generation,
        }
    }

    /// The key the cursor is positioned on, or `None` when it is off the edge.
    ///
    /// The entry itself may have been deleted since the cursor last moved.
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.anchor.as_ref().map(|anchor| &anchor.key)
    }

    /// Returns `true` unless the cursor is off the edge.
    #[must_use]
    pub fn is_positioned(&self) -> bool {
        self.anchor.is_some()
    }

    /// Runs `f` with the comparator of the underlying tree.
    pub(crate) fn with_less<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(self.tree.borrow().less())
    }
}

impl<K: Clone, V, C: Less<K>> Cursor<K, V, C> {
    fn anchor_at(tree: &RawTree<K, V, C>, position: Option<Position>) -> Option<Anchor<K>> {
        position.map(|position| Anchor {
            position,
            key: tree.key_at(position).clone(),
        })
    }

    /// The tree changed since the anchor was taken and the slot no longer holds its key.
    fn lost(&self, tree: &RawTree<K, V, C>, anchor: &Anchor<K>) -> bool {
        self.generation != tree.generation() && !tree.holds(anchor.position, &anchor.key)
    }

    /// Positions the cursor wherever `seek` lands.
    fn seek_with(&mut self, seek: impl FnOnce(&RawTree<K, V, C>) -> Option<Position>) -> bool {
        let tree = self.tree.borrow();
        self.anchor = Self::anchor_at(&tree, seek(&tree));
        self.generation = tree.generation();
        self.anchor.is_some()
    }

    /// Takes one step: `step` from an intact anchor, `reseek` by key from a lost one.
    fn step(
        &mut self,
        step: impl FnOnce(&RawTree<K, V, C>, Position) -> Option<Position>,
        reseek: impl FnOnce(&RawTree<K, V, C>, &K) -> Option<Position>,
    ) -> bool {
        let tree = self.tree.borrow();
        let Some(anchor) = &self.anchor else {
            return false;
        };

        let next = if self.lost(&tree, anchor) {
            trace!(generation = tree.generation(), "cursor lost its slot, reseeking by key");
            reseek(&tree, &anchor.key)
        } else {
            step(&tree, anchor.position)
        };

        self.anchor = Self::anchor_at(&tree, next);
        self.generation = tree.generation();
        self.anchor.is_some()
    }

    /// Re-anchors without moving: onto the remembered key if it is still present,
    /// otherwise onto the neighbour `reseek` picks.
    fn settle(&mut self, reseek: impl FnOnce(&RawTree<K, V, C>, &K) -> Option<Position>) -> bool {
        let tree = self.tree.borrow();
        let Some(anchor) = &self.anchor else {
            return false;
        };

        if self.lost(&tree, anchor) {
            trace!(generation = tree.generation(), "cursor lost its slot, reseeking by key");
            self.anchor = Self::anchor_at(&tree, reseek(&tree, &anchor.key));
        }
        self.generation = tree.generation();
        self.anchor.is_some()
    }

    /// Advances to the next entry in key order.
    ///
    /// Returns `false`, leaving the cursor off the edge, when there is no next entry or
    /// the cursor already was off the edge. If the current entry was removed, the cursor
    /// lands on the first key greater than it.
    ///
    /// # Panics
    ///
    /// Panics if called while the tree is mutably borrowed, e.g. from a
    /// [`Map::lookup`](crate::Map::lookup) closure that inserts.
    pub fn move_next(&mut self) -> bool {
        self.step(RawTree::successor, RawTree::first_greater)
    }

    /// Steps back to the previous entry in key order.
    ///
    /// Mirrors [`move_next`](Cursor::move_next). If the current entry was removed, the
    /// cursor lands on the last key less than it.
    ///
    /// # Panics
    ///
    /// See [`move_next`](Cursor::move_next).
    pub fn move_prev(&mut self) -> bool {
        self.step(RawTree::predecessor, RawTree::last_less)
    }

    /// Positions the cursor on the smallest key.
    pub fn seek_first(&mut self) -> bool {
        self.seek_with(RawTree::first_position)
    }

    /// Positions the cursor on the largest key.
    pub fn seek_last(&mut self) -> bool {
        self.seek_with(RawTree::last_position)
    }

    /// Positions the cursor on the largest key strictly less than `key`.
    pub fn seek_last_less(&mut self, key: &K) -> bool {
        self.seek_with(|tree| tree.last_less(key))
    }

    /// Positions the cursor on the largest key less than or equal to `key`.
    pub fn seek_last_less_or_equal(&mut self, key: &K) -> bool {
        self.seek_with(|tree| tree.last_less_or_equal(key))
    }

    /// Positions the cursor on the smallest key greater than or equal to `key`.
    ///
    /// ```
    /// use cursor_btree::Set;
    ///
    /// let set: Set<u32> = (0..100).map(|n| n * 10).collect();
    /// let mut cursor = set.cursor();
    /// assert!(cursor.seek_first_greater_or_equal(&42));
    /// assert_eq!(cursor.key(), Some(&50));
    /// assert!(!cursor.seek_first_greater_or_equal(&991));
    /// ```
    pub fn seek_first_greater_or_equal(&mut self, key: &K) -> bool {
        self.seek_with(|tree| tree.first_greater_or_equal(key))
    }

    /// Positions the cursor on the smallest key strictly greater than `key`.
    pub fn seek_first_greater(&mut self, key: &K) -> bool {
        self.seek_with(|tree| tree.first_greater(key))
    }

    /// Runs `f` on the value stored under the cursor's key.
    ///
    /// Returns `None` when the cursor is off the edge or its entry has been deleted.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates the tree the cursor walks.
    pub fn with_value<R>(&self, f: impl FnOnce(&V) -> R) -> Option<R> {
        let anchor = self.anchor.as_ref()?;
        let tree = self.tree.borrow();
        let position = if tree.holds(anchor.position, &anchor.key) {
            Some(anchor.position)
        } else {
            tree.search(&anchor.key)
        };
        position.map(|position| f(tree.value_at(position)))
    }

    /// A clone of the value stored under the cursor's key.
    #[must_use]
    pub fn value(&self) -> Option<V>
    where
        V: Clone,
    {
        self.with_value(V::clone)
    }

    /// Clones of the key and value under the cursor.
    #[must_use]
    pub fn entry(&self) -> Option<(K, V)>
    where
        V: Clone,
    {
        let value = self.value()?;
        self.key().map(|key| (key.clone(), value))
    }

    /// Iterates forward starting with the cursor's own entry.
    ///
    /// If that entry was deleted the walk starts at the next greater key.
    pub fn forward(self) -> Forward<K, V, C> {
        Forward {
            cursor: self,
            started: false,
        }
    }

    /// Iterates backward starting with the cursor's own entry.
    ///
    /// If that entry was deleted the walk starts at the next smaller key.
    pub fn backward(self) -> Backward<K, V, C> {
        Backward {
            cursor: self,
            started: false,
        }
    }
}

impl<K, V, C> Clone for Cursor<K, V, C>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            anchor: self.anchor.as_ref().map(|anchor| Anchor {
                position: anchor.position,
                key: anchor.key.clone(),
            }),
            generation: self.generation,
        }
    }
}

impl<K: fmt::Debug, V, C> fmt::Debug for Cursor<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("key", &self.key()).finish_non_exhaustive()
    }
}

/// An iterator walking a cursor forward.
///
/// This `struct` is created by [`Cursor::forward`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Forward<K, V, C = Natural> {
    cursor: Cursor<K, V, C>,
    started: bool,
}

impl<K: Clone, V: Clone, C: Less<K>> Iterator for Forward<K, V, C> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let moved = if self.started {
            self.cursor.move_next()
        } else {
            self.started = true;
            self.cursor.settle(RawTree::first_greater_or_equal)
        };
        if moved { self.cursor.entry() } else { None }
    }
}

impl<K: Clone, V: Clone, C: Less<K>> FusedIterator for Forward<K, V, C> {}

/// An iterator walking a cursor backward.
///
/// This `struct` is created by [`Cursor::backward`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Backward<K, V, C = Natural> {
    cursor: Cursor<K, V, C>,
    started: bool,
}

impl<K: Clone, V: Clone, C: Less<K>> Iterator for Backward<K, V, C> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let moved = if self.started {
            self.cursor.move_prev()
        } else {
            self.started = true;
            self.cursor.settle(RawTree::last_less_or_equal)
        };
        if moved { self.cursor.entry() } else { None }
    }
}

impl<K: Clone, V: Clone, C: Less<K>> FusedIterator for Backward<K, V, C> {}
