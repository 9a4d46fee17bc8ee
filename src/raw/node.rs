use core::cmp::Ordering;

use smallvec::SmallVec;

use super::handle::NodeId;
use crate::less::Less;

#[cfg(test)]
pub(crate) const BRANCH_FACTOR: usize = 16;
#[cfg(not(test))]
pub(crate) const BRANCH_FACTOR: usize = 32;

pub(crate) const MAX_KVS: usize = BRANCH_FACTOR - 1;
pub(crate) const MIN_KVS: usize = MAX_KVS / 2;

const _: () = assert!(BRANCH_FACTOR >= 3, "a B-tree needs at least three children per node");

pub(crate) type Keys<K> = SmallVec<[K; MAX_KVS]>;
pub(crate) type Values<V> = SmallVec<[V; MAX_KVS]>;
pub(crate) type Children = SmallVec<[NodeId; BRANCH_FACTOR]>;

/// Whether a node is still part of a tree.
///
/// Merges and root collapses retire a node by emptying it and tagging it `Unlinked`.
/// Cursors that remember the node see the tag and fall back to a search by key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Liveness {
    Live,
    Unlinked,
}

/// A B-tree node. Internal nodes store entries too, not just separators.
pub(crate) struct Node<K, V> {
    liveness: Liveness,
    parent: Option<NodeId>,
    keys: Keys<K>,
    values: Values<V>,
    // Empty for leaves, `keys.len() + 1` entries otherwise.
    children: Children,
}

/// Result of searching for a key in a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is the insertion point, which is also the child to descend into.
    Missing(usize),
}

/// The two halves of an overfilled node.
pub(crate) struct Split<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) right: Node<K, V>,
}

impl<K, V> Node<K, V> {
    /// Creates an empty live node.
    pub(crate) fn new(parent: Option<NodeId>) -> Self {
        Self {
            liveness: Liveness::Live,
            parent,
            keys: SmallVec::new(),
            values: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    /// Creates a root holding one separator between two subtrees.
    pub(crate) fn new_root(left: NodeId, key: K, value: V, right: NodeId) -> Self {
        let mut root = Self::new(None);
        root.keys.push(key);
        root.values.push(value);
        root.children.push(left);
        root.children.push(right);
        root
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.keys.len() >= MAX_KVS
    }

    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        self.liveness == Liveness::Live
    }

    #[cfg(test)]
    pub(crate) fn liveness(&self) -> Liveness {
        self.liveness
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &V {
        &self.values[index]
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> NodeId {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub(crate) fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    #[inline]
    pub(crate) fn last_child(&self) -> Option<NodeId> {
        self.children.last().copied()
    }

    /// Index of `child` among this node's children.
    pub(crate) fn child_position(&self, child: NodeId) -> usize {
        self.children
            .iter()
            .position(|&c| c == child)
            .expect("`Node::child_position()` - `child` is not a child of this node!")
    }

    /// Linear search: at these node sizes a scan beats binary search.
    #[inline]
    pub(crate) fn search<C: Less<K>>(&self, key: &K, less: &C) -> SearchResult {
        for (index, k) in self.keys.iter().enumerate() {
            if !less.less(k, key) {
                return if less.less(key, k) {
                    SearchResult::Missing(index)
                } else {
                    SearchResult::Found(index)
                };
            }
        }
        SearchResult::Missing(self.keys.len())
    }

    /// Overwrites the value at `index`, returning the previous one.
    pub(crate) fn replace_value(&mut self, index: usize, value: V) -> V {
        core::mem::replace(&mut self.values[index], value)
    }

    /// Overwrites the entry at `index`, returning the previous one.
    pub(crate) fn replace_entry(&mut self, index: usize, key: K, value: V) -> (K, V) {
        let key = core::mem::replace(&mut self.keys[index], key);
        let value = core::mem::replace(&mut self.values[index], value);
        (key, value)
    }

    pub(crate) fn insert_entry(&mut self, index: usize, key: K, value: V) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove_entry(&mut self, index: usize) -> (K, V) {
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        (key, value)
    }

    pub(crate) fn push_entry(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: NodeId) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> NodeId {
        self.children.remove(index)
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Removes the first child, if this is an internal node.
    pub(crate) fn take_first_child(&mut self) -> Option<NodeId> {
        if self.children.is_empty() {
            None
        } else {
            Some(self.children.remove(0))
        }
    }

    /// Removes the last child, if this is an internal node.
    pub(crate) fn take_last_child(&mut self) -> Option<NodeId> {
        self.children.pop()
    }

    /// Splits a full node around the entry about to be inserted at `index`.
    ///
    /// The node's `MAX_KVS` entries plus the pending one form an amalgam of
    /// `MAX_KVS + 1` entries. Amalgam slot `j` is the pending entry when `j == index`,
    /// otherwise the node's entry `j` (left of the hole) or `j - 1` (right of it). For
    /// internal nodes the pending `child` sits at amalgam child slot `index + 1`.
    ///
    /// The first `median` amalgam entries stay here, the median is returned as the
    /// separator and the rest move into `right`. Which branch runs depends only on
    /// where the hole falls relative to the median, so nothing is copied twice.
    /// `right` inherits this node's parent; the caller must re-parent moved children.
    pub(crate) fn split(&mut self, index: usize, key: K, value: V, child: Option<NodeId>) -> Split<K, V> {
        debug_assert!(self.is_full(), "`Node::split()` - node is not full!");
        debug_assert_eq!(self.is_leaf(), child.is_none(), "`Node::split()` - child/leaf mismatch!");

        let median = (MAX_KVS + 1) / 2;
        let mut right = Node::new(self.parent);

        let (separator_key, separator_value) = match index.cmp(&median) {
            // The hole is left of the median: the median is our entry `median - 1`.
            Ordering::Less => {
                right.keys = self.keys.drain(median..).collect();
                right.values = self.values.drain(median..).collect();
                let separator = self.remove_entry(median - 1);
                self.insert_entry(index, key, value);
                if let Some(child) = child {
                    right.children = self.children.drain(median..).collect();
                    self.children.insert(index + 1, child);
                }
                separator
            }
            // The pending entry is the median; its child opens the right half.
            Ordering::Equal => {
                right.keys = self.keys.drain(median..).collect();
                right.values = self.values.drain(median..).collect();
                if let Some(child) = child {
                    right.children.push(child);
                    right.children.extend(self.children.drain(median + 1..));
                }
                (key, value)
            }
            // The hole is right of the median: the median is our entry `median`.
            Ordering::Greater => {
                right.keys = self.keys.drain(median + 1..).collect();
                right.values = self.values.drain(median + 1..).collect();
                let separator = self.remove_entry(median);
                right.insert_entry(index - median - 1, key, value);
                if let Some(child) = child {
                    right.children = self.children.drain(median + 1..).collect();
                    right.children.insert(index - median, child);
                }
                separator
            }
        };

        Split {
            key: separator_key,
            value: separator_value,
            right,
        }
    }

    /// Appends `separator` and everything taken from the right sibling.
    pub(crate) fn absorb(&mut self, key: K, value: V, contents: Contents<K, V>) {
        debug_assert!(
            self.len() + 1 + contents.keys.len() <= MAX_KVS,
            "`Node::absorb()` - merged node would overflow!"
        );
        self.keys.push(key);
        self.values.push(value);
        self.keys.extend(contents.keys);
        self.values.extend(contents.values);
        self.children.extend(contents.children);
    }

    /// Retires the node: empties it, detaches it from its parent and tags it `Unlinked`.
    pub(crate) fn unlink(&mut self) -> Contents<K, V> {
        self.liveness = Liveness::Unlinked;
        self.parent = None;
        Contents {
            keys: core::mem::take(&mut self.keys),
            values: core::mem::take(&mut self.values),
            children: core::mem::take(&mut self.children),
        }
    }
}

/// Everything a retired node held.
pub(crate) struct Contents<K, V> {
    pub(crate) keys: Keys<K>,
    pub(crate) values: Values<V>,
    pub(crate) children: Children,
}
