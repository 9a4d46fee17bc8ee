use tracing::trace;

use super::arena::Arena;
use super::handle::NodeId;
use super::node::{Children, MAX_KVS, MIN_KVS, Node, SearchResult};
use crate::error::{Error, Result};
use crate::less::Less;

/// A slot holding one entry: node plus index into its keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Position {
    pub(crate) node: NodeId,
    pub(crate) index: usize,
}

/// The B-tree engine behind `Map` and `Set`.
pub(crate) struct RawTree<K, V, C> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Always a live node, empty only when the tree is.
    root: NodeId,
    less: C,
    /// Total number of entries across all nodes.
    len: usize,
    /// Bumped whenever an entry may have moved to a different slot.
    generation: u64,
}

impl<K, V, C> RawTree<K, V, C> {
    pub(crate) fn new(less: C) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::new(None));
        Self {
            nodes,
            root,
            less,
            len: 0,
            generation: 0,
        }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) const fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(crate) fn less(&self) -> &C {
        &self.less
    }

    /// Number of levels, counting the root leaf of an empty tree as one.
    pub(crate) fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.nodes.get(self.root);
        while let Some(child) = current.first_child() {
            height += 1;
            current = self.nodes.get(child);
        }
        height
    }

    /// Drops every entry. Old positions stop resolving.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::new(None));
        self.len = 0;
        self.bump();
    }

    #[inline]
    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn key_at(&self, position: Position) -> &K {
        self.nodes.get(position.node).key(position.index)
    }

    #[inline]
    pub(crate) fn value_at(&self, position: Position) -> &V {
        self.nodes.get(position.node).value(position.index)
    }

    #[inline]
    pub(crate) fn entry_at(&self, position: Position) -> (&K, &V) {
        let node = self.nodes.get(position.node);
        (node.key(position.index), node.value(position.index))
    }

    /// Leftmost entry of the subtree rooted at `id`.
    fn leftmost(&self, mut id: NodeId) -> Option<Position> {
        loop {
            let node = self.nodes.get(id);
            match node.first_child() {
                Some(child) => id = child,
                None if node.is_empty() => return None,
                None => return Some(Position { node: id, index: 0 }),
            }
        }
    }

    /// Rightmost entry of the subtree rooted at `id`.
    fn rightmost(&self, mut id: NodeId) -> Option<Position> {
        loop {
            let node = self.nodes.get(id);
            match node.last_child() {
                Some(child) => id = child,
                None if node.is_empty() => return None,
                None => {
                    return Some(Position {
                        node: id,
                        index: node.len() - 1,
                    });
                }
            }
        }
    }

    pub(crate) fn first_position(&self) -> Option<Position> {
        self.leftmost(self.root)
    }

    pub(crate) fn last_position(&self) -> Option<Position> {
        self.rightmost(self.root)
    }

    pub(crate) fn first(&self) -> Option<(&K, &V)> {
        self.first_position().map(|position| self.entry_at(position))
    }

    pub(crate) fn last(&self) -> Option<(&K, &V)> {
        self.last_position().map(|position| self.entry_at(position))
    }

    /// In-order successor of the entry at `position`.
    pub(crate) fn successor(&self, position: Position) -> Option<Position> {
        let node = self.nodes.get(position.node);
        if !node.is_leaf() {
            return self.leftmost(node.child(position.index + 1));
        }
        if position.index + 1 < node.len() {
            return Some(Position {
                node: position.node,
                index: position.index + 1,
            });
        }

        // Climb until we arrive from a child that still has a separator to its right.
        let mut child = position.node;
        while let Some(parent) = self.nodes.get(child).parent() {
            let parent_node = self.nodes.get(parent);
            let index = parent_node.child_position(child);
            if index < parent_node.len() {
                return Some(Position { node: parent, index });
            }
            child = parent;
        }
        None
    }

    /// In-order predecessor of the entry at `position`.
    pub(crate) fn predecessor(&self, position: Position) -> Option<Position> {
        let node = self.nodes.get(position.node);
        if !node.is_leaf() {
            return self.rightmost(node.child(position.index));
        }
        if position.index > 0 {
            return Some(Position {
                node: position.node,
                index: position.index - 1,
            });
        }

        let mut child = position.node;
        while let Some(parent) = self.nodes.get(child).parent() {
            let index = self.nodes.get(parent).child_position(child);
            if index > 0 {
                return Some(Position {
                    node: parent,
                    index: index - 1,
                });
            }
            child = parent;
        }
        None
    }
}

impl<K, V, C: Less<K>> RawTree<K, V, C> {
    /// Neither key sorts before the other.
    #[inline]
    pub(crate) fn equivalent(&self, a: &K, b: &K) -> bool {
        !self.less.less(a, b) && !self.less.less(b, a)
    }

    /// Whether `position` still resolves to a live slot holding `key`.
    ///
    /// Keys are unique, so a live slot holding `key` is `key`'s current home even if the
    /// node id was recycled since the position was taken.
    pub(crate) fn holds(&self, position: Position, key: &K) -> bool {
        self.nodes.try_get(position.node).is_some_and(|node| {
            node.is_live() && position.index < node.len() && self.equivalent(node.key(position.index), key)
        })
    }

    /// Searches for a key and returns its position if present.
    pub(crate) fn search(&self, key: &K) -> Option<Position> {
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            match node.search(key, &self.less) {
                SearchResult::Found(index) => return Some(Position { node: current, index }),
                SearchResult::Missing(_) if node.is_leaf() => return None,
                SearchResult::Missing(index) => current = node.child(index),
            }
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.search(key).map(|position| self.value_at(position))
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Descends towards `key`. Returns the slot holding it (`true`), or the nearest slot
    /// of the leaf where it would be inserted (`false`). `None` only for an empty tree.
    fn find(&self, key: &K) -> Option<(Position, bool)> {
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            match node.search(key, &self.less) {
                SearchResult::Found(index) => return Some((Position { node: current, index }, true)),
                SearchResult::Missing(index) if node.is_leaf() => {
                    if node.is_empty() {
                        return None;
                    }
                    let index = index.min(node.len() - 1);
                    return Some((Position { node: current, index }, false));
                }
                SearchResult::Missing(index) => current = node.child(index),
            }
        }
    }

    // The `find` slot is adjacent in key order to where `key` would sit, so each seek
    // needs at most one step to satisfy its relation.

    pub(crate) fn first_greater_or_equal(&self, key: &K) -> Option<Position> {
        let (position, exact) = self.find(key)?;
        if exact || !self.less.less(self.key_at(position), key) {
            Some(position)
        } else {
            self.successor(position)
        }
    }

    pub(crate) fn first_greater(&self, key: &K) -> Option<Position> {
        let (position, exact) = self.find(key)?;
        if !exact && self.less.less(key, self.key_at(position)) {
            Some(position)
        } else {
            self.successor(position)
        }
    }

    pub(crate) fn last_less_or_equal(&self, key: &K) -> Option<Position> {
        let (position, exact) = self.find(key)?;
        if exact || self.less.less(self.key_at(position), key) {
            Some(position)
        } else {
            self.predecessor(position)
        }
    }

    pub(crate) fn last_less(&self, key: &K) -> Option<Position> {
        let (position, exact) = self.find(key)?;
        if !exact && self.less.less(self.key_at(position), key) {
            Some(position)
        } else {
            self.predecessor(position)
        }
    }

    /// Inserts an entry, returning the old value if the key was already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut current = self.root;
        let index = loop {
            let node = self.nodes.get(current);
            match node.search(&key, &self.less) {
                // Overwrites leave every slot where it was.
                SearchResult::Found(index) => {
                    return Some(self.nodes.get_mut(current).replace_value(index, value));
                }
                SearchResult::Missing(index) if node.is_leaf() => break index,
                SearchResult::Missing(index) => current = node.child(index),
            }
        };

        self.len += 1;
        self.bump();
        if self.nodes.get(current).is_full() {
            self.overfill(current, index, key, value, None);
        } else {
            self.nodes.get_mut(current).insert_entry(index, key, value);
        }
        None
    }

    /// Splits full nodes from `id` upwards until the pending separator finds room.
    fn overfill(&mut self, mut id: NodeId, mut index: usize, mut key: K, mut value: V, mut child: Option<NodeId>) {
        loop {
            self.bump();
            let split = self.nodes.get_mut(id).split(index, key, value, child);
            let parent = split.right.parent();
            let right = self.nodes.alloc(split.right);
            if child.is_some() {
                self.adopt_children(id);
                self.adopt_children(right);
            }
            trace!(node = %id, right = %right, generation = self.generation, "split node");

            let Some(parent) = parent else {
                self.grow_root(id, split.key, split.value, right);
                return;
            };

            let at = self.nodes.get(parent).child_position(id);
            let parent_node = self.nodes.get_mut(parent);
            if !parent_node.is_full() {
                parent_node.insert_entry(at, split.key, split.value);
                parent_node.insert_child(at + 1, right);
                return;
            }

            id = parent;
            index = at;
            key = split.key;
            value = split.value;
            child = Some(right);
        }
    }

    fn grow_root(&mut self, left: NodeId, key: K, value: V, right: NodeId) {
        let root = self.nodes.alloc(Node::new_root(left, key, value, right));
        self.nodes.get_mut(left).set_parent(Some(root));
        self.nodes.get_mut(right).set_parent(Some(root));
        self.root = root;
        trace!(root = %root, generation = self.generation, "tree grew a level");
    }

    /// Points every child of `id` back at `id`.
    fn adopt_children(&mut self, id: NodeId) {
        let children: Children = self.nodes.get(id).children().iter().copied().collect();
        for child in children {
            self.nodes.get_mut(child).set_parent(Some(id));
        }
    }

    /// Removes a key, returning its entry if it was present.
    pub(crate) fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let Position { node: id, index } = self.search(key)?;
        self.len -= 1;
        self.bump();

        if self.nodes.get(id).is_leaf() {
            let entry = self.nodes.get_mut(id).remove_entry(index);
            self.rebalance(id);
            return Some(entry);
        }

        // Replace the separator with its predecessor, the last entry of the rightmost
        // leaf under the child to its left.
        let mut leaf = self.nodes.get(id).child(index);
        while let Some(child) = self.nodes.get(leaf).last_child() {
            leaf = child;
        }
        let last = self.nodes.get(leaf).len() - 1;
        let (key, value) = self.nodes.get_mut(leaf).remove_entry(last);
        let entry = self.nodes.get_mut(id).replace_entry(index, key, value);
        self.rebalance(leaf);
        Some(entry)
    }

    /// Restores minimum occupancy from `id` upwards after a removal.
    fn rebalance(&mut self, mut id: NodeId) {
        loop {
            let node = self.nodes.get(id);
            let Some(parent) = node.parent() else {
                if node.is_empty() && !node.is_leaf() {
                    self.collapse_root();
                }
                return;
            };
            if node.len() >= MIN_KVS {
                return;
            }

            let parent_node = self.nodes.get(parent);
            let at = parent_node.child_position(id);
            if at > 0 && self.nodes.get(parent_node.child(at - 1)).len() > MIN_KVS {
                self.steal_from_left(parent, at);
                return;
            }
            if at < parent_node.len() && self.nodes.get(parent_node.child(at + 1)).len() > MIN_KVS {
                self.steal_from_right(parent, at);
                return;
            }

            if at > 0 {
                self.merge_children(parent, at - 1);
            } else {
                self.merge_children(parent, at);
            }
            id = parent;
        }
    }

    /// Rotates the left sibling's last entry through the separator into child `at`.
    fn steal_from_left(&mut self, parent: NodeId, at: usize) {
        self.bump();
        let parent_node = self.nodes.get(parent);
        let (left, target) = (parent_node.child(at - 1), parent_node.child(at));

        let last = self.nodes.get(left).len() - 1;
        let left_node = self.nodes.get_mut(left);
        let (key, value) = left_node.remove_entry(last);
        let moved = left_node.take_last_child();

        let (key, value) = self.nodes.get_mut(parent).replace_entry(at - 1, key, value);
        let target_node = self.nodes.get_mut(target);
        target_node.insert_entry(0, key, value);
        if let Some(moved) = moved {
            target_node.insert_child(0, moved);
            self.nodes.get_mut(moved).set_parent(Some(target));
        }
        trace!(from = %left, to = %target, generation = self.generation, "rotated entry right");
    }

    /// Rotates the right sibling's first entry through the separator into child `at`.
    fn steal_from_right(&mut self, parent: NodeId, at: usize) {
        self.bump();
        let parent_node = self.nodes.get(parent);
        let (target, right) = (parent_node.child(at), parent_node.child(at + 1));

        let right_node = self.nodes.get_mut(right);
        let (key, value) = right_node.remove_entry(0);
        let moved = right_node.take_first_child();

        let (key, value) = self.nodes.get_mut(parent).replace_entry(at, key, value);
        let target_node = self.nodes.get_mut(target);
        target_node.push_entry(key, value);
        if let Some(moved) = moved {
            target_node.push_child(moved);
            self.nodes.get_mut(moved).set_parent(Some(target));
        }
        trace!(from = %right, to = %target, generation = self.generation, "rotated entry left");
    }

    /// Folds child `at + 1` and separator `at` into child `at`, retiring the right node.
    fn merge_children(&mut self, parent: NodeId, at: usize) {
        self.bump();
        let parent_node = self.nodes.get_mut(parent);
        let (key, value) = parent_node.remove_entry(at);
        let right = parent_node.remove_child(at + 1);
        let left = parent_node.child(at);

        let contents = self.nodes.get_mut(right).unlink();
        self.nodes.release(right);
        for &child in &contents.children {
            self.nodes.get_mut(child).set_parent(Some(left));
        }
        self.nodes.get_mut(left).absorb(key, value, contents);
        trace!(into = %left, retired = %right, generation = self.generation, "merged siblings");
    }

    /// Replaces an empty internal root with its only child.
    fn collapse_root(&mut self) {
        self.bump();
        let old = self.root;
        let contents = self.nodes.get_mut(old).unlink();
        self.nodes.release(old);
        debug_assert_eq!(contents.children.len(), 1, "`RawTree::collapse_root()` - root has several children!");

        let child = contents.children[0];
        self.nodes.get_mut(child).set_parent(None);
        self.root = child;
        trace!(root = %child, retired = %old, generation = self.generation, "tree lost a level");
    }

    /// Checks every structural invariant, reporting the first violation.
    pub(crate) fn validate(&self) -> Result<()> {
        let root = self.nodes.get(self.root);
        if let Some(parent) = root.parent() {
            return Err(Error::ParentLink {
                node: self.root.slot(),
                recorded: Some(parent.slot()),
                actual: None,
            });
        }
        if self.len > 0 && root.is_empty() {
            return Err(Error::EmptyRoot { len: self.len });
        }

        let mut walk = Walk::default();
        self.validate_node(self.root, 0, None, None, &mut walk)?;

        if walk.entries != self.len {
            return Err(Error::Length {
                reported: self.len,
                actual: walk.entries,
            });
        }
        if walk.nodes != self.nodes.len() {
            return Err(Error::Leaked {
                allocated: self.nodes.len(),
                reachable: walk.nodes,
            });
        }
        Ok(())
    }

    fn validate_node(&self, id: NodeId, depth: usize, lower: Option<&K>, upper: Option<&K>, walk: &mut Walk) -> Result<()> {
        let node = self.nodes.get(id);
        let slot = id.slot();
        walk.nodes += 1;
        walk.entries += node.len();

        if !node.is_live() {
            return Err(Error::Unlinked { node: slot });
        }
        let min = match (id == self.root, node.is_leaf()) {
            (true, true) => 0,
            (true, false) => 1,
            (false, _) => MIN_KVS,
        };
        if node.len() < min || node.len() > MAX_KVS {
            return Err(Error::Occupancy {
                node: slot,
                len: node.len(),
                min,
                max: MAX_KVS,
            });
        }

        let keys = node.keys();
        if let Some(index) = keys.windows(2).position(|pair| !self.less.less(&pair[0], &pair[1])) {
            return Err(Error::Unsorted { node: slot, index: index + 1 });
        }
        let below = matches!((lower, keys.first()), (Some(lower), Some(first)) if !self.less.less(lower, first));
        let above = matches!((upper, keys.last()), (Some(upper), Some(last)) if !self.less.less(last, upper));
        if below || above {
            return Err(Error::OutOfRange { node: slot });
        }

        if node.is_leaf() {
            return match walk.leaf_depth {
                Some(expected) if expected != depth => Err(Error::UnevenLeaves {
                    node: slot,
                    depth,
                    expected,
                }),
                _ => {
                    walk.leaf_depth = Some(depth);
                    Ok(())
                }
            };
        }

        if node.children().len() != node.len() + 1 {
            return Err(Error::ChildCount {
                node: slot,
                keys: node.len(),
                children: node.children().len(),
            });
        }
        for (index, &child) in node.children().iter().enumerate() {
            let recorded = self.nodes.get(child).parent();
            if recorded != Some(id) {
                return Err(Error::ParentLink {
                    node: child.slot(),
                    recorded: recorded.map(NodeId::slot),
                    actual: Some(slot),
                });
            }
            let child_lower = if index == 0 { lower } else { Some(node.key(index - 1)) };
            let child_upper = if index == node.len() { upper } else { Some(node.key(index)) };
            self.validate_node(child, depth + 1, child_lower, child_upper, walk)?;
        }
        Ok(())
    }
}

/// Running totals for `validate`.
#[derive(Default)]
struct Walk {
    nodes: usize,
    entries: usize,
    leaf_depth: Option<usize>,
}
