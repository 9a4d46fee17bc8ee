use alloc::vec::Vec;

use super::handle::NodeId;

/// Slot storage for tree nodes.
///
/// Released slots keep their last occupant until they are handed out again, so a stale
/// `NodeId` held by a cursor still resolves to *something*: either the tombstone the
/// engine left behind or whichever node reused the slot. Callers must never treat that
/// as proof the id is still part of the tree.
pub(crate) struct Arena<T> {
    slots: Vec<T>,
    free: Vec<NodeId>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of occupied (not released) slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.slot()] = element;
            id
        } else {
            assert!(
                self.slots.len() <= NodeId::MAX_SLOT,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                NodeId::MAX_SLOT + 1
            );
            self.slots.push(element);
            NodeId::from_slot(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        &self.slots[id.slot()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.slots[id.slot()]
    }

    /// Resolves an id that may predate a `clear`.
    #[inline]
    pub(crate) fn try_get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.slot())
    }

    /// Returns the slot to the free list. The occupant is dropped on reuse.
    pub(crate) fn release(&mut self, id: NodeId) {
        debug_assert!(!self.free.contains(&id), "`Arena::release()` - `id` released twice!");
        self.free.push(id);
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn released_slot_keeps_occupant_until_reuse() {
        let mut arena = Arena::new();
        let a = arena.alloc(1u32);
        let b = arena.alloc(2u32);
        arena.release(a);

        assert_eq!(arena.len(), 1);
        assert_eq!(*arena.get(a), 1);

        let c = arena.alloc(3u32);
        assert_eq!(c, a);
        assert_eq!(*arena.get(c), 3);
        assert_eq!(*arena.get(b), 2);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn cleared_ids_no_longer_resolve() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        arena.clear();

        assert_eq!(arena.len(), 0);
        assert!(arena.try_get(a).is_none());
    }

    proptest! {
        #[test]
        fn occupied_slots_behave_like_a_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(NodeId, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let id = arena.alloc(value);
                        prop_assert!(model.iter().all(|&(other, _)| other != id));
                        model.push((id, value));
                    }
                    Operation::Overwrite(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        *arena.get_mut(model[index].0) = value;
                        model[index].1 = value;
                    }
                    Operation::Release(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        arena.release(model[index].0);
                        model.swap_remove(index);
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());

                for &(id, value) in &model {
                    prop_assert_eq!(*arena.get(id), value);
                    prop_assert_eq!(arena.try_get(id).copied(), Some(value));
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        Overwrite(usize, u32),
        Release(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::Overwrite(which, value)),
            8 => any::<usize>().prop_map(Operation::Release),
            1 => Just(Operation::Clear),
        ]
    }
}
