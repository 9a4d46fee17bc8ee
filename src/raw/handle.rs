use core::fmt;
use core::num::NonZero;

#[cfg(test)]
type RawId = u16;
#[cfg(not(test))]
type RawId = u32;

/// Compact arena address of a tree node.
///
/// Ids are stored one-based so `Option<NodeId>` (the parent link) costs nothing extra.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct NodeId(NonZero<RawId>);

impl NodeId {
    pub(crate) const MAX_SLOT: usize = (RawId::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_slot(slot: usize) -> Self {
        assert!(slot <= Self::MAX_SLOT, "`NodeId::from_slot()` - `slot` > `NodeId::MAX_SLOT`!");
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((slot + 1) as RawId) {
            Some(raw) => Self(raw),
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.slot())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    // Parent links rely on the niche.
    assert_eq_size!(NodeId, Option<NodeId>);
    assert_eq_size!(NodeId, RawId);

    #[test]
    #[should_panic(expected = "`NodeId::from_slot()` - `slot` > `NodeId::MAX_SLOT`!")]
    fn slot_past_the_limit() {
        let _ = NodeId::from_slot(NodeId::MAX_SLOT + 1);
    }

    #[test]
    fn displays_the_slot() {
        assert_eq!(NodeId::from_slot(7).to_string(), "#7");
    }

    proptest! {
        #[test]
        fn slot_survives_conversion(slot in 0..=NodeId::MAX_SLOT) {
            prop_assert_eq!(NodeId::from_slot(slot).slot(), slot);
        }
    }
}
