//! Structural validation errors.
//!
//! None of the map or set operations fail: lookups on missing keys and queries on an
//! empty tree answer `None`. The errors here are only produced by
//! [`Map::validate`](crate::Map::validate) and [`Set::validate`](crate::Set::validate),
//! which walk the whole tree and report the first broken invariant. Property tests use
//! them as an oracle after every mutation.
//!
//! Node ids in the messages are arena slots; they are only meaningful when comparing
//! errors from the same tree.

use thiserror::Error;

/// A violated B-tree invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A non-root node holds too few or too many entries.
    #[error("node #{node} holds {len} entries, outside the permitted {min}..={max}")]
    Occupancy {
        node: usize,
        len: usize,
        min: usize,
        max: usize,
    },

    /// The root is empty even though the tree reports entries.
    #[error("root is empty while the tree reports {len} entries")]
    EmptyRoot { len: usize },

    /// An internal node's child count is not one more than its key count.
    #[error("node #{node} holds {keys} keys but {children} children")]
    ChildCount {
        node: usize,
        keys: usize,
        children: usize,
    },

    /// Two adjacent keys in a node are not strictly ascending.
    #[error("node #{node} is out of order at index {index}")]
    Unsorted { node: usize, index: usize },

    /// A key escapes the range its ancestors' separators allow.
    #[error("node #{node} holds a key outside the range of its separators")]
    OutOfRange { node: usize },

    /// A child's parent link disagrees with the node that holds it.
    #[error("node #{node} records parent {recorded:?} but is held by {actual:?}")]
    ParentLink {
        node: usize,
        recorded: Option<usize>,
        actual: Option<usize>,
    },

    /// Leaves sit at different depths.
    #[error("leaf #{node} sits at depth {depth}, expected {expected}")]
    UnevenLeaves {
        node: usize,
        depth: usize,
        expected: usize,
    },

    /// A node reachable from the root was tagged as unlinked by a merge or collapse.
    #[error("node #{node} is reachable but marked unlinked")]
    Unlinked { node: usize },

    /// The cached entry count disagrees with the entries actually stored.
    #[error("tree reports {reported} entries but holds {actual}")]
    Length { reported: usize, actual: usize },

    /// Some allocated nodes cannot be reached from the root.
    #[error("{allocated} nodes are allocated but only {reachable} are reachable from the root")]
    Leaked { allocated: usize, reachable: usize },
}

/// Result of a structural validation.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_node() {
        let error = Error::Occupancy {
            node: 3,
            len: 2,
            min: 7,
            max: 15,
        };
        assert_eq!(error.to_string(), "node #3 holds 2 entries, outside the permitted 7..=15");

        let error = Error::ParentLink {
            node: 4,
            recorded: None,
            actual: Some(1),
        };
        assert_eq!(error.to_string(), "node #4 records parent None but is held by Some(1)");
    }
}
