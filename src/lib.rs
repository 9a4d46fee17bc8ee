//! Ordered B-tree collections with cursors that survive mutation.
//!
//! This crate provides [`Map`] and [`Set`], sorted containers backed by a B-tree, and
//! a [`Cursor`] that can be held across insertions and deletions. When a split, merge
//! or rotation moves the entry a cursor points at, the cursor notices and finds its
//! way back by key instead of being invalidated.
//!
//! # Example
//!
//! ```
//! use cursor_btree::{Bound, Map};
//!
//! let scores = Map::new();
//! scores.put("Alice", 100);
//! scores.put("Bob", 85);
//! scores.put("Carol", 92);
//!
//! assert_eq!(scores.get(&"Bob"), Some(85));
//! assert_eq!(scores.len(), 3);
//!
//! // Walk a range while modifying the map.
//! let mut names = Vec::new();
//! for (name, _) in scores.range((Bound::Excluded("Alice"), Bound::Unbounded)) {
//!     names.push(name);
//!     scores.delete(&"Carol");
//! }
//! assert_eq!(names, ["Bob"]);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **Custom orderings** - Any [`Less`] implementation, closures included
//! - **Stable cursors** - Positions are re-found by key after structural changes
//! - **Shared handles** - Maps, sets, cursors and iterators share one tree through `&self`
//!
//! # Implementation
//!
//! Entries live in every node, not only in leaves. Nodes are stored in an arena and
//! addressed by compact ids; children know their parent, which lets a cursor walk
//! upwards without a stack. A generation counter on the tree tells a cursor whether
//! the slot it remembers might have changed.
//!
//! The collections are single-threaded: none of the types are `Send` or `Sync`.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod raw;

pub mod cursor;
pub mod error;
pub mod less;
pub mod map;
pub mod range;
pub mod set;

pub use core::ops::Bound;
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use less::{Less, Natural};
pub use map::Map;
pub use set::Set;
