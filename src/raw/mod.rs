mod arena;
mod handle;
mod node;
mod raw_tree;

pub(crate) use raw_tree::{Position, RawTree};
