//! Height-balanced tree primitives shared by every tree in this crate.
//!
//! Trees own a `Vec<N>` arena plus an `Option<u32>` root. Structural
//! functions take the arena and the current root and return the new root,
//! since any rotation can promote a different node to the top.

pub mod util;

pub use util::{
    append, assert_avl, first, height, insert_after, insert_before, last, next, prepend, prev,
    rebalance_up, remove, summary, update,
};
