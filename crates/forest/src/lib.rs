//! Arena-based balanced trees for indexed list bookkeeping.
//!
//! - [`IndexedTree`]: positional or comparator-ordered values with stable
//!   [`NodeId`] handles and O(log n) index lookup.
//! - [`Barcode`]: a run-length compressed sequence of two colours that maps
//!   between real indices and per-colour indices.
//! - [`BooleanList`]: a boolean list on top of a barcode.
//!
//! All trees keep their nodes in a `Vec` arena and link them by `u32`
//! indices. The shared balancing primitives live in [`avl`].

pub mod avl;
pub mod barcode;
pub mod boolean_list;
pub mod error;
pub mod indexed_tree;
pub mod types;

pub use barcode::{Barcode, Colour, Counts};
pub use boolean_list::BooleanList;
pub use error::ForestError;
pub use indexed_tree::{IndexedTree, NodeId};
