//! Observable lists.
//!
//! An [`ObservableList`] reports every mutation to its listeners as a
//! [`ListEvent`]: a compressed, index-ordered description of one atomic
//! change. Derived lists such as [`FilterList`] and [`GroupingList`] listen to
//! a source and publish events of their own.
//!
//! The building blocks are usable on their own:
//!
//! - [`ListEventAssembler`] batches changes into atomic changes and delivers
//!   them to push listeners and pull cursors.
//! - [`diff`] computes Myers shortest edit scripts and rewrites a list into
//!   another with [`diff::replace_all`].
//! - [`Grouper`] keeps a partition of a list into runs of equal neighbours
//!   up to date as the list changes.

pub mod diff;
mod error;
mod event;
mod filter_list;
mod grouper;
mod grouping_list;
mod observable_list;

pub use diff::{DiffOptions, Edit};
pub use error::{EventError, ListError};
pub use event::{
    ChangeKind, ListChangeBlock, ListEvent, ListEventAssembler, ListEventListener, ListenerId,
    SharedListener,
};
pub use filter_list::FilterList;
pub use grouper::{GroupChange, GroupClient, Grouper, DUPLICATE, UNIQUE};
pub use grouping_list::GroupingList;
pub use observable_list::ObservableList;

pub use glaze_forest::{Barcode, Colour};
