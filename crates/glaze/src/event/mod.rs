//! Change events: blocks, the cursor listeners read them through, and the
//! assembler that batches, sorts and delivers them.

mod assembler;
mod block;
mod list_event;

pub use assembler::{ListEventAssembler, ListEventListener, ListenerId, SharedListener};
pub use block::{ChangeKind, ListChangeBlock};
pub use list_event::ListEvent;
