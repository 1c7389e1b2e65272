use glaze_forest::ForestError;
use thiserror::Error;

use crate::event::ListenerId;

/// Misuse of a [`ListEventAssembler`](crate::ListEventAssembler).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("an atomic change is already open on this assembler")]
    TransactionOpen,

    #[error("no atomic change is open")]
    NoTransaction,

    #[error("unknown listener {0}")]
    UnknownListener(ListenerId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Forest(#[from] ForestError),
}
