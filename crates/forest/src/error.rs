use thiserror::Error;

use crate::barcode::Colour;

/// Precondition violations reported by the trees in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForestError {
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("operation not supported by this tree's insertion mode")]
    WrongMode,

    #[error("position {index} is not {expected:?}")]
    WrongColour { index: usize, expected: Colour },

    #[error("node handle no longer refers to a live node")]
    StaleNode,
}
