//! Tree-engine error types
//!
//! Errors raised by the materialized-path tree itself, independent of any
//! domain policy. Structural violations raised by an injected policy are
//! carried through the `Structure` variant so callers see a single error
//! channel per mutation.

use thiserror::Error;

use crate::errors::StructureError;
use crate::tree::{NodeId, Position};

/// Materialized-path tree errors
#[derive(Error, Debug)]
pub enum TreeError {
    /// The referenced node does not exist in this tree.
    #[error("node {0} is not part of this tree")]
    NodeNotFound(NodeId),

    /// The requested position is not valid for this operation.
    #[error("{0} is not a valid position for this operation")]
    InvalidPosition(Position),

    /// A node cannot be moved relative to itself or its own descendants.
    #[error("a node cannot be moved relative to its own descendant")]
    CyclicMove,

    /// The path encoding has no room left at this depth or fan-out.
    #[error("materialized path space is exhausted at depth {depth}")]
    PathSpaceExhausted { depth: usize },

    /// A pre-commit policy vetoed the mutation.
    #[error(transparent)]
    Structure(#[from] StructureError),
}

impl TreeError {
    /// The structural violation behind this error, if that is what it is.
    pub fn structural(&self) -> Option<&StructureError> {
        match self {
            TreeError::Structure(err) => Some(err),
            _ => None,
        }
    }
}
