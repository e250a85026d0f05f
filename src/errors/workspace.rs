//! Workspace-surface error types

use thiserror::Error;
use uuid::Uuid;

use crate::errors::{StructureError, TreeError};
use crate::tree::NodeId;

/// Errors raised by the workspace registry and its cross-entity operations.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("outline {0} not found")]
    OutlineNotFound(Uuid),

    #[error("arc {0} not found")]
    ArcNotFound(Uuid),

    #[error("character {0} not found")]
    CharacterNotFound(Uuid),

    #[error("location {0} not found")]
    LocationNotFound(Uuid),

    #[error("series {0} not found")]
    SeriesNotFound(Uuid),

    #[error("character instance {0} not found")]
    CharacterInstanceNotFound(Uuid),

    #[error("location instance {0} not found")]
    LocationInstanceNotFound(Uuid),

    #[error("story node {0} not found")]
    StoryNodeNotFound(NodeId),

    #[error("arc element {0} not found")]
    ArcElementNotFound(NodeId),

    /// Instances are unique per (definition, outline) pair.
    #[error("'{name}' already has an instance in this outline")]
    DuplicateInstance { name: String },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Structure(#[from] StructureError),
}

impl WorkspaceError {
    /// The structural violation behind this error, whether it was raised
    /// directly or surfaced through a tree mutation.
    pub fn structural(&self) -> Option<&StructureError> {
        match self {
            WorkspaceError::Structure(err) => Some(err),
            WorkspaceError::Tree(tree_err) => tree_err.structural(),
            _ => None,
        }
    }
}
