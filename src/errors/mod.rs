//! Domain-specific error types for storyloom
//!
//! This module provides structured error types for the different domains in
//! the engine, so callers can react to failures without parsing messages.
//!
//! # Error Categories
//!
//! - **TreeError**: materialized-path tree operations (positions, cyclic
//!   moves, path-space exhaustion, missing nodes)
//! - **StructureError**: hard structural-integrity violations (milestone
//!   rules, story parent/child rules, cross-outline associations)
//! - **WorkspaceError**: entity lookup and uniqueness failures at the
//!   workspace surface
//!
//! Structural violations always abort the mutation that triggered them; the
//! tree engine guarantees no partial writes have happened by the time one is
//! returned. Soft validation findings (arc error reports, nesting reports)
//! are ordinary data and intentionally do not live here.

pub mod structure;
pub mod tree;
pub mod workspace;

pub use structure::StructureError;
pub use tree::TreeError;
pub use workspace::WorkspaceError;

/// Result type alias for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Result type alias for workspace operations
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
