//! Hard structural-integrity violations
//!
//! Every variant here blocks the mutation that raised it. These are caller
//! errors, not transient conditions: there is no retry path, the operation
//! is simply not allowed against the current tree state.

use thiserror::Error;

use crate::arc_elements::ArcElementKind;
use crate::story_elements::StoryElementKind;

/// Violations of the structural invariants enforced at mutation time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// A milestone type may occur at most once per arc.
    #[error("an arc cannot contain two {0} milestones")]
    DuplicateMilestone(ArcElementKind),

    /// Milestones may never descend from another milestone.
    #[error("a milestone cannot be a child of another milestone")]
    MilestoneUnderMilestone,

    /// Milestones live directly beneath the arc root, nowhere deeper.
    #[error("milestones can only be direct children of the arc root")]
    MilestoneDepth,

    /// A milestone cannot be placed at the top of the tree.
    #[error("a milestone cannot sit at the root of an arc")]
    MilestoneAsRoot,

    /// Template generation requires an empty arc.
    #[error("this arc already has elements; a template cannot be built on top of it")]
    TemplateAlreadyPopulated,

    /// Template generation did not produce the full milestone set.
    #[error("arc template generation produced {0} milestones instead of 7")]
    TemplateIncomplete(usize),

    /// The story-type compatibility table rejects this pairing.
    #[error("{child} is not an allowed child of {parent}")]
    DisallowedChild {
        child: StoryElementKind,
        parent: StoryElementKind,
    },

    /// An in-place retype would orphan an existing child.
    #[error("{parent} is not permitted to be a parent of {child}")]
    DisallowedParent {
        parent: StoryElementKind,
        child: StoryElementKind,
    },

    /// Only the hidden root may sit at the top of a tree.
    #[error("only the hidden root may sit at the top of the tree")]
    RootReserved,

    /// Character instances may only be associated within their own outline.
    #[error("a character instance and its node must belong to the same outline")]
    CrossOutlineCharacter,

    /// Location instances may only be associated within their own outline.
    #[error("a location instance and its node must belong to the same outline")]
    CrossOutlineLocation,

    /// Arc elements may only link to story nodes of the same outline.
    #[error("an arc element cannot link to a story node from another outline")]
    CrossOutlineLink,
}
