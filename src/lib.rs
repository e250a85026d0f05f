pub mod arc;
pub mod arc_elements;
pub mod errors;
pub mod export;
pub mod fixture;
pub mod headline;
pub mod impact;
pub mod nesting;
pub mod outline;
pub mod story;
pub mod story_elements;
pub mod tree;
pub mod workspace;

mod links;

pub use arc::{Arc, ArcElement, ArcFinding, ArcFindingKind, ArcId, MaceType};
pub use outline::{Outline, OutlineId, StoryNodeHandle};
pub use story::{StoryElement, StoryTree};
pub use tree::{MpTree, NodeId, Position};
pub use workspace::Workspace;
