//! Outlines
//!
//! An outline owns exactly one story tree, created with its hidden root the
//! moment the outline exists, and any number of MACE arcs. Everything the
//! analytics layers need to look up arc elements by story node goes through
//! the reverse index here.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;
use uuid::Uuid;

use crate::arc::{Arc, ArcElement, ArcId, MaceType};
use crate::errors::{StructureError, TreeError, TreeResult, WorkspaceError, WorkspaceResult};
use crate::impact;
use crate::nesting::{self, NestingReport};
use crate::story::StoryTree;
use crate::tree::{NodeId, TreeNode};

pub type OutlineId = Uuid;

/// A story node reference that remembers which outline it came from, so
/// cross-outline link attempts can be caught instead of silently resolving
/// to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoryNodeHandle {
    pub outline: OutlineId,
    pub node: NodeId,
}

/// One outline: a story tree plus its arcs.
#[derive(Debug)]
pub struct Outline {
    pub id: OutlineId,
    pub title: String,
    pub description: Option<String>,
    pub series: Option<Uuid>,
    pub tags: IndexSet<String>,
    pub user: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub story: StoryTree,
    arcs: IndexMap<ArcId, Arc>,
}

impl Outline {
    pub(crate) fn new(user: &str, title: &str, description: Option<&str>) -> Self {
        let now = Utc::now();
        Outline {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.map(str::to_string),
            series: None,
            tags: IndexSet::new(),
            user: user.to_string(),
            created: now,
            modified: now,
            story: StoryTree::new(),
            arcs: IndexMap::new(),
        }
    }

    /// Creates an arc and generates its seven-point template in one step.
    pub fn create_arc(&mut self, mace_type: MaceType, name: &str) -> TreeResult<ArcId> {
        let mut arc = Arc::new(self.id, mace_type, name);
        let milestones = arc.generate_template()?;
        if milestones != 7 {
            return Err(TreeError::Structure(StructureError::TemplateIncomplete(
                milestones,
            )));
        }
        debug!(arc = %arc.name, outline = %self.title, "arc created with template");
        let id = arc.id;
        self.arcs.insert(id, arc);
        self.modified = Utc::now();
        Ok(id)
    }

    pub fn delete_arc(&mut self, id: ArcId) -> WorkspaceResult<Arc> {
        let arc = self
            .arcs
            .shift_remove(&id)
            .ok_or(WorkspaceError::ArcNotFound(id))?;
        self.modified = Utc::now();
        Ok(arc)
    }

    pub fn arc(&self, id: ArcId) -> Option<&Arc> {
        self.arcs.get(&id)
    }

    pub fn arc_mut(&mut self, id: ArcId) -> Option<&mut Arc> {
        self.arcs.get_mut(&id)
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.values()
    }

    pub(crate) fn arcs_mut(&mut self) -> impl Iterator<Item = &mut Arc> {
        self.arcs.values_mut()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// A handle for linking; fails if the node is not in this story tree.
    pub fn story_handle(&self, node: NodeId) -> WorkspaceResult<StoryNodeHandle> {
        if !self.story.contains(node) {
            return Err(WorkspaceError::StoryNodeNotFound(node));
        }
        Ok(StoryNodeHandle {
            outline: self.id,
            node,
        })
    }

    /// Every arc element linked to the given story node, arcs in creation
    /// order, elements in tree order.
    pub fn arc_elements_for_story_node(
        &self,
        node: NodeId,
    ) -> Vec<(ArcId, &TreeNode<ArcElement>)> {
        let mut linked = Vec::new();
        for arc in self.arcs.values() {
            for element in arc.tree().nodes_ordered() {
                if element.payload.story_node == Some(node) {
                    linked.push((arc.id, element));
                }
            }
        }
        linked
    }

    /// Narrative-intensity score for a story node.
    pub fn impact_rating(&self, node: NodeId) -> f64 {
        impact::impact_rating(self, node)
    }

    /// Whole-outline arc nesting analysis.
    pub fn validate_nesting(&self) -> NestingReport {
        nesting::validate_nesting(self)
    }

    /// Characters of the node and all its descendants, deduplicated.
    pub fn all_characters(&self, node: NodeId) -> IndexSet<Uuid> {
        self.story.all_characters(node)
    }

    /// Locations of the node and all its descendants, deduplicated.
    pub fn all_locations(&self, node: NodeId) -> IndexSet<Uuid> {
        self.story.all_locations(node)
    }
}
