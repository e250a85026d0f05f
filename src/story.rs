//! Story trees
//!
//! One per outline, created with a hidden root. Unlike arc trees, where bad
//! structure is merely reported, the parent/child compatibility table is
//! strictly enforced here: every add, move and retype is checked before it
//! commits.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{StructureError, TreeError, TreeResult};
use crate::story_elements::StoryElementKind;
use crate::tree::{MpTree, MutationCheck, NodeId, Position, TreeAction, TreeNode, TreePolicy};

/// Payload of a story tree node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoryElement {
    pub kind: StoryElementKind,
    pub name: Option<String>,
    pub description: Option<String>,
    pub characters: IndexSet<Uuid>,
    pub locations: IndexSet<Uuid>,
}

impl StoryElement {
    pub fn new(kind: StoryElementKind) -> Self {
        StoryElement {
            kind,
            name: None,
            description: None,
            characters: IndexSet::new(),
            locations: IndexSet::new(),
        }
    }

    pub fn named(kind: StoryElementKind, name: &str) -> Self {
        StoryElement {
            name: Some(name.to_string()),
            ..StoryElement::new(kind)
        }
    }
}

fn ensure_allowed(
    child: StoryElementKind,
    parent: StoryElementKind,
) -> Result<(), StructureError> {
    if child.allows_parent(parent) {
        Ok(())
    } else {
        Err(StructureError::DisallowedChild { child, parent })
    }
}

/// Enforces the allowed-parent table on every structural mutation.
pub struct StoryStructurePolicy;

impl TreePolicy<StoryElement> for StoryStructurePolicy {
    fn name(&self) -> &'static str {
        "story-structure"
    }

    fn check(
        &self,
        tree: &MpTree<StoryElement>,
        ctx: &MutationCheck<'_, StoryElement>,
    ) -> Result<(), StructureError> {
        match ctx.action {
            TreeAction::AddChild => {
                let (parent, payload) = match (ctx.node, ctx.payload) {
                    (Some(parent), Some(payload)) => (parent, payload),
                    _ => return Ok(()),
                };
                ensure_allowed(payload.kind, parent.payload.kind)
            }
            TreeAction::AddSibling => {
                let (anchor, payload) = match (ctx.node, ctx.payload) {
                    (Some(anchor), Some(payload)) => (anchor, payload),
                    _ => return Ok(()),
                };
                match tree.parent(anchor.id) {
                    Some(parent) => ensure_allowed(payload.kind, parent.payload.kind),
                    None => Err(StructureError::RootReserved),
                }
            }
            TreeAction::Move => {
                let (mover, target, position) = match (ctx.node, ctx.target, ctx.position) {
                    (Some(mover), Some(target), Some(position)) => (mover, target, position),
                    _ => return Ok(()),
                };
                if position.is_child() {
                    ensure_allowed(mover.payload.kind, target.payload.kind)
                } else {
                    match tree.parent(target.id) {
                        Some(parent) => ensure_allowed(mover.payload.kind, parent.payload.kind),
                        None => Err(StructureError::RootReserved),
                    }
                }
            }
            TreeAction::Update => {
                let (node, payload) = match (ctx.node, ctx.payload) {
                    (Some(node), Some(payload)) => (node, payload),
                    _ => return Ok(()),
                };
                match tree.parent(node.id) {
                    Some(parent) => ensure_allowed(payload.kind, parent.payload.kind)?,
                    None => {
                        if payload.kind != StoryElementKind::Root {
                            return Err(StructureError::RootReserved);
                        }
                    }
                }
                for child in tree.children(node.id) {
                    if !child.payload.kind.allows_parent(payload.kind) {
                        return Err(StructureError::DisallowedParent {
                            parent: payload.kind,
                            child: child.payload.kind,
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

/// A single-rooted story tree with the structure policy wired in.
#[derive(Debug)]
pub struct StoryTree {
    tree: MpTree<StoryElement>,
    root: NodeId,
}

impl StoryTree {
    pub(crate) fn new() -> Self {
        let mut tree = MpTree::new();
        let root = tree
            .add_root(StoryElement::new(StoryElementKind::Root))
            .expect("an empty tree cannot exhaust its path space");
        StoryTree { tree, root }
    }

    pub fn tree(&self) -> &MpTree<StoryElement> {
        &self.tree
    }

    /// The hidden root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add_child(&mut self, parent: NodeId, element: StoryElement) -> TreeResult<NodeId> {
        self.tree.add_child(parent, element, &[&StoryStructurePolicy])
    }

    pub fn add_sibling(
        &mut self,
        node: NodeId,
        position: Position,
        element: StoryElement,
    ) -> TreeResult<NodeId> {
        self.tree
            .add_sibling(node, position, element, &[&StoryStructurePolicy])
    }

    pub fn move_node(&mut self, node: NodeId, target: NodeId, position: Position) -> TreeResult<()> {
        self.tree
            .move_node(node, target, position, &[&StoryStructurePolicy])
    }

    /// In-place retype, re-validating the parent and every child.
    pub fn set_kind(&mut self, node: NodeId, kind: StoryElementKind) -> TreeResult<()> {
        let mut payload = self
            .tree
            .get(node)
            .ok_or(TreeError::NodeNotFound(node))?
            .payload
            .clone();
        payload.kind = kind;
        self.tree.update(node, payload, &[&StoryStructurePolicy])
    }

    pub fn set_name(&mut self, node: NodeId, name: Option<&str>) -> TreeResult<()> {
        self.tree
            .modify(node, |payload| payload.name = name.map(str::to_string))
    }

    pub fn set_description(&mut self, node: NodeId, description: Option<&str>) -> TreeResult<()> {
        self.tree
            .modify(node, |payload| payload.description = description.map(str::to_string))
    }

    pub fn remove(&mut self, node: NodeId) -> TreeResult<Vec<NodeId>> {
        if node == self.root {
            return Err(TreeError::Structure(StructureError::RootReserved));
        }
        self.tree.remove(node)
    }

    pub(crate) fn modify<F>(&mut self, node: NodeId, edit: F) -> TreeResult<()>
    where
        F: FnOnce(&mut StoryElement),
    {
        self.tree.modify(node, edit)
    }

    pub fn get(&self, node: NodeId) -> Option<&TreeNode<StoryElement>> {
        self.tree.get(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.contains(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<&TreeNode<StoryElement>> {
        self.tree.children(node)
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.tree.child_count(node)
    }

    pub fn descendants(&self, node: NodeId) -> Vec<&TreeNode<StoryElement>> {
        self.tree.descendants(node)
    }

    pub fn ancestors(&self, node: NodeId) -> Vec<&TreeNode<StoryElement>> {
        self.tree.ancestors(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<&TreeNode<StoryElement>> {
        self.tree.parent(node)
    }

    pub fn depth(&self, node: NodeId) -> usize {
        self.tree.depth(node)
    }

    /// A node's own characters plus every descendant's, deduplicated.
    pub fn all_characters(&self, node: NodeId) -> IndexSet<Uuid> {
        let mut all = match self.tree.get(node) {
            Some(n) => n.payload.characters.clone(),
            None => IndexSet::new(),
        };
        for descendant in self.tree.descendants(node) {
            all.extend(descendant.payload.characters.iter().copied());
        }
        all
    }

    /// A node's own locations plus every descendant's, deduplicated.
    pub fn all_locations(&self, node: NodeId) -> IndexSet<Uuid> {
        let mut all = match self.tree.get(node) {
            Some(n) => n.payload.locations.clone(),
            None => IndexSet::new(),
        };
        for descendant in self.tree.descendants(node) {
            all.extend(descendant.payload.locations.iter().copied());
        }
        all
    }
}
