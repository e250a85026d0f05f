//! MACE arcs and their element trees
//!
//! An arc owns one element tree: a hidden root, the seven milestones as
//! direct root children, and optional try/fail and beat elements nested
//! between them. Structural rules come in two tiers. The hard tier runs as
//! a pre-commit tree policy and blocks the mutation: duplicate milestones,
//! milestones inserted anywhere but directly under the root, milestones
//! inserted at the root level. The soft tier (`fetch_errors`) never blocks
//! anything; users are allowed to leave an arc in an imperfect state, and
//! the report just tells them what a reader would stumble over.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;
use uuid::Uuid;

use crate::arc_elements::{ArcElementKind, ARC_ELEMENT_DEFINITIONS};
use crate::errors::{StructureError, TreeError, TreeResult};
use crate::headline::derive_headline;
use crate::tree::{MpTree, MutationCheck, NodeId, Position, TreeAction, TreeNode, TreePolicy};

pub type ArcId = Uuid;

/// The four MACE arc drivers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MaceType {
    Milieu,
    Answer,
    Character,
    Event,
}

/// Payload of an arc element tree node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArcElement {
    pub kind: ArcElementKind,
    pub description: String,
    /// Derived from the description on every write.
    pub headline: String,
    /// Story node this element plays out in, if placed.
    pub story_node: Option<NodeId>,
    pub characters: IndexSet<Uuid>,
    pub locations: IndexSet<Uuid>,
}

impl ArcElement {
    pub fn new(kind: ArcElementKind, description: &str) -> Self {
        ArcElement {
            kind,
            description: description.to_string(),
            headline: derive_headline(description),
            story_node: None,
            characters: IndexSet::new(),
            locations: IndexSet::new(),
        }
    }
}

/// Hard-tier structural policy for arc element trees.
///
/// Moves are deliberately not checked here: relocating a milestone into a
/// bad spot is reported by the soft tier instead of being blocked.
pub struct ArcStructurePolicy;

impl ArcStructurePolicy {
    fn ensure_no_duplicate(
        tree: &MpTree<ArcElement>,
        kind: ArcElementKind,
        exclude: Option<NodeId>,
    ) -> Result<(), StructureError> {
        for node in tree.iter() {
            if node.payload.kind == kind && Some(node.id) != exclude {
                return Err(StructureError::DuplicateMilestone(kind));
            }
        }
        Ok(())
    }
}

impl TreePolicy<ArcElement> for ArcStructurePolicy {
    fn name(&self) -> &'static str {
        "arc-structure"
    }

    fn check(
        &self,
        tree: &MpTree<ArcElement>,
        ctx: &MutationCheck<'_, ArcElement>,
    ) -> Result<(), StructureError> {
        match ctx.action {
            TreeAction::AddChild => {
                let kind = match ctx.payload {
                    Some(payload) => payload.kind,
                    None => return Ok(()),
                };
                if !kind.is_milestone() {
                    return Ok(());
                }
                if let Some(parent) = ctx.node {
                    if parent.payload.kind.is_milestone() {
                        return Err(StructureError::MilestoneUnderMilestone);
                    }
                    if tree.depth(parent.id) != 1 {
                        return Err(StructureError::MilestoneDepth);
                    }
                }
                Self::ensure_no_duplicate(tree, kind, None)
            }
            TreeAction::AddSibling => {
                let kind = match ctx.payload {
                    Some(payload) => payload.kind,
                    None => return Ok(()),
                };
                if !kind.is_milestone() {
                    return Ok(());
                }
                if let Some(anchor) = ctx.node {
                    match tree.depth(anchor.id) {
                        1 => return Err(StructureError::MilestoneAsRoot),
                        2 => {}
                        _ => return Err(StructureError::MilestoneDepth),
                    }
                }
                Self::ensure_no_duplicate(tree, kind, None)
            }
            TreeAction::Update => {
                let (node, kind) = match (ctx.node, ctx.payload) {
                    (Some(node), Some(payload)) => (node, payload.kind),
                    _ => return Ok(()),
                };
                if kind.is_milestone() {
                    Self::ensure_no_duplicate(tree, kind, Some(node.id))?;
                }
                Ok(())
            }
            TreeAction::Move => Ok(()),
        }
    }
}

/// One soft-validation finding, labeled for the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArcFinding {
    pub kind: ArcFindingKind,
    /// The node the finding points at, where one exists.
    pub node: Option<NodeId>,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ArcFindingKind {
    HookPlacement,
    ResolutionPlacement,
    Generation,
    MilestoneSequence,
}

impl ArcFindingKind {
    pub fn label(self) -> &'static str {
        match self {
            ArcFindingKind::HookPlacement => "hook_error",
            ArcFindingKind::ResolutionPlacement => "reso_error",
            ArcFindingKind::Generation => "generation_error",
            ArcFindingKind::MilestoneSequence => "mseq_error",
        }
    }
}

/// A MACE arc: one driver, one name, one element tree.
#[derive(Debug)]
pub struct Arc {
    pub id: ArcId,
    pub outline: Uuid,
    pub mace_type: MaceType,
    pub name: String,
    tree: MpTree<ArcElement>,
    root: Option<NodeId>,
    cached_errors: Option<Vec<ArcFinding>>,
}

impl Arc {
    pub(crate) fn new(outline: Uuid, mace_type: MaceType, name: &str) -> Self {
        Arc {
            id: Uuid::new_v4(),
            outline,
            mace_type,
            name: name.to_string(),
            tree: MpTree::new(),
            root: None,
            cached_errors: None,
        }
    }

    pub fn tree(&self) -> &MpTree<ArcElement> {
        &self.tree
    }

    /// The hidden root node, once the tree exists.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Builds the seven-point template. The arc must be empty.
    pub fn generate_template(&mut self) -> TreeResult<usize> {
        let root = match self.root {
            Some(root) => root,
            None => {
                let description = format!("root of arc {}", self.name);
                let root = self
                    .tree
                    .add_root(ArcElement::new(ArcElementKind::Root, &description))?;
                self.root = Some(root);
                root
            }
        };
        if self.tree.child_count(root) > 0 {
            return Err(TreeError::Structure(StructureError::TemplateAlreadyPopulated));
        }
        for definition in ARC_ELEMENT_DEFINITIONS.values().filter(|d| d.milestone) {
            let description = definition.template_description.unwrap_or_default();
            self.tree.add_child(
                root,
                ArcElement::new(definition.kind, description),
                &[&ArcStructurePolicy],
            )?;
        }
        Ok(self.tree.child_count(root))
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: ArcElementKind,
        description: &str,
    ) -> TreeResult<NodeId> {
        self.tree
            .add_child(parent, ArcElement::new(kind, description), &[&ArcStructurePolicy])
    }

    pub fn add_sibling(
        &mut self,
        node: NodeId,
        position: Position,
        kind: ArcElementKind,
        description: &str,
    ) -> TreeResult<NodeId> {
        self.tree.add_sibling(
            node,
            position,
            ArcElement::new(kind, description),
            &[&ArcStructurePolicy],
        )
    }

    pub fn move_element(
        &mut self,
        node: NodeId,
        target: NodeId,
        position: Position,
    ) -> TreeResult<()> {
        self.tree
            .move_node(node, target, position, &[&ArcStructurePolicy])
    }

    /// In-place retype; headline and associations are preserved.
    pub fn set_kind(&mut self, node: NodeId, kind: ArcElementKind) -> TreeResult<()> {
        let mut payload = self
            .tree
            .get(node)
            .ok_or(TreeError::NodeNotFound(node))?
            .payload
            .clone();
        payload.kind = kind;
        self.tree.update(node, payload, &[&ArcStructurePolicy])
    }

    pub fn set_description(&mut self, node: NodeId, description: &str) -> TreeResult<()> {
        self.tree.modify(node, |payload| {
            payload.description = description.to_string();
            payload.headline = derive_headline(description);
        })
    }

    pub fn remove_element(&mut self, node: NodeId) -> TreeResult<Vec<NodeId>> {
        if Some(node) == self.root {
            return Err(TreeError::Structure(StructureError::RootReserved));
        }
        self.tree.remove(node)
    }

    pub(crate) fn modify_element<F>(&mut self, node: NodeId, edit: F) -> TreeResult<()>
    where
        F: FnOnce(&mut ArcElement),
    {
        self.tree.modify(node, edit)
    }

    /// Memoized soft-validation report. Stays stale across mutations until
    /// `refresh` is called; callers that need a fresh view must refresh
    /// first.
    pub fn current_errors(&mut self) -> &[ArcFinding] {
        if self.cached_errors.is_none() {
            self.cached_errors = Some(self.fetch_errors());
        }
        self.cached_errors.as_deref().unwrap_or_default()
    }

    /// Drops the memoized report so the next `current_errors` recomputes.
    pub fn refresh(&mut self) {
        self.cached_errors = None;
    }

    /// Evaluates the tree and reports everything the user should fix.
    pub fn fetch_errors(&self) -> Vec<ArcFinding> {
        let mut findings = Vec::new();
        if let Some(node) = self.validate_first_element() {
            findings.push(ArcFinding {
                kind: ArcFindingKind::HookPlacement,
                node: Some(node),
                message: "the first element of the arc should be the hook".to_string(),
            });
        }
        if let Some(node) = self.validate_last_element() {
            findings.push(ArcFinding {
                kind: ArcFindingKind::ResolutionPlacement,
                node: Some(node),
                message: "the last element of the arc should be the resolution".to_string(),
            });
        }
        if let Err(message) = self.validate_generations() {
            findings.push(ArcFinding {
                kind: ArcFindingKind::Generation,
                node: None,
                message,
            });
        }
        if let Some(node) = self.validate_milestones() {
            findings.push(ArcFinding {
                kind: ArcFindingKind::MilestoneSequence,
                node: Some(node),
                message: "milestones appear out of their canonical sequence".to_string(),
            });
        }
        debug!(arc = %self.name, findings = findings.len(), "arc validation swept");
        findings
    }

    /// The first direct root child should be the hook.
    fn validate_first_element(&self) -> Option<NodeId> {
        let root = self.root?;
        let first = self.tree.first_child(root)?;
        if first.payload.kind == ArcElementKind::Hook {
            None
        } else {
            Some(first.id)
        }
    }

    /// The last direct root child should be the resolution.
    fn validate_last_element(&self) -> Option<NodeId> {
        let root = self.root?;
        let last = self.tree.last_child(root)?;
        if last.payload.kind == ArcElementKind::Resolution {
            None
        } else {
            Some(last.id)
        }
    }

    /// Every node deeper than the root children must satisfy the
    /// allowed-parent rule for its kind; milestones may not be that deep at
    /// all.
    fn validate_generations(&self) -> Result<(), String> {
        let root = match self.root {
            Some(root) => root,
            None => return Ok(()),
        };
        for node in self.tree.descendants(root) {
            let parent = match self.tree.parent(node.id) {
                Some(parent) => parent,
                None => continue,
            };
            if self.tree.depth(parent.id) <= 1 {
                continue;
            }
            debug!(kind = %node.payload.kind, parent = %parent.payload.kind, "checking generation");
            if node.payload.kind.is_milestone() {
                return Err(
                    "milestones cannot be descendants of anything besides the root".to_string(),
                );
            }
            if !node
                .payload
                .kind
                .allowed_parents()
                .contains(&parent.payload.kind)
            {
                return Err(format!(
                    "{} cannot be a descendant of {}",
                    node.payload.kind.label(),
                    parent.payload.kind.label()
                ));
            }
        }
        Ok(())
    }

    /// Milestone sequence numbers must be non-decreasing left to right
    /// among the direct root children.
    fn validate_milestones(&self) -> Option<NodeId> {
        let root = self.root?;
        let mut cursor = 0u8;
        for child in self.tree.children(root) {
            if let Some(seq) = child.payload.kind.milestone_seq() {
                if seq < cursor {
                    return Some(child.id);
                }
                cursor = seq;
            }
        }
        None
    }

    /// Direct root child of the given milestone kind, if present.
    pub fn milestone(&self, kind: ArcElementKind) -> Option<&TreeNode<ArcElement>> {
        let root = self.root?;
        self.tree
            .children(root)
            .into_iter()
            .find(|n| n.payload.kind == kind)
    }

    /// Any element of the given kind, anywhere in the tree.
    pub fn element_of_kind(&self, kind: ArcElementKind) -> Option<&TreeNode<ArcElement>> {
        self.tree.nodes_ordered().into_iter().find(|n| n.payload.kind == kind)
    }
}
