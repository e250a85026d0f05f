//! Generic materialized-path ordered tree
//!
//! Nodes are addressed by a fixed-width path string: each step is a
//! zero-padded base-36 number, so sibling order, depth and ancestry all fall
//! out of plain string comparison. Two tree families are built on this
//! engine (arc element trees and story trees); each call site injects its
//! own structural policies, which run as pre-commit hooks and can veto a
//! mutation before anything is written.
//!
//! Mutations are atomic: capacity and path-length checks happen up front,
//! policies run next, and only then are paths rewritten. A returned error
//! therefore guarantees the tree is untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{StructureError, TreeError, TreeResult};

pub type NodeId = Uuid;

/// Default step width; 36^5 sibling slots per level.
pub const DEFAULT_STEP_LEN: usize = 5;

const PATH_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const MAX_PATH_BYTES: usize = 1024;

/// Where an insertion or move lands relative to its reference node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    FirstChild,
    LastChild,
    FirstSibling,
    Left,
    Right,
    LastSibling,
}

impl Position {
    pub fn is_child(self) -> bool {
        matches!(self, Position::FirstChild | Position::LastChild)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::FirstChild => "first-child",
            Position::LastChild => "last-child",
            Position::FirstSibling => "first-sibling",
            Position::Left => "left",
            Position::Right => "right",
            Position::LastSibling => "last-sibling",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structural mutations a policy can observe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction {
    AddChild,
    AddSibling,
    Move,
    Update,
}

/// Everything a pre-commit policy gets to see about a pending mutation.
///
/// `node` is the node the operation is anchored on: the parent for
/// `AddChild`, the reference sibling for `AddSibling`, the moving node for
/// `Move` and the node being rewritten for `Update`. `payload` is the
/// prospective payload for insertions and updates; `target` and `position`
/// are only present for moves and positional inserts.
pub struct MutationCheck<'a, P> {
    pub action: TreeAction,
    pub node: Option<&'a TreeNode<P>>,
    pub payload: Option<&'a P>,
    pub target: Option<&'a TreeNode<P>>,
    pub position: Option<Position>,
}

/// A structural validator injected by the call site.
///
/// Policies run synchronously inside the mutation, in the order supplied,
/// before any write happens. Returning an error vetoes the mutation.
pub trait TreePolicy<P> {
    fn name(&self) -> &'static str;

    fn check(&self, tree: &MpTree<P>, ctx: &MutationCheck<'_, P>) -> Result<(), StructureError>;
}

#[derive(Clone, Debug)]
pub struct TreeNode<P> {
    pub id: NodeId,
    pub path: String,
    pub payload: P,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct MpTree<P> {
    steplen: usize,
    nodes: IndexMap<NodeId, TreeNode<P>>,
}

impl<P> Default for MpTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> MpTree<P> {
    pub fn new() -> Self {
        Self::with_steplen(DEFAULT_STEP_LEN)
    }

    /// A tree with a non-default step width. Narrow steps are mostly useful
    /// for exercising path-space exhaustion.
    pub fn with_steplen(steplen: usize) -> Self {
        assert!(steplen >= 1, "step width must be at least 1");
        MpTree {
            steplen,
            nodes: IndexMap::new(),
        }
    }

    pub fn steplen(&self) -> usize {
        self.steplen
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode<P>> {
        self.nodes.get(&id)
    }

    fn require(&self, id: NodeId) -> TreeResult<&TreeNode<P>> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    /// Nodes in insertion order. Use `nodes_ordered` for tree order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode<P>> {
        self.nodes.values()
    }

    /// Nodes in tree (depth-first, sibling) order.
    pub fn nodes_ordered(&self) -> Vec<&TreeNode<P>> {
        let mut nodes: Vec<&TreeNode<P>> = self.nodes.values().collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        nodes
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.get(id).map(|n| n.path.len() / self.steplen).unwrap_or(0)
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.depth(id) == 1
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.contains(id) && self.child_count(id) == 0
    }

    pub fn roots(&self) -> Vec<&TreeNode<P>> {
        self.children_of_path("")
    }

    pub fn root_of(&self, id: NodeId) -> Option<&TreeNode<P>> {
        let node = self.get(id)?;
        let root_path = &node.path[..self.steplen];
        self.node_by_path(root_path)
    }

    pub fn parent(&self, id: NodeId) -> Option<&TreeNode<P>> {
        let node = self.get(id)?;
        if node.path.len() <= self.steplen {
            return None;
        }
        let parent_path = &node.path[..node.path.len() - self.steplen];
        self.node_by_path(parent_path)
    }

    pub fn children(&self, id: NodeId) -> Vec<&TreeNode<P>> {
        match self.get(id) {
            Some(node) => self.children_of_path(&node.path),
            None => Vec::new(),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// All nodes beneath `id`, in tree order. Does not include `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<&TreeNode<P>> {
        let prefix = match self.get(id) {
            Some(node) => node.path.clone(),
            None => return Vec::new(),
        };
        let mut found: Vec<&TreeNode<P>> = self
            .nodes
            .values()
            .filter(|n| n.path.len() > prefix.len() && n.path.starts_with(&prefix))
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    pub fn descendant_count(&self, id: NodeId) -> usize {
        self.descendants(id).len()
    }

    /// Ancestors from the root down to the direct parent.
    pub fn ancestors(&self, id: NodeId) -> Vec<&TreeNode<P>> {
        let node = match self.get(id) {
            Some(node) => node,
            None => return Vec::new(),
        };
        let mut found = Vec::new();
        let mut end = self.steplen;
        while end < node.path.len() {
            if let Some(ancestor) = self.node_by_path(&node.path[..end]) {
                found.push(ancestor);
            }
            end += self.steplen;
        }
        found
    }

    pub fn first_child(&self, id: NodeId) -> Option<&TreeNode<P>> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<&TreeNode<P>> {
        self.children(id).last().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<&TreeNode<P>> {
        let node = self.get(id)?;
        let parent_path = node.path[..node.path.len() - self.steplen].to_string();
        let siblings = self.children_of_path(&parent_path);
        let idx = siblings.iter().position(|n| n.id == id)?;
        siblings.get(idx + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<&TreeNode<P>> {
        let node = self.get(id)?;
        let parent_path = node.path[..node.path.len() - self.steplen].to_string();
        let siblings = self.children_of_path(&parent_path);
        let idx = siblings.iter().position(|n| n.id == id)?;
        idx.checked_sub(1).and_then(|i| siblings.get(i)).copied()
    }

    fn node_by_path(&self, path: &str) -> Option<&TreeNode<P>> {
        self.nodes.values().find(|n| n.path == path)
    }

    fn children_of_path(&self, parent_path: &str) -> Vec<&TreeNode<P>> {
        let want_len = parent_path.len() + self.steplen;
        let mut found: Vec<&TreeNode<P>> = self
            .nodes
            .values()
            .filter(|n| n.path.len() == want_len && n.path.starts_with(parent_path))
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    fn capacity(&self) -> u64 {
        (PATH_ALPHABET.len() as u64).saturating_pow(self.steplen as u32)
    }

    fn encode_step(&self, value: u64) -> String {
        let radix = PATH_ALPHABET.len() as u64;
        let mut digits = vec![b'0'; self.steplen];
        let mut rest = value;
        for slot in digits.iter_mut().rev() {
            *slot = PATH_ALPHABET[(rest % radix) as usize];
            rest /= radix;
        }
        String::from_utf8(digits).unwrap_or_default()
    }

    fn run_policies(
        &self,
        policies: &[&dyn TreePolicy<P>],
        ctx: &MutationCheck<'_, P>,
    ) -> Result<(), StructureError> {
        for policy in policies {
            debug!(policy = policy.name(), action = ?ctx.action, "running tree policy");
            policy.check(self, ctx)?;
        }
        Ok(())
    }

    /// Adds a top-level node. Multiple roots are legal at the engine level;
    /// the domain wrappers keep their trees single-rooted.
    pub fn add_root(&mut self, payload: P) -> TreeResult<NodeId> {
        let step = match self.roots().last() {
            Some(last) => self.decode_step(&last.path) + 1,
            None => 1,
        };
        if step >= self.capacity() {
            return Err(TreeError::PathSpaceExhausted { depth: 1 });
        }
        let path = self.encode_step(step);
        Ok(self.insert_node(path, payload))
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        payload: P,
        policies: &[&dyn TreePolicy<P>],
    ) -> TreeResult<NodeId> {
        {
            let parent_node = self.require(parent)?;
            let ctx = MutationCheck {
                action: TreeAction::AddChild,
                node: Some(parent_node),
                payload: Some(&payload),
                target: None,
                position: None,
            };
            self.run_policies(policies, &ctx)?;
        }
        let parent_node = self.require(parent)?;
        let parent_path = parent_node.path.clone();
        let depth = parent_path.len() / self.steplen + 1;
        let step = match self.children_of_path(&parent_path).last() {
            Some(last) => self.decode_step(&last.path) + 1,
            None => 1,
        };
        if step >= self.capacity() {
            return Err(TreeError::PathSpaceExhausted { depth });
        }
        let path = format!("{}{}", parent_path, self.encode_step(step));
        if path.len() > MAX_PATH_BYTES {
            return Err(TreeError::PathSpaceExhausted { depth });
        }
        Ok(self.insert_node(path, payload))
    }

    pub fn add_sibling(
        &mut self,
        node: NodeId,
        position: Position,
        payload: P,
        policies: &[&dyn TreePolicy<P>],
    ) -> TreeResult<NodeId> {
        if position.is_child() {
            return Err(TreeError::InvalidPosition(position));
        }
        {
            let anchor = self.require(node)?;
            let ctx = MutationCheck {
                action: TreeAction::AddSibling,
                node: Some(anchor),
                payload: Some(&payload),
                target: None,
                position: Some(position),
            };
            self.run_policies(policies, &ctx)?;
        }
        let anchor = self.require(node)?;
        let parent_path = anchor.path[..anchor.path.len() - self.steplen].to_string();
        let depth = anchor.path.len() / self.steplen;
        let siblings: Vec<NodeId> = self
            .children_of_path(&parent_path)
            .iter()
            .map(|n| n.id)
            .collect();
        if siblings.len() as u64 + 1 >= self.capacity() {
            return Err(TreeError::PathSpaceExhausted { depth });
        }
        let anchor_idx = siblings
            .iter()
            .position(|&s| s == node)
            .ok_or(TreeError::NodeNotFound(node))?;
        let insert_idx = match position {
            Position::FirstSibling => 0,
            Position::Left => anchor_idx,
            Position::Right => anchor_idx + 1,
            Position::LastSibling => siblings.len(),
            Position::FirstChild | Position::LastChild => {
                return Err(TreeError::InvalidPosition(position))
            }
        };
        let id = self.insert_node(String::new(), payload);
        let mut order = siblings;
        order.insert(insert_idx, id);
        self.renumber_siblings(&parent_path, &order);
        Ok(id)
    }

    /// Relocates `node` (and its whole subtree) relative to `target`.
    pub fn move_node(
        &mut self,
        node: NodeId,
        target: NodeId,
        position: Position,
        policies: &[&dyn TreePolicy<P>],
    ) -> TreeResult<()> {
        {
            let moving = self.require(node)?;
            let target_node = self.require(target)?;
            if target_node.path.starts_with(&moving.path) {
                return Err(TreeError::CyclicMove);
            }
            let ctx = MutationCheck {
                action: TreeAction::Move,
                node: Some(moving),
                payload: None,
                target: Some(target_node),
                position: Some(position),
            };
            self.run_policies(policies, &ctx)?;
        }
        let moving_path = self.require(node)?.path.clone();
        let target_path = self.require(target)?.path.clone();
        let old_parent_path = moving_path[..moving_path.len() - self.steplen].to_string();
        let new_parent_path = if position.is_child() {
            target_path.clone()
        } else {
            target_path[..target_path.len() - self.steplen].to_string()
        };
        let depth = new_parent_path.len() / self.steplen + 1;

        // Validate capacity and path budget before touching anything.
        let same_parent = new_parent_path == old_parent_path;
        let destination_count = self.children_of_path(&new_parent_path).len();
        let destination_count = if same_parent {
            destination_count
        } else {
            destination_count + 1
        };
        if destination_count as u64 >= self.capacity() {
            return Err(TreeError::PathSpaceExhausted { depth });
        }
        let new_path_len = new_parent_path.len() + self.steplen;
        let deepest = self
            .descendants(node)
            .iter()
            .map(|n| n.path.len() - moving_path.len())
            .max()
            .unwrap_or(0);
        if new_path_len + deepest > MAX_PATH_BYTES {
            return Err(TreeError::PathSpaceExhausted { depth });
        }

        if same_parent {
            let mut order: Vec<NodeId> = self
                .children_of_path(&old_parent_path)
                .iter()
                .map(|n| n.id)
                .filter(|&id| id != node)
                .collect();
            let insert_idx = self.insertion_index(&order, target, position);
            order.insert(insert_idx, node);
            self.renumber_siblings(&old_parent_path, &order);
            return Ok(());
        }

        // Detach: close the gap among the old siblings. The moving subtree
        // keeps stale paths until it is renumbered into place below, so no
        // path lookups may happen in between.
        let old_order: Vec<NodeId> = self
            .children_of_path(&old_parent_path)
            .iter()
            .map(|n| n.id)
            .filter(|&id| id != node)
            .collect();
        self.renumber_siblings(&old_parent_path, &old_order);

        // The target's path may have changed during the detach renumbering.
        let new_parent_path = {
            let target_path = self.require(target)?.path.clone();
            if position.is_child() {
                target_path
            } else {
                target_path[..target_path.len() - self.steplen].to_string()
            }
        };
        let mut order: Vec<NodeId> = self
            .children_of_path(&new_parent_path)
            .iter()
            .map(|n| n.id)
            .collect();
        let insert_idx = self.insertion_index(&order, target, position);
        order.insert(insert_idx, node);
        self.renumber_siblings(&new_parent_path, &order);
        Ok(())
    }

    fn insertion_index(&self, order: &[NodeId], target: NodeId, position: Position) -> usize {
        match position {
            Position::FirstChild | Position::FirstSibling => 0,
            Position::LastChild | Position::LastSibling => order.len(),
            Position::Left => order
                .iter()
                .position(|&id| id == target)
                .unwrap_or(order.len()),
            Position::Right => order
                .iter()
                .position(|&id| id == target)
                .map(|i| i + 1)
                .unwrap_or(order.len()),
        }
    }

    /// Replaces a node's payload after running the update policies.
    pub fn update(
        &mut self,
        node: NodeId,
        payload: P,
        policies: &[&dyn TreePolicy<P>],
    ) -> TreeResult<()> {
        {
            let existing = self.require(node)?;
            let ctx = MutationCheck {
                action: TreeAction::Update,
                node: Some(existing),
                payload: Some(&payload),
                target: None,
                position: None,
            };
            self.run_policies(policies, &ctx)?;
        }
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(TreeError::NodeNotFound(node))?;
        entry.payload = payload;
        entry.modified = Utc::now();
        Ok(())
    }

    /// Non-structural payload edit; bypasses policies on purpose.
    pub(crate) fn modify<F>(&mut self, node: NodeId, edit: F) -> TreeResult<()>
    where
        F: FnOnce(&mut P),
    {
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(TreeError::NodeNotFound(node))?;
        edit(&mut entry.payload);
        entry.modified = Utc::now();
        Ok(())
    }

    /// Removes `node` and its whole subtree, returning the removed ids in
    /// tree order.
    pub fn remove(&mut self, node: NodeId) -> TreeResult<Vec<NodeId>> {
        let prefix = self.require(node)?.path.clone();
        let parent_path = prefix[..prefix.len() - self.steplen].to_string();
        let mut doomed: Vec<(String, NodeId)> = self
            .nodes
            .values()
            .filter(|n| n.path.starts_with(&prefix))
            .map(|n| (n.path.clone(), n.id))
            .collect();
        doomed.sort();
        let removed: Vec<NodeId> = doomed.into_iter().map(|(_, id)| id).collect();
        for id in &removed {
            self.nodes.shift_remove(id);
        }
        let order: Vec<NodeId> = self
            .children_of_path(&parent_path)
            .iter()
            .map(|n| n.id)
            .collect();
        self.renumber_siblings(&parent_path, &order);
        Ok(removed)
    }

    fn insert_node(&mut self, path: String, payload: P) -> NodeId {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.nodes.insert(
            id,
            TreeNode {
                id,
                path,
                payload,
                created: now,
                modified: now,
            },
        );
        id
    }

    fn decode_step(&self, path: &str) -> u64 {
        let step = &path[path.len() - self.steplen..];
        let radix = PATH_ALPHABET.len() as u64;
        step.bytes().fold(0u64, |acc, b| {
            let digit = PATH_ALPHABET.iter().position(|&a| a == b).unwrap_or(0) as u64;
            acc * radix + digit
        })
    }

    /// Rewrites the paths of `order` (children of `parent_path`) so their
    /// steps run 1..n in the given order, carrying each subtree along.
    ///
    /// All prefix rewrites are computed against a snapshot of the current
    /// paths, so shifting a run of siblings cannot cascade into itself.
    fn renumber_siblings(&mut self, parent_path: &str, order: &[NodeId]) {
        let mut prefix_map: Vec<(String, String)> = Vec::new();
        let mut placeholders: Vec<(NodeId, String)> = Vec::new();
        for (idx, id) in order.iter().enumerate() {
            let new_path = format!("{}{}", parent_path, self.encode_step(idx as u64 + 1));
            let old_path = match self.nodes.get(id) {
                Some(n) => n.path.clone(),
                None => continue,
            };
            if old_path.is_empty() {
                placeholders.push((*id, new_path));
            } else if old_path != new_path {
                prefix_map.push((old_path, new_path));
            }
        }
        if !prefix_map.is_empty() {
            for entry in self.nodes.values_mut() {
                for (old, new) in &prefix_map {
                    if entry.path.starts_with(old.as_str()) {
                        entry.path = format!("{}{}", new, &entry.path[old.len()..]);
                        break;
                    }
                }
            }
        }
        for (id, new_path) in placeholders {
            if let Some(entry) = self.nodes.get_mut(&id) {
                entry.path = new_path;
            }
        }
    }
}
