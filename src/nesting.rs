//! MACE nesting validation
//!
//! Concurrent arcs should nest like balanced parentheses: the last arc to
//! hook should be the first to resolve. This validator walks the story
//! tree's depth-2 branches, numbers the leaf nodes left to right with one
//! shared counter, collects where each arc's milestones land, and runs two
//! checks: each arc's milestones must appear in canonical order, and no two
//! arcs' hook/resolution spans may cross (sharing an entry or exit point is
//! forgiven).

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::arc::ArcId;
use crate::arc_elements::ArcElementKind;
use crate::outline::Outline;
use crate::tree::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NestingErrorKind {
    ArcSequence,
    ResolutionOrder,
}

impl NestingErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            NestingErrorKind::ArcSequence => "nest_arc_seq",
            NestingErrorKind::ResolutionOrder => "nest_reso_error",
        }
    }
}

/// One whole-outline finding: the message plus everything implicated.
#[derive(Clone, Debug, Serialize)]
pub struct NestingFinding {
    pub message: String,
    pub arcs: Vec<ArcId>,
    /// Implicated story nodes, in story-tree order.
    pub story_nodes: Vec<NodeId>,
}

/// Mapping from error label to finding; empty means the outline nests
/// cleanly.
pub type NestingReport = IndexMap<NestingErrorKind, NestingFinding>;

/// Reviews the story tree and validates that associated arc elements are
/// nested appropriately.
pub fn validate_nesting(outline: &Outline) -> NestingReport {
    let root = outline.story.root();

    // Milestone placements per arc, keyed by the shared leaf counter.
    let mut leaf_seq: usize = 0;
    let mut placements: IndexMap<ArcId, Vec<(ArcElementKind, usize)>> = IndexMap::new();
    for branch in outline.story.children(root) {
        collect_branch(outline, branch.id, &mut leaf_seq, &mut placements);
    }

    let mut arcs_out_of_sequence: Vec<ArcId> = Vec::new();
    let mut entry_exit: IndexMap<ArcId, (usize, usize)> = IndexMap::new();
    for (arc_id, found) in &placements {
        // Last placement of a milestone kind wins, as the outline reads.
        let mut positions: IndexMap<ArcElementKind, usize> = IndexMap::new();
        for (kind, seq) in found {
            positions.insert(*kind, *seq);
        }
        if let (Some(&entry), Some(&exit)) = (
            positions.get(&ArcElementKind::Hook),
            positions.get(&ArcElementKind::Resolution),
        ) {
            entry_exit.insert(*arc_id, (entry, exit));
        }
        let mut ordered: Vec<(ArcElementKind, usize)> = positions.into_iter().collect();
        ordered.sort_by_key(|(_, seq)| *seq);
        let mut cursor = 0u8;
        for (kind, _) in ordered {
            let milestone_seq = kind.milestone_seq().unwrap_or(0);
            if cursor > milestone_seq {
                debug!(arc = %arc_id, "arc milestones regress against the leaf order");
                arcs_out_of_sequence.push(*arc_id);
                break;
            }
            cursor = milestone_seq;
        }
    }

    // Entry order forward, exit order backward; properly nested arcs meet
    // their own reflection. A pairing of two different arcs is legal only
    // when one span strictly contains the other or they share an endpoint.
    let mut conflicted: Vec<ArcId> = Vec::new();
    if !entry_exit.is_empty() {
        let mut by_entry: Vec<ArcId> = entry_exit.keys().copied().collect();
        by_entry.sort_by_key(|arc| entry_exit[arc].0);
        let mut by_exit: Vec<ArcId> = entry_exit.keys().copied().collect();
        by_exit.sort_by(|a, b| entry_exit[b].1.cmp(&entry_exit[a].1));
        for (idx, entering) in by_entry.iter().enumerate() {
            let exiting = by_exit[idx];
            if *entering == exiting {
                continue;
            }
            let (en_entry, en_exit) = entry_exit[entering];
            let (ex_entry, ex_exit) = entry_exit[&exiting];
            if en_entry == ex_entry || en_exit == ex_exit {
                debug!("arcs share an entry or exit point; nesting conflict ignored");
                continue;
            }
            let properly_nested = (en_entry < ex_entry && en_exit > ex_exit)
                || (en_entry > ex_entry && en_exit < ex_exit);
            if !properly_nested {
                debug!(entering = %entering, exiting = %exiting, "arc spans cross");
                if !conflicted.contains(entering) {
                    conflicted.push(*entering);
                }
                if !conflicted.contains(&exiting) {
                    conflicted.push(exiting);
                }
            }
        }
    }

    let mut report = NestingReport::new();
    if !arcs_out_of_sequence.is_empty() {
        let mut story_nodes = Vec::new();
        for node in outline.story.tree().nodes_ordered() {
            if node.id == root {
                continue;
            }
            let linked = outline.arc_elements_for_story_node(node.id);
            if linked
                .iter()
                .any(|(arc_id, _)| arcs_out_of_sequence.contains(arc_id))
            {
                story_nodes.push(node.id);
            }
        }
        report.insert(
            NestingErrorKind::ArcSequence,
            NestingFinding {
                message: "Arc element milestones are out of sequence".to_string(),
                arcs: arcs_out_of_sequence,
                story_nodes,
            },
        );
    }
    if !conflicted.is_empty() {
        let mut story_nodes = Vec::new();
        for node in outline.story.tree().nodes_ordered() {
            let linked = outline.arc_elements_for_story_node(node.id);
            if linked.iter().any(|(arc_id, element)| {
                element.payload.kind == ArcElementKind::Resolution && conflicted.contains(arc_id)
            }) {
                story_nodes.push(node.id);
            }
        }
        let mut by_exit = conflicted;
        by_exit.sort_by_key(|arc| entry_exit.get(arc).map(|(_, exit)| *exit).unwrap_or(0));
        report.insert(
            NestingErrorKind::ResolutionOrder,
            NestingFinding {
                message: "Arcs should resolve in the opposite order that they were introduced"
                    .to_string(),
                arcs: by_exit,
                story_nodes,
            },
        );
    }
    report
}

/// Depth-first walk below one depth-2 branch. Only leaf nodes advance the
/// counter and only their linked milestones are collected; elements placed
/// on container nodes do not participate.
fn collect_branch(
    outline: &Outline,
    node: NodeId,
    leaf_seq: &mut usize,
    placements: &mut IndexMap<ArcId, Vec<(ArcElementKind, usize)>>,
) {
    for child in outline.story.children(node) {
        if outline.story.child_count(child.id) > 0 {
            collect_branch(outline, child.id, leaf_seq, placements);
        } else {
            for (arc_id, element) in outline.arc_elements_for_story_node(child.id) {
                if element.payload.kind.is_milestone() {
                    debug!(
                        kind = %element.payload.kind,
                        seq = *leaf_seq,
                        "milestone collected for nesting check"
                    );
                    placements
                        .entry(arc_id)
                        .or_default()
                        .push((element.payload.kind, *leaf_seq));
                }
            }
            *leaf_seq += 1;
        }
    }
}
