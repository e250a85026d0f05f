//! Impact rating
//!
//! Measures how powerful a moment in the story is by looking at the arc
//! elements placed on it, then letting that force echo up and down the
//! direct ancestor/descendant line with fast generational decay. Siblings
//! never contribute. The hidden root always scores zero.

use indexmap::IndexMap;
use tracing::debug;

use crate::arc_elements::ArcElementKind;
use crate::outline::Outline;
use crate::tree::NodeId;

const BASE_IMPACT: f64 = 0.5;
const MILE_IMPACT: f64 = 2.0;
const BEAT_IMPACT: f64 = 0.5;
const TF_IMPACT: f64 = 0.5;
const MILE_CHILD_BONUS: f64 = 0.5;
const SAME_MILE_BONUS: f64 = 0.5;

/// Per-generation decay factors for the bleed.
const MILE_BLEED: f64 = 0.5;
const TF_BEAT_BLEED: f64 = 0.25;

/// Computes the impact rating for one story node.
pub fn impact_rating(outline: &Outline, node: NodeId) -> f64 {
    let depth = outline.story.depth(node);
    if depth <= 1 {
        return 0.0;
    }
    let (base, add, mile) = local_impact(outline, node);
    let local = base + add + mile;
    debug!(local, "local impact computed");

    let mut inherited = 0.0;
    let mut related: Vec<NodeId> = outline
        .story
        .ancestors(node)
        .iter()
        .filter(|n| outline.story.depth(n.id) > 1)
        .map(|n| n.id)
        .collect();
    related.extend(outline.story.descendants(node).iter().map(|n| n.id));
    for relative in related {
        let relative_depth = outline.story.depth(relative);
        let (_, mut add, mut mile) = local_impact(outline, relative);
        if add + mile <= 0.0 {
            continue;
        }
        let generations = depth.abs_diff(relative_depth);
        for _ in 0..generations {
            add *= TF_BEAT_BLEED;
            mile *= MILE_BLEED;
        }
        debug!(add, mile, generations, "impact bleed from relative");
        inherited += add + mile;
    }
    local + inherited
}

/// The (base, additive, milestone) impact triple from the arc elements
/// directly placed on a node. The base floor is returned separately so the
/// bleed can ignore it.
fn local_impact(outline: &Outline, node: NodeId) -> (f64, f64, f64) {
    let mut add = 0.0;
    let mut mile = 0.0;
    let mut kind_counts: IndexMap<ArcElementKind, usize> = IndexMap::new();
    for (arc_id, element) in outline.arc_elements_for_story_node(node) {
        *kind_counts.entry(element.payload.kind).or_insert(0) += 1;
        if element.payload.kind.is_milestone() {
            mile += MILE_IMPACT;
            continue;
        }
        let arc = match outline.arc(arc_id) {
            Some(arc) => arc,
            None => continue,
        };
        let parent_is_milestone = arc
            .tree()
            .parent(element.id)
            .map(|p| p.payload.kind.is_milestone())
            .unwrap_or(false);
        if parent_is_milestone {
            add += MILE_CHILD_BONUS;
        }
        match element.payload.kind {
            ArcElementKind::Beat => add += BEAT_IMPACT,
            ArcElementKind::TryFail => add += TF_IMPACT,
            _ => {}
        }
    }
    for (kind, count) in kind_counts {
        if kind.is_milestone() && count > 1 {
            add += (count - 1) as f64 * SAME_MILE_BONUS;
        }
    }
    (BASE_IMPACT, add, mile)
}
