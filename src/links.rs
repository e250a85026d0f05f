//! Cross-link propagation
//!
//! Arc elements and story nodes share their casts: whenever an arc element
//! is linked to a story node, or gains characters/locations while linked,
//! the story node's association sets are extended with the arc element's.
//! Propagation is one-directional (arc to story) and additive only;
//! removing an association on the arc side never removes it on the story
//! side. Same-outline membership is checked before anything is written.

use tracing::debug;

use crate::arc::ArcId;
use crate::arc_elements::ArcElementKind;
use crate::errors::{StructureError, TreeResult};
use crate::outline::{Outline, OutlineId, StoryNodeHandle};
use crate::tree::NodeId;
use crate::workspace::{CharacterInstance, LocationInstance};

pub(crate) fn ensure_same_outline_character(
    outline: OutlineId,
    instance: &CharacterInstance,
) -> Result<(), StructureError> {
    if instance.outline != outline {
        return Err(StructureError::CrossOutlineCharacter);
    }
    Ok(())
}

pub(crate) fn ensure_same_outline_location(
    outline: OutlineId,
    instance: &LocationInstance,
) -> Result<(), StructureError> {
    if instance.outline != outline {
        return Err(StructureError::CrossOutlineLocation);
    }
    Ok(())
}

pub(crate) fn ensure_same_outline_link(
    outline: OutlineId,
    handle: StoryNodeHandle,
) -> Result<(), StructureError> {
    if handle.outline != outline {
        return Err(StructureError::CrossOutlineLink);
    }
    Ok(())
}

/// Pushes an arc element's characters and locations into its linked story
/// node. A no-op for the hidden root and for unlinked elements.
pub(crate) fn propagate_arc_associations(
    outline: &mut Outline,
    arc: ArcId,
    element: NodeId,
) -> TreeResult<()> {
    let (kind, story_node, characters, locations) = match outline
        .arc(arc)
        .and_then(|a| a.tree().get(element))
    {
        Some(node) => (
            node.payload.kind,
            node.payload.story_node,
            node.payload.characters.clone(),
            node.payload.locations.clone(),
        ),
        None => return Ok(()),
    };
    if kind == ArcElementKind::Root {
        return Ok(());
    }
    let story_node = match story_node {
        Some(story_node) => story_node,
        None => return Ok(()),
    };
    debug!(
        characters = characters.len(),
        locations = locations.len(),
        "propagating arc associations to story node"
    );
    outline.story.modify(story_node, |payload| {
        payload.characters.extend(characters);
        payload.locations.extend(locations);
    })
}

/// Strips a character instance from every node set in the outline, used
/// when the instance record itself is deleted.
pub(crate) fn purge_character(outline: &mut Outline, instance: uuid::Uuid) {
    let story_nodes: Vec<NodeId> = outline
        .story
        .tree()
        .iter()
        .filter(|n| n.payload.characters.contains(&instance))
        .map(|n| n.id)
        .collect();
    for node in story_nodes {
        let _ = outline.story.modify(node, |payload| {
            payload.characters.shift_remove(&instance);
        });
    }
    for arc in outline.arcs_mut() {
        let elements: Vec<NodeId> = arc
            .tree()
            .iter()
            .filter(|n| n.payload.characters.contains(&instance))
            .map(|n| n.id)
            .collect();
        for element in elements {
            let _ = arc.modify_element(element, |payload| {
                payload.characters.shift_remove(&instance);
            });
        }
    }
}

/// Location counterpart of `purge_character`.
pub(crate) fn purge_location(outline: &mut Outline, instance: uuid::Uuid) {
    let story_nodes: Vec<NodeId> = outline
        .story
        .tree()
        .iter()
        .filter(|n| n.payload.locations.contains(&instance))
        .map(|n| n.id)
        .collect();
    for node in story_nodes {
        let _ = outline.story.modify(node, |payload| {
            payload.locations.shift_remove(&instance);
        });
    }
    for arc in outline.arcs_mut() {
        let elements: Vec<NodeId> = arc
            .tree()
            .iter()
            .filter(|n| n.payload.locations.contains(&instance))
            .map(|n| n.id)
            .collect();
        for element in elements {
            let _ = arc.modify_element(element, |payload| {
                payload.locations.shift_remove(&instance);
            });
        }
    }
}
