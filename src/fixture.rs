//! YAML outline fixtures
//!
//! A fixture file describes one outline: its cast, its arcs (templated
//! automatically, with optional extra beats and try/fails), the story tree,
//! and the links between arc elements and story nodes. Loading replays the
//! file through the validated mutation APIs, so a fixture that violates the
//! structural rules fails to load with the violation attached.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::arc::{ArcId, MaceType};
use crate::arc_elements::ArcElementKind;
use crate::outline::OutlineId;
use crate::story::StoryElement;
use crate::story_elements::StoryElementKind;
use crate::tree::NodeId;
use crate::workspace::{CharacterRoles, Workspace};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutlineFixture {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub characters: Vec<CharacterFixture>,
    #[serde(default)]
    pub locations: Vec<LocationFixture>,
    #[serde(default)]
    pub arcs: Vec<ArcFixture>,
    #[serde(default)]
    pub story: Vec<StoryNodeFixture>,
    #[serde(default)]
    pub links: Vec<LinkFixture>,
    #[serde(default)]
    pub cast: Vec<CastFixture>,
}

fn default_user() -> String {
    "author".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacterFixture {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationFixture {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArcFixture {
    pub name: String,
    pub mace: MaceType,
    /// Extra non-milestone elements layered onto the template.
    #[serde(default)]
    pub elements: Vec<ArcElementFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArcElementFixture {
    pub kind: ArcElementKind,
    /// Milestone code (e.g. `mile_mid`) or the key of an earlier element.
    pub parent: String,
    #[serde(default)]
    pub key: Option<String>,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryNodeFixture {
    pub kind: StoryElementKind,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<StoryNodeFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkFixture {
    /// Arc name.
    pub arc: String,
    /// Milestone code or element key within that arc.
    pub element: String,
    /// Story node key.
    pub story: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CastFixture {
    /// Story node key.
    pub story: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Reads and replays a fixture file.
pub fn load_outline(path: &Path) -> Result<(Workspace, OutlineId)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let fixture: OutlineFixture = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse fixture {}", path.display()))?;
    build(&fixture)
}

/// Replays a fixture through the validated APIs.
pub fn build(fixture: &OutlineFixture) -> Result<(Workspace, OutlineId)> {
    let mut workspace = Workspace::new();
    let outline_id =
        workspace.create_outline(&fixture.user, &fixture.title, fixture.description.as_deref());

    let mut character_instances = HashMap::new();
    for character in &fixture.characters {
        let definition = workspace.create_character(
            &fixture.user,
            &character.name,
            character.description.as_deref(),
        );
        let roles = parse_roles(&character.roles)
            .with_context(|| format!("character '{}'", character.name))?;
        let instance = workspace
            .instantiate_character(definition, outline_id, roles)
            .with_context(|| format!("character '{}'", character.name))?;
        character_instances.insert(character.name.clone(), instance);
    }

    let mut location_instances = HashMap::new();
    for location in &fixture.locations {
        let definition = workspace.create_location(
            &fixture.user,
            &location.name,
            location.description.as_deref(),
        );
        let instance = workspace
            .instantiate_location(definition, outline_id)
            .with_context(|| format!("location '{}'", location.name))?;
        location_instances.insert(location.name.clone(), instance);
    }

    let mut arcs: HashMap<String, ArcId> = HashMap::new();
    let mut arc_element_keys: HashMap<(String, String), NodeId> = HashMap::new();
    for arc_fixture in &fixture.arcs {
        let outline = workspace.outline_mut(outline_id)?;
        let arc_id = outline
            .create_arc(arc_fixture.mace, &arc_fixture.name)
            .with_context(|| format!("arc '{}'", arc_fixture.name))?;
        arcs.insert(arc_fixture.name.clone(), arc_id);
        for element in &arc_fixture.elements {
            let outline = workspace.outline_mut(outline_id)?;
            let arc = outline
                .arc_mut(arc_id)
                .ok_or_else(|| anyhow!("arc '{}' vanished", arc_fixture.name))?;
            let parent = resolve_arc_element(
                arc,
                &arc_fixture.name,
                &element.parent,
                &arc_element_keys,
            )?;
            let node = arc
                .add_child(parent, element.kind, &element.description)
                .with_context(|| {
                    format!("element under '{}' in arc '{}'", element.parent, arc_fixture.name)
                })?;
            if let Some(key) = &element.key {
                arc_element_keys.insert((arc_fixture.name.clone(), key.clone()), node);
            }
        }
    }

    let mut story_keys: HashMap<String, NodeId> = HashMap::new();
    {
        let outline = workspace.outline_mut(outline_id)?;
        let root = outline.story.root();
        for node in &fixture.story {
            build_story_node(outline, root, node, &mut story_keys)?;
        }
    }

    for link in &fixture.links {
        let arc_id = *arcs
            .get(&link.arc)
            .ok_or_else(|| anyhow!("link references unknown arc '{}'", link.arc))?;
        let element = {
            let outline = workspace.outline(outline_id)?;
            let arc = outline
                .arc(arc_id)
                .ok_or_else(|| anyhow!("arc '{}' vanished", link.arc))?;
            resolve_arc_element(arc, &link.arc, &link.element, &arc_element_keys)?
        };
        let story_node = *story_keys
            .get(&link.story)
            .ok_or_else(|| anyhow!("link references unknown story key '{}'", link.story))?;
        for name in &link.characters {
            let instance = *character_instances
                .get(name)
                .ok_or_else(|| anyhow!("link references unknown character '{name}'"))?;
            workspace
                .add_arc_element_character(outline_id, arc_id, element, instance)
                .with_context(|| format!("associating '{name}' with arc '{}'", link.arc))?;
        }
        for name in &link.locations {
            let instance = *location_instances
                .get(name)
                .ok_or_else(|| anyhow!("link references unknown location '{name}'"))?;
            workspace
                .add_arc_element_location(outline_id, arc_id, element, instance)
                .with_context(|| format!("associating '{name}' with arc '{}'", link.arc))?;
        }
        let handle = workspace.story_handle(outline_id, story_node)?;
        workspace
            .link_arc_element(outline_id, arc_id, element, Some(handle))
            .with_context(|| format!("linking '{}' of arc '{}'", link.element, link.arc))?;
    }

    for cast in &fixture.cast {
        let story_node = *story_keys
            .get(&cast.story)
            .ok_or_else(|| anyhow!("cast references unknown story key '{}'", cast.story))?;
        for name in &cast.characters {
            let instance = *character_instances
                .get(name)
                .ok_or_else(|| anyhow!("cast references unknown character '{name}'"))?;
            workspace.add_story_node_character(outline_id, story_node, instance)?;
        }
        for name in &cast.locations {
            let instance = *location_instances
                .get(name)
                .ok_or_else(|| anyhow!("cast references unknown location '{name}'"))?;
            workspace.add_story_node_location(outline_id, story_node, instance)?;
        }
    }

    Ok((workspace, outline_id))
}

fn parse_roles(roles: &[String]) -> Result<CharacterRoles> {
    let mut parsed = CharacterRoles::default();
    for role in roles {
        match role.as_str() {
            "main" => parsed.main_character = true,
            "pov" => parsed.pov_character = true,
            "protagonist" => parsed.protagonist = true,
            "antagonist" => parsed.antagonist = true,
            "obstacle" => parsed.obstacle = true,
            "villain" => parsed.villain = true,
            other => bail!("unknown character role '{other}'"),
        }
    }
    Ok(parsed)
}

fn resolve_arc_element(
    arc: &crate::arc::Arc,
    arc_name: &str,
    reference: &str,
    keys: &HashMap<(String, String), NodeId>,
) -> Result<NodeId> {
    if let Some(node) = keys.get(&(arc_name.to_string(), reference.to_string())) {
        return Ok(*node);
    }
    if let Ok(kind) = reference.parse::<ArcElementKind>() {
        if let Some(node) = arc.element_of_kind(kind) {
            return Ok(node.id);
        }
    }
    Err(anyhow!(
        "'{reference}' does not name an element of arc '{arc_name}'"
    ))
}

fn build_story_node(
    outline: &mut crate::outline::Outline,
    parent: NodeId,
    fixture: &StoryNodeFixture,
    story_keys: &mut HashMap<String, NodeId>,
) -> Result<()> {
    let mut element = StoryElement::new(fixture.kind);
    element.name = fixture.name.clone();
    element.description = fixture.description.clone();
    let node = outline
        .story
        .add_child(parent, element)
        .with_context(|| format!("story node '{}'", fixture.key.as_deref().unwrap_or("?")))?;
    if let Some(key) = &fixture.key {
        if story_keys.insert(key.clone(), node).is_some() {
            bail!("duplicate story key '{key}'");
        }
    }
    for child in &fixture.children {
        build_story_node(outline, node, child, story_keys)?;
    }
    Ok(())
}
