//! The workspace registry
//!
//! Top-level owner of outlines, reusable character/location definitions,
//! series and the per-outline instance records. Cross-entity mutations
//! (instantiation, associations, arc-to-story links) go through here so
//! same-outline membership can be checked against the instance registry
//! before any tree is touched.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;
use uuid::Uuid;

use crate::arc::ArcId;
use crate::errors::{WorkspaceError, WorkspaceResult};
use crate::links;
use crate::outline::{Outline, OutlineId, StoryNodeHandle};
use crate::tree::NodeId;

pub type CharacterId = Uuid;
pub type LocationId = Uuid;
pub type SeriesId = Uuid;
pub type CharacterInstanceId = Uuid;
pub type LocationInstanceId = Uuid;

/// Reusable character definition, usable across outlines via instances.
#[derive(Clone, Debug)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub description: Option<String>,
    pub series: IndexSet<SeriesId>,
    pub tags: IndexSet<String>,
    pub user: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Reusable location definition.
#[derive(Clone, Debug)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: Option<String>,
    pub series: IndexSet<SeriesId>,
    pub tags: IndexSet<String>,
    pub user: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Container for outlines and reusable definitions that belong together.
#[derive(Clone, Debug)]
pub struct Series {
    pub id: SeriesId,
    pub title: String,
    pub description: Option<String>,
    pub tags: IndexSet<String>,
    pub user: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Role flags a character can play within one outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharacterRoles {
    pub main_character: bool,
    pub pov_character: bool,
    pub protagonist: bool,
    pub antagonist: bool,
    pub obstacle: bool,
    pub villain: bool,
}

impl CharacterRoles {
    /// Roles that count toward the length estimate. Obstacles do not.
    pub fn is_pivotal(self) -> bool {
        self.main_character
            || self.pov_character
            || self.protagonist
            || self.antagonist
            || self.villain
    }
}

/// Per-outline usage record of a character. This, never the bare
/// definition, is what gets linked into tree nodes.
#[derive(Clone, Debug)]
pub struct CharacterInstance {
    pub id: CharacterInstanceId,
    pub character: CharacterId,
    pub outline: OutlineId,
    pub roles: CharacterRoles,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Per-outline usage record of a location.
#[derive(Clone, Debug)]
pub struct LocationInstance {
    pub id: LocationInstanceId,
    pub location: LocationId,
    pub outline: OutlineId,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// The registry itself.
#[derive(Debug, Default)]
pub struct Workspace {
    outlines: IndexMap<OutlineId, Outline>,
    characters: IndexMap<CharacterId, Character>,
    locations: IndexMap<LocationId, Location>,
    series: IndexMap<SeriesId, Series>,
    character_instances: IndexMap<CharacterInstanceId, CharacterInstance>,
    location_instances: IndexMap<LocationInstanceId, LocationInstance>,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace::default()
    }

    pub fn create_series(
        &mut self,
        user: &str,
        title: &str,
        description: Option<&str>,
    ) -> SeriesId {
        let now = Utc::now();
        let series = Series {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.map(str::to_string),
            tags: IndexSet::new(),
            user: user.to_string(),
            created: now,
            modified: now,
        };
        let id = series.id;
        self.series.insert(id, series);
        id
    }

    pub fn create_character(
        &mut self,
        user: &str,
        name: &str,
        description: Option<&str>,
    ) -> CharacterId {
        let now = Utc::now();
        let character = Character {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            series: IndexSet::new(),
            tags: IndexSet::new(),
            user: user.to_string(),
            created: now,
            modified: now,
        };
        let id = character.id;
        self.characters.insert(id, character);
        id
    }

    pub fn create_location(
        &mut self,
        user: &str,
        name: &str,
        description: Option<&str>,
    ) -> LocationId {
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            series: IndexSet::new(),
            tags: IndexSet::new(),
            user: user.to_string(),
            created: now,
            modified: now,
        };
        let id = location.id;
        self.locations.insert(id, location);
        id
    }

    /// Creates an outline; its story tree root comes into existence with it.
    pub fn create_outline(
        &mut self,
        user: &str,
        title: &str,
        description: Option<&str>,
    ) -> OutlineId {
        let outline = Outline::new(user, title, description);
        let id = outline.id;
        debug!(outline = title, "outline created with story root");
        self.outlines.insert(id, outline);
        id
    }

    /// Removes an outline and every instance record tied to it.
    pub fn delete_outline(&mut self, id: OutlineId) -> WorkspaceResult<Outline> {
        let outline = self
            .outlines
            .shift_remove(&id)
            .ok_or(WorkspaceError::OutlineNotFound(id))?;
        self.character_instances.retain(|_, inst| inst.outline != id);
        self.location_instances.retain(|_, inst| inst.outline != id);
        Ok(outline)
    }

    pub fn outline(&self, id: OutlineId) -> WorkspaceResult<&Outline> {
        self.outlines
            .get(&id)
            .ok_or(WorkspaceError::OutlineNotFound(id))
    }

    pub fn outline_mut(&mut self, id: OutlineId) -> WorkspaceResult<&mut Outline> {
        self.outlines
            .get_mut(&id)
            .ok_or(WorkspaceError::OutlineNotFound(id))
    }

    pub fn outlines(&self) -> impl Iterator<Item = &Outline> {
        self.outlines.values()
    }

    pub fn character(&self, id: CharacterId) -> WorkspaceResult<&Character> {
        self.characters
            .get(&id)
            .ok_or(WorkspaceError::CharacterNotFound(id))
    }

    pub fn location(&self, id: LocationId) -> WorkspaceResult<&Location> {
        self.locations
            .get(&id)
            .ok_or(WorkspaceError::LocationNotFound(id))
    }

    pub fn series_entry(&self, id: SeriesId) -> WorkspaceResult<&Series> {
        self.series.get(&id).ok_or(WorkspaceError::SeriesNotFound(id))
    }

    pub fn add_character_to_series(
        &mut self,
        character: CharacterId,
        series: SeriesId,
    ) -> WorkspaceResult<()> {
        if !self.series.contains_key(&series) {
            return Err(WorkspaceError::SeriesNotFound(series));
        }
        let record = self
            .characters
            .get_mut(&character)
            .ok_or(WorkspaceError::CharacterNotFound(character))?;
        record.series.insert(series);
        record.modified = Utc::now();
        Ok(())
    }

    pub fn add_location_to_series(
        &mut self,
        location: LocationId,
        series: SeriesId,
    ) -> WorkspaceResult<()> {
        if !self.series.contains_key(&series) {
            return Err(WorkspaceError::SeriesNotFound(series));
        }
        let record = self
            .locations
            .get_mut(&location)
            .ok_or(WorkspaceError::LocationNotFound(location))?;
        record.series.insert(series);
        record.modified = Utc::now();
        Ok(())
    }

    /// Files an outline under a series, or pulls it back out with `None`.
    pub fn assign_outline_to_series(
        &mut self,
        outline: OutlineId,
        series: Option<SeriesId>,
    ) -> WorkspaceResult<()> {
        if let Some(series) = series {
            if !self.series.contains_key(&series) {
                return Err(WorkspaceError::SeriesNotFound(series));
            }
        }
        let record = self
            .outlines
            .get_mut(&outline)
            .ok_or(WorkspaceError::OutlineNotFound(outline))?;
        record.series = series;
        record.modified = Utc::now();
        Ok(())
    }

    /// Creates a usage record of a character in an outline. Unique per
    /// (character, outline) pair.
    pub fn instantiate_character(
        &mut self,
        character: CharacterId,
        outline: OutlineId,
        roles: CharacterRoles,
    ) -> WorkspaceResult<CharacterInstanceId> {
        let name = self.character(character)?.name.clone();
        self.outline(outline)?;
        if self
            .character_instances
            .values()
            .any(|inst| inst.character == character && inst.outline == outline)
        {
            return Err(WorkspaceError::DuplicateInstance { name });
        }
        let now = Utc::now();
        let instance = CharacterInstance {
            id: Uuid::new_v4(),
            character,
            outline,
            roles,
            created: now,
            modified: now,
        };
        let id = instance.id;
        self.character_instances.insert(id, instance);
        Ok(id)
    }

    /// Creates a usage record of a location in an outline. Unique per
    /// (location, outline) pair.
    pub fn instantiate_location(
        &mut self,
        location: LocationId,
        outline: OutlineId,
    ) -> WorkspaceResult<LocationInstanceId> {
        let name = self.location(location)?.name.clone();
        self.outline(outline)?;
        if self
            .location_instances
            .values()
            .any(|inst| inst.location == location && inst.outline == outline)
        {
            return Err(WorkspaceError::DuplicateInstance { name });
        }
        let now = Utc::now();
        let instance = LocationInstance {
            id: Uuid::new_v4(),
            location,
            outline,
            created: now,
            modified: now,
        };
        let id = instance.id;
        self.location_instances.insert(id, instance);
        Ok(id)
    }

    pub fn character_instance(
        &self,
        id: CharacterInstanceId,
    ) -> WorkspaceResult<&CharacterInstance> {
        self.character_instances
            .get(&id)
            .ok_or(WorkspaceError::CharacterInstanceNotFound(id))
    }

    pub fn location_instance(&self, id: LocationInstanceId) -> WorkspaceResult<&LocationInstance> {
        self.location_instances
            .get(&id)
            .ok_or(WorkspaceError::LocationInstanceNotFound(id))
    }

    /// Deletes the instance record and strips it from every node in its
    /// outline.
    pub fn remove_character_instance(&mut self, id: CharacterInstanceId) -> WorkspaceResult<()> {
        let instance = self
            .character_instances
            .shift_remove(&id)
            .ok_or(WorkspaceError::CharacterInstanceNotFound(id))?;
        if let Ok(outline) = self.outline_mut(instance.outline) {
            links::purge_character(outline, id);
        }
        Ok(())
    }

    /// Location counterpart of `remove_character_instance`.
    pub fn remove_location_instance(&mut self, id: LocationInstanceId) -> WorkspaceResult<()> {
        let instance = self
            .location_instances
            .shift_remove(&id)
            .ok_or(WorkspaceError::LocationInstanceNotFound(id))?;
        if let Ok(outline) = self.outline_mut(instance.outline) {
            links::purge_location(outline, id);
        }
        Ok(())
    }

    /// Word-count heuristic: ((pivotal characters + locations) * 750)
    /// * (1.5 * arcs).
    pub fn length_estimate(&self, outline: OutlineId) -> WorkspaceResult<f64> {
        let record = self.outline(outline)?;
        let characters = self
            .character_instances
            .values()
            .filter(|inst| inst.outline == outline && inst.roles.is_pivotal())
            .count();
        let locations = self
            .location_instances
            .values()
            .filter(|inst| inst.outline == outline)
            .count();
        let arcs = record.arc_count();
        Ok(((characters + locations) as f64 * 750.0) * (1.5 * arcs as f64))
    }

    /// A linkable reference to a story node of the given outline.
    pub fn story_handle(
        &self,
        outline: OutlineId,
        node: NodeId,
    ) -> WorkspaceResult<StoryNodeHandle> {
        self.outline(outline)?.story_handle(node)
    }

    /// Links (or unlinks, with `None`) an arc element to a story node and
    /// propagates the element's cast to it.
    pub fn link_arc_element(
        &mut self,
        outline: OutlineId,
        arc: ArcId,
        element: NodeId,
        story: Option<StoryNodeHandle>,
    ) -> WorkspaceResult<()> {
        let record = self
            .outlines
            .get_mut(&outline)
            .ok_or(WorkspaceError::OutlineNotFound(outline))?;
        if let Some(handle) = story {
            links::ensure_same_outline_link(record.id, handle)?;
            if !record.story.contains(handle.node) {
                return Err(WorkspaceError::StoryNodeNotFound(handle.node));
            }
        }
        let arc_record = record
            .arc_mut(arc)
            .ok_or(WorkspaceError::ArcNotFound(arc))?;
        if arc_record.tree().get(element).is_none() {
            return Err(WorkspaceError::ArcElementNotFound(element));
        }
        arc_record.modify_element(element, |payload| {
            payload.story_node = story.map(|handle| handle.node);
        })?;
        if story.is_some() {
            links::propagate_arc_associations(record, arc, element)?;
        }
        Ok(())
    }

    /// Associates a character instance with an arc element; the instance
    /// must belong to the element's outline. Propagates to the linked story
    /// node, if any.
    pub fn add_arc_element_character(
        &mut self,
        outline: OutlineId,
        arc: ArcId,
        element: NodeId,
        instance: CharacterInstanceId,
    ) -> WorkspaceResult<()> {
        let instance_record = self.character_instance(instance)?.clone();
        let record = self
            .outlines
            .get_mut(&outline)
            .ok_or(WorkspaceError::OutlineNotFound(outline))?;
        links::ensure_same_outline_character(record.id, &instance_record)?;
        let arc_record = record
            .arc_mut(arc)
            .ok_or(WorkspaceError::ArcNotFound(arc))?;
        if arc_record.tree().get(element).is_none() {
            return Err(WorkspaceError::ArcElementNotFound(element));
        }
        arc_record.modify_element(element, |payload| {
            payload.characters.insert(instance);
        })?;
        links::propagate_arc_associations(record, arc, element)?;
        Ok(())
    }

    /// Location counterpart of `add_arc_element_character`.
    pub fn add_arc_element_location(
        &mut self,
        outline: OutlineId,
        arc: ArcId,
        element: NodeId,
        instance: LocationInstanceId,
    ) -> WorkspaceResult<()> {
        let instance_record = self.location_instance(instance)?.clone();
        let record = self
            .outlines
            .get_mut(&outline)
            .ok_or(WorkspaceError::OutlineNotFound(outline))?;
        links::ensure_same_outline_location(record.id, &instance_record)?;
        let arc_record = record
            .arc_mut(arc)
            .ok_or(WorkspaceError::ArcNotFound(arc))?;
        if arc_record.tree().get(element).is_none() {
            return Err(WorkspaceError::ArcElementNotFound(element));
        }
        arc_record.modify_element(element, |payload| {
            payload.locations.insert(instance);
        })?;
        links::propagate_arc_associations(record, arc, element)?;
        Ok(())
    }

    /// Drops a character from an arc element. Never touches the linked
    /// story node; propagation is additive only.
    pub fn remove_arc_element_character(
        &mut self,
        outline: OutlineId,
        arc: ArcId,
        element: NodeId,
        instance: CharacterInstanceId,
    ) -> WorkspaceResult<()> {
        let record = self.outline_mut(outline)?;
        let arc_record = record
            .arc_mut(arc)
            .ok_or(WorkspaceError::ArcNotFound(arc))?;
        arc_record.modify_element(element, |payload| {
            payload.characters.shift_remove(&instance);
        })?;
        Ok(())
    }

    /// Location counterpart of `remove_arc_element_character`.
    pub fn remove_arc_element_location(
        &mut self,
        outline: OutlineId,
        arc: ArcId,
        element: NodeId,
        instance: LocationInstanceId,
    ) -> WorkspaceResult<()> {
        let record = self.outline_mut(outline)?;
        let arc_record = record
            .arc_mut(arc)
            .ok_or(WorkspaceError::ArcNotFound(arc))?;
        arc_record.modify_element(element, |payload| {
            payload.locations.shift_remove(&instance);
        })?;
        Ok(())
    }

    /// Associates a character instance with a story node; same-outline
    /// membership is enforced.
    pub fn add_story_node_character(
        &mut self,
        outline: OutlineId,
        node: NodeId,
        instance: CharacterInstanceId,
    ) -> WorkspaceResult<()> {
        let instance_record = self.character_instance(instance)?.clone();
        let record = self
            .outlines
            .get_mut(&outline)
            .ok_or(WorkspaceError::OutlineNotFound(outline))?;
        links::ensure_same_outline_character(record.id, &instance_record)?;
        if !record.story.contains(node) {
            return Err(WorkspaceError::StoryNodeNotFound(node));
        }
        record.story.modify(node, |payload| {
            payload.characters.insert(instance);
        })?;
        Ok(())
    }

    /// Location counterpart of `add_story_node_character`.
    pub fn add_story_node_location(
        &mut self,
        outline: OutlineId,
        node: NodeId,
        instance: LocationInstanceId,
    ) -> WorkspaceResult<()> {
        let instance_record = self.location_instance(instance)?.clone();
        let record = self
            .outlines
            .get_mut(&outline)
            .ok_or(WorkspaceError::OutlineNotFound(outline))?;
        links::ensure_same_outline_location(record.id, &instance_record)?;
        if !record.story.contains(node) {
            return Err(WorkspaceError::StoryNodeNotFound(node));
        }
        record.story.modify(node, |payload| {
            payload.locations.insert(instance);
        })?;
        Ok(())
    }

    pub fn remove_story_node_character(
        &mut self,
        outline: OutlineId,
        node: NodeId,
        instance: CharacterInstanceId,
    ) -> WorkspaceResult<()> {
        let record = self.outline_mut(outline)?;
        record.story.modify(node, |payload| {
            payload.characters.shift_remove(&instance);
        })?;
        Ok(())
    }

    pub fn remove_story_node_location(
        &mut self,
        outline: OutlineId,
        node: NodeId,
        instance: LocationInstanceId,
    ) -> WorkspaceResult<()> {
        let record = self.outline_mut(outline)?;
        record.story.modify(node, |payload| {
            payload.locations.shift_remove(&instance);
        })?;
        Ok(())
    }
}
