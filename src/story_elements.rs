//! Story element kinds and the parent/child compatibility table
//!
//! Unlike arc trees, where bad structure is merely reported, the story tree
//! enforces this table on every structural mutation.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Narrative structural units, coarsest to finest.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum StoryElementKind {
    #[serde(rename = "root")]
    #[strum(serialize = "root")]
    Root,
    #[serde(rename = "book")]
    #[strum(serialize = "book")]
    Book,
    #[serde(rename = "act")]
    #[strum(serialize = "act")]
    Act,
    #[serde(rename = "part")]
    #[strum(serialize = "part")]
    Part,
    #[serde(rename = "chapter")]
    #[strum(serialize = "chapter")]
    Chapter,
    /// Scene or sequel, the finest unit.
    #[serde(rename = "ss")]
    #[strum(serialize = "ss")]
    SceneSequel,
}

#[derive(Clone, Debug)]
pub struct StoryElementDefinition {
    pub kind: StoryElementKind,
    pub label: &'static str,
    pub allowed_children: &'static [StoryElementKind],
    pub allowed_parents: &'static [StoryElementKind],
}

/// Compatibility table: a kind may only sit beneath its allowed parents.
pub static STORY_ELEMENT_DEFINITIONS: Lazy<IndexMap<StoryElementKind, StoryElementDefinition>> =
    Lazy::new(|| {
        use StoryElementKind::*;
        let defs = [
            StoryElementDefinition {
                kind: Root,
                label: "Root",
                allowed_children: &[SceneSequel, Chapter, Part, Act, Book],
                allowed_parents: &[],
            },
            StoryElementDefinition {
                kind: SceneSequel,
                label: "Scene/Sequel",
                allowed_children: &[],
                allowed_parents: &[Chapter, Part, Act, Book, Root],
            },
            StoryElementDefinition {
                kind: Chapter,
                label: "Chapter",
                allowed_children: &[SceneSequel],
                allowed_parents: &[Part, Act, Book, Root],
            },
            StoryElementDefinition {
                kind: Part,
                label: "Part",
                allowed_children: &[Chapter, SceneSequel],
                allowed_parents: &[Act, Book, Root],
            },
            StoryElementDefinition {
                kind: Act,
                label: "Act",
                allowed_children: &[Part, Chapter, SceneSequel],
                allowed_parents: &[Book, Root],
            },
            StoryElementDefinition {
                kind: Book,
                label: "Book",
                allowed_children: &[Act, Part, Chapter, SceneSequel],
                allowed_parents: &[Root],
            },
        ];
        defs.into_iter().map(|d| (d.kind, d)).collect()
    });

impl StoryElementKind {
    pub fn definition(self) -> &'static StoryElementDefinition {
        &STORY_ELEMENT_DEFINITIONS[&self]
    }

    pub fn label(self) -> &'static str {
        self.definition().label
    }

    pub fn allowed_parents(self) -> &'static [StoryElementKind] {
        self.definition().allowed_parents
    }

    pub fn allows_parent(self, parent: StoryElementKind) -> bool {
        self.allowed_parents().contains(&parent)
    }
}
