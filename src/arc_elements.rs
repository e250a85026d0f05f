//! Arc element kinds and their canonical definitions
//!
//! The seven-milestone template (hook, plot turn 1, pinch 1, midpoint,
//! pinch 2, plot turn 2, resolution) plus the repeatable try/fail and beat
//! elements. The definition table is built once at startup and never
//! mutated; every validator consults it by reference.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Element kinds an arc tree node can carry.
///
/// Serialized with the short wire codes (`mile_hook`, `tf`, ...) that the
/// fixture format and dumps use.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum ArcElementKind {
    #[serde(rename = "root")]
    #[strum(serialize = "root")]
    Root,
    #[serde(rename = "mile_hook")]
    #[strum(serialize = "mile_hook")]
    Hook,
    #[serde(rename = "mile_pt1")]
    #[strum(serialize = "mile_pt1")]
    PlotTurn1,
    #[serde(rename = "mile_pnch1")]
    #[strum(serialize = "mile_pnch1")]
    Pinch1,
    #[serde(rename = "mile_mid")]
    #[strum(serialize = "mile_mid")]
    Midpoint,
    #[serde(rename = "mile_pnch2")]
    #[strum(serialize = "mile_pnch2")]
    Pinch2,
    #[serde(rename = "mile_pt2")]
    #[strum(serialize = "mile_pt2")]
    PlotTurn2,
    #[serde(rename = "mile_reso")]
    #[strum(serialize = "mile_reso")]
    Resolution,
    #[serde(rename = "tf")]
    #[strum(serialize = "tf")]
    TryFail,
    #[serde(rename = "beat")]
    #[strum(serialize = "beat")]
    Beat,
}

/// Non-milestone elements are only meaningful between two milestones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceRestriction {
    pub after: ArcElementKind,
    pub before: ArcElementKind,
}

#[derive(Clone, Debug)]
pub struct ArcElementDefinition {
    pub kind: ArcElementKind,
    pub label: &'static str,
    pub milestone: bool,
    pub milestone_seq: Option<u8>,
    pub template_description: Option<&'static str>,
    pub seq_restrict: Option<SequenceRestriction>,
    pub allowed_parents: &'static [ArcElementKind],
}

const BETWEEN_HOOK_AND_RESOLUTION: SequenceRestriction = SequenceRestriction {
    after: ArcElementKind::Hook,
    before: ArcElementKind::Resolution,
};

/// Canonical arc element definition table, in milestone-sequence order.
pub static ARC_ELEMENT_DEFINITIONS: Lazy<IndexMap<ArcElementKind, ArcElementDefinition>> =
    Lazy::new(|| {
        let defs = [
            ArcElementDefinition {
                kind: ArcElementKind::Root,
                label: "Arc Parent Node (user-hidden)",
                milestone: false,
                milestone_seq: None,
                template_description: None,
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::Hook,
                label: "Milestone: Hook",
                milestone: true,
                milestone_seq: Some(1),
                template_description: Some(
                    "The starting point of this arc. The opposite of the resolution.",
                ),
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::PlotTurn1,
                label: "Milestone: Plot Turn 1",
                milestone: true,
                milestone_seq: Some(2),
                template_description: Some("The change that initiates the story of the arc."),
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::Pinch1,
                label: "Milestone: Pinch 1",
                milestone: true,
                milestone_seq: Some(3),
                template_description: Some("The first major challenge to the path of the arc."),
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::Midpoint,
                label: "Milestone: Midpoint",
                milestone: true,
                milestone_seq: Some(4),
                template_description: Some(
                    "The middle of the arc, the arc moves towards the resolution with purpose.",
                ),
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::Pinch2,
                label: "Milestone: Pinch 2",
                milestone: true,
                milestone_seq: Some(5),
                template_description: Some(
                    "The last major challenge to the arc. All appears lost.",
                ),
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::PlotTurn2,
                label: "Milestone: Plot Turn 2",
                milestone: true,
                milestone_seq: Some(6),
                template_description: Some(
                    "The change that allows the arc to resolve. The way past the final pinch.",
                ),
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::Resolution,
                label: "Milestone: Resolution",
                milestone: true,
                milestone_seq: Some(7),
                template_description: Some(
                    "The resolution of the arc. Opposite of the hook. Victory or failure is achieved.",
                ),
                seq_restrict: None,
                allowed_parents: &[],
            },
            ArcElementDefinition {
                kind: ArcElementKind::TryFail,
                label: "Try/Fail",
                milestone: false,
                milestone_seq: None,
                template_description: Some("A try/fail cycle along the path of the arc."),
                seq_restrict: Some(BETWEEN_HOOK_AND_RESOLUTION),
                allowed_parents: &[ArcElementKind::TryFail],
            },
            ArcElementDefinition {
                kind: ArcElementKind::Beat,
                label: "Beat",
                milestone: false,
                milestone_seq: None,
                template_description: Some("Something happens... what?"),
                seq_restrict: Some(BETWEEN_HOOK_AND_RESOLUTION),
                allowed_parents: &[ArcElementKind::TryFail],
            },
        ];
        defs.into_iter().map(|d| (d.kind, d)).collect()
    });

impl ArcElementKind {
    pub fn definition(self) -> &'static ArcElementDefinition {
        &ARC_ELEMENT_DEFINITIONS[&self]
    }

    pub fn is_milestone(self) -> bool {
        self.definition().milestone
    }

    /// 1-based canonical position for milestones, `None` otherwise.
    pub fn milestone_seq(self) -> Option<u8> {
        self.definition().milestone_seq
    }

    pub fn label(self) -> &'static str {
        self.definition().label
    }

    /// Kinds a non-root parent must have for this kind to descend from it.
    pub fn allowed_parents(self) -> &'static [ArcElementKind] {
        self.definition().allowed_parents
    }

    /// The seven milestones in canonical sequence order.
    pub fn milestones() -> impl Iterator<Item = ArcElementKind> {
        ArcElementKind::iter().filter(|k| k.is_milestone())
    }
}
