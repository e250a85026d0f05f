//! The impact calculator: local bonuses and generational bleed.

use storyloom::arc_elements::ArcElementKind;
use storyloom::story::StoryElement;
use storyloom::story_elements::StoryElementKind::*;
use storyloom::tree::{NodeId, Position};
use storyloom::workspace::Workspace;
use storyloom::{ArcId, MaceType, OutlineId};

struct Stage {
    workspace: Workspace,
    outline: OutlineId,
    parts: Vec<NodeId>,
    chapters: Vec<NodeId>,
    scenes: Vec<NodeId>,
}

/// Two parts, two chapters per part, two scenes per chapter.
fn stage() -> Stage {
    let mut workspace = Workspace::new();
    let outline_id = workspace.create_outline("u1", "Monkeys are here", None);
    let record = workspace.outline_mut(outline_id).unwrap();
    let root = record.story.root();
    let mut parts = Vec::new();
    let mut chapters = Vec::new();
    let mut scenes = Vec::new();
    for _ in 0..2 {
        let part = record.story.add_child(root, StoryElement::new(Part)).unwrap();
        parts.push(part);
        for _ in 0..2 {
            let chapter = record
                .story
                .add_child(part, StoryElement::new(Chapter))
                .unwrap();
            chapters.push(chapter);
            for _ in 0..2 {
                scenes.push(
                    record
                        .story
                        .add_child(chapter, StoryElement::new(SceneSequel))
                        .unwrap(),
                );
            }
        }
    }
    Stage {
        workspace,
        outline: outline_id,
        parts,
        chapters,
        scenes,
    }
}

fn create_arc(stage: &mut Stage, mace: MaceType, name: &str) -> ArcId {
    stage
        .workspace
        .outline_mut(stage.outline)
        .unwrap()
        .create_arc(mace, name)
        .unwrap()
}

fn milestone(stage: &Stage, arc: ArcId, kind: ArcElementKind) -> NodeId {
    stage
        .workspace
        .outline(stage.outline)
        .unwrap()
        .arc(arc)
        .unwrap()
        .milestone(kind)
        .unwrap()
        .id
}

fn link(stage: &mut Stage, arc: ArcId, element: NodeId, story_node: NodeId) {
    let handle = stage
        .workspace
        .story_handle(stage.outline, story_node)
        .unwrap();
    stage
        .workspace
        .link_arc_element(stage.outline, arc, element, Some(handle))
        .unwrap();
}

fn impact(stage: &Stage, node: NodeId) -> f64 {
    stage
        .workspace
        .outline(stage.outline)
        .unwrap()
        .impact_rating(node)
}

#[test]
fn overlapping_milestones_raise_the_intensity() {
    let mut stage = stage();
    let arc1 = create_arc(&mut stage, MaceType::Character, "Coming of age");
    let arc2 = create_arc(&mut stage, MaceType::Event, "Invasion of the uptight people");
    let arc3 = create_arc(&mut stage, MaceType::Event, "Escape from town");

    // One beat under arc1's midpoint, one beside it.
    let arc1_mid = milestone(&stage, arc1, ArcElementKind::Midpoint);
    let (beat1, beat2) = {
        let outline = stage.workspace.outline_mut(stage.outline).unwrap();
        let arc = outline.arc_mut(arc1).unwrap();
        let beat1 = arc
            .add_child(arc1_mid, ArcElementKind::Beat, "Making a plan")
            .unwrap();
        let beat2 = arc
            .add_sibling(arc1_mid, Position::Left, ArcElementKind::Beat, "exposition")
            .unwrap();
        (beat1, beat2)
    };

    // Nothing is placed yet: every non-root node sits at the base floor,
    // the hidden root at zero.
    {
        let outline = stage.workspace.outline(stage.outline).unwrap();
        let root = outline.story.root();
        assert_eq!(outline.impact_rating(root), 0.0);
        for node in outline.story.descendants(root) {
            assert_eq!(outline.impact_rating(node.id), 0.5);
        }
    }

    let scenes = stage.scenes.clone();
    let chapters = stage.chapters.clone();
    let parts = stage.parts.clone();

    // The stray beat lands on scene 4 (chapter 2).
    link(&mut stage, arc1, beat2, scenes[3]);
    {
        let outline = stage.workspace.outline(stage.outline).unwrap();
        assert_eq!(outline.story.ancestors(scenes[3]).len(), 3);
    }
    assert_eq!(impact(&stage, scenes[3]), 1.0);
    assert_eq!(impact(&stage, chapters[1]), 0.625);

    // The milestone-born beat lands on scene 5; it carries the
    // child-of-milestone bonus.
    link(&mut stage, arc1, beat1, scenes[4]);
    assert_eq!(impact(&stage, scenes[4]), 1.5);
    assert_eq!(impact(&stage, chapters[2]), 0.75);

    // The midpoint itself lands on chapter 3: the chapter spikes and the
    // scene below inherits half per generation.
    link(&mut stage, arc1, arc1_mid, chapters[2]);
    assert_eq!(impact(&stage, chapters[2]), 2.75);
    assert_eq!(impact(&stage, scenes[4]), 2.5);

    // Plot turn 1 of arc 2 on scene 3.
    let arc2_pt1 = milestone(&stage, arc2, ArcElementKind::PlotTurn1);
    link(&mut stage, arc2, arc2_pt1, scenes[2]);
    assert_eq!(impact(&stage, scenes[2]), 2.5);
    assert_eq!(impact(&stage, chapters[1]), 1.625);

    // Pinch 1 of arc 1 joins it.
    let arc1_pinch1 = milestone(&stage, arc1, ArcElementKind::Pinch1);
    link(&mut stage, arc1, arc1_pinch1, scenes[2]);
    assert_eq!(impact(&stage, scenes[2]), 4.5);
    assert_eq!(impact(&stage, chapters[1]), 2.625);

    // A second pinch 1, from a third arc: like milestones stack an extra
    // bonus.
    let arc3_pinch1 = milestone(&stage, arc3, ArcElementKind::Pinch1);
    link(&mut stage, arc3, arc3_pinch1, scenes[2]);
    assert_eq!(impact(&stage, scenes[2]), 7.0);
    assert_eq!(impact(&stage, chapters[1]), 3.75);

    // Arc 2's pinch 1 lines up with beat1 on scene 5: the scene, its
    // chapter and its part all feel it.
    let arc2_pinch1 = milestone(&stage, arc2, ArcElementKind::Pinch1);
    link(&mut stage, arc2, arc2_pinch1, scenes[4]);
    assert_eq!(impact(&stage, scenes[4]), 4.5);
    assert_eq!(impact(&stage, chapters[2]), 3.75);
    assert_eq!(impact(&stage, parts[1]), 2.0625);
}

#[test]
fn siblings_do_not_bleed_into_each_other() {
    let mut stage = stage();
    let arc1 = create_arc(&mut stage, MaceType::Event, "Lone spike");
    let mid = milestone(&stage, arc1, ArcElementKind::Midpoint);
    let scene0 = stage.scenes[0];
    link(&mut stage, arc1, mid, scene0);
    // scene 1 carries the milestone; its sibling scene 2 is untouched.
    assert_eq!(impact(&stage, stage.scenes[0]), 2.5);
    assert_eq!(impact(&stage, stage.scenes[1]), 0.5);
    // The chapter above inherits, two levels up decays twice.
    assert_eq!(impact(&stage, stage.chapters[0]), 1.5);
    assert_eq!(impact(&stage, stage.parts[0]), 1.0);
}
