//! Whole-outline MACE nesting validation: arcs should resolve in the
//! opposite order of their introduction, and each arc's milestones must
//! land in canonical order across the story.

use storyloom::arc_elements::ArcElementKind;
use storyloom::nesting::NestingErrorKind;
use storyloom::story::StoryElement;
use storyloom::story_elements::StoryElementKind::*;
use storyloom::tree::NodeId;
use storyloom::workspace::Workspace;
use storyloom::{ArcId, MaceType, OutlineId};

struct Stage {
    workspace: Workspace,
    outline: OutlineId,
    scenes: Vec<NodeId>,
}

/// Two parts, two chapters each, four scenes per chapter: sixteen leaves.
fn stage() -> Stage {
    let mut workspace = Workspace::new();
    let outline_id = workspace.create_outline("u1", "Monkeys are here", None);
    let record = workspace.outline_mut(outline_id).unwrap();
    let root = record.story.root();
    let mut scenes = Vec::new();
    for _ in 0..2 {
        let part = record.story.add_child(root, StoryElement::new(Part)).unwrap();
        for _ in 0..2 {
            let chapter = record
                .story
                .add_child(part, StoryElement::new(Chapter))
                .unwrap();
            for _ in 0..4 {
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

fn place(stage: &mut Stage, arc: ArcId, kind: ArcElementKind, scene: NodeId) {
    let element = stage
        .workspace
        .outline(stage.outline)
        .unwrap()
        .arc(arc)
        .unwrap()
        .milestone(kind)
        .unwrap()
        .id;
    let handle = stage.workspace.story_handle(stage.outline, scene).unwrap();
    stage
        .workspace
        .link_arc_element(stage.outline, arc, element, Some(handle))
        .unwrap();
}

fn report(stage: &Stage) -> storyloom::nesting::NestingReport {
    stage
        .workspace
        .outline(stage.outline)
        .unwrap()
        .validate_nesting()
}

#[test]
fn crossing_arc_spans_are_flagged_and_aligned_spans_are_forgiven() {
    let mut stage = stage();
    let scenes = stage.scenes.clone();
    let arc1 = create_arc(&mut stage, MaceType::Character, "coming of age");
    let arc2 = create_arc(&mut stage, MaceType::Event, "A QUEST!!!");
    let arc3 = create_arc(&mut stage, MaceType::Event, "invading dragons");

    // A lone hook tells the validator nothing.
    place(&mut stage, arc1, ArcElementKind::Hook, scenes[0]);
    assert!(report(&stage).is_empty());

    place(&mut stage, arc1, ArcElementKind::Resolution, scenes[13]);
    assert!(report(&stage).is_empty());

    // A resolution with no hook is not enough information either.
    place(&mut stage, arc2, ArcElementKind::Resolution, scenes[14]);
    assert!(report(&stage).is_empty());

    // Arc 2 hooks after arc 1 but also resolves after it: crossed spans.
    place(&mut stage, arc2, ArcElementKind::Hook, scenes[1]);
    let findings = report(&stage);
    assert_eq!(findings.len(), 1);
    let finding = &findings[&NestingErrorKind::ResolutionOrder];
    assert_eq!(
        finding.message,
        "Arcs should resolve in the opposite order that they were introduced"
    );
    assert_eq!(finding.story_nodes, vec![scenes[13], scenes[14]]);

    // Resolving at the same point is fine.
    place(&mut stage, arc1, ArcElementKind::Resolution, scenes[14]);
    assert!(report(&stage).is_empty());

    // Proper nesting: arc 2 resolves before arc 1.
    place(&mut stage, arc2, ArcElementKind::Resolution, scenes[13]);
    assert!(report(&stage).is_empty());

    // Arc 3 resolves last but has no hook yet: ignored.
    place(&mut stage, arc3, ArcElementKind::Resolution, scenes[15]);
    assert!(report(&stage).is_empty());

    // With its hook third, arc 3 crosses both other arcs.
    place(&mut stage, arc3, ArcElementKind::Hook, scenes[2]);
    let findings = report(&stage);
    let finding = &findings[&NestingErrorKind::ResolutionOrder];
    assert_eq!(
        finding.story_nodes,
        vec![scenes[13], scenes[14], scenes[15]]
    );

    // Hooking at the same point as arc 2 clears that pair; arc 1 and
    // arc 3 still cross.
    place(&mut stage, arc3, ArcElementKind::Hook, scenes[1]);
    let findings = report(&stage);
    let finding = &findings[&NestingErrorKind::ResolutionOrder];
    assert_eq!(finding.story_nodes, vec![scenes[14], scenes[15]]);

    // Pulling arc 3's resolution inside arc 2's span fixes everything.
    place(&mut stage, arc3, ArcElementKind::Resolution, scenes[11]);
    assert!(report(&stage).is_empty());

    // Milestones inside one arc must respect canonical order across the
    // leaf sequence.
    place(&mut stage, arc1, ArcElementKind::Midpoint, scenes[7]);
    assert!(report(&stage).is_empty());
    place(&mut stage, arc1, ArcElementKind::PlotTurn2, scenes[4]);
    let findings = report(&stage);
    let finding = &findings[&NestingErrorKind::ArcSequence];
    assert_eq!(finding.message, "Arc element milestones are out of sequence");
    assert_eq!(finding.arcs, vec![arc1]);
    assert_eq!(
        finding.story_nodes,
        vec![scenes[0], scenes[4], scenes[7], scenes[14]]
    );
}

#[test]
fn container_placements_do_not_join_the_leaf_sequence() {
    let mut stage = stage();
    let scenes = stage.scenes.clone();
    let arc1 = create_arc(&mut stage, MaceType::Event, "container bound");
    // Hook on a chapter (a container), resolution on a leaf: the hook never
    // enters the sequence, so the arc has no span to check.
    let chapter = {
        let outline = stage.workspace.outline(stage.outline).unwrap();
        outline.story.parent(scenes[0]).unwrap().id
    };
    place(&mut stage, arc1, ArcElementKind::Hook, chapter);
    place(&mut stage, arc1, ArcElementKind::Resolution, scenes[15]);
    assert!(report(&stage).is_empty());
}

#[test]
fn labels_are_stable() {
    assert_eq!(NestingErrorKind::ArcSequence.label(), "nest_arc_seq");
    assert_eq!(NestingErrorKind::ResolutionOrder.label(), "nest_reso_error");
}
