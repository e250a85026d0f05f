//! Arc template, hard-tier milestone rules and the soft validation report.

use storyloom::arc_elements::ArcElementKind;
use storyloom::errors::{StructureError, TreeError};
use storyloom::tree::{NodeId, Position};
use storyloom::workspace::Workspace;
use storyloom::{ArcFindingKind, ArcId, MaceType, OutlineId};

fn sample_arc(workspace: &mut Workspace) -> (OutlineId, ArcId) {
    let outline = workspace.create_outline("u1", "Monkeys are here", Some("A sample outline"));
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .create_arc(MaceType::Event, "I ate something gross")
        .unwrap();
    (outline, arc)
}

fn milestone_children(workspace: &Workspace, outline: OutlineId, arc: ArcId) -> Vec<NodeId> {
    let arc = workspace.outline(outline).unwrap().arc(arc).unwrap();
    let root = arc.root().unwrap();
    arc.tree().children(root).iter().map(|n| n.id).collect()
}

fn labels(findings: &[storyloom::ArcFinding]) -> Vec<&'static str> {
    findings.iter().map(|f| f.kind.label()).collect()
}

#[test]
fn template_generation_builds_the_seven_point_tree() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let outline_ref = workspace.outline(outline).unwrap();
    let arc = outline_ref.arc(arc_id).unwrap();
    assert_eq!(arc.outline, outline_ref.id);

    let root = arc.root().unwrap();
    assert!(arc.tree().is_root(root));
    let children = arc.tree().children(root);
    assert_eq!(children.len(), 7);
    let mut last_seq = 0;
    for child in &children {
        assert!(child.payload.kind.is_milestone());
        let seq = child.payload.kind.milestone_seq().unwrap();
        assert!(seq > last_seq);
        last_seq = seq;
    }
}

#[test]
fn template_generation_requires_an_empty_arc() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .arc_mut(arc_id)
        .unwrap();
    let err = arc.generate_template().unwrap_err();
    assert!(matches!(
        err.structural(),
        Some(StructureError::TemplateAlreadyPopulated)
    ));
}

#[test]
fn duplicate_milestones_are_blocked() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let children = milestone_children(&workspace, outline, arc_id);
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .arc_mut(arc_id)
        .unwrap();
    let root = arc.root().unwrap();

    let err = arc
        .add_child(root, ArcElementKind::PlotTurn1, "The plot thickens")
        .unwrap_err();
    assert!(matches!(
        err.structural(),
        Some(StructureError::DuplicateMilestone(ArcElementKind::PlotTurn1))
    ));

    for node in children {
        let kind = arc.tree().get(node).unwrap().payload.kind;
        let position = if kind == ArcElementKind::Resolution {
            Position::Left
        } else {
            Position::Right
        };
        let err = arc
            .add_sibling(node, position, kind, "naughty naughty")
            .unwrap_err();
        assert!(matches!(
            err.structural(),
            Some(StructureError::DuplicateMilestone(_))
        ));
    }
}

#[test]
fn milestones_cannot_nest_under_milestones() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let children = milestone_children(&workspace, outline, arc_id);
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .arc_mut(arc_id)
        .unwrap();
    // The parent check fires before the duplicate check.
    let err = arc
        .add_child(children[0], ArcElementKind::Midpoint, "too deep")
        .unwrap_err();
    assert!(matches!(
        err.structural(),
        Some(StructureError::MilestoneUnderMilestone)
    ));

    let root = arc.root().unwrap();
    let err = arc
        .add_sibling(root, Position::Right, ArcElementKind::Midpoint, "rootward")
        .unwrap_err();
    assert!(matches!(
        err.structural(),
        Some(StructureError::MilestoneAsRoot)
    ));
}

#[test]
fn retype_to_a_present_milestone_is_blocked() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let children = milestone_children(&workspace, outline, arc_id);
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .arc_mut(arc_id)
        .unwrap();
    let beat = arc
        .add_sibling(children[1], Position::Right, ArcElementKind::Beat, "a beat")
        .unwrap();
    let err = arc.set_kind(beat, ArcElementKind::PlotTurn1).unwrap_err();
    assert!(matches!(
        err.structural(),
        Some(StructureError::DuplicateMilestone(ArcElementKind::PlotTurn1))
    ));
    // Retyping between the filler kinds is fine.
    arc.set_kind(beat, ArcElementKind::TryFail).unwrap();
    // Retyping a milestone to itself is a no-op, not a duplicate.
    arc.set_kind(children[1], ArcElementKind::PlotTurn1).unwrap();
}

#[test]
fn headline_follows_description_edits() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let children = milestone_children(&workspace, outline, arc_id);
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .arc_mut(arc_id)
        .unwrap();
    let hook = children[0];

    arc.set_description(
        hook,
        "This is my hook. There are many like it but this one is mine. \
         I do wonder when the ghosts will come for all of us.",
    )
    .unwrap();
    assert_eq!(
        arc.tree().get(hook).unwrap().payload.headline,
        "This is my hook. There are many like it but this one is mine. \
         I do wonder when the ghosts\u{2026}"
    );

    arc.set_description(hook, "I ate some clams.\n\nThey were yummy.")
        .unwrap();
    assert_eq!(arc.tree().get(hook).unwrap().payload.headline, "I ate some clams.");
}

#[test]
fn soft_validation_tracks_the_arc_as_it_degrades() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let children = milestone_children(&workspace, outline, arc_id);
    let (hook, pt1, pinch2, pt2, reso) = (
        children[0],
        children[1],
        children[4],
        children[5],
        children[6],
    );
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .arc_mut(arc_id)
        .unwrap();

    // A fresh template carries zero findings, and the memo sees that.
    assert!(arc.fetch_errors().is_empty());
    assert!(arc.current_errors().is_empty());

    // Move the hook just before the resolution: hook placement and
    // milestone sequence both break.
    arc.move_element(hook, reso, Position::Left).unwrap();
    let findings = arc.fetch_errors();
    assert_eq!(findings.len(), 2);
    assert!(labels(&findings).contains(&"hook_error"));
    assert!(labels(&findings).contains(&"mseq_error"));

    // The memoized report is stale until an explicit refresh.
    assert!(arc.current_errors().is_empty());
    arc.refresh();
    assert_eq!(arc.current_errors().len(), 2);

    // Move the resolution right after plot turn 1: resolution placement
    // joins the list.
    arc.move_element(reso, pt1, Position::Right).unwrap();
    let findings = arc.fetch_errors();
    assert_eq!(findings.len(), 3);
    assert!(labels(&findings).contains(&"hook_error"));
    assert!(labels(&findings).contains(&"mseq_error"));
    assert!(labels(&findings).contains(&"reso_error"));

    // Nest plot turn 2 under pinch 2: a generation violation on top.
    arc.move_element(pt2, pinch2, Position::FirstChild).unwrap();
    let findings = arc.fetch_errors();
    assert_eq!(findings.len(), 4);
    assert!(labels(&findings).contains(&"generation_error"));

    // Put plot turn 2 back on the root level.
    arc.move_element(pt2, pinch2, Position::Right).unwrap();
    assert_eq!(arc.fetch_errors().len(), 3);

    // Beats and try/fails between hook and resolution are fine.
    let beat = arc
        .add_sibling(pt1, Position::Right, ArcElementKind::Beat, "I am a beat")
        .unwrap();
    assert_eq!(arc.fetch_errors().len(), 3);
    let tf = arc
        .add_sibling(
            beat,
            Position::Right,
            ArcElementKind::TryFail,
            "I am a try/fail cycle",
        )
        .unwrap();
    assert_eq!(arc.fetch_errors().len(), 3);

    // A try/fail cannot live inside a beat.
    arc.move_element(tf, beat, Position::FirstChild).unwrap();
    let findings = arc.fetch_errors();
    assert_eq!(findings.len(), 4);
    assert!(labels(&findings).contains(&"generation_error"));

    // The other way around is allowed.
    arc.move_element(tf, beat, Position::Right).unwrap();
    arc.move_element(beat, tf, Position::FirstChild).unwrap();
    assert_eq!(arc.fetch_errors().len(), 3);

    // Nested try/fail cycles are allowed too.
    let tf2 = arc
        .add_child(tf, ArcElementKind::TryFail, "I am a nested try/fail cycle.")
        .unwrap();
    assert!(arc.tree().contains(tf2));
    assert_eq!(arc.fetch_errors().len(), 3);

    // Moving the try/fail relocates its whole subtree intact.
    arc.move_element(tf, pt1, Position::FirstChild).unwrap();
    assert_eq!(arc.tree().descendant_count(pt1), 3);
}

#[test]
fn finding_labels_are_stable() {
    assert_eq!(ArcFindingKind::HookPlacement.label(), "hook_error");
    assert_eq!(ArcFindingKind::ResolutionPlacement.label(), "reso_error");
    assert_eq!(ArcFindingKind::MilestoneSequence.label(), "mseq_error");
    assert_eq!(ArcFindingKind::Generation.label(), "generation_error");
}

#[test]
fn moves_never_raise_hard_errors_inside_the_arc() {
    let mut workspace = Workspace::new();
    let (outline, arc_id) = sample_arc(&mut workspace);
    let children = milestone_children(&workspace, outline, arc_id);
    let arc = workspace
        .outline_mut(outline)
        .unwrap()
        .arc_mut(arc_id)
        .unwrap();
    // Milestone under milestone by move: allowed, reported softly.
    arc.move_element(children[3], children[2], Position::FirstChild)
        .unwrap();
    let findings = arc.fetch_errors();
    assert!(labels(&findings).contains(&"generation_error"));
    // But a move into a descendant is still a cycle at the engine level.
    let err = arc
        .move_element(children[2], children[3], Position::FirstChild)
        .unwrap_err();
    assert!(matches!(err, TreeError::CyclicMove));
}
