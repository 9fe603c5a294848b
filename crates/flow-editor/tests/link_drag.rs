//! Integration tests: link-drag gestures through the editor session
//! (flow-editor ↔ flow-render hit testing ↔ flow-core stores).

use flow_core::id::NodeId;
use flow_core::layout::{PortRef, locate};
use flow_core::model::{Connection, NodeKind, Point};
use flow_core::EditorConfig;
use flow_editor::{EditorSession, Gesture, GraphMutation, InputEvent, LinkOutcome, Modifiers};
use pretty_assertions::assert_eq;

/// Default pair on a canvas whose pan puts logical (2000, 2000) at the
/// container origin, with the container at page (40, 80).
fn open() -> (EditorSession, NodeId, NodeId) {
    let (mut session, _) = EditorSession::restore(None, EditorConfig::default());
    session.set_origin(40.0, 80.0);
    (session, NodeId(1), NodeId(2))
}

fn screen_of(session: &EditorSession, id: NodeId, port: PortRef) -> Point {
    let logical = locate(session.graph(), id, port, &session.config().layout).unwrap();
    session.to_screen(logical)
}

// ─── Release targets ────────────────────────────────────────────────────

#[test]
fn release_over_input_port_connects() {
    let (mut s, start, instruction) = open();
    let from = screen_of(&s, start, PortRef::Output(0));
    let to = screen_of(&s, instruction, PortRef::Input);

    s.pointer_down(from);
    assert!(matches!(s.gesture(), Gesture::Linking(link) if link.from == start && link.port == 0));
    s.pointer_move(Point::new(to.x - 30.0, to.y + 5.0));
    assert!(s.preview_curve().is_some());
    assert!(s.frame().preview.is_some());

    let outcome = s.pointer_up(to);
    assert_eq!(outcome, Some(LinkOutcome::Connected(Connection::new(start, 0, instruction))));
    assert_eq!(s.graph().connections(), &[Connection::new(start, 0, instruction)]);
    assert!(s.gesture().is_idle());
    assert!(s.frame().preview.is_none());
}

#[test]
fn release_over_empty_canvas_creates_nothing() {
    let (mut s, start, _) = open();
    let from = screen_of(&s, start, PortRef::Output(0));

    s.pointer_down(from);
    s.pointer_move(Point::new(from.x + 120.0, from.y + 400.0));
    let outcome = s.pointer_up(Point::new(from.x + 120.0, from.y + 400.0));

    assert_eq!(outcome, Some(LinkOutcome::Cancelled));
    assert!(s.graph().connections().is_empty());
    assert!(s.preview_curve().is_none());
}

#[test]
fn release_over_own_input_is_rejected() {
    let (mut s, _, instruction) = open();
    let from = screen_of(&s, instruction, PortRef::Output(0));
    let own_input = screen_of(&s, instruction, PortRef::Input);

    s.pointer_down(from);
    assert_eq!(s.pointer_up(own_input), Some(LinkOutcome::Rejected));
    assert!(s.graph().connections().is_empty());
}

#[test]
fn repeating_a_link_keeps_one_connection() {
    let (mut s, start, instruction) = open();
    let from = screen_of(&s, start, PortRef::Output(0));
    let to = screen_of(&s, instruction, PortRef::Input);

    for expected in [
        LinkOutcome::Connected(Connection::new(start, 0, instruction)),
        LinkOutcome::Rejected,
    ] {
        s.pointer_down(from);
        assert_eq!(s.pointer_up(to), Some(expected));
    }
    assert_eq!(s.graph().connections().len(), 1);
}

#[test]
fn preview_follows_pointer_in_logical_space() {
    let (mut s, start, _) = open();
    s.zoom(0.5);
    assert!(s.begin_output_drag(start, 0));
    let pointer = Point::new(640.0, 380.0);
    s.pointer_move(pointer);

    let curve = s.preview_curve().unwrap();
    let expected = s.to_logical(pointer);
    assert!((curve.to.x - expected.x).abs() < 1e-9);
    assert!((curve.to.y - expected.y).abs() < 1e-9);
    let port = locate(s.graph(), start, PortRef::Output(0), &s.config().layout).unwrap();
    assert_eq!(curve.from, port);
}

// ─── Gesture exclusivity ────────────────────────────────────────────────

#[test]
fn starting_a_second_gesture_replaces_the_first() {
    let (mut s, start, instruction) = open();
    let first = screen_of(&s, start, PortRef::Output(0));

    s.pointer_down(first);
    assert!(s.gesture().link().is_some());

    // A second press before release: header drag of the instruction node.
    let header = s.to_screen(Point::new(2520.0, 2210.0));
    s.pointer_down(header);
    assert!(matches!(s.gesture(), Gesture::DraggingNode { id, .. } if *id == instruction));
    assert!(s.preview_curve().is_none());

    s.pointer_move(Point::new(header.x + 10.0, header.y));
    assert_eq!(s.graph().node(instruction).unwrap().x, 2510.0);
    assert_eq!(s.pointer_up(Point::new(header.x + 10.0, header.y)), None);
    assert!(s.graph().connections().is_empty());
    assert_eq!(s.graph().node(start).unwrap().position(), Point::new(2200.0, 2200.0));
}

#[test]
fn second_link_drag_wins() {
    let (mut s, start, instruction) = open();
    let end = s.create_node(NodeKind::End, 2800.0, 2200.0);

    assert!(s.begin_output_drag(start, 0));
    assert!(s.begin_output_drag(instruction, 0));
    let target = screen_of(&s, end, PortRef::Input);
    assert_eq!(
        s.pointer_up(target),
        Some(LinkOutcome::Connected(Connection::new(instruction, 0, end)))
    );
    assert_eq!(s.graph().connections().len(), 1);
}

#[test]
fn release_without_active_link_is_cancelled() {
    let (mut s, _, instruction) = open();
    assert_eq!(s.release_over_input(instruction), LinkOutcome::Cancelled);
    assert_eq!(s.release_elsewhere(), LinkOutcome::Cancelled);
}

// ─── Other pointer targets ──────────────────────────────────────────────

#[test]
fn close_button_deletes_node_and_its_connections() {
    let (mut s, start, instruction) = open();
    s.apply_mutation(GraphMutation::Connect { from: start, port: 0, to: instruction });
    let close = s.to_screen(Point::new(2500.0 + 190.0, 2210.0));

    s.pointer_down(close);
    assert!(s.graph().node(instruction).is_none());
    assert!(s.graph().connections().is_empty());
    assert!(s.gesture().is_idle());
}

#[test]
fn double_click_removes_only_that_connection() {
    let (mut s, start, instruction) = open();
    let end = s.create_node(NodeKind::End, 2500.0, 2600.0);
    s.apply_mutation(GraphMutation::Connect { from: start, port: 0, to: instruction });
    s.apply_mutation(GraphMutation::Connect { from: start, port: 0, to: end });

    let frame = s.frame();
    let edge = frame
        .edges
        .iter()
        .find(|e| e.connection.to == end)
        .unwrap();
    let c = edge.curve;
    let mid = Point::new(
        (c.from.x + 3.0 * c.ctrl1.x + 3.0 * c.ctrl2.x + c.to.x) / 8.0,
        (c.from.y + 3.0 * c.ctrl1.y + 3.0 * c.ctrl2.y + c.to.y) / 8.0,
    );

    let removed = s.double_click(s.to_screen(mid));
    assert_eq!(removed, Some(Connection::new(start, 0, end)));
    assert_eq!(s.graph().connections(), &[Connection::new(start, 0, instruction)]);
}

#[test]
fn events_drive_the_same_gestures() {
    let (mut s, start, instruction) = open();
    let from = screen_of(&s, start, PortRef::Output(0));
    let to = screen_of(&s, instruction, PortRef::Input);
    let m = Modifiers::NONE;

    for event in [
        InputEvent::PointerDown { x: from.x, y: from.y, modifiers: m },
        InputEvent::PointerMove { x: to.x, y: to.y, modifiers: m },
        InputEvent::PointerUp { x: to.x, y: to.y, modifiers: m },
    ] {
        assert_eq!(s.handle_event(&event), None);
    }
    assert_eq!(s.graph().connections().len(), 1);
}
