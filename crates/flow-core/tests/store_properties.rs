//! Integration tests: store, transform and routing properties.

use flow_core::id::NodeId;
use flow_core::layout::{LayoutMetrics, PortRef, locate};
use flow_core::model::{Connection, FlowGraph, NodeKind, Point};
use flow_core::transform::{Viewport, ZoomLimits};
use pretty_assertions::assert_eq;

fn ring(n: u32) -> FlowGraph {
    let mut g = FlowGraph::new();
    for i in 0..n {
        g.create_node(NodeKind::Condition, f64::from(i) * 300.0, 0.0);
    }
    for i in 1..=n {
        let next = i % n + 1;
        g.try_add_connection(NodeId(i), 0, NodeId(next));
        g.try_add_connection(NodeId(i), 1, NodeId((i + 1) % n + 1));
    }
    g
}

// ─── Scenario: default pair ──────────────────────────────────────────────

#[test]
fn start_and_instruction_on_empty_store() {
    let mut g = FlowGraph::new();
    let start = g.create_node(NodeKind::Start, 2200.0, 2200.0);
    g.create_node(NodeKind::Instruction, 2500.0, 2200.0);

    assert_eq!(g.node_count(), 2);
    assert!(g.connections().is_empty());
    let node = g.node(start).unwrap();
    assert_eq!(node.id, NodeId(1));
    assert!(!node.inputs);
    assert_eq!(node.outputs, vec!["Next"]);
}

// ─── Store properties ────────────────────────────────────────────────────

#[test]
fn adding_the_same_triple_twice_keeps_one() {
    let mut g = ring(3);
    let before = g.connections().len();
    assert!(!g.try_add_connection(NodeId(1), 0, NodeId(2)));
    assert_eq!(g.connections().len(), before);
    assert_eq!(
        g.connections()
            .iter()
            .filter(|c| **c == Connection::new(NodeId(1), 0, NodeId(2)))
            .count(),
        1
    );
}

#[test]
fn deleting_a_node_removes_exactly_its_incident_connections() {
    for victim in 1..=6 {
        let mut g = ring(6);
        let total = g.connections().len();
        let degree = g.incident_connections(NodeId(victim)).count();
        let others: Vec<Connection> = g
            .connections()
            .iter()
            .filter(|c| !c.touches(NodeId(victim)))
            .copied()
            .collect();

        g.delete_node(NodeId(victim));
        assert_eq!(g.connections().len(), total - degree);
        assert_eq!(g.connections(), others.as_slice());
    }
}

#[test]
fn adding_output_ports_only_appends() {
    let mut g = FlowGraph::new();
    let c = g.create_node(NodeKind::Condition, 0.0, 0.0);
    let mut expected = vec!["Yes".to_string(), "No".to_string()];
    for label in ["Maybe", "Later", "Never"] {
        let before = g.node(c).unwrap().outputs.len();
        let index = g.add_output_port(c, label).unwrap();
        assert_eq!(index, before);
        expected.push(label.into());
        assert_eq!(g.node(c).unwrap().outputs, expected);
    }
}

#[test]
fn adding_a_port_shifts_later_anchors_only_downwards() {
    let metrics = LayoutMetrics::default();
    let mut g = FlowGraph::new();
    let c = g.create_node(NodeKind::Condition, 100.0, 100.0);
    let before = locate(&g, c, PortRef::Output(1), &metrics).unwrap();
    assert!(locate(&g, c, PortRef::Output(2), &metrics).is_none());

    g.add_option(c);
    let after = locate(&g, c, PortRef::Output(1), &metrics).unwrap();
    let added = locate(&g, c, PortRef::Output(2), &metrics).unwrap();
    assert_eq!(before, after);
    assert!(added.y > after.y);
}

// ─── Transform properties ────────────────────────────────────────────────

#[test]
fn screen_logical_roundtrip_across_states() {
    let origin = Point::new(37.0, 112.5);
    let screens = [
        Point::new(0.0, 0.0),
        Point::new(640.0, 480.0),
        Point::new(-15.25, 9999.0),
        Point::new(1.0e-3, 73.7),
    ];
    for scale in [0.5, 0.7, 1.0, 1.3, 2.0] {
        for (pan_x, pan_y) in [(-2000.0, -2000.0), (0.0, 0.0), (123.4, -56.7)] {
            let vp = Viewport::new(pan_x, pan_y, scale);
            for p in screens {
                let back = vp.to_screen(origin, vp.to_logical(origin, p));
                assert!(
                    (back.x - p.x).abs() < 1e-9 && (back.y - p.y).abs() < 1e-9,
                    "roundtrip drifted at scale {scale}: {p:?} -> {back:?}"
                );
            }
        }
    }
}

#[test]
fn zoom_in_at_max_scale_is_clamped() {
    let limits = ZoomLimits::default();
    let mut vp = Viewport::default();
    while vp.zoom_by(limits.step, &limits) {}
    assert!((vp.scale - limits.max).abs() < 1e-9);
    assert!(!vp.zoom_by(limits.step, &limits));
    assert!((vp.scale - limits.max).abs() < 1e-9);
}
