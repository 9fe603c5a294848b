//! Hit testing: logical point → editor target.
//!
//! Cards are checked front-to-back (last painted = topmost). Within a
//! card, ports win over the close button, the close button over the
//! header, and the header over the body. Connections sit underneath every
//! card and are picked by distance to the curve.

use crate::scene::to_kurbo;
use flow_core::id::NodeId;
use flow_core::layout::{LayoutMetrics, NodeGeometry};
use flow_core::model::{Connection, FlowGraph, Point};
use flow_core::route::recompute_routes;
use kurbo::{CubicBez, ParamCurveNearest};

/// What a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Canvas,
    Header(NodeId),
    CloseButton(NodeId),
    InputPort(NodeId),
    OutputPort(NodeId, usize),
    Body(NodeId),
    Connection(Connection),
}

impl Hit {
    /// The node under the pointer, if any.
    pub fn node(&self) -> Option<NodeId> {
        match *self {
            Hit::Header(id)
            | Hit::CloseButton(id)
            | Hit::InputPort(id)
            | Hit::OutputPort(id, _)
            | Hit::Body(id) => Some(id),
            Hit::Canvas | Hit::Connection(_) => None,
        }
    }
}

/// Find the topmost target at logical point `p`.
///
/// `tolerance` is the pick distance for connections, in logical units
/// (callers divide a screen tolerance by the zoom scale).
pub fn hit_test(graph: &FlowGraph, metrics: &LayoutMetrics, p: Point, tolerance: f64) -> Hit {
    for node in graph.nodes().iter().rev() {
        let geo = NodeGeometry::of(node, metrics);
        if let Some(hit) = hit_card(&geo, metrics, p) {
            return hit;
        }
    }

    match hit_connection(graph, metrics, p, tolerance) {
        Some(conn) => Hit::Connection(conn),
        None => Hit::Canvas,
    }
}

fn hit_card(geo: &NodeGeometry, metrics: &LayoutMetrics, p: Point) -> Option<Hit> {
    let r2 = metrics.port_radius * metrics.port_radius;

    for (i, anchor) in geo.outputs.iter().enumerate() {
        if anchor.distance_sq(p) <= r2 {
            return Some(Hit::OutputPort(geo.id, i));
        }
    }
    if let Some(anchor) = geo.input
        && anchor.distance_sq(p) <= r2
    {
        return Some(Hit::InputPort(geo.id));
    }
    if geo.close_button.contains(p) {
        return Some(Hit::CloseButton(geo.id));
    }
    if geo.header.contains(p) {
        return Some(Hit::Header(geo.id));
    }
    if geo.bounds.contains(p) {
        return Some(Hit::Body(geo.id));
    }
    None
}

/// Nearest routed connection within `tolerance` of `p`.
pub fn hit_connection(
    graph: &FlowGraph,
    metrics: &LayoutMetrics,
    p: Point,
    tolerance: f64,
) -> Option<Connection> {
    let target = to_kurbo(p);
    let limit = tolerance * tolerance;

    recompute_routes(graph, metrics)
        .into_iter()
        .filter_map(|routed| {
            let c = routed.curve;
            let bez = CubicBez::new(
                to_kurbo(c.from),
                to_kurbo(c.ctrl1),
                to_kurbo(c.ctrl2),
                to_kurbo(c.to),
            );
            let nearest = bez.nearest(target, 1e-3);
            (nearest.distance_sq <= limit).then_some((nearest.distance_sq, routed.connection))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, conn)| conn)
}

/// Input port under `p`, if any. Used when a link drag is released.
pub fn input_port_at(graph: &FlowGraph, metrics: &LayoutMetrics, p: Point) -> Option<NodeId> {
    match hit_test(graph, metrics, p, 0.0) {
        Hit::InputPort(id) => Some(id),
        _ => None,
    }
}
