//! Connection routing: cubic S-curves between port anchors.

use crate::id::NodeId;
use crate::layout::{LayoutMetrics, NodeGeometry, PortRef};
use crate::model::{Connection, FlowGraph, Point};
use std::collections::HashMap;
use std::fmt::Write;

/// A cubic Bézier from an output anchor to an input anchor.
///
/// Control points sit horizontally `0.5 * |Δx|` away from each endpoint,
/// pointing right from the source and left into the target. The offset
/// is never negative, so handles do not flip when the target is to the
/// left of the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveRoute {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

impl CurveRoute {
    pub fn between(from: Point, to: Point) -> Self {
        let dist = (to.x - from.x).abs() * 0.5;
        Self {
            from,
            ctrl1: Point::new(from.x + dist, from.y),
            ctrl2: Point::new(to.x - dist, to.y),
            to,
        }
    }

    /// SVG path data: `M x1 y1 C c1x c1y, c2x c2y, x2 y2`.
    pub fn to_svg_path(&self) -> String {
        let mut d = String::with_capacity(64);
        let _ = write!(
            d,
            "M {} {} C {} {}, {} {}, {} {}",
            self.from.x,
            self.from.y,
            self.ctrl1.x,
            self.ctrl1.y,
            self.ctrl2.x,
            self.ctrl2.y,
            self.to.x,
            self.to.y
        );
        d
    }
}

/// A stored connection with its resolved curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutedConnection {
    pub connection: Connection,
    pub curve: CurveRoute,
}

/// Route every resolvable connection, in store order.
///
/// Connections whose source port or target input cannot be located are
/// skipped; they stay in the store.
pub fn recompute_routes(graph: &FlowGraph, metrics: &LayoutMetrics) -> Vec<RoutedConnection> {
    let mut cache: HashMap<NodeId, NodeGeometry> = HashMap::new();
    let mut routes = Vec::with_capacity(graph.connections().len());

    for conn in graph.connections() {
        let from = port_of(graph, &mut cache, metrics, conn.from, PortRef::Output(conn.from_port));
        let to = port_of(graph, &mut cache, metrics, conn.to, PortRef::Input);
        match (from, to) {
            (Some(from), Some(to)) => routes.push(RoutedConnection {
                connection: *conn,
                curve: CurveRoute::between(from, to),
            }),
            _ => log::trace!("skipping dangling connection {conn:?}"),
        }
    }
    routes
}

fn port_of(
    graph: &FlowGraph,
    cache: &mut HashMap<NodeId, NodeGeometry>,
    metrics: &LayoutMetrics,
    id: NodeId,
    port: PortRef,
) -> Option<Point> {
    if !cache.contains_key(&id) {
        let node = graph.node(id)?;
        cache.insert(id, NodeGeometry::of(node, metrics));
    }
    cache.get(&id)?.port(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[test]
    fn handles_never_invert() {
        let forward = CurveRoute::between(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(forward.ctrl1, Point::new(50.0, 0.0));
        assert_eq!(forward.ctrl2, Point::new(50.0, 50.0));

        let backward = CurveRoute::between(Point::new(100.0, 0.0), Point::new(0.0, 50.0));
        assert_eq!(backward.ctrl1, Point::new(150.0, 0.0));
        assert_eq!(backward.ctrl2, Point::new(-50.0, 50.0));

        let vertical = CurveRoute::between(Point::new(10.0, 0.0), Point::new(10.0, 90.0));
        assert_eq!(vertical.ctrl1, vertical.from);
        assert_eq!(vertical.ctrl2, vertical.to);
    }

    #[test]
    fn svg_path_format() {
        let curve = CurveRoute::between(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(curve.to_svg_path(), "M 0 0 C 50 0, 50 50, 100 50");
    }

    #[test]
    fn dangling_connections_are_skipped_not_deleted() {
        let mut g = FlowGraph::new();
        let a = g.create_node(NodeKind::Start, 0.0, 0.0);
        let b = g.create_node(NodeKind::End, 400.0, 0.0);
        g.try_add_connection(a, 0, b);
        g.try_add_connection(a, 5, b);
        g.push_connection(Connection::new(a, 0, NodeId(99)));
        // start nodes have no input port
        g.try_add_connection(b, 0, a);

        let routes = recompute_routes(&g, &LayoutMetrics::default());
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].connection, Connection::new(a, 0, b));
        assert_eq!(g.connections().len(), 4);
    }
}
