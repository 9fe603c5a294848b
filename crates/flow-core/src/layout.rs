//! Analytic node layout and port locator.
//!
//! Port anchors are computed from the node's kind and port count using
//! fixed layout metrics, so a port can be located without anything
//! having been rendered first.
//!
//! ```text
//!  ┌──────────────────────────┐
//!  │ header            [×]    │  header_height
//! ●│ body                     │  body height (by kind)
//!  │                  label ● │  output_row_height per output
//!  │                  label ● │
//!  └──────────────────────────┘  padding
//! ```

use crate::id::NodeId;
use crate::model::{Bounds, FlowGraph, Node, NodeKind, Point};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Sizes used to lay out a node card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub node_width: f64,
    pub header_height: f64,
    /// Body height for instruction nodes (text area).
    pub instruction_body: f64,
    /// Body height for condition nodes ("+ Option" button).
    pub condition_body: f64,
    /// Body height for every other kind (caption line).
    pub default_body: f64,
    pub output_row_height: f64,
    pub padding: f64,
    /// Width of the delete button at the right end of the header.
    pub close_button_width: f64,
    /// Pick radius around a port anchor.
    pub port_radius: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            header_height: 36.0,
            instruction_body: 80.0,
            condition_body: 40.0,
            default_body: 32.0,
            output_row_height: 26.0,
            padding: 8.0,
            close_button_width: 28.0,
            port_radius: 8.0,
        }
    }
}

impl LayoutMetrics {
    pub fn body_height(&self, kind: &NodeKind) -> f64 {
        match kind {
            NodeKind::Instruction => self.instruction_body,
            NodeKind::Condition => self.condition_body,
            _ => self.default_body,
        }
    }

    /// Card height for a node of `kind` with `outputs` ports.
    pub fn node_height(&self, kind: &NodeKind, outputs: usize) -> f64 {
        self.header_height
            + self.body_height(kind)
            + outputs as f64 * self.output_row_height
            + self.padding
    }
}

/// Which port of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRef {
    Input,
    Output(usize),
}

/// Resolved geometry of one node card in logical space.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGeometry {
    pub id: NodeId,
    pub bounds: Bounds,
    pub header: Bounds,
    pub close_button: Bounds,
    pub input: Option<Point>,
    pub outputs: SmallVec<[Point; 4]>,
}

impl NodeGeometry {
    /// Lay out a single node.
    pub fn of(node: &Node, metrics: &LayoutMetrics) -> Self {
        let width = metrics.node_width;
        let height = metrics.node_height(&node.kind, node.outputs.len());
        let bounds = Bounds {
            x: node.x,
            y: node.y,
            width,
            height,
        };
        let header = Bounds {
            x: node.x,
            y: node.y,
            width,
            height: metrics.header_height,
        };
        let close_button = Bounds {
            x: node.x + width - metrics.close_button_width,
            y: node.y,
            width: metrics.close_button_width,
            height: metrics.header_height,
        };

        let input = node
            .inputs
            .then(|| Point::new(node.x, node.y + metrics.header_height / 2.0));

        let rows_top = node.y + metrics.header_height + metrics.body_height(&node.kind);
        let outputs = (0..node.outputs.len())
            .map(|i| {
                Point::new(
                    node.x + width,
                    rows_top + metrics.output_row_height * (i as f64 + 0.5),
                )
            })
            .collect();

        Self {
            id: node.id,
            bounds,
            header,
            close_button,
            input,
            outputs,
        }
    }

    /// Anchor of `port`, or `None` if the node has no such port.
    pub fn port(&self, port: PortRef) -> Option<Point> {
        match port {
            PortRef::Input => self.input,
            PortRef::Output(i) => self.outputs.get(i).copied(),
        }
    }
}

/// Locate a port in logical space.
///
/// Returns `None` for unknown nodes, for the input of a node without an
/// input port, and for output indices past the node's current outputs.
pub fn locate(graph: &FlowGraph, id: NodeId, port: PortRef, metrics: &LayoutMetrics) -> Option<Point> {
    let node = graph.node(id)?;
    NodeGeometry::of(node, metrics).port(port)
}

/// Lay out every node in the graph.
pub fn resolve_layout(graph: &FlowGraph, metrics: &LayoutMetrics) -> HashMap<NodeId, NodeGeometry> {
    graph
        .nodes()
        .iter()
        .map(|node| (node.id, NodeGeometry::of(node, metrics)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_anchor_only_when_declared() {
        let mut g = FlowGraph::new();
        let start = g.create_node(NodeKind::Start, 0.0, 0.0);
        let end = g.create_node(NodeKind::End, 100.0, 50.0);
        let m = LayoutMetrics::default();

        assert_eq!(locate(&g, start, PortRef::Input, &m), None);
        assert_eq!(
            locate(&g, end, PortRef::Input, &m),
            Some(Point::new(100.0, 50.0 + m.header_height / 2.0))
        );
        assert_eq!(locate(&g, NodeId(77), PortRef::Input, &m), None);
    }

    #[test]
    fn output_anchors_stack_below_body() {
        let mut g = FlowGraph::new();
        let c = g.create_node(NodeKind::Condition, 10.0, 20.0);
        let m = LayoutMetrics::default();

        let yes = locate(&g, c, PortRef::Output(0), &m).unwrap();
        let no = locate(&g, c, PortRef::Output(1), &m).unwrap();
        assert_eq!(yes.x, 10.0 + m.node_width);
        assert_eq!(no.y - yes.y, m.output_row_height);
        assert_eq!(
            yes.y,
            20.0 + m.header_height + m.condition_body + m.output_row_height / 2.0
        );
        assert_eq!(locate(&g, c, PortRef::Output(2), &m), None);
    }

    #[test]
    fn adding_a_port_grows_the_card_and_keeps_existing_anchors() {
        let mut g = FlowGraph::new();
        let c = g.create_node(NodeKind::Condition, 0.0, 0.0);
        let m = LayoutMetrics::default();
        let before = NodeGeometry::of(g.node(c).unwrap(), &m);

        g.add_option(c);
        let after = NodeGeometry::of(g.node(c).unwrap(), &m);
        assert_eq!(after.outputs.len(), 3);
        assert_eq!(&after.outputs[..2], &before.outputs[..]);
        assert_eq!(after.bounds.height - before.bounds.height, m.output_row_height);
    }

    #[test]
    fn geometry_follows_position() {
        let mut g = FlowGraph::new();
        let n = g.create_node(NodeKind::Instruction, 0.0, 0.0);
        let m = LayoutMetrics::default();
        let a = locate(&g, n, PortRef::Output(0), &m).unwrap();
        g.update_position(n, 30.0, -40.0);
        let b = locate(&g, n, PortRef::Output(0), &m).unwrap();
        assert_eq!((b.x - a.x, b.y - a.y), (30.0, -40.0));
    }

    #[test]
    fn resolve_covers_every_node() {
        let mut g = FlowGraph::new();
        g.create_node(NodeKind::Start, 0.0, 0.0);
        g.create_node(NodeKind::End, 300.0, 0.0);
        let layout = resolve_layout(&g, &LayoutMetrics::default());
        assert_eq!(layout.len(), 2);
        assert!(layout[&NodeId(1)].close_button.x > layout[&NodeId(1)].header.x);
    }
}
