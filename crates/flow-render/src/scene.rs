//! Editor state → renderer-independent frame.
//!
//! A [`Frame`] holds everything a backend needs to draw one picture of the
//! editor: node cards with resolved geometry, connection curves, the
//! optional preview edge and the minimap. Building a frame is a pure
//! function of its inputs, so rebuilding with unchanged state yields an
//! identical frame.

use flow_core::layout::{LayoutMetrics, NodeGeometry};
use flow_core::minimap::{self, MinimapConfig, MinimapProjection};
use flow_core::model::{Connection, FlowGraph, NodeKind};
use flow_core::route::{CurveRoute, recompute_routes};
use flow_core::transform::Viewport;
use kurbo::{Affine, BezPath, Rect};

/// One node card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub kind: NodeKind,
    pub title: String,
    /// Body text (instruction nodes), or the `"<kind> node"` caption.
    pub caption: String,
    pub output_labels: Vec<String>,
    pub geometry: NodeGeometry,
}

/// A routed connection ready to stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    pub connection: Connection,
    pub curve: CurveRoute,
    pub path: BezPath,
}

/// Transient edge drawn while dragging from an output port.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewEdge {
    pub curve: CurveRoute,
    pub path: BezPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Logical canvas space → canvas-local screen pixels.
    pub transform: Affine,
    pub cards: Vec<Card>,
    pub edges: Vec<EdgePath>,
    pub preview: Option<PreviewEdge>,
    pub minimap: Option<MinimapProjection>,
}

/// Logical → canvas-local transform: translate by the pan offset, then scale.
pub fn viewport_affine(viewport: &Viewport) -> Affine {
    Affine::scale(viewport.scale) * Affine::translate((viewport.pan_x, viewport.pan_y))
}

pub fn to_kurbo(p: flow_core::Point) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

pub fn curve_path(curve: &CurveRoute) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(to_kurbo(curve.from));
    path.curve_to(to_kurbo(curve.ctrl1), to_kurbo(curve.ctrl2), to_kurbo(curve.to));
    path
}

pub fn bounds_rect(b: &flow_core::Bounds) -> Rect {
    Rect::new(b.x, b.y, b.right(), b.bottom())
}

/// Project the editor state into a frame.
pub fn build_frame(
    graph: &FlowGraph,
    viewport: &Viewport,
    preview: Option<CurveRoute>,
    metrics: &LayoutMetrics,
    minimap_config: &MinimapConfig,
) -> Frame {
    let cards = graph
        .nodes()
        .iter()
        .map(|node| Card {
            kind: node.kind.clone(),
            title: node.title.clone(),
            caption: match node.kind {
                NodeKind::Instruction => node.text().unwrap_or_default().to_string(),
                _ => format!("{} node", node.kind),
            },
            output_labels: node.outputs.clone(),
            geometry: NodeGeometry::of(node, metrics),
        })
        .collect();

    let edges = recompute_routes(graph, metrics)
        .into_iter()
        .map(|routed| EdgePath {
            connection: routed.connection,
            path: curve_path(&routed.curve),
            curve: routed.curve,
        })
        .collect();

    Frame {
        transform: viewport_affine(viewport),
        cards,
        edges,
        preview: preview.map(|curve| PreviewEdge {
            path: curve_path(&curve),
            curve,
        }),
        minimap: minimap::project(graph, minimap_config),
    }
}
