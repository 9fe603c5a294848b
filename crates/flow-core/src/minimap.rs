//! Minimap projection.
//!
//! Fits the padded bounding box of every node footprint into the minimap
//! with a single uniform scale, so the overview never distorts.

use crate::id::NodeId;
use crate::model::{FlowGraph, Point};
use serde::{Deserialize, Serialize};

/// Minimap size and projection constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    pub width: f64,
    pub height: f64,
    /// Logical footprint every node occupies in the overview.
    pub footprint_width: f64,
    pub footprint_height: f64,
    /// Margin added on every side of the node bounding box.
    pub padding: f64,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 150.0,
            footprint_width: 200.0,
            footprint_height: 100.0,
            padding: 500.0,
        }
    }
}

/// A node projected into minimap pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiniNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Result of projecting the whole graph.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapProjection {
    /// Uniform logical → minimap scale.
    pub scale: f64,
    /// Logical coordinate mapped to the minimap's top-left corner.
    pub origin: Point,
    pub nodes: Vec<MiniNode>,
}

impl MinimapProjection {
    /// Project a logical point into minimap pixels.
    pub fn project(&self, p: Point) -> Point {
        Point::new((p.x - self.origin.x) * self.scale, (p.y - self.origin.y) * self.scale)
    }
}

/// Project every node into the minimap. Returns `None` for an empty graph.
pub fn project(graph: &FlowGraph, config: &MinimapConfig) -> Option<MinimapProjection> {
    if graph.is_empty() {
        return None;
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for node in graph.nodes() {
        min_x = min_x.min(node.x);
        min_y = min_y.min(node.y);
        max_x = max_x.max(node.x + config.footprint_width);
        max_y = max_y.max(node.y + config.footprint_height);
    }

    min_x -= config.padding;
    min_y -= config.padding;
    max_x += config.padding;
    max_y += config.padding;

    let box_w = max_x - min_x;
    let box_h = max_y - min_y;
    if box_w <= 0.0 || box_h <= 0.0 {
        return None;
    }
    let scale = (config.width / box_w).min(config.height / box_h);

    let nodes = graph
        .nodes()
        .iter()
        .map(|n| MiniNode {
            id: n.id,
            x: (n.x - min_x) * scale,
            y: (n.y - min_y) * scale,
            width: config.footprint_width * scale,
            height: config.footprint_height * scale,
        })
        .collect();

    Some(MinimapProjection {
        scale,
        origin: Point::new(min_x, min_y),
        nodes,
    })
}
