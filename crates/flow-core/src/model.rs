//! Core data model for flow documents.
//!
//! A flow is an ordered list of typed nodes plus a list of directed
//! connections from a node's output port to another node's input port.
//! Nodes live in logical canvas space (top-left anchored), independent
//! of the viewport's pan and zoom.

use crate::id::{IdAllocator, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A point in either screen or logical canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned box in logical canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The type of a node. Serialized as its lowercase name (`"condition"`).
///
/// Unknown names coming from a stored document are kept verbatim in
/// `Other` so they survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Start,
    Instruction,
    Condition,
    End,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Instruction => "instruction",
            NodeKind::Condition => "condition",
            NodeKind::End => "end",
            NodeKind::Other(name) => name,
        }
    }

    /// Output labels a freshly created node of this kind starts with.
    pub fn default_outputs(&self) -> Vec<String> {
        match self {
            NodeKind::Condition => vec!["Yes".into(), "No".into()],
            NodeKind::End => Vec::new(),
            _ => vec!["Next".into()],
        }
    }

    /// Every kind except `start` accepts incoming connections.
    pub fn has_input(&self) -> bool {
        !matches!(self, NodeKind::Start)
    }

    /// Kind name with the first letter upper-cased (`"instruction"` → `"Instruction"`).
    pub fn default_title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "start" => NodeKind::Start,
            "instruction" => NodeKind::Instruction,
            "condition" => NodeKind::Condition,
            "end" => NodeKind::End,
            _ => NodeKind::Other(name),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(name: &str) -> Self {
        NodeKind::from(name.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Nodes & connections ─────────────────────────────────────────────────

/// A single node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Top-left corner in logical canvas space.
    pub x: f64,
    pub y: f64,
    pub title: String,
    /// Output port labels; the index is the port number.
    pub outputs: Vec<String>,
    /// Whether the node renders an input port.
    pub inputs: bool,
    /// Free-form payload (e.g. `text` for instruction nodes).
    pub data: Map<String, Value>,
}

impl Node {
    /// Build a node seeded from its kind's defaults.
    pub fn new(id: NodeId, kind: NodeKind, x: f64, y: f64) -> Self {
        Self {
            id,
            title: kind.default_title(),
            outputs: kind.default_outputs(),
            inputs: kind.has_input(),
            kind,
            x,
            y,
            data: Map::new(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Instruction text stored under `data.text`.
    pub fn text(&self) -> Option<&str> {
        self.data.get("text").and_then(Value::as_str)
    }
}

/// A directed edge from output port `from_port` of `from` to the input of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: NodeId,
    #[serde(rename = "fromPort", default)]
    pub from_port: usize,
    pub to: NodeId,
}

impl Connection {
    pub const fn new(from: NodeId, from_port: usize, to: NodeId) -> Self {
        Self {
            from,
            from_port,
            to,
        }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }
}

// ─── Flow graph ──────────────────────────────────────────────────────────

/// Node store + connection store.
///
/// Nodes keep insertion order (render and save order). An id → position
/// index keeps lookups O(1) on the drag hot path.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    connections: Vec<Connection>,
    ids: IdAllocator,
}

impl FlowGraph {
    /// Create an empty graph whose id counter starts at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph whose id counter starts at `next_id`.
    #[must_use]
    pub fn with_next_id(next_id: u32) -> Self {
        Self {
            ids: IdAllocator::starting_at(next_id),
            ..Self::default()
        }
    }

    // ─── Node store ──────────────────────────────────────────────────────

    /// Create a node of `kind` at `(x, y)` and return its id.
    pub fn create_node(&mut self, kind: NodeKind, x: f64, y: f64) -> NodeId {
        let id = self.ids.allocate();
        if self.index.contains_key(&id) {
            log::error!("not creating {kind} node: id {id} already in use");
            return id;
        }
        log::debug!("create {kind} node {id} at ({x}, {y})");
        self.push_node(Node::new(id, kind, x, y));
        id
    }

    /// Reserve the next id without creating a node.
    pub fn allocate_id(&mut self) -> NodeId {
        self.ids.allocate()
    }

    /// Insert a fully-formed node (bulk load). Returns `false` and leaves
    /// the store untouched if the id is already present.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            log::warn!("duplicate node id {} ignored", node.id);
            return false;
        }
        if node.id.0 > IdAllocator::MAX_ID {
            log::warn!("node id {} out of range, ignored", node.id);
            return false;
        }
        self.ids.observe(node.id);
        self.push_node(node);
        true
    }

    fn push_node(&mut self, node: Node) {
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index.get(&id).copied().map(|i| &mut self.nodes[i])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The id the next created node will get (persisted as `nextId`).
    pub fn next_id(&self) -> u32 {
        self.ids.peek()
    }

    /// Overwrite a node's position. Returns `false` for unknown ids.
    pub fn update_position(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    /// Remove a node and every connection touching it.
    pub fn delete_node(&mut self, id: NodeId) -> Option<Node> {
        let pos = self.index.remove(&id)?;
        let removed = self.nodes.remove(pos);
        self.rebuild_index();

        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        log::debug!(
            "deleted node {id} and {} incident connection(s)",
            before - self.connections.len()
        );
        Some(removed)
    }

    /// Append an output port. Returns the new port's index.
    pub fn add_output_port(&mut self, id: NodeId, label: impl Into<String>) -> Option<usize> {
        let node = self.node_mut(id)?;
        node.outputs.push(label.into());
        Some(node.outputs.len() - 1)
    }

    /// Append an output labelled `Option N` (N = new port count).
    pub fn add_option(&mut self, id: NodeId) -> Option<usize> {
        let count = self.node(id)?.outputs.len();
        self.add_output_port(id, format!("Option {}", count + 1))
    }

    /// Store instruction text under `data.text`.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.data.insert("text".into(), Value::String(text.into()));
                true
            }
            None => false,
        }
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Drop every node and connection. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.connections.clear();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.id, i);
        }
    }

    // ─── Connection store ────────────────────────────────────────────────

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Add `from[from_port] → to` unless it is a self-loop or already present.
    pub fn try_add_connection(&mut self, from: NodeId, from_port: usize, to: NodeId) -> bool {
        if from == to {
            return false;
        }
        let conn = Connection::new(from, from_port, to);
        if self.connections.contains(&conn) {
            return false;
        }
        log::debug!("connect {from}[{from_port}] -> {to}");
        self.connections.push(conn);
        true
    }

    /// Remove the first connection matching `pred`.
    pub fn remove_connection<F>(&mut self, pred: F) -> Option<Connection>
    where
        F: Fn(&Connection) -> bool,
    {
        let pos = self.connections.iter().position(pred)?;
        Some(self.connections.remove(pos))
    }

    /// Connections leaving or entering `id`.
    pub fn incident_connections(&self, id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.touches(id))
    }

    /// Outgoing connections of `id`, in insertion order.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from == id)
    }

    /// Whether both endpoints of `conn` currently resolve to a port.
    pub fn is_resolvable(&self, conn: &Connection) -> bool {
        let source_ok = self
            .node(conn.from)
            .is_some_and(|n| conn.from_port < n.outputs.len());
        let target_ok = self.node(conn.to).is_some_and(|n| n.inputs);
        source_ok && target_ok
    }

    /// Append a stored connection without the self-loop/duplicate checks
    /// (bulk load keeps whatever the document contains).
    pub fn push_connection(&mut self, conn: Connection) {
        self.connections.push(conn);
    }
}
