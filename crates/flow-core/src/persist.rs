//! Persisted flow document format.
//!
//! The save body is `{ nodes, connections, nextId, canvasX, canvasY, scale }`.
//! Reading is lenient: older payloads spell the viewport `panX`/`panY`/
//! `zoomScale`, and any field may be missing. Missing fields get fixed
//! defaults instead of failing the load.

use crate::config::EditorConfig;
use crate::id::{IdAllocator, NodeId};
use crate::model::{Connection, FlowGraph, Node, NodeKind};
use crate::transform::{Viewport, ZoomLimits};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const DEFAULT_PAN: f64 = -2000.0;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid flow document: {0}")]
    Json(#[from] serde_json::Error),
    /// The backend answered a save with `status != "success"`.
    #[error("Error saving flow: {0}")]
    Rejected(String),
}

/// The full editor state as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowDocument {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    #[serde(rename = "nextId")]
    pub next_id: u32,
    #[serde(rename = "canvasX")]
    pub canvas_x: f64,
    #[serde(rename = "canvasY")]
    pub canvas_y: f64,
    pub scale: f64,
}

impl FlowDocument {
    /// Snapshot a graph and viewport for saving.
    pub fn capture(graph: &FlowGraph, viewport: &Viewport) -> Self {
        Self {
            nodes: graph.nodes().to_vec(),
            connections: graph.connections().to_vec(),
            next_id: graph.next_id(),
            canvas_x: viewport.pan_x,
            canvas_y: viewport.pan_y,
            scale: viewport.scale,
        }
    }

    /// Encode as the JSON save body.
    ///
    /// # Errors
    /// Propagates the encoder error (only possible for non-finite numbers
    /// inside node payloads).
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored document, substituting defaults for missing fields.
    ///
    /// # Errors
    /// Returns `PersistError::Json` if the text is not a JSON object of the
    /// expected shape.
    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        let raw: RawDocument = serde_json::from_str(text)?;
        Ok(raw.into_document())
    }

    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Rebuild the stores and viewport described by this document.
    ///
    /// The id counter never falls behind the largest loaded id, and the
    /// scale is clamped to `limits`.
    pub fn into_state(self, limits: &ZoomLimits) -> (FlowGraph, Viewport) {
        let mut graph = FlowGraph::with_next_id(self.next_id);
        for node in self.nodes {
            graph.insert_node(node);
        }
        for conn in self.connections {
            graph.push_connection(conn);
        }
        let viewport = Viewport::new(self.canvas_x, self.canvas_y, limits.clamp(self.scale));
        (graph, viewport)
    }
}

// ─── Save response ────────────────────────────────────────────────────────

pub const SAVE_OK_MESSAGE: &str = "Flow saved to backend successfully!";
pub const SAVE_NETWORK_MESSAGE: &str = "Network error saving flow.";

/// Body returned by the save endpoint: `{ status, message?, page_id? }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Id of the tutorial page the backend compiled from the flow.
    #[serde(default)]
    pub page_id: Option<u64>,
}

impl SaveResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Turn the response into the page id on success.
    ///
    /// # Errors
    /// `PersistError::Rejected` with the server's message (or the raw
    /// status when no message was sent).
    pub fn into_result(self) -> Result<Option<u64>, PersistError> {
        if self.is_success() {
            return Ok(self.page_id);
        }
        let message = match self.message {
            Some(m) if !m.is_empty() => m,
            _ => format!("status {:?}", self.status),
        };
        Err(PersistError::Rejected(message))
    }

    /// The line shown to the user after the save round-trip.
    pub fn user_message(&self) -> String {
        match self.clone().into_result() {
            Ok(_) => SAVE_OK_MESSAGE.to_string(),
            Err(err) => err.to_string(),
        }
    }
}

// ─── Default graph & restore ──────────────────────────────────────────────

/// The graph a new or empty document opens with: a start node and one
/// instruction node.
pub fn default_graph() -> FlowGraph {
    let mut graph = FlowGraph::new();
    graph.create_node(NodeKind::Start, 2200.0, 2200.0);
    graph.create_node(NodeKind::Instruction, 2500.0, 2200.0);
    graph
}

/// Where restored state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    Document,
    Default,
}

/// Restore editor state from an optional stored payload.
///
/// Absent, blank, undecodable and node-less payloads all fall back to
/// [`default_graph`] with the configured initial viewport.
pub fn restore(payload: Option<&str>, config: &EditorConfig) -> (FlowGraph, Viewport, RestoreSource) {
    let decoded = match payload.map(str::trim) {
        None | Some("") => None,
        Some(text) => match FlowDocument::from_json(text) {
            Ok(doc) => Some(doc),
            Err(err) => {
                log::warn!("falling back to default flow: {err}");
                None
            }
        },
    };

    match decoded {
        Some(doc) if doc.has_nodes() => {
            let (graph, viewport) = doc.into_state(&config.zoom);
            (graph, viewport, RestoreSource::Document)
        }
        _ => (default_graph(), config.initial_viewport(), RestoreSource::Default),
    }
}

// ─── Lenient wire structs ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    nodes: Option<Vec<RawNode>>,
    connections: Option<Vec<RawConnection>>,
    #[serde(rename = "nextId")]
    next_id: Option<u32>,
    #[serde(rename = "canvasX", alias = "panX")]
    canvas_x: Option<f64>,
    #[serde(rename = "canvasY", alias = "panY")]
    canvas_y: Option<f64>,
    #[serde(alias = "zoomScale")]
    scale: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNode {
    id: Option<u32>,
    #[serde(rename = "type")]
    kind: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    title: Option<String>,
    outputs: Option<Vec<String>>,
    inputs: Option<bool>,
    data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConnection {
    from: Option<u32>,
    #[serde(rename = "fromPort")]
    from_port: Option<usize>,
    to: Option<u32>,
}

impl RawDocument {
    fn into_document(self) -> FlowDocument {
        let raw_nodes = self.nodes.unwrap_or_default();

        // Ids missing from the payload are numbered after every explicit one.
        let mut next_id = self.next_id.unwrap_or(1).max(1);
        for id in raw_nodes.iter().filter_map(|n| n.id) {
            if let Some(after) = id.checked_add(1) {
                next_id = next_id.max(after);
            }
        }

        let nodes = raw_nodes
            .into_iter()
            .filter_map(|raw| {
                let id = match raw.id {
                    Some(id) if id > IdAllocator::MAX_ID => {
                        log::warn!("dropping node with out-of-range id {id}");
                        return None;
                    }
                    Some(id) => NodeId(id),
                    None => match next_id.checked_add(1) {
                        Some(after) => {
                            let id = NodeId(next_id);
                            next_id = after;
                            id
                        }
                        None => {
                            log::warn!("dropping node: no id left to assign");
                            return None;
                        }
                    },
                };
                Some(raw.into_node(id))
            })
            .collect();

        let connections = self
            .connections
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| match (c.from, c.to) {
                (Some(from), Some(to)) => Some(Connection::new(
                    NodeId(from),
                    c.from_port.unwrap_or(0),
                    NodeId(to),
                )),
                _ => {
                    log::warn!("dropping connection without endpoints: {c:?}");
                    None
                }
            })
            .collect();

        FlowDocument {
            nodes,
            connections,
            next_id,
            canvas_x: self.canvas_x.unwrap_or(DEFAULT_PAN),
            canvas_y: self.canvas_y.unwrap_or(DEFAULT_PAN),
            scale: self.scale.unwrap_or(1.0),
        }
    }
}

impl RawNode {
    fn into_node(self, id: NodeId) -> Node {
        let kind = NodeKind::from(self.kind.unwrap_or_else(|| "instruction".into()));
        let data = match self.data {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Node {
            id,
            title: self.title.unwrap_or_else(|| kind.default_title()),
            outputs: self.outputs.unwrap_or_else(|| kind.default_outputs()),
            inputs: self.inputs.unwrap_or_else(|| kind.has_input()),
            x: self.x.unwrap_or(0.0),
            y: self.y.unwrap_or(0.0),
            kind,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn save_response_messages() {
        let ok: SaveResponse =
            serde_json::from_str(r#"{"status": "success", "page_id": 41}"#).unwrap();
        assert_eq!(ok.user_message(), "Flow saved to backend successfully!");
        assert_eq!(ok.into_result().unwrap(), Some(41));

        let err: SaveResponse =
            serde_json::from_str(r#"{"status": "error", "message": "bad nodes"}"#).unwrap();
        assert_eq!(err.user_message(), "Error saving flow: bad nodes");

        let bare: SaveResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(bare.into_result(), Err(PersistError::Rejected(_))));
    }

    #[test]
    fn save_body_uses_wire_names() {
        let graph = default_graph();
        let doc = FlowDocument::capture(&graph, &Viewport::default());
        let value: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(value["nextId"], 3);
        assert_eq!(value["canvasX"], -2000.0);
        assert_eq!(value["scale"], 1.0);
        assert_eq!(value["nodes"][0]["type"], "start");
        assert_eq!(value["nodes"][0]["inputs"], false);
        assert_eq!(value["nodes"][1]["outputs"][0], "Next");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let doc = FlowDocument::from_json(r#"{ "nodes": [ { "id": 4, "type": "condition" } ] }"#)
            .unwrap();
        assert_eq!(doc.next_id, 5);
        assert_eq!(doc.canvas_x, -2000.0);
        assert_eq!(doc.scale, 1.0);
        let node = &doc.nodes[0];
        assert_eq!(node.title, "Condition");
        assert_eq!(node.outputs, vec!["Yes", "No"]);
        assert!(node.inputs);
        assert!(node.data.is_empty());
        assert_eq!((node.x, node.y), (0.0, 0.0));
    }

    #[test]
    fn legacy_viewport_names_are_accepted() {
        let doc = FlowDocument::from_json(
            r#"{ "nodes": [], "panX": 12.5, "panY": -3, "zoomScale": 1.5 }"#,
        )
        .unwrap();
        assert_eq!((doc.canvas_x, doc.canvas_y, doc.scale), (12.5, -3.0, 1.5));
    }

    #[test]
    fn nodes_without_ids_are_numbered_after_known_ids() {
        let doc = FlowDocument::from_json(
            r#"{ "nextId": 2, "nodes": [ { "type": "start" }, { "id": 9, "type": "end" } ] }"#,
        )
        .unwrap();
        assert_eq!(doc.nodes[0].id, NodeId(10));
        assert_eq!(doc.next_id, 11);
    }

    #[test]
    fn ids_at_the_top_of_the_range_are_dropped() {
        let config = EditorConfig::default();
        let (graph, _, source) = restore(Some(r#"{"nodes":[{"id":4294967295,"type":"end"}]}"#), &config);
        assert_eq!(source, RestoreSource::Default);
        assert_eq!(graph.node_count(), 2);

        let payload = r#"{
            "nodes": [
                { "id": 4294967295, "type": "end" },
                { "id": 4294967294, "type": "start" },
                { "type": "end" }
            ],
            "connections": [ { "from": 4294967294, "to": 4294967295 } ]
        }"#;
        let (graph, _, source) = restore(Some(payload), &config);
        assert_eq!(source, RestoreSource::Document);
        let ids: Vec<_> = graph.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(IdAllocator::MAX_ID)]);
        assert_eq!(graph.next_id(), u32::MAX);
    }

    #[test]
    fn restore_falls_back_for_empty_payloads() {
        let config = EditorConfig::default();
        for payload in [None, Some(""), Some("   "), Some(r#"{"nodes": [], "connections": []}"#), Some("not json")] {
            let (graph, viewport, source) = restore(payload, &config);
            assert_eq!(source, RestoreSource::Default, "payload {payload:?}");
            assert_eq!(graph.node_count(), 2);
            assert_eq!(viewport, config.initial_viewport());
        }
    }

    #[test]
    fn restore_clamps_scale_and_keeps_dangling_connections() {
        let payload = r#"{
            "nodes": [ { "id": 1, "type": "start", "x": 1, "y": 2 } ],
            "connections": [ { "from": 1, "fromPort": 0, "to": 8 } ],
            "nextId": 2, "canvasX": 0, "canvasY": 0, "scale": 9
        }"#;
        let (graph, viewport, source) = restore(Some(payload), &EditorConfig::default());
        assert_eq!(source, RestoreSource::Document);
        assert_eq!(viewport, Viewport::new(0.0, 0.0, 2.0));
        assert_eq!(graph.connections().len(), 1);
        assert_eq!(graph.next_id(), 2);
    }
}
