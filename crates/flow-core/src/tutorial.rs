//! Tutorial documents and graph → tutorial compilation.
//!
//! A tutorial is an ordered list of step blocks. Each step carries typed
//! content blocks and labelled options pointing at the next step id; an
//! option with an empty destination ends the walk.

use crate::id::NodeId;
use crate::model::{FlowGraph, NodeKind};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Bfs, VisitMap};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

// ─── Documents ────────────────────────────────────────────────────────────

/// Response of the tutorial listing endpoint (`{ "items": [...] }`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TutorialCatalog {
    #[serde(default)]
    pub items: Vec<Tutorial>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tutorial {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<StepBlock>,
}

impl Tutorial {
    /// The entry step: the first block in document order.
    pub fn first_step(&self) -> Option<&Step> {
        self.steps.first().map(|b| &b.value)
    }

    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps
            .iter()
            .map(|b| &b.value)
            .find(|s| s.step_id == step_id)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// `{ "type": "step", "value": {...} }` stream block wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepBlock {
    #[serde(rename = "type", default = "step_block_type")]
    pub kind: String,
    pub value: Step,
}

fn step_block_type() -> String {
    "step".into()
}

impl From<Step> for StepBlock {
    fn from(value: Step) -> Self {
        Self {
            kind: step_block_type(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub options: Vec<StepOption>,
}

impl Step {
    /// A step without options is terminal.
    pub fn is_terminal(&self) -> bool {
        self.options.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOption {
    pub label: String,
    /// Empty string means "finish".
    #[serde(default)]
    pub next_step_id: String,
}

impl StepOption {
    pub fn finishes(&self) -> bool {
        self.next_step_id.is_empty()
    }
}

/// A typed content block inside a step.
///
/// Block types the viewer does not know are kept with their raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBlock", into = "RawBlock")]
pub enum ContentBlock {
    /// Rich-text HTML.
    Text(String),
    /// Reference to an image resolved through the image lookup.
    Image(u64),
    /// Embed HTML.
    Video(String),
    Unsupported { kind: String, value: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Value,
}

impl From<RawBlock> for ContentBlock {
    fn from(raw: RawBlock) -> Self {
        let known = match (raw.kind.as_str(), &raw.value) {
            ("text", Value::String(s)) => Some(ContentBlock::Text(s.clone())),
            ("image", v) => v.as_u64().map(ContentBlock::Image),
            ("video", Value::String(s)) => Some(ContentBlock::Video(s.clone())),
            _ => None,
        };
        known.unwrap_or(ContentBlock::Unsupported {
            kind: raw.kind,
            value: raw.value,
        })
    }
}

impl From<ContentBlock> for RawBlock {
    fn from(block: ContentBlock) -> Self {
        let (kind, value) = match block {
            ContentBlock::Text(s) => ("text".to_string(), Value::String(s)),
            ContentBlock::Image(id) => ("image".to_string(), Value::from(id)),
            ContentBlock::Video(s) => ("video".to_string(), Value::String(s)),
            ContentBlock::Unsupported { kind, value } => (kind, value),
        };
        RawBlock { kind, value }
    }
}

/// Image lookup response, flattened: `{ "title", "meta": { "download_url" } }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawImageMeta")]
pub struct ImageMeta {
    pub title: String,
    pub url: String,
}

#[derive(Deserialize)]
struct RawImageMeta {
    #[serde(default)]
    title: String,
    #[serde(default)]
    meta: RawImageLinks,
}

#[derive(Default, Deserialize)]
struct RawImageLinks {
    #[serde(default)]
    download_url: String,
}

impl From<RawImageMeta> for ImageMeta {
    fn from(raw: RawImageMeta) -> Self {
        Self {
            title: raw.title,
            url: raw.meta.download_url,
        }
    }
}

// ─── Compilation ──────────────────────────────────────────────────────────

/// Turn an editor graph into tutorial step blocks.
///
/// Every non-start node becomes a step whose id is the node id. Options
/// follow the node's outgoing connections in store order, labelled with
/// the source output's label (`"Next"` when the port index is stale).
/// Instruction text, when non-empty, becomes a single text block.
///
/// Steps reachable from a start node come first, in breadth-first order,
/// so the first step is the one the start node leads to. Unreachable
/// steps follow in store order.
pub fn compile_steps(graph: &FlowGraph) -> Vec<StepBlock> {
    let mut topology: DiGraphMap<NodeId, ()> = DiGraphMap::new();
    for node in graph.nodes() {
        topology.add_node(node.id);
    }
    for conn in graph.connections() {
        if graph.contains(conn.from) && graph.contains(conn.to) {
            topology.add_edge(conn.from, conn.to, ());
        }
    }

    let mut order: Vec<NodeId> = Vec::with_capacity(graph.node_count());
    let mut roots = graph
        .nodes()
        .iter()
        .filter(|n| n.kind == NodeKind::Start)
        .map(|n| n.id);
    if let Some(first) = roots.next() {
        let mut bfs = Bfs::new(&topology, first);
        for root in roots {
            if bfs.discovered.visit(root) {
                bfs.stack.push_back(root);
            }
        }
        while let Some(id) = bfs.next(&topology) {
            order.push(id);
        }
    }
    let reached: HashSet<NodeId> = order.iter().copied().collect();
    order.extend(graph.nodes().iter().map(|n| n.id).filter(|id| !reached.contains(id)));

    order
        .into_iter()
        .filter_map(|id| graph.node(id))
        .filter(|node| node.kind != NodeKind::Start)
        .map(|node| {
            let content = match node.text() {
                Some(text) if !text.is_empty() => vec![ContentBlock::Text(text.to_string())],
                _ => Vec::new(),
            };
            let options = graph
                .outgoing(node.id)
                .map(|conn| StepOption {
                    label: node
                        .outputs
                        .get(conn.from_port)
                        .cloned()
                        .unwrap_or_else(|| "Next".into()),
                    next_step_id: conn.to.to_string(),
                })
                .collect();
            StepBlock::from(Step {
                step_id: node.id.to_string(),
                title: node.title.clone(),
                content,
                options,
            })
        })
        .collect()
}
