//! Pointer gesture state.
//!
//! At most one gesture is active at a time. Starting a gesture while
//! another is active cancels the old one first (a link drag loses its
//! preview edge, a node drag stops where it is).

use flow_core::id::NodeId;
use flow_core::model::{Connection, Point};

/// An in-progress drag from an output port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkDrag {
    pub from: NodeId,
    pub port: usize,
    /// Free end of the preview edge, in logical space.
    pub preview_end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Dragging empty canvas. `last` is the previous screen position.
    Panning { last: Point },
    /// Dragging a node by its header.
    DraggingNode {
        id: NodeId,
        start_screen: Point,
        /// Node position when the drag started.
        initial: Point,
    },
    Linking(LinkDrag),
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn link(&self) -> Option<&LinkDrag> {
        match self {
            Gesture::Linking(link) => Some(link),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "idle",
            Gesture::Panning { .. } => "panning",
            Gesture::DraggingNode { .. } => "dragging-node",
            Gesture::Linking(_) => "linking",
        }
    }
}

/// How a link drag ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new connection was stored.
    Connected(Connection),
    /// Released over an input port, but the connection was a self-loop
    /// or already existed.
    Rejected,
    /// Released away from any input port, or no link drag was active.
    Cancelled,
}
