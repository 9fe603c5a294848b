use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node on the canvas.
///
/// Plain integer on the wire (`"id": 3`), assigned by [`IdAllocator`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        NodeId(raw)
    }
}

/// Monotonic id counter owned by a flow graph.
///
/// Ids are never reused, not even after the node is deleted or the
/// canvas is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Largest id a stored node may carry. The counter needs one value
    /// past every id it observes, so `u32::MAX` itself is never accepted.
    pub const MAX_ID: u32 = u32::MAX - 1;

    /// Start counting at `next` (values below 1 are bumped to 1).
    pub fn starting_at(next: u32) -> Self {
        Self { next: next.max(1) }
    }

    /// Hand out the next id.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => log::error!("node id space exhausted, {id} handed out again"),
        }
        id
    }

    /// `true` once the counter has reached `u32::MAX`.
    pub fn is_exhausted(&self) -> bool {
        self.next == u32::MAX
    }

    /// The id the next call to `allocate` will return.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Make sure an externally supplied id is never handed out again.
    pub fn observe(&mut self, id: NodeId) {
        if id.0 >= self.next {
            self.next = id.0.saturating_add(1);
        }
    }
}
