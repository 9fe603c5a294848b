//! Editor session: the single owned state of an open canvas.
//!
//! The session owns the node and connection stores, the viewport, the
//! active gesture and the invalidation flags a host uses to decide what
//! to redraw. Every change goes through the session, so the flags never
//! miss a mutation.
//!
//! - **Mutations** go through [`EditorSession::apply_mutation`], the only
//!   place that touches the graph.
//! - **Gestures** (pan, node drag, link drag) are driven by pointer events
//!   in screen space and converted through the viewport.

use crate::gesture::{Gesture, LinkDrag, LinkOutcome};
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use flow_core::config::EditorConfig;
use flow_core::id::NodeId;
use flow_core::layout::{PortRef, locate};
use flow_core::model::{Connection, FlowGraph, NodeKind, Point};
use flow_core::persist::{FlowDocument, RestoreSource, restore};
use flow_core::route::CurveRoute;
use flow_core::transform::Viewport;
use flow_render::{Frame, Hit, build_frame, hit_connection, hit_test, input_port_at};

/// Connection pick distance in screen pixels.
const PICK_TOLERANCE: f64 = 6.0;

/// A change to the node or connection store.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    CreateNode { kind: NodeKind, x: f64, y: f64 },
    MoveNode { id: NodeId, x: f64, y: f64 },
    DeleteNode { id: NodeId },
    AddOutputPort { id: NodeId, label: String },
    /// Append an output labelled `Option N`.
    AddOption { id: NodeId },
    SetText { id: NodeId, text: String },
    SetTitle { id: NodeId, title: String },
    Connect { from: NodeId, port: usize, to: NodeId },
    Disconnect(Connection),
    Clear,
}

/// What changed since the host last redrew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub nodes: bool,
    pub connections: bool,
    pub minimap: bool,
    pub viewport: bool,
    pub preview: bool,
}

impl Invalidation {
    pub const ALL: Invalidation = Invalidation {
        nodes: true,
        connections: true,
        minimap: true,
        viewport: true,
        preview: true,
    };

    pub fn any(&self) -> bool {
        self.nodes || self.connections || self.minimap || self.viewport || self.preview
    }

    fn topology(&mut self) {
        self.nodes = true;
        self.connections = true;
        self.minimap = true;
    }
}

impl std::ops::BitOrAssign for Invalidation {
    fn bitor_assign(&mut self, rhs: Invalidation) {
        self.nodes |= rhs.nodes;
        self.connections |= rhs.connections;
        self.minimap |= rhs.minimap;
        self.viewport |= rhs.viewport;
        self.preview |= rhs.preview;
    }
}

/// Work the session cannot do on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    /// Send the current document to the persistence gateway.
    Save,
    /// Ask the user to confirm, then call [`EditorSession::clear`].
    ConfirmClear,
}

pub struct EditorSession {
    graph: FlowGraph,
    viewport: Viewport,
    config: EditorConfig,
    /// Page position of the canvas container's top-left corner.
    origin: Point,
    gesture: Gesture,
    dirty: Invalidation,
}

impl EditorSession {
    /// Open an empty canvas.
    pub fn new(config: EditorConfig) -> Self {
        let viewport = config.initial_viewport();
        Self::with_state(FlowGraph::new(), viewport, config)
    }

    pub fn with_state(graph: FlowGraph, viewport: Viewport, config: EditorConfig) -> Self {
        Self {
            graph,
            viewport,
            config,
            origin: Point::ZERO,
            gesture: Gesture::Idle,
            dirty: Invalidation::ALL,
        }
    }

    /// Open a canvas from a stored payload, falling back to the default
    /// graph when the payload is absent, malformed or has no nodes.
    pub fn restore(payload: Option<&str>, config: EditorConfig) -> (Self, RestoreSource) {
        let (graph, viewport, source) = restore(payload, &config);
        log::info!(
            "opened flow ({source:?}): {} nodes, {} connections",
            graph.node_count(),
            graph.connections().len()
        );
        (Self::with_state(graph, viewport, config), source)
    }

    /// Replace the document in place. Configuration and container origin
    /// carry over; any gesture in progress is dropped.
    pub fn reload(&mut self, payload: Option<&str>) -> RestoreSource {
        let (graph, viewport, source) = restore(payload, &self.config);
        log::info!(
            "reloaded flow ({source:?}): {} nodes, {} connections",
            graph.node_count(),
            graph.connections().len()
        );
        self.graph = graph;
        self.viewport = viewport;
        self.gesture = Gesture::Idle;
        self.dirty = Invalidation::ALL;
        source
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.origin = Point::new(x, y);
    }

    pub fn to_logical(&self, screen: Point) -> Point {
        self.viewport.to_logical(self.origin, screen)
    }

    pub fn to_screen(&self, logical: Point) -> Point {
        self.viewport.to_screen(self.origin, logical)
    }

    /// Return and reset the invalidation flags.
    pub fn take_invalidation(&mut self) -> Invalidation {
        std::mem::take(&mut self.dirty)
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply a store mutation. Returns `true` if anything changed.
    pub fn apply_mutation(&mut self, mutation: GraphMutation) -> bool {
        match mutation {
            GraphMutation::CreateNode { kind, x, y } => {
                self.graph.create_node(kind, x, y);
                self.dirty.topology();
                true
            }
            GraphMutation::MoveNode { id, x, y } => {
                let moved = self.graph.update_position(id, x, y);
                if moved {
                    self.dirty.topology();
                }
                moved
            }
            GraphMutation::DeleteNode { id } => {
                if self.graph.delete_node(id).is_none() {
                    return false;
                }
                let involved = match self.gesture {
                    Gesture::DraggingNode { id: dragged, .. } => dragged == id,
                    Gesture::Linking(link) => link.from == id,
                    _ => false,
                };
                if involved {
                    self.cancel_gesture();
                }
                self.dirty.topology();
                true
            }
            GraphMutation::AddOutputPort { id, label } => {
                let added = self.graph.add_output_port(id, label).is_some();
                if added {
                    self.dirty.nodes = true;
                    self.dirty.connections = true;
                }
                added
            }
            GraphMutation::AddOption { id } => {
                let added = self.graph.add_option(id).is_some();
                if added {
                    self.dirty.nodes = true;
                    self.dirty.connections = true;
                }
                added
            }
            GraphMutation::SetText { id, text } => {
                let changed = self.graph.set_text(id, text);
                self.dirty.nodes |= changed;
                changed
            }
            GraphMutation::SetTitle { id, title } => {
                let changed = self.graph.set_title(id, title);
                self.dirty.nodes |= changed;
                changed
            }
            GraphMutation::Connect { from, port, to } => {
                let added = self.graph.try_add_connection(from, port, to);
                self.dirty.connections |= added;
                added
            }
            GraphMutation::Disconnect(conn) => {
                let removed = self.graph.remove_connection(|c| *c == conn).is_some();
                self.dirty.connections |= removed;
                removed
            }
            GraphMutation::Clear => {
                self.cancel_gesture();
                self.graph.clear();
                self.dirty.topology();
                true
            }
        }
    }

    /// Create a node and return its id.
    pub fn create_node(&mut self, kind: NodeKind, x: f64, y: f64) -> NodeId {
        let id = NodeId(self.graph.next_id());
        self.apply_mutation(GraphMutation::CreateNode { kind, x, y });
        id
    }

    /// Create a node where a palette item was dropped, offset so the card
    /// lands roughly centred under the cursor.
    pub fn drop_from_palette(&mut self, kind: NodeKind, screen: Point) -> NodeId {
        let at = self.to_logical(screen);
        let offset = self.config.drop_offset;
        self.create_node(kind, at.x - offset.x, at.y - offset.y)
    }

    /// Remove every node and connection. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.apply_mutation(GraphMutation::Clear);
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Zoom by `delta`, clamped. Returns `true` if the scale changed.
    pub fn zoom(&mut self, delta: f64) -> bool {
        let changed = self.viewport.zoom_by(delta, &self.config.zoom);
        self.dirty.viewport |= changed;
        changed
    }

    pub fn reset_zoom(&mut self) -> bool {
        let changed = self.viewport.set_scale(1.0, &self.config.zoom);
        self.dirty.viewport |= changed;
        changed
    }

    /// Ctrl/⌘ + wheel zooms one step per event. Returns `true` when the
    /// event was consumed (the host should suppress page scrolling).
    pub fn wheel(&mut self, dy: f64, modifiers: Modifiers) -> bool {
        if !modifiers.command() {
            return false;
        }
        let step = self.config.zoom.step;
        self.zoom(if dy < 0.0 { step } else { -step });
        true
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    fn replace_gesture(&mut self, next: Gesture) {
        if !self.gesture.is_idle() {
            log::debug!("{} cancelled by {}", self.gesture.name(), next.name());
        }
        if self.gesture.link().is_some() || next.link().is_some() {
            self.dirty.preview = true;
        }
        self.gesture = next;
    }

    fn cancel_gesture(&mut self) {
        self.replace_gesture(Gesture::Idle);
    }

    pub fn begin_pan(&mut self, screen: Point) {
        self.replace_gesture(Gesture::Panning { last: screen });
    }

    /// Start dragging `id` by its header. Returns `false` for unknown ids.
    pub fn begin_node_drag(&mut self, id: NodeId, screen: Point) -> bool {
        let Some(initial) = self.graph.node(id).map(|n| n.position()) else {
            return false;
        };
        self.replace_gesture(Gesture::DraggingNode {
            id,
            start_screen: screen,
            initial,
        });
        true
    }

    /// Start a link drag from output `port` of `id`. The preview edge
    /// starts collapsed on the port. Returns `false` if the port does not
    /// exist.
    pub fn begin_output_drag(&mut self, id: NodeId, port: usize) -> bool {
        let Some(anchor) = locate(&self.graph, id, PortRef::Output(port), &self.config.layout) else {
            return false;
        };
        self.replace_gesture(Gesture::Linking(LinkDrag {
            from: id,
            port,
            preview_end: anchor,
        }));
        true
    }

    /// End a link drag over the input port of `target`.
    pub fn release_over_input(&mut self, target: NodeId) -> LinkOutcome {
        let Some(link) = self.gesture.link().copied() else {
            return LinkOutcome::Cancelled;
        };
        self.cancel_gesture();

        let connected = target != link.from
            && self.apply_mutation(GraphMutation::Connect {
                from: link.from,
                port: link.port,
                to: target,
            });
        if connected {
            LinkOutcome::Connected(Connection::new(link.from, link.port, target))
        } else {
            log::debug!("link {}[{}] -> {target} rejected", link.from, link.port);
            LinkOutcome::Rejected
        }
    }

    /// End a link drag anywhere but an input port.
    pub fn release_elsewhere(&mut self) -> LinkOutcome {
        self.cancel_gesture();
        LinkOutcome::Cancelled
    }

    /// Pointer pressed at `screen`. Starts whatever gesture the target
    /// calls for and returns what was hit.
    pub fn pointer_down(&mut self, screen: Point) -> Hit {
        let logical = self.to_logical(screen);
        let tolerance = PICK_TOLERANCE / self.viewport.scale;
        let hit = hit_test(&self.graph, &self.config.layout, logical, tolerance);
        log::trace!("pointer down at {logical:?}: {hit:?}");

        match hit {
            Hit::OutputPort(id, port) => {
                self.begin_output_drag(id, port);
            }
            Hit::CloseButton(id) => {
                self.apply_mutation(GraphMutation::DeleteNode { id });
            }
            Hit::Header(id) => {
                self.begin_node_drag(id, screen);
            }
            Hit::Canvas => self.begin_pan(screen),
            Hit::InputPort(_) | Hit::Body(_) | Hit::Connection(_) => {}
        }
        hit
    }

    pub fn pointer_move(&mut self, screen: Point) {
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Panning { last } => {
                self.viewport.pan_by_screen(screen.x - last.x, screen.y - last.y);
                self.gesture = Gesture::Panning { last: screen };
                self.dirty.viewport = true;
            }
            Gesture::DraggingNode {
                id,
                start_screen,
                initial,
            } => {
                let (dx, dy) = self
                    .viewport
                    .screen_delta_to_logical(screen.x - start_screen.x, screen.y - start_screen.y);
                self.apply_mutation(GraphMutation::MoveNode {
                    id,
                    x: initial.x + dx,
                    y: initial.y + dy,
                });
            }
            Gesture::Linking(link) => {
                self.gesture = Gesture::Linking(LinkDrag {
                    preview_end: self.to_logical(screen),
                    ..link
                });
                self.dirty.preview = true;
            }
        }
    }

    /// Pointer released. Every gesture ends here; a link drag reports how
    /// it ended.
    pub fn pointer_up(&mut self, screen: Point) -> Option<LinkOutcome> {
        if self.gesture.link().is_none() {
            self.cancel_gesture();
            return None;
        }
        let logical = self.to_logical(screen);
        let outcome = match input_port_at(&self.graph, &self.config.layout, logical) {
            Some(target) => self.release_over_input(target),
            None => self.release_elsewhere(),
        };
        Some(outcome)
    }

    /// Double-click removes the connection under the pointer, if any.
    pub fn double_click(&mut self, screen: Point) -> Option<Connection> {
        let logical = self.to_logical(screen);
        let tolerance = PICK_TOLERANCE / self.viewport.scale;
        let conn = hit_connection(&self.graph, &self.config.layout, logical, tolerance)?;
        self.apply_mutation(GraphMutation::Disconnect(conn))
            .then_some(conn)
    }

    pub fn key(&mut self, key: &str, modifiers: Modifiers) -> Option<HostRequest> {
        let action = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        )?;
        match action {
            ShortcutAction::ZoomIn => {
                self.zoom(self.config.zoom.step);
                None
            }
            ShortcutAction::ZoomOut => {
                self.zoom(-self.config.zoom.step);
                None
            }
            ShortcutAction::ZoomReset => {
                self.reset_zoom();
                None
            }
            ShortcutAction::Save => Some(HostRequest::Save),
            ShortcutAction::ClearCanvas => Some(HostRequest::ConfirmClear),
        }
    }

    /// Dispatch a normalized input event.
    pub fn handle_event(&mut self, event: &InputEvent) -> Option<HostRequest> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.pointer_down(Point::new(*x, *y));
            }
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, .. } => {
                if let Some(outcome) = self.pointer_up(Point::new(*x, *y)) {
                    log::debug!("link drag ended: {outcome:?}");
                }
            }
            InputEvent::DoubleClick { x, y } => {
                self.double_click(Point::new(*x, *y));
            }
            InputEvent::Wheel { dy, modifiers, .. } => {
                self.wheel(*dy, *modifiers);
            }
            InputEvent::Key { key, modifiers } => return self.key(key, *modifiers),
        }
        None
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// The preview edge of an active link drag. `None` when idle or when
    /// the source port no longer resolves.
    pub fn preview_curve(&self) -> Option<CurveRoute> {
        let link = self.gesture.link()?;
        let from = locate(&self.graph, link.from, PortRef::Output(link.port), &self.config.layout)?;
        Some(CurveRoute::between(from, link.preview_end))
    }

    pub fn frame(&self) -> Frame {
        build_frame(
            &self.graph,
            &self.viewport,
            self.preview_curve(),
            &self.config.layout,
            &self.config.minimap,
        )
    }

    /// Snapshot for saving.
    pub fn document(&self) -> FlowDocument {
        FlowDocument::capture(&self.graph, &self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> EditorSession {
        let mut s = EditorSession::new(EditorConfig::default());
        s.viewport = Viewport::new(0.0, 0.0, 1.0);
        s
    }

    #[test]
    fn node_drag_follows_cursor_at_any_zoom() {
        let mut s = session();
        let id = s.create_node(NodeKind::Instruction, 100.0, 100.0);
        s.viewport.scale = 2.0;
        assert!(s.begin_node_drag(id, Point::new(300.0, 300.0)));

        s.pointer_move(Point::new(340.0, 320.0));
        assert_eq!(s.graph().node(id).unwrap().position(), Point::new(120.0, 110.0));
        s.pointer_move(Point::new(300.0, 300.0));
        assert_eq!(s.graph().node(id).unwrap().position(), Point::new(100.0, 100.0));

        assert_eq!(s.pointer_up(Point::new(300.0, 300.0)), None);
        assert!(s.gesture().is_idle());
    }

    #[test]
    fn pan_divides_by_scale() {
        let mut s = session();
        s.viewport.scale = 0.5;
        s.begin_pan(Point::new(10.0, 10.0));
        s.pointer_move(Point::new(20.0, 15.0));
        s.pointer_move(Point::new(30.0, 20.0));
        assert_eq!((s.viewport().pan_x, s.viewport().pan_y), (40.0, 20.0));
        assert!(s.take_invalidation().viewport);
    }

    #[test]
    fn palette_drop_offsets_node() {
        let mut s = session();
        s.set_origin(50.0, 60.0);
        let id = s.drop_from_palette(NodeKind::Condition, Point::new(450.0, 360.0));
        let node = s.graph().node(id).unwrap();
        assert_eq!(node.position(), Point::new(300.0, 280.0));
        assert_eq!(node.outputs, vec!["Yes", "No"]);
    }

    #[test]
    fn reload_keeps_container_origin() {
        let mut s = session();
        s.set_origin(40.0, 80.0);
        s.take_invalidation();
        let payload = r#"{ "nodes": [ { "id": 7, "type": "start", "x": 10, "y": 20 } ], "canvasX": 0, "canvasY": 0 }"#;
        assert_eq!(s.reload(Some(payload)), RestoreSource::Document);
        assert_eq!(s.origin(), Point::new(40.0, 80.0));
        assert_eq!(s.to_logical(Point::new(50.0, 100.0)), Point::new(10.0, 20.0));
        assert_eq!(s.graph().node_count(), 1);
        assert!(s.take_invalidation().nodes);
    }

    #[test]
    fn wheel_needs_command_modifier() {
        let mut s = session();
        assert!(!s.wheel(-100.0, Modifiers::NONE));
        assert_eq!(s.viewport().scale, 1.0);
        assert!(s.wheel(-100.0, Modifiers::CTRL));
        assert!((s.viewport().scale - 1.1).abs() < 1e-9);
        assert!(s.wheel(100.0, Modifiers::CTRL));
        assert!((s.viewport().scale - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shortcuts_zoom_and_request_host_work() {
        let mut s = session();
        let cmd = Modifiers::CTRL;
        assert_eq!(s.key("=", cmd), None);
        assert!((s.viewport().scale - 1.1).abs() < 1e-9);
        assert_eq!(s.key("0", cmd), None);
        assert_eq!(s.viewport().scale, 1.0);
        assert_eq!(s.key("s", cmd), Some(HostRequest::Save));
        assert_eq!(
            s.key("Delete", Modifiers { shift: true, ..cmd }),
            Some(HostRequest::ConfirmClear)
        );
        assert_eq!(s.key("q", cmd), None);
    }

    #[test]
    fn deleting_the_dragged_node_ends_the_drag() {
        let mut s = session();
        let id = s.create_node(NodeKind::End, 0.0, 0.0);
        s.begin_node_drag(id, Point::ZERO);
        assert!(s.apply_mutation(GraphMutation::DeleteNode { id }));
        assert!(s.gesture().is_idle());
        assert!(!s.apply_mutation(GraphMutation::DeleteNode { id }));
    }

    #[test]
    fn invalidation_tracks_mutations() {
        let mut s = session();
        s.take_invalidation();
        let id = s.create_node(NodeKind::Condition, 0.0, 0.0);
        assert_eq!(s.take_invalidation(), Invalidation {
            nodes: true,
            connections: true,
            minimap: true,
            viewport: false,
            preview: false,
        });
        assert!(!s.take_invalidation().any());

        s.apply_mutation(GraphMutation::SetText {
            id,
            text: "Check the cable".into(),
        });
        let dirty = s.take_invalidation();
        assert!(dirty.nodes && !dirty.connections && !dirty.minimap);

        assert!(!s.apply_mutation(GraphMutation::MoveNode {
            id: NodeId(99),
            x: 0.0,
            y: 0.0,
        }));
        assert!(!s.take_invalidation().any());

        let mut pending = Invalidation::default();
        pending |= Invalidation {
            viewport: true,
            ..Invalidation::default()
        };
        pending |= Invalidation {
            preview: true,
            ..Invalidation::default()
        };
        assert!(pending.viewport && pending.preview && !pending.nodes);
    }

    #[test]
    fn clear_keeps_id_counter_and_viewport() {
        let mut s = session();
        s.create_node(NodeKind::Start, 0.0, 0.0);
        s.create_node(NodeKind::End, 0.0, 0.0);
        s.zoom(0.3);
        s.clear();
        assert!(s.graph().is_empty());
        assert!((s.viewport().scale - 1.3).abs() < 1e-9);
        assert_eq!(s.create_node(NodeKind::Start, 0.0, 0.0), NodeId(3));
    }

    #[test]
    fn document_captures_viewport() {
        let mut s = session();
        s.create_node(NodeKind::Start, 1.0, 2.0);
        s.zoom(-0.2);
        let doc = s.document();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.next_id, 2);
        assert!((doc.scale - 0.8).abs() < 1e-9);
    }
}
