//! WASM bridge for the flow editor: exposes the editor session and the
//! tutorial viewer to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Pointer coordinates are
//! page pixels; the host reports the canvas container's page position
//! with [`FlowCanvas::set_origin`]. Results that carry more than one
//! value come back as JSON strings.

mod render2d;
mod svg;

use flow_core::config::EditorConfig;
use flow_core::id::NodeId;
use flow_core::model::{NodeKind, Point};
use flow_core::persist::{RestoreSource, SAVE_NETWORK_MESSAGE, SaveResponse};
use flow_core::tutorial::{ImageMeta, TutorialCatalog, compile_steps};
use flow_editor::input::{InputEvent, Modifiers};
use flow_editor::session::{EditorSession, GraphMutation, HostRequest, Invalidation};
use flow_editor::viewer::{BlockView, ImageState, TutorialViewer, ViewerError, ViewerView};
use flow_editor::LinkOutcome;
use flow_render::Hit;
use render2d::CanvasTheme;
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The WASM-facing canvas controller.
///
/// Owns the editor session. All interaction from the page goes through
/// this struct.
#[wasm_bindgen]
pub struct FlowCanvas {
    session: EditorSession,
    width: f64,
    height: f64,
    /// `false` = light (default), `true` = dark.
    dark_mode: bool,
    /// Changes not yet drawn.
    pending: Invalidation,
}

#[wasm_bindgen]
impl FlowCanvas {
    /// Create a controller with the default configuration and an empty
    /// canvas. Call [`FlowCanvas::load`] to open a document.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        Self::with_session(EditorSession::new(EditorConfig::default()), width, height)
    }

    /// Create a controller from a JSON [`EditorConfig`]; missing fields
    /// take their defaults.
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Result<FlowCanvas, JsValue> {
        console_error_panic_hook_setup();
        let config = EditorConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&format!("invalid editor config: {e}")))?;
        Ok(Self::with_session(EditorSession::new(config), width, height))
    }

    /// Replace the open document with a stored payload (the body of the
    /// load endpoint). Returns `"document"`, or `"default"` when the
    /// payload was absent, malformed or had no nodes.
    pub fn load(&mut self, payload: Option<String>) -> String {
        let source = self.session.reload(payload.as_deref());
        self.flush();
        match source {
            RestoreSource::Document => "document".to_string(),
            RestoreSource::Default => "default".to_string(),
        }
    }

    /// JSON body for the save endpoint.
    pub fn save_body(&self) -> Result<String, JsValue> {
        self.session
            .document()
            .to_json()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Tutorial steps compiled from the current graph, as JSON.
    pub fn compiled_steps(&self) -> String {
        serde_json::to_string(&compile_steps(self.session.graph())).unwrap_or_else(|_| "[]".into())
    }

    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.session.set_origin(x, y);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.pending |= Invalidation::ALL;
    }

    pub fn set_theme(&mut self, dark: bool) {
        if self.dark_mode != dark {
            self.dark_mode = dark;
            self.pending |= Invalidation::ALL;
        }
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Whether anything changed since the last [`FlowCanvas::render`].
    pub fn needs_redraw(&mut self) -> bool {
        self.flush()
    }

    /// Whether the minimap changed since the last
    /// [`FlowCanvas::render_minimap`].
    pub fn minimap_dirty(&mut self) -> bool {
        self.flush();
        self.pending.minimap
    }

    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) {
        let frame = self.session.frame();
        render2d::render_frame(ctx, &frame, self.width, self.height, &self.theme());
        self.flush();
        self.pending = Invalidation {
            minimap: self.pending.minimap,
            ..Invalidation::default()
        };
    }

    pub fn render_minimap(&mut self, ctx: &CanvasRenderingContext2d) {
        let frame = self.session.frame();
        let config = &self.session.config().minimap;
        render2d::render_minimap(ctx, frame.minimap.as_ref(), config, &self.theme());
        self.minimap_drawn();
    }

    /// SVG of the connection layer.
    pub fn export_svg(&self) -> String {
        svg::render_svg(&self.session.frame(), &self.theme())
    }

    /// Screen-space body rectangles of every card, for positioning DOM
    /// overlays (text areas, "+ Option" buttons). JSON array of
    /// `{id, type, x, y, width, height}`.
    pub fn node_rects(&self) -> String {
        let metrics = &self.session.config().layout;
        let scale = self.session.viewport().scale;
        let rects: Vec<Value> = self
            .session
            .graph()
            .nodes()
            .iter()
            .map(|node| {
                let body_top = Point::new(node.x, node.y + metrics.header_height);
                let corner = self.session.to_screen(body_top);
                let height = metrics.node_height(&node.kind, node.outputs.len()) - metrics.header_height;
                json!({
                    "id": node.id.0,
                    "type": node.kind.as_str(),
                    "x": corner.x,
                    "y": corner.y,
                    "width": metrics.node_width * scale,
                    "height": height * scale,
                })
            })
            .collect();
        Value::Array(rects).to_string()
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// Pointer pressed. Returns JSON `{"hit", "node", "port", "changed"}`
    /// where `hit` is one of `canvas`, `header`, `close`, `input`,
    /// `output`, `body` or `connection`.
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        _shift: bool,
        _ctrl: bool,
        _alt: bool,
        _meta: bool,
    ) -> String {
        let hit = self.session.pointer_down(Point::new(x, y));
        let mut out = hit_json(&hit);
        out["changed"] = Value::Bool(self.flush());
        out.to_string()
    }

    /// Pointer moved. Returns `true` if the canvas needs a redraw.
    pub fn handle_pointer_move(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.session.handle_event(&InputEvent::PointerMove {
            x,
            y,
            modifiers: Modifiers::new(shift, ctrl, alt, meta),
        });
        self.flush()
    }

    /// Pointer released. Returns JSON `{"changed", "link"}` where `link`
    /// is `connected`, `rejected`, `cancelled` or `none`.
    pub fn handle_pointer_up(
        &mut self,
        x: f64,
        y: f64,
        _shift: bool,
        _ctrl: bool,
        _alt: bool,
        _meta: bool,
    ) -> String {
        let link = match self.session.pointer_up(Point::new(x, y)) {
            Some(LinkOutcome::Connected(_)) => "connected",
            Some(LinkOutcome::Rejected) => "rejected",
            Some(LinkOutcome::Cancelled) => "cancelled",
            None => "none",
        };
        json!({ "changed": self.flush(), "link": link }).to_string()
    }

    /// Double-click removes the connection under the pointer. Returns
    /// `true` if one was removed.
    pub fn handle_double_click(&mut self, x: f64, y: f64) -> bool {
        let removed = self.session.double_click(Point::new(x, y)).is_some();
        self.flush();
        removed
    }

    /// Wheel event. Returns `true` when consumed (Ctrl/⌘ zoom); the host
    /// should then call `preventDefault`.
    pub fn handle_wheel(&mut self, dy: f64, ctrl: bool, meta: bool) -> bool {
        let consumed = self.session.wheel(dy, Modifiers::new(false, ctrl, false, meta));
        self.flush();
        consumed
    }

    /// Keyboard shortcut. Returns JSON `{"changed", "request"}` where
    /// `request` is `save`, `confirmClear` or `none`. For `confirmClear`
    /// the host asks the user and then calls [`FlowCanvas::clear`].
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let request = self.session.handle_event(&InputEvent::Key {
            key: key.to_string(),
            modifiers: Modifiers::new(shift, ctrl, alt, meta),
        });
        let request = match request {
            Some(HostRequest::Save) => "save",
            Some(HostRequest::ConfirmClear) => "confirmClear",
            None => "none",
        };
        json!({ "changed": self.flush(), "request": request }).to_string()
    }

    // ─── Node operations ─────────────────────────────────────────────────

    /// Palette drop at a page position. Returns the new node id.
    pub fn drop_node(&mut self, kind: &str, x: f64, y: f64) -> u32 {
        let id = self.session.drop_from_palette(NodeKind::from(kind), Point::new(x, y));
        self.flush();
        id.0
    }

    /// Append an `Option N` output to a node.
    pub fn add_option(&mut self, id: u32) -> bool {
        self.mutate(GraphMutation::AddOption { id: NodeId(id) })
    }

    pub fn set_node_text(&mut self, id: u32, text: &str) -> bool {
        self.mutate(GraphMutation::SetText {
            id: NodeId(id),
            text: text.to_string(),
        })
    }

    pub fn set_node_title(&mut self, id: u32, title: &str) -> bool {
        self.mutate(GraphMutation::SetTitle {
            id: NodeId(id),
            title: title.to_string(),
        })
    }

    pub fn delete_node(&mut self, id: u32) -> bool {
        self.mutate(GraphMutation::DeleteNode { id: NodeId(id) })
    }

    /// Remove every node and connection (after the host confirmed).
    pub fn clear(&mut self) {
        self.session.clear();
        self.flush();
    }

    // ─── Zoom ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        let step = self.session.config().zoom.step;
        self.session.zoom(step);
        self.flush()
    }

    pub fn zoom_out(&mut self) -> bool {
        let step = self.session.config().zoom.step;
        self.session.zoom(-step);
        self.flush()
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.session.reset_zoom();
        self.flush()
    }

    /// `"100%"`-style label for the zoom indicator.
    pub fn zoom_label(&self) -> String {
        self.session.viewport().zoom_label()
    }

    pub fn node_count(&self) -> usize {
        self.session.graph().node_count()
    }

    pub fn connection_count(&self) -> usize {
        self.session.graph().connections().len()
    }
}

impl FlowCanvas {
    fn with_session(session: EditorSession, width: f64, height: f64) -> Self {
        let mut canvas = Self {
            session,
            width,
            height,
            dark_mode: false,
            pending: Invalidation::ALL,
        };
        canvas.flush();
        canvas
    }

    fn theme(&self) -> CanvasTheme {
        if self.dark_mode {
            CanvasTheme::dark()
        } else {
            CanvasTheme::light()
        }
    }

    fn mutate(&mut self, mutation: GraphMutation) -> bool {
        let changed = self.session.apply_mutation(mutation);
        self.flush();
        changed
    }

    fn minimap_drawn(&mut self) {
        self.flush();
        self.pending.minimap = false;
    }

    /// Move session invalidation into `pending`. Returns `true` if
    /// anything is waiting to be drawn.
    fn flush(&mut self) -> bool {
        self.pending |= self.session.take_invalidation();
        self.pending.any()
    }
}

fn hit_json(hit: &Hit) -> Value {
    let (name, port) = match hit {
        Hit::Canvas => ("canvas", None),
        Hit::Header(_) => ("header", None),
        Hit::CloseButton(_) => ("close", None),
        Hit::InputPort(_) => ("input", None),
        Hit::OutputPort(_, port) => ("output", Some(*port)),
        Hit::Body(_) => ("body", None),
        Hit::Connection(_) => ("connection", None),
    };
    json!({
        "hit": name,
        "node": hit.node().map(|id| id.0),
        "port": port,
    })
}

// ─── Tutorial viewer ──────────────────────────────────────────────────────

/// The WASM-facing tutorial viewer. The host fetches the catalog and
/// image metadata and feeds them in; navigation happens here.
#[wasm_bindgen]
pub struct FlowViewer {
    viewer: TutorialViewer,
}

#[wasm_bindgen]
impl FlowViewer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook_setup();
        Self {
            viewer: TutorialViewer::default(),
        }
    }

    /// Load the tutorial listing response (`{ "items": [...] }`) and show
    /// the catalog. Returns the number of tutorials.
    pub fn load_catalog(&mut self, json: &str) -> Result<usize, JsValue> {
        let catalog: TutorialCatalog = serde_json::from_str(json)
            .map_err(|e| JsValue::from_str(&format!("invalid tutorial catalog: {e}")))?;
        self.viewer = TutorialViewer::new(catalog.items);
        Ok(self.viewer.tutorials().len())
    }

    /// Returns JSON `{"ok":true}` or `{"ok":false,"error":"..."}`.
    pub fn open(&mut self, id: u32) -> String {
        outcome_json(self.viewer.open(u64::from(id)))
    }

    /// Pick option `index` of the current step. Same JSON as
    /// [`FlowViewer::open`]; a missing destination keeps the current step.
    pub fn choose(&mut self, index: usize) -> String {
        outcome_json(self.viewer.choose(index))
    }

    pub fn follow(&mut self, next_step_id: &str) -> String {
        outcome_json(self.viewer.follow(next_step_id))
    }

    pub fn finish(&mut self) {
        self.viewer.finish();
    }

    pub fn back(&mut self) {
        self.viewer.back_to_catalog();
    }

    /// Image ids on the current step the host should fetch.
    pub fn take_image_requests(&mut self) -> Vec<u32> {
        self.viewer
            .take_image_requests()
            .into_iter()
            .filter_map(|id| u32::try_from(id).ok())
            .collect()
    }

    /// Feed back an image lookup response (`{ title, meta: { download_url } }`).
    pub fn image_loaded(&mut self, id: u32, json: &str) {
        let meta = serde_json::from_str::<ImageMeta>(json);
        self.viewer.image_resolved(u64::from(id), meta);
    }

    pub fn image_failed(&mut self, id: u32, reason: &str) {
        self.viewer.image_resolved::<&str>(u64::from(id), Err(reason));
    }

    /// The current screen as JSON; see [`view_json`].
    pub fn view(&self) -> String {
        view_json(&self.viewer.view()).to_string()
    }
}

impl Default for FlowViewer {
    fn default() -> Self {
        Self::new()
    }
}

fn outcome_json(result: Result<(), ViewerError>) -> String {
    match result {
        Ok(()) => json!({ "ok": true }).to_string(),
        Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

/// Viewer screen → JSON:
///
/// - `{"screen":"catalog","entries":[{id,title,description}]}`
/// - `{"screen":"empty","title"}`
/// - `{"screen":"step","title","blocks":[...],"options":[...],"finish"}`
fn view_json(view: &ViewerView) -> Value {
    match view {
        ViewerView::Catalog { entries } => json!({
            "screen": "catalog",
            "entries": entries
                .iter()
                .map(|e| json!({ "id": e.id, "title": e.title, "description": e.description }))
                .collect::<Vec<_>>(),
        }),
        ViewerView::EmptyTutorial { title } => json!({ "screen": "empty", "title": title }),
        ViewerView::Step(step) => json!({
            "screen": "step",
            "title": step.title,
            "blocks": step.blocks.iter().map(block_json).collect::<Vec<_>>(),
            "options": step.options,
            "finish": step.finish,
        }),
    }
}

fn block_json(block: &BlockView) -> Value {
    match block {
        BlockView::Text(html) => json!({ "type": "text", "html": html }),
        BlockView::Video(html) => json!({ "type": "video", "html": html }),
        BlockView::Image { id, state } => match state {
            ImageState::Loading => json!({ "type": "image", "id": id, "state": "loading" }),
            ImageState::Loaded { url, title } => json!({
                "type": "image",
                "id": id,
                "state": "loaded",
                "url": url,
                "title": title,
            }),
            ImageState::Failed => json!({ "type": "image", "id": id, "state": "failed" }),
        },
    }
}

// ─── Standalone helpers (no canvas needed) ────────────────────────────────

/// Interpret the save endpoint's reply. Pass `undefined` when the request
/// itself failed. Returns JSON `{"ok", "message", "pageId"}`.
#[wasm_bindgen]
pub fn save_outcome(response_json: Option<String>) -> String {
    let Some(text) = response_json else {
        log::warn!("save failed: no response");
        return json!({ "ok": false, "message": SAVE_NETWORK_MESSAGE, "pageId": null }).to_string();
    };
    match serde_json::from_str::<SaveResponse>(&text) {
        Ok(response) => json!({
            "ok": response.is_success(),
            "message": response.user_message(),
            "pageId": response.page_id,
        })
        .to_string(),
        Err(e) => {
            log::warn!("save response is not JSON: {e}");
            json!({ "ok": false, "message": SAVE_NETWORK_MESSAGE, "pageId": null }).to_string()
        }
    }
}

/// Set the console log level (`error`, `warn`, `info`, `debug`, `trace`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> bool {
    match level.parse::<log::LevelFilter>() {
        Ok(filter) => {
            log::set_max_level(filter);
            true
        }
        Err(_) => false,
    }
}

// ─── Console plumbing ─────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}: {}", record.level(), record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the panic hook and console logger once.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Flow WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}
