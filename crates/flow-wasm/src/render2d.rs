//! Canvas2D software renderer.
//!
//! Draws a [`Frame`] to an HTML `<canvas>` via `CanvasRenderingContext2d`.
//! Unlike the Vello painter this one also draws text: card titles,
//! captions and output labels.

use flow_core::layout::NodeGeometry;
use flow_core::minimap::{MinimapConfig, MinimapProjection};
use flow_core::model::{Bounds, NodeKind};
use flow_core::route::CurveRoute;
use flow_render::{Card, Frame};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const CARD_RADIUS: f64 = 8.0;
const PORT_RADIUS: f64 = 6.0;
const FONT: &str = "Inter, system-ui, sans-serif";

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub card: &'static str,
    pub card_border: &'static str,
    pub header_text: &'static str,
    pub body_text: &'static str,
    pub close: &'static str,
    pub port: &'static str,
    pub edge: &'static str,
    pub preview: &'static str,
    pub minimap_bg: &'static str,
    pub minimap_node: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.05)",
            card: "#FFFFFF",
            card_border: "#D1D5DB",
            header_text: "#FFFFFF",
            body_text: "#374151",
            close: "#FFFFFF",
            port: "#6B7280",
            edge: "#6B7080",
            preview: "rgba(107, 112, 128, 0.7)",
            minimap_bg: "rgba(255, 255, 255, 0.8)",
            minimap_node: "#6366F1",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#0F172A",
            grid: "rgba(255, 255, 255, 0.04)",
            card: "#1E293B",
            card_border: "#334155",
            header_text: "#FFFFFF",
            body_text: "#CBD5E1",
            close: "#FFFFFF",
            port: "#94A3B8",
            edge: "#94A3B8",
            preview: "rgba(148, 163, 184, 0.7)",
            minimap_bg: "rgba(15, 23, 42, 0.8)",
            minimap_node: "#6366F1",
        }
    }

    pub fn header(&self, kind: &NodeKind) -> &'static str {
        match kind {
            NodeKind::Start => "#10B981",
            NodeKind::Instruction => "#3B82F6",
            NodeKind::Condition => "#F59E0B",
            NodeKind::End => "#EF4444",
            NodeKind::Other(_) => "#6B7280",
        }
    }
}

/// Render the canvas part of a frame. Pixel size is `width` × `height`.
pub fn render_frame(ctx: &CanvasRenderingContext2d, frame: &Frame, width: f64, height: f64, theme: &CanvasTheme) {
    let _ = ctx.reset_transform();
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, width, height);
    draw_grid(ctx, width, height, theme);

    let [a, b, c, d, e, f] = frame.transform.as_coeffs();
    ctx.save();
    let _ = ctx.set_transform(a, b, c, d, e, f);

    ctx.set_stroke_style_str(theme.edge);
    ctx.set_line_width(2.0);
    for edge in &frame.edges {
        stroke_curve(ctx, &edge.curve);
    }

    for card in &frame.cards {
        draw_card(ctx, card, theme);
    }

    if let Some(preview) = &frame.preview {
        ctx.save();
        ctx.set_stroke_style_str(theme.preview);
        let _ = ctx.set_line_dash(&js_sys::Array::of2(
            &JsValue::from_f64(5.0),
            &JsValue::from_f64(5.0),
        ));
        stroke_curve(ctx, &preview.curve);
        ctx.restore();
    }

    ctx.restore();
}

fn stroke_curve(ctx: &CanvasRenderingContext2d, curve: &CurveRoute) {
    ctx.begin_path();
    ctx.move_to(curve.from.x, curve.from.y);
    ctx.bezier_curve_to(
        curve.ctrl1.x,
        curve.ctrl1.y,
        curve.ctrl2.x,
        curve.ctrl2.y,
        curve.to.x,
        curve.to.y,
    );
    ctx.stroke();
}

fn draw_card(ctx: &CanvasRenderingContext2d, card: &Card, theme: &CanvasTheme) {
    let geo = &card.geometry;
    let Bounds { x, y, width, height } = geo.bounds;

    rounded_rect_path(ctx, x, y, width, height, CARD_RADIUS);
    ctx.set_fill_style_str(theme.card);
    ctx.fill();
    ctx.set_stroke_style_str(theme.card_border);
    ctx.set_line_width(1.0);
    ctx.stroke();

    // Header band, rounded on top only.
    let h = geo.header;
    ctx.save();
    rounded_rect_path(ctx, x, y, width, height, CARD_RADIUS);
    ctx.clip();
    ctx.set_fill_style_str(theme.header(&card.kind));
    ctx.fill_rect(h.x, h.y, h.width, h.height);
    ctx.restore();

    ctx.set_font(&format!("600 13px {FONT}"));
    ctx.set_fill_style_str(theme.header_text);
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    let title_width = h.width - geo.close_button.width - 12.0;
    let title = fit_text(ctx, &card.title, title_width);
    let _ = ctx.fill_text(&title, h.x + 10.0, h.y + h.height / 2.0);

    draw_close_button(ctx, &geo.close_button, theme);
    draw_body(ctx, card, theme);
    draw_ports(ctx, geo, theme);
}

fn draw_close_button(ctx: &CanvasRenderingContext2d, b: &Bounds, theme: &CanvasTheme) {
    let cx = b.x + b.width / 2.0;
    let cy = b.y + b.height / 2.0;
    let arm = b.width.min(b.height) * 0.18;
    ctx.set_stroke_style_str(theme.close);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(cx - arm, cy - arm);
    ctx.line_to(cx + arm, cy + arm);
    ctx.move_to(cx - arm, cy + arm);
    ctx.line_to(cx + arm, cy - arm);
    ctx.stroke();
}

fn draw_body(ctx: &CanvasRenderingContext2d, card: &Card, theme: &CanvasTheme) {
    let geo = &card.geometry;
    let left = geo.bounds.x + 10.0;
    let top = geo.header.bottom() + 14.0;
    let max_width = geo.bounds.width - 20.0;

    ctx.set_font(&format!("12px {FONT}"));
    ctx.set_fill_style_str(theme.body_text);
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    // Instruction text wraps onto at most three lines.
    for (i, line) in wrap_text(ctx, &card.caption, max_width).iter().take(3).enumerate() {
        let _ = ctx.fill_text(line, left, top + i as f64 * 16.0);
    }

    ctx.set_text_align("right");
    for (label, anchor) in card.output_labels.iter().zip(geo.outputs.iter()) {
        let text = fit_text(ctx, label, max_width - PORT_RADIUS * 2.0);
        let _ = ctx.fill_text(&text, anchor.x - PORT_RADIUS * 2.0, anchor.y);
    }
}

fn draw_ports(ctx: &CanvasRenderingContext2d, geo: &NodeGeometry, theme: &CanvasTheme) {
    ctx.set_fill_style_str(theme.port);
    for anchor in geo.input.iter().chain(geo.outputs.iter()) {
        ctx.begin_path();
        let _ = ctx.arc(anchor.x, anchor.y, PORT_RADIUS, 0.0, std::f64::consts::TAU);
        ctx.fill();
    }
}

fn draw_grid(ctx: &CanvasRenderingContext2d, width: f64, height: f64, theme: &CanvasTheme) {
    ctx.set_fill_style_str(theme.grid);
    let spacing = 20.0;
    let mut x = 0.0;
    while x < width {
        let mut y = 0.0;
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}

// ─── Minimap ──────────────────────────────────────────────────────────────

/// Render the minimap into its own canvas. An empty graph leaves only
/// the background.
pub fn render_minimap(
    ctx: &CanvasRenderingContext2d,
    projection: Option<&MinimapProjection>,
    config: &MinimapConfig,
    theme: &CanvasTheme,
) {
    let _ = ctx.reset_transform();
    ctx.clear_rect(0.0, 0.0, config.width, config.height);
    ctx.set_fill_style_str(theme.minimap_bg);
    ctx.fill_rect(0.0, 0.0, config.width, config.height);

    let Some(projection) = projection else {
        return;
    };
    ctx.set_fill_style_str(theme.minimap_node);
    for mini in &projection.nodes {
        ctx.fill_rect(mini.x, mini.y, mini.width, mini.height);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}

fn text_width(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
    ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
}

/// Truncate `text` with an ellipsis so it fits in `max_width`.
fn fit_text(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> String {
    if text_width(ctx, text) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "…";
        if text_width(ctx, &candidate) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Greedy word wrap. Explicit newlines always break.
fn wrap_text(ctx: &CanvasRenderingContext2d, text: &str, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if !current.is_empty() && text_width(ctx, &candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}
