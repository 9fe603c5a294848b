//! Frame → Vello drawing commands.
//!
//! Cards, ports, connection curves and the dashed preview edge are painted
//! in logical space under the frame's viewport transform, so stroke
//! widths scale with the zoom like the rest of the canvas. The minimap is
//! painted separately in its own pixel space.

use crate::scene::{Card, Frame, bounds_rect, to_kurbo};
use flow_core::minimap::{MinimapConfig, MinimapProjection};
use flow_core::model::NodeKind;
use kurbo::{Affine, Circle, Line, Rect, RoundedRect, Stroke as KurboStroke};
use peniko::{Color, Fill};
use vello::Scene;

const CARD_RADIUS: f64 = 8.0;
const EDGE_WIDTH: f64 = 2.0;

/// Colours used by the Vello painter.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub card: Color,
    pub card_border: Color,
    pub close: Color,
    pub port: Color,
    pub edge: Color,
    pub preview: Color,
    pub minimap_bg: Color,
    pub minimap_node: Color,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            background: Color::from_rgb8(0x0F, 0x17, 0x2A),
            card: Color::from_rgb8(0x1E, 0x29, 0x3B),
            card_border: Color::from_rgb8(0x33, 0x41, 0x55),
            close: Color::from_rgb8(0xEF, 0x44, 0x44),
            port: Color::from_rgb8(0x94, 0xA3, 0xB8),
            edge: Color::from_rgb8(0x94, 0xA3, 0xB8),
            preview: Color::from_rgba8(0x94, 0xA3, 0xB8, 0xB0),
            minimap_bg: Color::from_rgba8(0x0F, 0x17, 0x2A, 0xCC),
            minimap_node: Color::from_rgb8(0x63, 0x66, 0xF1),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::from_rgb8(0xF5, 0xF5, 0xF7),
            card: Color::from_rgb8(0xFF, 0xFF, 0xFF),
            card_border: Color::from_rgb8(0xD1, 0xD5, 0xDB),
            close: Color::from_rgb8(0xEF, 0x44, 0x44),
            port: Color::from_rgb8(0x6B, 0x72, 0x80),
            edge: Color::from_rgb8(0x6B, 0x70, 0x80),
            preview: Color::from_rgba8(0x6B, 0x70, 0x80, 0xB0),
            minimap_bg: Color::from_rgba8(0xFF, 0xFF, 0xFF, 0xCC),
            minimap_node: Color::from_rgb8(0x63, 0x66, 0xF1),
        }
    }

    /// Header colour per node kind.
    pub fn header(&self, kind: &NodeKind) -> Color {
        match kind {
            NodeKind::Start => Color::from_rgb8(0x10, 0xB9, 0x81),
            NodeKind::Instruction => Color::from_rgb8(0x3B, 0x82, 0xF6),
            NodeKind::Condition => Color::from_rgb8(0xF5, 0x9E, 0x0B),
            NodeKind::End => Color::from_rgb8(0xEF, 0x44, 0x44),
            NodeKind::Other(_) => Color::from_rgb8(0x6B, 0x72, 0x80),
        }
    }
}

/// Paint the canvas portion of a frame.
///
/// Call once per frame with a freshly-cleared `Scene`. The caller
/// presents the scene and paints the minimap with [`paint_minimap`].
pub fn paint_frame(scene: &mut Scene, frame: &Frame, palette: &Palette, size: (f64, f64)) {
    let backdrop = Rect::new(0.0, 0.0, size.0, size.1);
    scene.fill(Fill::NonZero, Affine::IDENTITY, palette.background, None, &backdrop);

    let t = frame.transform;
    let edge_stroke = KurboStroke::new(EDGE_WIDTH);
    for edge in &frame.edges {
        scene.stroke(&edge_stroke, t, palette.edge, None, &edge.path);
    }

    for card in &frame.cards {
        paint_card(scene, t, card, palette);
    }

    if let Some(preview) = &frame.preview {
        let dashed = KurboStroke::new(EDGE_WIDTH).with_dashes(0.0, [5.0, 5.0]);
        scene.stroke(&dashed, t, palette.preview, None, &preview.path);
    }
}

fn paint_card(scene: &mut Scene, t: Affine, card: &Card, palette: &Palette) {
    let geo = &card.geometry;
    let body = bounds_rect(&geo.bounds).to_rounded_rect(CARD_RADIUS);
    scene.fill(Fill::NonZero, t, palette.card, None, &body);
    scene.stroke(&KurboStroke::new(1.0), t, palette.card_border, None, &body);

    let header = bounds_rect(&geo.header);
    let header_shape = RoundedRect::from_rect(
        header,
        (CARD_RADIUS, CARD_RADIUS, 0.0, 0.0),
    );
    scene.fill(Fill::NonZero, t, palette.header(&card.kind), None, &header_shape);

    // ×
    let close = bounds_rect(&geo.close_button);
    let c = close.center();
    let arm = close.width().min(close.height()) * 0.2;
    let cross = KurboStroke::new(2.0);
    scene.stroke(&cross, t, palette.close, None, &Line::new((c.x - arm, c.y - arm), (c.x + arm, c.y + arm)));
    scene.stroke(&cross, t, palette.close, None, &Line::new((c.x - arm, c.y + arm), (c.x + arm, c.y - arm)));

    // Text shaping needs a font context; the Canvas2D renderer draws labels.
    log::trace!("card {} {:?} ({} outputs)", geo.id, card.title, card.output_labels.len());

    if let Some(input) = geo.input {
        scene.fill(Fill::NonZero, t, palette.port, None, &Circle::new(to_kurbo(input), 6.0));
    }
    for anchor in &geo.outputs {
        scene.fill(Fill::NonZero, t, palette.port, None, &Circle::new(to_kurbo(*anchor), 6.0));
    }
}

/// Paint the minimap with its top-left corner at `at` (canvas-local pixels).
pub fn paint_minimap(
    scene: &mut Scene,
    projection: Option<&MinimapProjection>,
    config: &MinimapConfig,
    palette: &Palette,
    at: kurbo::Point,
) {
    let t = Affine::translate(at.to_vec2());
    let frame = Rect::new(0.0, 0.0, config.width, config.height).to_rounded_rect(4.0);
    scene.fill(Fill::NonZero, t, palette.minimap_bg, None, &frame);
    scene.stroke(&KurboStroke::new(1.0), t, palette.card_border, None, &frame);

    let Some(projection) = projection else {
        return;
    };
    for mini in &projection.nodes {
        let r = Rect::new(mini.x, mini.y, mini.x + mini.width, mini.y + mini.height);
        scene.fill(Fill::NonZero, t, palette.minimap_node, None, &r);
    }
}
