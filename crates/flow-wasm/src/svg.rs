//! SVG export of the connection layer.
//!
//! Every routed connection becomes a `<path class="connection-line">`
//! carrying its endpoints as data attributes; an active preview edge is
//! exported dashed. Coordinates stay logical, and the view box covers
//! every card and curve.

use crate::render2d::CanvasTheme;
use flow_render::Frame;
use std::fmt::Write;

const PAD: f64 = 16.0;

pub fn render_svg(frame: &Frame, theme: &CanvasTheme) -> String {
    let (min_x, min_y, max_x, max_y) = extent(frame).unwrap_or((0.0, 0.0, 800.0, 600.0));
    let x = min_x - PAD;
    let y = min_y - PAD;
    let width = max_x - min_x + PAD * 2.0;
    let height = max_y - min_y + PAD * 2.0;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{x} {y} {width} {height}\">"
    );
    let _ = writeln!(
        svg,
        "<g class=\"connections\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\">",
        theme.edge
    );
    for edge in &frame.edges {
        let c = edge.connection;
        let _ = writeln!(
            svg,
            "  <path class=\"connection-line\" data-from=\"{}\" data-port=\"{}\" data-to=\"{}\" d=\"{}\"/>",
            c.from,
            c.from_port,
            c.to,
            edge.curve.to_svg_path()
        );
    }
    if let Some(preview) = &frame.preview {
        let _ = writeln!(
            svg,
            "  <path class=\"connection-preview\" stroke=\"{}\" stroke-dasharray=\"5,5\" d=\"{}\"/>",
            theme.preview,
            preview.curve.to_svg_path()
        );
    }
    svg.push_str("</g>\n</svg>");
    svg
}

/// Bounding box of cards and curve control polygons, if there is anything.
fn extent(frame: &Frame) -> Option<(f64, f64, f64, f64)> {
    let card_corners = frame.cards.iter().flat_map(|card| {
        let b = card.geometry.bounds;
        [(b.x, b.y), (b.right(), b.bottom())]
    });
    let curve_points = frame
        .edges
        .iter()
        .map(|e| e.curve)
        .chain(frame.preview.iter().map(|p| p.curve))
        .flat_map(|c| [c.from, c.ctrl1, c.ctrl2, c.to])
        .map(|p| (p.x, p.y));

    card_corners
        .chain(curve_points)
        .fold(None, |acc, (px, py)| match acc {
            None => Some((px, py, px, py)),
            Some((x0, y0, x1, y1)) => Some((x0.min(px), y0.min(py), x1.max(px), y1.max(py))),
        })
}
