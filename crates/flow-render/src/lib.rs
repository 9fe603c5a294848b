//! Flow editor rendering: frame projection, Vello painting, hit testing.

pub mod hit;
pub mod paint;
pub mod scene;

pub use hit::{Hit, hit_connection, hit_test, input_port_at};
pub use paint::{Palette, paint_frame, paint_minimap};
pub use scene::{Card, EdgePath, Frame, PreviewEdge, build_frame, curve_path, viewport_affine};
