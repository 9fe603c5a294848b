//! Flow editor core: node and connection stores, coordinate transform,
//! port layout, connection routing, minimap projection, persistence
//! format and tutorial compilation.
//!
//! Nothing here touches the DOM or the network; the render, editor and
//! wasm crates build on these types.

pub mod config;
pub mod id;
pub mod layout;
pub mod minimap;
pub mod model;
pub mod persist;
pub mod route;
pub mod transform;
pub mod tutorial;

pub use config::EditorConfig;
pub use id::{IdAllocator, NodeId};
pub use layout::{LayoutMetrics, NodeGeometry, PortRef, locate, resolve_layout};
pub use minimap::{MiniNode, MinimapConfig, MinimapProjection};
pub use model::*;
pub use persist::{
    FlowDocument, PersistError, RestoreSource, SAVE_NETWORK_MESSAGE, SAVE_OK_MESSAGE, SaveResponse,
    default_graph, restore,
};
pub use route::{CurveRoute, RoutedConnection, recompute_routes};
pub use transform::{Viewport, ZoomLimits};
pub use tutorial::{
    ContentBlock, ImageMeta, Step, StepBlock, StepOption, Tutorial, TutorialCatalog, compile_steps,
};
