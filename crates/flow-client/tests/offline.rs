//! Gateway behavior when the backend cannot be reached.

use flow_client::{FlowGateway, GatewayConfig, GatewayError};
use flow_core::config::EditorConfig;
use flow_core::persist::{FlowDocument, RestoreSource, default_graph};
use flow_core::transform::Viewport;
use pretty_assertions::assert_eq;

fn unreachable() -> FlowGateway {
    // Port 1 (tcpmux) is closed on any development machine.
    FlowGateway::new(GatewayConfig::new("http://127.0.0.1:1", "3")).unwrap()
}

#[tokio::test]
async fn failed_load_opens_default_graph() {
    let editor = EditorConfig::default();
    let (graph, viewport, source) = unreachable().load_or_default(&editor).await;
    assert_eq!(source, RestoreSource::Default);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(viewport, editor.initial_viewport());
}

#[tokio::test]
async fn failed_save_is_a_network_error() {
    let document = FlowDocument::capture(&default_graph(), &Viewport::default());
    let err = unreachable().save(&document).await.unwrap_err();
    assert!(matches!(err, GatewayError::Network(_)));
    assert_eq!(err.user_message(), "Network error saving flow.");
}
