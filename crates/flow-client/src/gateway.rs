//! HTTP gateway to the flow backend.
//!
//! Every call is a single request with no retry. Failures come back as
//! [`GatewayError`]; callers keep their in-memory state untouched.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use flow_core::config::EditorConfig;
use flow_core::model::FlowGraph;
use flow_core::persist::{FlowDocument, RestoreSource, SAVE_OK_MESSAGE, SaveResponse, restore};
use flow_core::transform::Viewport;
use flow_core::tutorial::{ImageMeta, Tutorial, TutorialCatalog};

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// What the server said (`"Saved 4 steps."`).
    pub server_message: Option<String>,
    /// Tutorial page compiled from the flow.
    pub page_id: Option<u64>,
}

impl SaveReceipt {
    pub fn user_message(&self) -> &'static str {
        SAVE_OK_MESSAGE
    }
}

pub struct FlowGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl FlowGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Stored payload text. `None` when the backend returned an empty body.
    pub async fn fetch_document(&self) -> Result<Option<String>, GatewayError> {
        let url = self.config.load_url();
        log::debug!("GET {url}");
        let resp = self.client.get(&url).send().await?;
        check_status(resp.status(), &url)?;
        let text = resp.text().await?;
        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }

    /// Load the stored flow. Undecodable or node-less payloads restore the
    /// default graph; only transport and HTTP failures are errors.
    pub async fn load(&self, editor: &EditorConfig) -> Result<(FlowGraph, Viewport, RestoreSource), GatewayError> {
        let payload = self.fetch_document().await?;
        Ok(restore(payload.as_deref(), editor))
    }

    /// Like [`FlowGateway::load`], but a failed request also falls back to
    /// the default graph.
    pub async fn load_or_default(&self, editor: &EditorConfig) -> (FlowGraph, Viewport, RestoreSource) {
        match self.load(editor).await {
            Ok(state) => state,
            Err(err) => {
                log::warn!("loading flow {} failed, opening default: {err}", self.config.document_id);
                restore(None, editor)
            }
        }
    }

    pub async fn save(&self, document: &FlowDocument) -> Result<SaveReceipt, GatewayError> {
        let url = self.config.save_url();
        log::debug!(
            "POST {url} ({} nodes, {} connections)",
            document.nodes.len(),
            document.connections.len()
        );
        let resp = self.client.post(&url).json(document).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let receipt = interpret_save(status.as_u16(), &body, &url);
        match &receipt {
            Ok(r) => log::info!("flow saved (page {:?})", r.page_id),
            Err(err) => log::warn!("save failed: {err}"),
        }
        receipt
    }

    /// Every published tutorial, in listing order.
    pub async fn tutorials(&self) -> Result<Vec<Tutorial>, GatewayError> {
        let url = self.config.tutorials_url();
        log::debug!("GET {url}");
        let resp = self.client.get(&url).send().await?;
        check_status(resp.status(), &url)?;
        let body = resp.text().await?;
        Ok(decode_catalog(&body)?.items)
    }

    pub async fn image_meta(&self, id: u64) -> Result<ImageMeta, GatewayError> {
        let url = self.config.image_url(id);
        log::debug!("GET {url}");
        let resp = self.client.get(&url).send().await?;
        check_status(resp.status(), &url)?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn check_status(status: reqwest::StatusCode, url: &str) -> Result<(), GatewayError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(GatewayError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

/// Interpret a save reply. The backend reports failures as
/// `{ "status": "error", "message" }`, usually with HTTP 400, so the body
/// is read before the status code.
pub fn interpret_save(status: u16, body: &str, url: &str) -> Result<SaveReceipt, GatewayError> {
    match serde_json::from_str::<SaveResponse>(body) {
        Ok(response) => {
            let server_message = response.message.clone();
            let page_id = response.into_result()?;
            Ok(SaveReceipt {
                server_message,
                page_id,
            })
        }
        Err(_) if !(200..300).contains(&status) => Err(GatewayError::Status {
            status,
            url: url.to_string(),
        }),
        Err(err) => Err(GatewayError::Decode(err)),
    }
}

pub fn decode_catalog(body: &str) -> Result<TutorialCatalog, GatewayError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "http://localhost/api/flow/save/3/";

    #[test]
    fn save_success_carries_page_id() {
        let receipt = interpret_save(
            200,
            r#"{"status": "success", "message": "Saved 3 steps.", "page_id": 3}"#,
            URL,
        )
        .unwrap();
        assert_eq!(
            receipt,
            SaveReceipt {
                server_message: Some("Saved 3 steps.".into()),
                page_id: Some(3),
            }
        );
        assert_eq!(receipt.user_message(), "Flow saved to backend successfully!");
    }

    #[test]
    fn save_error_body_wins_over_status() {
        let err = interpret_save(400, r#"{"status": "error", "message": "boom"}"#, URL).unwrap_err();
        assert!(matches!(&err, GatewayError::Rejected(_)));
        assert_eq!(err.user_message(), "Error saving flow: boom");
    }

    #[test]
    fn save_non_json_failure_reports_status() {
        let err = interpret_save(502, "<html>Bad Gateway</html>", URL).unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 502, .. }));
        let err = interpret_save(200, "not json", URL).unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn catalog_without_items_is_empty() {
        assert!(decode_catalog("{}").unwrap().items.is_empty());
        assert!(decode_catalog("\"nope\"").is_err());
    }
}
