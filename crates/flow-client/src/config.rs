//! Gateway configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
/// Environment variable `flowctl` reads `--base-url` from.
pub const API_BASE_ENV: &str = "FLOW_API_BASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server root, without the `/api` suffix.
    pub base_url: String,
    /// Tutorial page the flow document belongs to.
    pub document_id: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            document_id: "3".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            document_id: document_id.into(),
        }
    }

    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn load_url(&self) -> String {
        format!("{}/api/flow/get/{}/", self.root(), self.document_id)
    }

    pub fn save_url(&self) -> String {
        format!("{}/api/flow/save/{}/", self.root(), self.document_id)
    }

    pub fn tutorials_url(&self) -> String {
        format!(
            "{}/api/v2/pages/?type=home.TutorialPage&fields=steps,description",
            self.root()
        )
    }

    pub fn image_url(&self, id: u64) -> String {
        format!("{}/api/v2/images/{id}/", self.root())
    }
}
