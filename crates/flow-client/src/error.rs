use flow_core::persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    /// The backend answered but refused the request.
    #[error("{0}")]
    Rejected(String),
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid flow document: {0}")]
    Document(PersistError),
}

impl From<PersistError> for GatewayError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Rejected(message) => GatewayError::Rejected(format!("Error saving flow: {message}")),
            other => GatewayError::Document(other),
        }
    }
}

impl GatewayError {
    /// Short line suitable for an alert or status bar.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Network(_) => flow_core::persist::SAVE_NETWORK_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
