//! Flow backend client: load and save flow documents, list tutorials and
//! resolve image metadata over HTTP.

pub mod config;
pub mod error;
pub mod gateway;

pub use config::{API_BASE_ENV, DEFAULT_API_BASE, GatewayConfig};
pub use error::GatewayError;
pub use gateway::{FlowGateway, SaveReceipt, decode_catalog, interpret_save};
