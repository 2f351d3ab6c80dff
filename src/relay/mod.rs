//! Relay core: request model, credential, and the upstream client

pub mod client;
pub mod credential;
pub mod types;

pub use client::UpstreamClient;
pub use credential::ApiKey;
pub use types::{ChatMessage, MessageRole, RelayRequest, UpstreamPayload, preview};
