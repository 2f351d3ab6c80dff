//! chat-relay - credential-injecting forward proxy for LLM chat completions
//!
//! Accepts chat-completion requests from a front-end, adds the server-held
//! API key, and relays them to one upstream chat-completions API. Responses
//! come back as buffered JSON or as a passthrough byte stream.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod relay;
pub mod telemetry;
