//! Command-line interface for chat-relay
//!
//! Provides argument parsing and subcommand handling for the chat-relay binary.

use clap::{Parser, Subcommand};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Credential-injecting forward proxy for an LLM chat-completions API
#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(version)]
#[command(about = "Credential-injecting forward proxy for an LLM chat-completions API")]
#[command(
    long_about = "chat-relay accepts chat-completion requests from browser front-ends, \
    adds the server-held API key, and relays them to a single upstream API. \
    Responses come back either as buffered JSON or as a passthrough event stream."
)]
pub struct Cli {
    /// Path to configuration file (defaults to ./config.toml if it exists)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Address to bind, overrides server.host
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on, overrides server.port
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# chat-relay configuration
#
# Every key is optional; the values below are the defaults.
# The upstream API key is NOT stored here. Export it in the environment
# variable named by upstream.api_key_env instead.

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Largest accepted request body in bytes
max_body_bytes = 2097152

[upstream]
# Chat-completions endpoint every request is relayed to
url = "https://openrouter.ai/api/v1/chat/completions"

# Environment variable holding the upstream API key
api_key_env = "OPENROUTER_API_KEY"

# Sent as HTTP-Referer / X-Title when the client does not supply its own.
# Informational only.
default_referer = "http://localhost:3000"
default_title = "Chat Relay"

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Message previews in logs are cut to this many characters
preview_chars = 50
"#
}
