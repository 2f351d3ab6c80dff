//! chat-relay HTTP server
//!
//! Starts an Axum web server that relays chat-completion requests upstream.

use chat_relay::{
    cli::{Cli, Command, DEFAULT_CONFIG_PATH, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    relay::ApiKey,
    telemetry,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = &cli.command {
        match output {
            Some(path) => {
                std::fs::write(path, generate_config_template())?;
                println!("Wrote configuration template to {}", path);
            }
            None => print!("{}", generate_config_template()),
        }
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    telemetry::init(&config.observability.log_level);

    // Read once; immutable for the rest of the process.
    let api_key = ApiKey::from_env(config.upstream.api_key_env());
    if api_key.is_none() {
        tracing::warn!(
            api_key_env = %config.upstream.api_key_env(),
            "Upstream API key is not set; relay requests will fail with 500"
        );
    }

    tracing::info!(
        upstream_url = %config.upstream.url(),
        "Starting chat-relay on {}:{}",
        config.server.host,
        config.server.port
    );

    let addr = SocketAddr::from((config.server.bind_ip()?, config.server.port));

    let state = AppState::new(Arc::new(config), api_key)?;
    let app = handlers::app(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Load the config file, falling back to defaults when none is present
///
/// An explicitly requested file must exist; the implicit `config.toml` is
/// optional.
fn load_config(path: Option<&str>) -> Result<Config, chat_relay::error::RelayError> {
    match path {
        Some(path) => Config::from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH),
        None => Ok(Config::default()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
