//! wechat-server: webhook endpoint for WeChat accounts.
//!
//! Answers the URL verification handshake, authenticates and decrypts
//! callbacks, and sends rule-based passive replies.

mod bot;
mod config;
mod server;

use bot::AutoReply;
use clap::Parser;
use config::ServerConfig;
use server::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// wechat-server: WeChat callback endpoint
#[derive(Parser, Debug)]
#[command(name = "wechat-server", version, about = "WeChat callback endpoint")]
struct Cli {
    /// Listen address (overrides the config file)
    #[arg(long)]
    bind: Option<String>,

    /// Listen port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Callback path (overrides the config file)
    #[arg(long)]
    path: Option<String>,

    /// Config file path
    #[arg(long, default_value = "~/.wechat/server.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config_path = PathBuf::from(&cli.config);
    let server_config = match ServerConfig::load(
        &config_path,
        cli.bind.as_deref(),
        cli.port,
        cli.path.as_deref(),
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let handler = match server_config.handler() {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "invalid account configuration");
            std::process::exit(1);
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = %handler.platform(),
        tenant = %handler.tenant_id(),
        mode = ?handler.mode(),
        "starting wechat-server"
    );

    let state = AppState {
        handler: Arc::new(handler),
        bot: Arc::new(AutoReply::new(&server_config.reply)),
    };
    let app = server::router(state, &server_config.path);

    let addr = SocketAddr::new(server_config.bind, server_config.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%addr, path = %server_config.path, "listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
        std::process::exit(1);
    }

    info!("wechat-server stopped");
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }

    info!("received shutdown signal");
}
