//! JN Deploy Agent
//!
//! Installs private Git repositories as plugins on freshly provisioned
//! WordPress test sites. The provisioner notifies the agent over HTTP
//! after creating a site; the agent clones each requested repository,
//! archives it, uploads it, and installs/builds/activates it remotely.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod middleware;
pub mod services;
pub mod state;

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::state::app_state::{get_shutdown_token, trigger_shutdown};
use crate::state::AppState;

/// Command-line overrides applied on top of the environment configuration
#[derive(Debug, Default)]
pub struct RuntimeConfig {
    pub port_override: Option<u16>,
}

/// Initialize logging and configuration, then serve the agent until
/// shutdown.
pub async fn init_and_run(runtime: RuntimeConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = EnvConfig::from_env();
    if let Some(port) = runtime.port_override {
        config.port = port;
    }
    let port = config.port;

    let state = Arc::new(AppState::new(config));
    let app = api::router(state);

    // Initialize the token before the signal task can race against it;
    // trigger_shutdown is a no-op on an uninitialized token.
    let shutdown = get_shutdown_token();

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            trigger_shutdown();
        }
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind listening port");
    info!(port = port, "jn-deploy-agent listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await
        .expect("Server error");
}
