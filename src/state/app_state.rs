//! Application state

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::EnvConfig;

/// Global shutdown token for gracefully stopping background work
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// Get the global shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN.get_or_init(CancellationToken::new).clone()
}

/// Trigger global shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

/// Application state
pub struct AppState {
    /// API key for request authentication
    pub api_key: String,
    /// Environment configuration
    pub config: EnvConfig,
    /// Service start time
    pub started_at: DateTime<Utc>,
    /// Currently running deployment runs (run id set)
    pub active_runs: RwLock<HashSet<String>>,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            config,
            started_at: Utc::now(),
            active_runs: RwLock::new(HashSet::new()),
        }
    }

    /// Register a deployment run as active
    pub async fn register_run(&self, run_id: &str) {
        self.active_runs.write().await.insert(run_id.to_string());
    }

    /// Remove a finished deployment run
    pub async fn unregister_run(&self, run_id: &str) {
        self.active_runs.write().await.remove(run_id);
    }

    /// Number of deployment runs currently in flight
    pub async fn active_run_count(&self) -> usize {
        self.active_runs.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        let config = EnvConfig {
            api_key: "test-key".to_string(),
            port: 0,
            github: crate::domain::Credentials::new("u", "t"),
            error_policy: crate::config::ErrorPolicy::Abort,
            node_installer: "bin/node-install.sh".to_string(),
        };
        AppState::new(config)
    }

    #[test]
    fn test_trigger_after_init_cancels_token() {
        // The token must be initialized before anything can trigger it;
        // a trigger on an uninitialized OnceLock would be silently lost.
        let token = get_shutdown_token();
        trigger_shutdown();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_registration() {
        let state = test_state();
        assert_eq!(state.active_run_count().await, 0);

        state.register_run("run-1").await;
        state.register_run("run-2").await;
        assert_eq!(state.active_run_count().await, 2);

        state.unregister_run("run-1").await;
        assert_eq!(state.active_run_count().await, 1);
    }
}
