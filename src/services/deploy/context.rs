//! Deployment context
//!
//! Everything a deployment run needs, resolved once at run start; no
//! ambient configuration lookup from inside the pipeline.

use std::sync::Arc;

use crate::config::{EnvConfig, ErrorPolicy};
use crate::domain::deploy::{Credentials, RemoteTarget};
use crate::state::AppState;

/// Execution context for one deployment run
#[derive(Clone)]
pub struct DeployContext {
    /// Run ID, used in log correlation
    pub run_id: String,
    /// Application state
    pub state: Arc<AppState>,
    /// Destination site
    pub target: RemoteTarget,
}

impl DeployContext {
    pub fn config(&self) -> &EnvConfig {
        &self.state.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.state.config.github
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.state.config.error_policy
    }
}
