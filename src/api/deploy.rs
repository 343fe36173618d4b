//! Deployment API
//!
//! Contains the /deploy endpoint the provisioner calls after creating a
//! site. This is the standalone counterpart of the post-creation hook:
//! the request carries the creation outcome, the new site's coordinates,
//! and the raw request parameter map the repository list travels in.

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::deploy::RemoteTarget;
use crate::domain::features;
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireApiKey;
use crate::services;
use crate::state::AppState;

/// Site-creation notification
#[derive(Debug, Clone, Deserialize)]
pub struct DeployRequest {
    /// Error message when site creation failed; the run is skipped entirely
    pub site_error: Option<String>,
    /// Domain of the new site
    pub domain: String,
    /// Site admin username
    pub username: String,
    /// Site admin password
    pub password: String,
    /// PHP version the site was provisioned with (informational)
    pub php_version: Option<String>,
    /// Raw request parameters from the original site-creation request
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Deployment trigger response
#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub status: &'static str,
    /// Run ID for log correlation; empty when the run was skipped
    pub run_id: String,
    /// Number of repositories accepted for deployment
    pub repos: usize,
}

/// Build the deployment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/deploy", post(site_created))
}

/// Handle a site-creation notification
///
/// POST /deploy
/// Requires API key
///
/// The deployment itself runs in a background task; the response only
/// acknowledges that the run was started.
async fn site_created(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeployRequest>,
) -> ApiResult<impl IntoResponse> {
    process(state, request).await.map(Json)
}

/// Decide whether the notification starts a deployment run
async fn process(state: Arc<AppState>, request: DeployRequest) -> ApiResult<DeployResponse> {
    if let Some(error) = request.site_error {
        info!(error = %error, "Site creation failed, skipping deployment");
        return Ok(DeployResponse {
            status: "skipped",
            run_id: String::new(),
            repos: 0,
        });
    }

    if request.domain.is_empty() || request.username.is_empty() {
        return Err(ApiError::bad_request("domain and username are required"));
    }

    let repos = features::extract_repos(&request.params).unwrap_or_default();
    if repos.is_empty() {
        return Ok(DeployResponse {
            status: "skipped",
            run_id: String::new(),
            repos: 0,
        });
    }

    let target = RemoteTarget {
        domain: request.domain,
        user: request.username,
        password: request.password,
    };
    let run_id = uuid::Uuid::new_v4().to_string();

    info!(
        run_id = %run_id,
        domain = %target.domain,
        php_version = request.php_version.as_deref().unwrap_or("unknown"),
        repos = repos.len(),
        "Accepted deployment run"
    );

    let response = DeployResponse {
        status: "running",
        run_id: run_id.clone(),
        repos: repos.len(),
    };

    tokio::spawn(services::deploy::execute(state, run_id, target, repos));

    Ok(response)
}
