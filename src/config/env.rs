//! Environment variable configuration loading

use std::env;
use tracing::warn;

use crate::domain::deploy::Credentials;

/// Environment configuration
///
/// Loaded once at startup and passed by reference everywhere; no ambient
/// settings lookup at deploy time.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// API key for authenticating incoming requests
    pub api_key: String,
    /// Listening port
    pub port: u16,
    /// Source-control credentials used to build authenticated clone URLs
    pub github: Credentials,
    /// What to do when a deployment step fails
    pub error_policy: ErrorPolicy,
    /// Local path of the Node bootstrap script uploaded to every new site
    pub node_installer: String,
}

/// Per-step failure behavior for a deployment run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the run at the first failed step
    Abort,
    /// Log the failure and move on to the next repository
    Continue,
}

impl ErrorPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "abort" => Some(ErrorPolicy::Abort),
            "continue" => Some(ErrorPolicy::Continue),
            _ => None,
        }
    }
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        // API key - legacy name supported for compatibility
        let api_key = load_with_fallback("DEPLOY_AGENT_API_KEY", "API_KEY")
            .unwrap_or_else(|| "change-me-in-production".to_string());
        if env::var("API_KEY").is_ok() {
            warn!("Deprecated environment variable detected. Please use DEPLOY_AGENT_API_KEY");
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9876);

        let gh_username = env::var("GH_USERNAME").unwrap_or_default();
        let gh_pat = env::var("GH_PAT").unwrap_or_default();
        if gh_username.is_empty() || gh_pat.is_empty() {
            warn!("GH_USERNAME or GH_PAT is not set; private repository clones will fail");
        }

        let error_policy = match env::var("DEPLOY_ON_ERROR") {
            Ok(value) => ErrorPolicy::parse(&value).unwrap_or_else(|| {
                warn!(value = %value, "Unknown DEPLOY_ON_ERROR value, defaulting to abort");
                ErrorPolicy::Abort
            }),
            Err(_) => ErrorPolicy::Abort,
        };

        let node_installer =
            env::var("NODE_INSTALLER_PATH").unwrap_or_else(|_| "bin/node-install.sh".to_string());

        Self {
            api_key,
            port,
            github: Credentials::new(gh_username, gh_pat),
            error_policy,
            node_installer,
        }
    }
}

/// Load an environment variable with a fallback name
fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary).ok().or_else(|| env::var(fallback).ok())
}

/// Constants
pub mod constants {
    /// Timeout for `git clone` (seconds)
    pub const CLONE_TIMEOUT_SECS: u64 = 600;

    /// Timeout for local `zip` invocation (seconds)
    pub const ARCHIVE_TIMEOUT_SECS: u64 = 300;

    /// Timeout for uploading one archive (seconds)
    pub const UPLOAD_TIMEOUT_SECS: u64 = 300;

    /// Timeout for the remote bootstrap script (seconds)
    pub const BOOTSTRAP_TIMEOUT_SECS: u64 = 600;

    /// Timeout for the composite install/build/activate command (seconds)
    pub const REMOTE_CMD_TIMEOUT_SECS: u64 = 1800; // 30 minutes

    /// Version
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_fallback() {
        env::set_var("TEST_PRIMARY", "primary_value");
        env::set_var("TEST_FALLBACK", "fallback_value");

        assert_eq!(
            load_with_fallback("TEST_PRIMARY", "TEST_FALLBACK"),
            Some("primary_value".to_string())
        );

        env::remove_var("TEST_PRIMARY");
        assert_eq!(
            load_with_fallback("TEST_PRIMARY", "TEST_FALLBACK"),
            Some("fallback_value".to_string())
        );

        env::remove_var("TEST_FALLBACK");
        assert_eq!(load_with_fallback("TEST_PRIMARY", "TEST_FALLBACK"), None);
    }

    #[test]
    fn test_error_policy_parse() {
        assert_eq!(ErrorPolicy::parse("abort"), Some(ErrorPolicy::Abort));
        assert_eq!(ErrorPolicy::parse("Continue"), Some(ErrorPolicy::Continue));
        assert_eq!(ErrorPolicy::parse("retry"), None);
    }
}
