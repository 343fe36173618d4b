//! Deployment pipeline
//!
//! One run covers all repositories requested for one newly created site,
//! strictly in order: bootstrap the remote Node toolchain once, then for
//! each repository clone/archive locally, upload the archive, and run the
//! composite install/build/activate command on the site.

pub mod archive;
pub mod context;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::env::constants::{
    BOOTSTRAP_TIMEOUT_SECS, REMOTE_CMD_TIMEOUT_SECS, UPLOAD_TIMEOUT_SECS,
};
use crate::config::ErrorPolicy;
use crate::domain::deploy::{InvalidDescriptor, RemoteTarget, RepoDescriptor};
use crate::infra::command::CommandError;
use crate::state::AppState;

pub use context::DeployContext;

/// Deployment pipeline error
#[derive(Debug)]
pub enum DeployError {
    /// A descriptor field failed validation
    InvalidDescriptor(InvalidDescriptor),
    /// An external tool exited non-zero
    CommandFailed {
        step: &'static str,
        exit_code: i32,
        output: Vec<String>,
    },
    /// An external tool could not be run at all
    Command(CommandError),
    /// Local filesystem failure (temp directory handling)
    Io(std::io::Error),
}

impl std::fmt::Display for DeployError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployError::InvalidDescriptor(e) => write!(f, "{}", e),
            DeployError::CommandFailed {
                step, exit_code, ..
            } => write!(f, "{} exited with code {}", step, exit_code),
            DeployError::Command(e) => write!(f, "{}", e),
            DeployError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for DeployError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeployError::InvalidDescriptor(e) => Some(e),
            DeployError::Command(e) => Some(e),
            DeployError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvalidDescriptor> for DeployError {
    fn from(e: InvalidDescriptor) -> Self {
        DeployError::InvalidDescriptor(e)
    }
}

impl From<CommandError> for DeployError {
    fn from(e: CommandError) -> Self {
        DeployError::Command(e)
    }
}

impl From<std::io::Error> for DeployError {
    fn from(e: std::io::Error) -> Self {
        DeployError::Io(e)
    }
}

/// Execute one deployment run.
///
/// This is the entry point spawned by the API layer after a site has been
/// created. Repositories are processed sequentially; what happens after a
/// failed step depends on the configured [`ErrorPolicy`].
pub async fn execute(
    state: Arc<AppState>,
    run_id: String,
    target: RemoteTarget,
    repos: Vec<RepoDescriptor>,
) {
    if repos.is_empty() {
        return;
    }

    state.register_run(&run_id).await;
    let ctx = DeployContext {
        run_id: run_id.clone(),
        state: state.clone(),
        target,
    };

    info!(
        run_id = %ctx.run_id,
        domain = %ctx.target.domain,
        repos = repos.len(),
        "Starting deployment run"
    );

    run_pipeline(&ctx, &repos).await;

    state.unregister_run(&run_id).await;
    info!(run_id = %run_id, "Deployment run finished");
}

async fn run_pipeline(ctx: &DeployContext, repos: &[RepoDescriptor]) {
    // The Node toolchain is prepared once per run, even when no repository
    // asks for a build.
    if let Err(e) = bootstrap_node(ctx).await {
        error!(run_id = %ctx.run_id, error = %e, "Node bootstrap failed");
        if ctx.error_policy() == ErrorPolicy::Abort {
            return;
        }
    }

    for repo in repos {
        match deploy_repo(ctx, repo).await {
            Ok(()) => {
                info!(
                    run_id = %ctx.run_id,
                    repo = %repo.name,
                    "Plugin deployed and activated"
                );
            }
            Err(e) => {
                error!(
                    run_id = %ctx.run_id,
                    repo = %repo.name,
                    error = %e,
                    "Plugin deployment failed"
                );
                if ctx.error_policy() == ErrorPolicy::Abort {
                    return;
                }
            }
        }
    }
}

/// Upload the Node installer script and run it on the remote host
async fn bootstrap_node(ctx: &DeployContext) -> Result<(), DeployError> {
    let installer = std::path::Path::new(&ctx.config().node_installer);
    transport::upload(
        installer,
        "~/node-install.sh",
        &ctx.target,
        Duration::from_secs(UPLOAD_TIMEOUT_SECS),
    )
    .await?;

    transport::run_remote(
        &ctx.target,
        "chmod +x ~/node-install.sh && ~/node-install.sh",
        Duration::from_secs(BOOTSTRAP_TIMEOUT_SECS),
    )
    .await
}

/// Archive, upload, install, and activate one repository
async fn deploy_repo(ctx: &DeployContext, repo: &RepoDescriptor) -> Result<(), DeployError> {
    repo.validate()?;

    let (tmp, archive_path) = archive::archive(repo, ctx.credentials()).await?;

    let upload_result = transport::upload(
        &archive_path,
        &repo.archive_name(),
        &ctx.target,
        Duration::from_secs(UPLOAD_TIMEOUT_SECS),
    )
    .await;
    // The local archive is removed whether or not the upload succeeded.
    drop(tmp);
    upload_result?;

    transport::run_remote(
        &ctx.target,
        &install_command(repo, &ctx.target.user),
        Duration::from_secs(REMOTE_CMD_TIMEOUT_SECS),
    )
    .await
}

/// Plugin directory of the site served for `user`
fn plugins_dir(user: &str) -> String {
    format!("~/apps/{}/public/wp-content/plugins", user)
}

/// Build the composite remote command for one repository: source the Node
/// environment, unzip the uploaded archive into the plugin directory,
/// optionally install and build, then activate the plugin by slug.
fn install_command(repo: &RepoDescriptor, user: &str) -> String {
    let plugins_dir = plugins_dir(user);
    let build_cmd = if repo.build {
        " && npm install && npm run build"
    } else {
        ""
    };
    format!(
        "source ~/.nvm/nvm.sh && unzip {archive} -d {plugins_dir} && cd {plugins_dir}/{name}{build_cmd} && cd .. && wp plugin activate {name}",
        archive = repo.archive_name(),
        plugins_dir = plugins_dir,
        name = repo.name,
        build_cmd = build_cmd,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(build: bool) -> RepoDescriptor {
        RepoDescriptor {
            name: "foo".to_string(),
            url: "github.com/acme".to_string(),
            branch: "main".to_string(),
            build,
        }
    }

    #[test]
    fn test_plugins_dir() {
        assert_eq!(
            plugins_dir("admin"),
            "~/apps/admin/public/wp-content/plugins"
        );
    }

    #[test]
    fn test_install_command_with_build() {
        let cmd = install_command(&repo(true), "admin");
        assert_eq!(
            cmd,
            "source ~/.nvm/nvm.sh \
             && unzip foo.zip -d ~/apps/admin/public/wp-content/plugins \
             && cd ~/apps/admin/public/wp-content/plugins/foo \
             && npm install && npm run build \
             && cd .. \
             && wp plugin activate foo"
        );
    }

    #[test]
    fn test_install_command_without_build() {
        let cmd = install_command(&repo(false), "admin");
        assert!(!cmd.contains("npm install"));
        assert!(!cmd.contains("npm run build"));
        assert!(cmd.contains("unzip foo.zip -d ~/apps/admin/public/wp-content/plugins"));
        assert!(cmd.ends_with("wp plugin activate foo"));
    }

    #[tokio::test]
    async fn test_execute_empty_repo_list_is_a_noop() {
        let config = crate::config::EnvConfig {
            api_key: "k".to_string(),
            port: 0,
            github: crate::domain::Credentials::new("u", "t"),
            error_policy: ErrorPolicy::Abort,
            node_installer: "bin/node-install.sh".to_string(),
        };
        let state = Arc::new(AppState::new(config));
        let target = RemoteTarget {
            domain: "site.example".to_string(),
            user: "admin".to_string(),
            password: "pw".to_string(),
        };

        // No repos: returns immediately, touches nothing, registers nothing.
        execute(state.clone(), "run-1".to_string(), target, Vec::new()).await;
        assert_eq!(state.active_run_count().await, 0);
    }
}
