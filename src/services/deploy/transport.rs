//! Remote transport
//!
//! Password-authenticated scp/ssh against the newly provisioned site.
//! The password travels in the `SSHPASS` environment variable and is
//! handed to `sshpass -e`; it never appears on a command line.

use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::domain::deploy::RemoteTarget;
use crate::infra::command::CommandOutput;
use crate::infra::CommandRunner;

use super::DeployError;

/// Host key checking is disabled: every target site is freshly provisioned
/// and its key is never seen twice.
const SSH_OPTS: &str = "StrictHostKeyChecking=no";

/// Copy a local file into the remote user's home directory (or any
/// destination path understood by scp).
pub async fn upload(
    source: &Path,
    dest: &str,
    target: &RemoteTarget,
    timeout: Duration,
) -> Result<(), DeployError> {
    let source = source.to_string_lossy();
    let remote = target.scp_dest(dest);

    let output = CommandRunner::run(
        "sshpass",
        &["-e", "scp", "-o", SSH_OPTS, source.as_ref(), &remote],
        &std::env::temp_dir(),
        &[("SSHPASS", target.password.as_str())],
        timeout,
    )
    .await?;

    check("scp", output)
}

/// Execute a command string on the remote host.
///
/// Remote stderr is redirected into the captured output stream, matching
/// what the deployment log expects to see on failure.
pub async fn run_remote(
    target: &RemoteTarget,
    command: &str,
    timeout: Duration,
) -> Result<(), DeployError> {
    let host = target.ssh_host();
    let merged = format!("{} 2>&1", command);

    let output = CommandRunner::run(
        "sshpass",
        &["-e", "ssh", "-o", SSH_OPTS, &host, &merged],
        &std::env::temp_dir(),
        &[("SSHPASS", target.password.as_str())],
        timeout,
    )
    .await?;

    check("ssh", output)
}

/// Non-zero exit becomes a typed error; the code and joined output are
/// logged at debug level.
fn check(step: &'static str, output: CommandOutput) -> Result<(), DeployError> {
    if output.success() {
        return Ok(());
    }
    debug!(
        step = step,
        exit_code = output.exit_code,
        output = %output.joined(),
        "Commands run finished with non-zero exit"
    );
    Err(DeployError::CommandFailed {
        step,
        exit_code: output.exit_code,
        output: output.lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_zero_exit_is_ok() {
        let output = CommandOutput {
            exit_code: 0,
            lines: vec!["done".to_string()],
        };
        assert!(check("ssh", output).is_ok());
    }

    #[test]
    fn test_check_nonzero_exit_is_error() {
        let output = CommandOutput {
            exit_code: 127,
            lines: vec!["line one".to_string(), "line two".to_string()],
        };
        match check("scp", output).unwrap_err() {
            DeployError::CommandFailed {
                step,
                exit_code,
                output,
            } => {
                assert_eq!(step, "scp");
                assert_eq!(exit_code, 127);
                assert_eq!(output, vec!["line one", "line two"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
