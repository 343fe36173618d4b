//! Command executor
//!
//! Single entry point for spawning external tools (`git`, `zip`, `scp`,
//! `ssh`). Programs are invoked with argv lists, never through a local
//! shell, and every invocation is bounded by a timeout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Command executor
pub struct CommandRunner;

/// Command execution error
#[derive(Debug)]
pub enum CommandError {
    /// The process could not be spawned or awaited
    SpawnFailed(std::io::Error),
    /// The process exceeded its timeout and was killed
    Timeout,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::SpawnFailed(e) => write!(f, "Failed to spawn command: {}", e),
            CommandError::Timeout => write!(f, "Command timed out"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Captured result of a finished command
#[derive(Debug)]
pub struct CommandOutput {
    /// Process exit code (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Captured output lines, stdout first, then stderr, each in
    /// invocation order
    pub lines: Vec<String>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Output joined into a single line for debug logging
    pub fn joined(&self) -> String {
        self.lines.join(" -> ")
    }
}

impl CommandRunner {
    /// Run a program to completion, capturing its output.
    ///
    /// # Arguments
    /// * `program` - program to execute
    /// * `args` - argv list
    /// * `work_dir` - working directory
    /// * `envs` - extra environment variables for the child
    /// * `timeout` - kill the process after this long
    pub async fn run(
        program: &str,
        args: &[&str],
        work_dir: &Path,
        envs: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        for (key, value) in envs {
            command.env(key, value);
        }

        let output = tokio::select! {
            result = command.output() => {
                result.map_err(CommandError::SpawnFailed)?
            }
            _ = tokio::time::sleep(timeout) => {
                return Err(CommandError::Timeout);
            }
        };

        let mut lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        lines.extend(
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .map(str::to_string),
        );

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_run_success() {
        let result = CommandRunner::run(
            "echo",
            &["hello"],
            &PathBuf::from("/tmp"),
            &[],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(result.success());
        assert_eq!(result.lines, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_run_not_found() {
        let result = CommandRunner::run(
            "nonexistent_command_12345",
            &[],
            &PathBuf::from("/tmp"),
            &[],
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(CommandError::SpawnFailed(_))));
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_is_captured() {
        let result = CommandRunner::run(
            "sh",
            &["-c", "echo out; echo err 1>&2; exit 3"],
            &PathBuf::from("/tmp"),
            &[],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(!result.success());
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.lines, vec!["out", "err"]);
        assert_eq!(result.joined(), "out -> err");
    }

    #[tokio::test]
    async fn test_run_preserves_line_order() {
        let result = CommandRunner::run(
            "sh",
            &["-c", "echo one; echo two; echo three"],
            &PathBuf::from("/tmp"),
            &[],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(result.lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_run_env_passthrough() {
        let result = CommandRunner::run(
            "sh",
            &["-c", "printf '%s' \"$TEST_RUNNER_VAR\""],
            &PathBuf::from("/tmp"),
            &[("TEST_RUNNER_VAR", "value")],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(result.lines, vec!["value"]);
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let result = CommandRunner::run(
            "sleep",
            &["5"],
            &PathBuf::from("/tmp"),
            &[],
            Duration::from_millis(100),
        )
        .await;

        assert!(matches!(result, Err(CommandError::Timeout)));
    }
}
