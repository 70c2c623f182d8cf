//! Command invocation seam
//!
//! The runner never spawns processes directly; it goes through
//! [`CommandExecutor`] so tests can script exit codes without touching the
//! host. [`ShellExecutor`] is the production implementation: each step's
//! command string runs under `sh -c`, with a `sudo` prefix when the step
//! requires elevated privilege.

use std::path::Path;
use std::process::Command;

use crate::error::{FarmhandError, FarmhandResult};
use crate::plan::DeploymentStep;

/// Outcome of invoking one step's command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit status; `None` when the process died to a signal
    pub status: Option<i32>,
    /// Interleaved stdout then stderr, lossily decoded
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs one step's command to completion in the given working directory.
pub trait CommandExecutor {
    fn run(&mut self, step: &DeploymentStep, cwd: &Path) -> FarmhandResult<ExecOutput>;
}

/// Production executor: `sh -c` via `std::process::Command`.
///
/// Blocks until the command returns; the spec defines no timeout model.
#[derive(Debug, Default)]
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    fn run(&mut self, step: &DeploymentStep, cwd: &Path) -> FarmhandResult<ExecOutput> {
        let output = if step.sudo {
            Command::new("sudo")
                .args(["sh", "-c", &step.command])
                .current_dir(cwd)
                .output()
        } else {
            Command::new("sh")
                .args(["-c", &step.command])
                .current_dir(cwd)
                .output()
        }
        .map_err(|source| FarmhandError::Spawn {
            step: step.name.clone(),
            source,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }

        Ok(ExecOutput {
            status: output.status.code(),
            output: combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::DeploymentStep;

    #[test]
    fn test_shell_executor_captures_stdout() {
        let step = DeploymentStep::new("greet", "echo hello");
        let out = ShellExecutor
            .run(&step, Path::new("/tmp"))
            .expect("echo should spawn");

        assert!(out.success());
        assert!(out.output.contains("hello"));
    }

    #[test]
    fn test_shell_executor_reports_exit_status() {
        let step = DeploymentStep::new("fail", "exit 3");
        let out = ShellExecutor.run(&step, Path::new("/tmp")).unwrap();

        assert!(!out.success());
        assert_eq!(out.status, Some(3));
    }

    #[test]
    fn test_shell_executor_captures_stderr() {
        let step = DeploymentStep::new("warn", "echo oops >&2; exit 1");
        let out = ShellExecutor.run(&step, Path::new("/tmp")).unwrap();

        assert_eq!(out.status, Some(1));
        assert!(out.output.contains("oops"));
    }

    #[test]
    fn test_shell_executor_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let step = DeploymentStep::new("where", "pwd");
        let out = ShellExecutor.run(&step, dir.path()).unwrap();

        assert!(out.success());
        let canonical = dir.path().canonicalize().unwrap();
        assert!(out.output.trim().ends_with(
            canonical.file_name().unwrap().to_str().unwrap()
        ));
    }
}
