//! Common test utilities for Farmhand integration tests.
//!
//! Provides `TestEnv`: an isolated project directory plus helpers to run the
//! farmhand binary inside it with a scrubbed environment.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Result of running a farmhand CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated test environment with temp directories.
///
/// The project directory is the working directory for every invocation; the
/// home directory keeps user-level plan discovery away from the real
/// `~/.config`.
pub struct TestEnv {
    pub project_root: TempDir,
    pub home_dir: TempDir,
    farmhand_bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            project_root: TempDir::new().expect("create project tempdir"),
            home_dir: TempDir::new().expect("create home tempdir"),
            farmhand_bin: PathBuf::from(env!("CARGO_BIN_EXE_farmhand")),
        }
    }

    /// Get path relative to project root
    pub fn project_path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    /// Write the project-local plan file
    pub fn write_plan(&self, toml: &str) {
        std::fs::write(self.project_path("farmhand.toml"), toml).expect("write farmhand.toml");
    }

    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        self.run_from_with_env(self.project_root.path(), args, env_vars)
    }

    pub fn run_from_with_env(
        &self,
        cwd: &Path,
        args: &[&str],
        env_vars: &[(&str, &str)],
    ) -> TestResult {
        let mut cmd = Command::new(&self.farmhand_bin);
        cmd.args(args)
            .current_dir(cwd)
            .env("HOME", self.home_dir.path())
            .env("XDG_CONFIG_HOME", self.home_dir.path().join(".config"))
            .env_remove("FARMHAND_APP_ROOT")
            .env_remove("FARMHAND_PYTHON")
            .env_remove("DJANGO_SECRET_KEY")
            .env_remove("DATABASE_URL")
            .env_remove("DJANGO_DEBUG")
            .env_remove("DJANGO_ALLOWED_HOSTS");

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("failed to run farmhand binary");

        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Build a plan whose steps only touch the project directory, so tests can
/// execute it for real. Steps drop marker files to make order observable.
pub fn touch_plan(steps: &[(&str, &str)]) -> String {
    let mut toml = String::from("app_root = \".\"\nendpoints = [\"http://localhost/api/\"]\n");
    for (name, command) in steps {
        toml.push_str(&format!(
            "\n[[steps]]\nname = \"{name}\"\ncommand = \"{command}\"\n"
        ));
    }
    toml
}
