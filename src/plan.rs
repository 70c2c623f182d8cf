//! Deployment plan model
//!
//! A plan is an ordered list of [`DeploymentStep`]s plus the metadata needed
//! to report on a finished run: the application root the steps execute in,
//! the endpoints to verify once deployment succeeds, and the environment
//! variables the deployed application consumes.
//!
//! The step list is defined once, at load time, and is immutable for the
//! duration of a run. No step is assumed reversible.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One externally-observable provisioning action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStep {
    /// Human-readable label, used in all reporting
    pub name: String,

    /// Shell command, run via `sh -c`
    pub command: String,

    /// Working directory; relative paths resolve against the plan's app root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Run with elevated privilege (`sudo` prefix)
    #[serde(default)]
    pub sudo: bool,

    /// On failure, log and proceed to the next step instead of aborting
    #[serde(default)]
    pub continue_on_failure: bool,
}

impl DeploymentStep {
    /// Plain step with all flags at their defaults.
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            working_dir: None,
            sudo: false,
            continue_on_failure: false,
        }
    }

    pub fn sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    pub fn continue_on_failure(mut self) -> Self {
        self.continue_on_failure = true;
        self
    }
}

/// Environment variables the deployed application reads.
///
/// The runner never inspects these itself; `doctor` reports on their
/// presence without printing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    #[serde(default = "default_required_env")]
    pub required: Vec<String>,

    #[serde(default = "default_optional_env")]
    pub optional: Vec<String>,
}

impl Default for EnvironmentSpec {
    fn default() -> Self {
        Self {
            required: default_required_env(),
            optional: default_optional_env(),
        }
    }
}

fn default_required_env() -> Vec<String> {
    vec![
        "DJANGO_SECRET_KEY".to_string(),
        "DATABASE_URL".to_string(),
    ]
}

fn default_optional_env() -> Vec<String> {
    vec![
        "DJANGO_DEBUG".to_string(),
        "DJANGO_ALLOWED_HOSTS".to_string(),
    ]
}

/// A complete deployment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Directory the steps run in by default
    #[serde(default = "default_app_root")]
    pub app_root: PathBuf,

    /// Ordered step sequence; author-defined total order
    #[serde(default = "default_steps")]
    pub steps: Vec<DeploymentStep>,

    /// URLs printed in the final confirmation message for manual verification
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    #[serde(default)]
    pub environment: EnvironmentSpec,
}

fn default_app_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_endpoints() -> Vec<String> {
    vec![
        "http://localhost/admin/".to_string(),
        "http://localhost/api/".to_string(),
    ]
}

/// The stock Lightsail/Django provisioning sequence.
fn default_steps() -> Vec<DeploymentStep> {
    vec![
        DeploymentStep::new(
            "install dependencies",
            "pip3 install -r requirements.txt",
        ),
        DeploymentStep::new(
            "apply database migrations",
            "python3 manage.py migrate --noinput",
        ),
        DeploymentStep::new(
            "collect static files",
            "python3 manage.py collectstatic --noinput",
        ),
        DeploymentStep::new(
            "set static file permissions",
            "chown -R www-data:www-data staticfiles && chmod -R 755 staticfiles",
        )
        .sudo(),
        DeploymentStep::new("restart gunicorn", "systemctl restart gunicorn").sudo(),
        // A failed status printout should not reclassify the deployment
        DeploymentStep::new("check gunicorn status", "systemctl is-active gunicorn")
            .sudo()
            .continue_on_failure(),
    ]
}

impl Default for Plan {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Plan {
    /// Built-in plan mirroring the stock deployment procedure.
    pub fn builtin() -> Self {
        Self {
            app_root: default_app_root(),
            steps: default_steps(),
            endpoints: default_endpoints(),
            environment: EnvironmentSpec::default(),
        }
    }

    /// Effective working directory for a step.
    pub fn step_cwd(&self, step: &DeploymentStep) -> PathBuf {
        match &step.working_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.app_root.join(dir),
            None => self.app_root.clone(),
        }
    }

    /// All environment variable names the plan recognizes, required first.
    pub fn recognized_env(&self) -> impl Iterator<Item = (&str, bool)> {
        self.environment
            .required
            .iter()
            .map(|v| (v.as_str(), true))
            .chain(self.environment.optional.iter().map(|v| (v.as_str(), false)))
    }
}
