//! Plan file loading
//!
//! Resolution order:
//! 1. Explicit `--config` path (must exist)
//! 2. `./farmhand.toml` in the current directory
//! 3. `~/.config/farmhand/plan.toml`
//! 4. Built-in plan
//!
//! `FARMHAND_*` environment variables override the loaded plan afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FarmhandError, FarmhandResult};
use crate::plan::Plan;

/// Project-local plan file name
pub const PLAN_FILE: &str = "farmhand.toml";

/// Non-fatal warning surfaced while loading a plan file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
}

impl std::fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "unknown key '{}' in {}:{}",
                self.key,
                self.file.display(),
                line
            ),
            None => write!(f, "unknown key '{}' in {}", self.key, self.file.display()),
        }
    }
}

/// Load a plan from a TOML file.
pub fn load(path: &Path) -> FarmhandResult<Plan> {
    let (plan, _warnings) = load_with_warnings(path)?;
    Ok(plan)
}

/// Load a plan and collect non-fatal warnings (unknown keys).
pub fn load_with_warnings(path: &Path) -> FarmhandResult<(Plan, Vec<PlanWarning>)> {
    if !path.exists() {
        return Err(FarmhandError::PlanNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let plan: Plan = serde_ignored::deserialize(deserializer, |path| {
        unknown_paths.push(path.to_string());
    })
    .map_err(|e| FarmhandError::InvalidPlan {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if plan.steps.is_empty() {
        return Err(FarmhandError::EmptyPlan);
    }

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            let line = find_line_number(&content, &key);
            PlanWarning {
                key,
                file: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Ok((plan, warnings))
}

/// Resolve a plan from the explicit path, discovery, or the builtin.
///
/// An explicit path that does not exist is an error; a missing discovered
/// file is not.
pub fn load_or_default(
    explicit: Option<&Path>,
) -> FarmhandResult<(Plan, Vec<PlanWarning>, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let (plan, warnings) = load_with_warnings(path)?;
        return Ok((
            with_env_overrides(plan),
            warnings,
            Some(path.to_path_buf()),
        ));
    }

    let project_plan = PathBuf::from(PLAN_FILE);
    if project_plan.exists() {
        let (plan, warnings) = load_with_warnings(&project_plan)?;
        return Ok((with_env_overrides(plan), warnings, Some(project_plan)));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user_plan = config_dir.join("farmhand/plan.toml");
        if user_plan.exists() {
            let (plan, warnings) = load_with_warnings(&user_plan)?;
            return Ok((with_env_overrides(plan), warnings, Some(user_plan)));
        }
    }

    Ok((with_env_overrides(Plan::builtin()), Vec::new(), None))
}

/// Apply `FARMHAND_*` environment variable overrides.
pub fn with_env_overrides(mut plan: Plan) -> Plan {
    if let Ok(root) = std::env::var("FARMHAND_APP_ROOT") {
        if !root.is_empty() {
            plan.app_root = PathBuf::from(root);
        }
    }

    // FARMHAND_PYTHON rewrites the interpreter in the stock manage.py steps
    if let Ok(python) = std::env::var("FARMHAND_PYTHON") {
        if !python.is_empty() {
            for step in &mut plan.steps {
                if step.command.starts_with("python3 ") {
                    step.command = format!(
                        "{python} {}",
                        step.command.trim_start_matches("python3 ")
                    );
                }
            }
        }
    }

    plan
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

/// Commented sample plan written by `farmhand init`.
pub const SAMPLE_PLAN: &str = r#"# Farmhand deployment plan
#
# Steps run in order. A non-zero exit aborts the remaining sequence unless
# the step sets continue_on_failure = true.

app_root = "/home/ubuntu/app"

endpoints = [
    "http://localhost/admin/",
    "http://localhost/api/",
]

[environment]
required = ["DJANGO_SECRET_KEY", "DATABASE_URL"]
optional = ["DJANGO_DEBUG", "DJANGO_ALLOWED_HOSTS"]

[[steps]]
name = "install dependencies"
command = "pip3 install -r requirements.txt"

[[steps]]
name = "apply database migrations"
command = "python3 manage.py migrate --noinput"

[[steps]]
name = "collect static files"
command = "python3 manage.py collectstatic --noinput"

[[steps]]
name = "set static file permissions"
command = "chown -R www-data:www-data staticfiles && chmod -R 755 staticfiles"
sudo = true

[[steps]]
name = "restart gunicorn"
command = "systemctl restart gunicorn"
sudo = true

[[steps]]
name = "check gunicorn status"
command = "systemctl is-active gunicorn"
sudo = true
continue_on_failure = true
"#;
