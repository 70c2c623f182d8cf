//! Environment preflight
//!
//! Reports which of the plan's recognized environment variables are set on
//! this host. Values are never printed; the deployed application reads
//! them, the runner does not. A missing required variable fails the check,
//! a missing optional one only warns.

use crate::plan::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct EnvCheck {
    pub variable: String,
    pub required: bool,
    pub status: CheckStatus,
    pub message: String,
}

/// Result of a full preflight pass.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub checks: Vec<EnvCheck>,
}

impl DoctorReport {
    pub fn passes(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn warnings(&self) -> usize {
        self.count(CheckStatus::Warning)
    }

    pub fn errors(&self) -> usize {
        self.count(CheckStatus::Error)
    }

    pub fn is_success(&self) -> bool {
        self.errors() == 0
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

/// Check presence of every environment variable the plan recognizes.
pub fn run_doctor(plan: &Plan) -> DoctorReport {
    run_doctor_with(plan, |name| std::env::var_os(name).is_some())
}

/// Same as [`run_doctor`] with the environment lookup injected.
pub fn run_doctor_with(plan: &Plan, is_set: impl Fn(&str) -> bool) -> DoctorReport {
    let mut report = DoctorReport::default();

    for (variable, required) in plan.recognized_env() {
        let set = is_set(variable);
        let status = match (set, required) {
            (true, _) => CheckStatus::Pass,
            (false, true) => CheckStatus::Error,
            (false, false) => CheckStatus::Warning,
        };
        let message = match (set, required) {
            (true, _) => "set".to_string(),
            (false, true) => "missing (required by the application)".to_string(),
            (false, false) => "not set (application default applies)".to_string(),
        };
        report.checks.push(EnvCheck {
            variable: variable.to_string(),
            required,
            status,
            message,
        });
    }

    report
}
