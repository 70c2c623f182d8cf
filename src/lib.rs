//! Farmhand - deployment runner for Django applications on AWS Lightsail
//!
//! Farmhand models a deployment as data: an ordered list of steps (install
//! dependencies, migrate, collect static assets, set permissions, restart
//! the service) executed strictly in sequence, fail-fast unless a step is
//! explicitly marked continuable.

pub mod config;
pub mod doctor;
pub mod error;
pub mod executor;
pub mod plan;
pub mod runner;

// Re-exports for convenience
pub use config::{load_or_default, PlanWarning};
pub use doctor::{run_doctor, CheckStatus, DoctorReport};
pub use error::{FarmhandError, FarmhandResult};
pub use executor::{CommandExecutor, ExecOutput, ShellExecutor};
pub use plan::{DeploymentStep, EnvironmentSpec, Plan};
pub use runner::{Outcome, RunEvent, RunOptions, RunReport, RunState, Runner, StepOutcome};
