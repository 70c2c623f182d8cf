//! Sequential deployment runner
//!
//! Drives a [`Plan`] through its steps strictly in order, one at a time.
//! A non-zero exit aborts the remaining sequence unless the step (or the
//! whole run, via [`RunOptions::keep_going`]) is marked continuable.
//!
//! Progress is delivered through a caller-supplied callback so the CLI can
//! render either human-readable or JSON output without the runner knowing
//! which.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::error::{FarmhandError, FarmhandResult};
use crate::executor::CommandExecutor;
use crate::plan::{DeploymentStep, Plan};

/// Runner lifecycle. Terminal states have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Index of the step currently executing
    Running(usize),
    Succeeded,
    /// Index of the step that aborted the run
    Failed(usize),
}

/// Per-step result recorded in the final report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed {
        duration: Duration,
    },
    Failed {
        status: Option<i32>,
        output: String,
        /// Whether this failure aborted the run
        fatal: bool,
    },
    /// Never executed because an earlier step aborted the run
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub name: String,
    pub outcome: Outcome,
}

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub state: RunState,
    pub outcomes: Vec<StepOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Succeeded
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|s| pred(&s.outcome)).count()
    }

    /// The error for the step that aborted the run, if any.
    ///
    /// Continuable failures are skipped; only a fatal one aborts.
    pub fn failure(&self) -> Option<FarmhandError> {
        self.outcomes.iter().find_map(|step| match &step.outcome {
            Outcome::Failed {
                status,
                output,
                fatal: true,
            } => Some(FarmhandError::StepFailed {
                step: step.name.clone(),
                status: *status,
                output: output.clone(),
            }),
            _ => None,
        })
    }

    /// Process exit code per the conventional contract: 0 on success,
    /// otherwise the aborting step's exit status (1 for signal death).
    pub fn exit_code(&self) -> i32 {
        match self.failure() {
            None => 0,
            Some(err) => err.exit_code(),
        }
    }
}

/// Progress events emitted during a run.
#[derive(Debug)]
pub enum RunEvent<'a> {
    Started {
        total: usize,
    },
    StepStarted {
        index: usize,
        step: &'a DeploymentStep,
    },
    StepPassed {
        index: usize,
        step: &'a DeploymentStep,
        duration: Duration,
    },
    StepFailed {
        index: usize,
        step: &'a DeploymentStep,
        status: Option<i32>,
        output: &'a str,
        /// False when this failure aborts the run
        continuing: bool,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Treat every step as continuable
    pub keep_going: bool,
}

/// Executes a plan's steps in order against a [`CommandExecutor`].
pub struct Runner {
    plan: Plan,
    options: RunOptions,
    state: RunState,
}

impl Runner {
    pub fn new(plan: Plan, options: RunOptions) -> Self {
        Self {
            plan,
            options,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every step in order, invoking `on_event` as progress happens.
    ///
    /// Returns `Err` only when a command cannot be spawned at all; a step
    /// that runs and exits non-zero is reported through the `RunReport`.
    pub fn run<E, F>(&mut self, executor: &mut E, mut on_event: F) -> FarmhandResult<RunReport>
    where
        E: CommandExecutor,
        F: FnMut(RunEvent<'_>),
    {
        let started_at = Utc::now();
        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(self.plan.steps.len());
        let mut aborted_at: Option<usize> = None;

        on_event(RunEvent::Started {
            total: self.plan.steps.len(),
        });

        for (index, step) in self.plan.steps.iter().enumerate() {
            if aborted_at.is_some() {
                outcomes.push(StepOutcome {
                    name: step.name.clone(),
                    outcome: Outcome::Skipped,
                });
                continue;
            }

            self.state = RunState::Running(index);
            on_event(RunEvent::StepStarted { index, step });

            let clock = Instant::now();
            let cwd = self.plan.step_cwd(step);
            let result = match executor.run(step, &cwd) {
                Ok(result) => result,
                Err(err) => {
                    // A step whose command cannot even spawn aborts the run;
                    // the state machine still lands in a terminal state.
                    self.state = RunState::Failed(index);
                    return Err(err);
                }
            };
            let duration = clock.elapsed();

            if result.success() {
                on_event(RunEvent::StepPassed {
                    index,
                    step,
                    duration,
                });
                outcomes.push(StepOutcome {
                    name: step.name.clone(),
                    outcome: Outcome::Passed { duration },
                });
            } else {
                let continuing = step.continue_on_failure || self.options.keep_going;
                on_event(RunEvent::StepFailed {
                    index,
                    step,
                    status: result.status,
                    output: &result.output,
                    continuing,
                });
                outcomes.push(StepOutcome {
                    name: step.name.clone(),
                    outcome: Outcome::Failed {
                        status: result.status,
                        output: result.output,
                        fatal: !continuing,
                    },
                });
                if !continuing {
                    aborted_at = Some(index);
                }
            }
        }

        self.state = match aborted_at {
            Some(index) => RunState::Failed(index),
            None => RunState::Succeeded,
        };

        Ok(RunReport {
            started_at,
            state: self.state,
            outcomes,
        })
    }
}
