//! Sequential run-list execution
//!
//! A run list is folded step by step over a [`HostPrimitives`]
//! implementation. A failing step stops the fold unless its policy is
//! [`FailurePolicy::Continue`], in which case the failure is recorded as
//! tolerated and the next step runs. No step runs concurrently with another.

use crate::descriptor::{Descriptor, FailurePolicy, Step, StepCommand};
use crate::error::{LauncherError, Result};
use tracing::{info, warn};

/// Output from a `shell.run` invocation.
#[derive(Debug, Clone, Default)]
pub struct ShellOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
}

impl ShellOutput {
    /// Successful output with empty streams
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            ..Self::default()
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code,
            success: false,
            ..Self::default()
        }
    }

    /// Check if the command succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> std::result::Result<(), String> {
        if self.success {
            Ok(())
        } else {
            let code = self
                .exit_code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            let stderr = self.stderr.trim();
            if stderr.is_empty() {
                Err(format!("{} failed (exit code {})", context, code))
            } else {
                Err(format!("{} failed (exit code {}): {}", context, code, stderr))
            }
        }
    }
}

/// Host command vocabulary a run list is executed against.
pub trait HostPrimitives {
    /// Execute a shell command line to completion.
    ///
    /// `Err` means the command could not be started at all; a command that
    /// ran and exited non-zero is reported through [`ShellOutput::success`].
    fn shell_run(&mut self, message: &str) -> Result<ShellOutput>;

    /// Display a status message to the user.
    fn notify(&mut self, html: &str) -> Result<()>;
}

/// Result of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    /// Failed, but the step's policy let the run continue
    Tolerated(String),
    /// Failed and stopped the run
    Failed(String),
}

/// Record of an executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub index: usize,
    pub method: &'static str,
    pub outcome: StepOutcome,
}

/// What happened while running a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub descriptor: String,
    /// One record per step that was actually executed
    pub steps: Vec<StepRecord>,
    /// Index of the step that stopped the run
    pub aborted_at: Option<usize>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.aborted_at.is_none()
    }

    /// Number of steps that were started
    pub fn executed(&self) -> usize {
        self.steps.len()
    }

    /// Steps that failed without stopping the run
    pub fn tolerated(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Tolerated(_)))
    }

    /// Turn an aborted run into [`LauncherError::StepFailed`]
    pub fn into_result(self) -> Result<Self> {
        let Some(index) = self.aborted_at else {
            return Ok(self);
        };
        let record = self.steps.iter().find(|s| s.index == index);
        let (method, reason) = match record {
            Some(StepRecord {
                method,
                outcome: StepOutcome::Failed(reason),
                ..
            }) => (*method, reason.clone()),
            _ => ("unknown", "run aborted".to_string()),
        };
        Err(LauncherError::StepFailed {
            index,
            method,
            reason,
        })
    }
}

/// Run one step, mapping every kind of failure to a reason string
fn run_step(step: &Step, host: &mut dyn HostPrimitives) -> std::result::Result<(), String> {
    match &step.command {
        StepCommand::ShellRun { message } => {
            let output = host.shell_run(message).map_err(|e| e.to_string())?;
            output.ensure_success(message)
        }
        StepCommand::Notify { html } => host.notify(html).map_err(|e| e.to_string()),
    }
}

/// Execute a descriptor's run list top to bottom.
///
/// A descriptor without a run list produces an empty, successful report.
pub fn execute(descriptor: &Descriptor, host: &mut dyn HostPrimitives) -> RunReport {
    let steps = descriptor.steps();
    info!(descriptor = %descriptor.name, steps = steps.len(), "Starting run");

    let mut report = RunReport {
        descriptor: descriptor.name.clone(),
        steps: Vec::with_capacity(steps.len()),
        aborted_at: None,
    };

    for (index, step) in steps.iter().enumerate() {
        let method = step.command.method();
        info!(index, method, policy = ?step.on_failure, "Executing step");

        let outcome = match (run_step(step, host), step.on_failure) {
            (Ok(()), _) => StepOutcome::Succeeded,
            (Err(reason), FailurePolicy::Continue) => {
                warn!(index, method, %reason, "Step failed, continuing");
                StepOutcome::Tolerated(reason)
            }
            (Err(reason), FailurePolicy::Abort) => {
                warn!(index, method, %reason, "Step failed, aborting run");
                StepOutcome::Failed(reason)
            }
        };

        let abort = matches!(outcome, StepOutcome::Failed(_));
        report.steps.push(StepRecord {
            index,
            method,
            outcome,
        });
        if abort {
            report.aborted_at = Some(index);
            break;
        }
    }

    if report.is_success() {
        info!(descriptor = %descriptor.name, executed = report.executed(), "Run finished");
    }
    report
}
