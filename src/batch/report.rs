//! Batch reports.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::reconcile::ReconcileStatus;
use crate::error::ArmoryError;
use crate::steps::{StepOutcome, StepResult};

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    /// Not started.
    Pending,
    /// Steps are being attempted.
    Running,
    /// Every requested id was attempted.
    Completed,
    /// A fatal environment error stopped the batch early.
    Aborted,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchState::Pending => "pending",
            BatchState::Running => "running",
            BatchState::Completed => "completed",
            BatchState::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

/// Ordered results of one batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One result per attempted id, in request order.
    pub results: Vec<StepResult>,

    /// At least one result is `Failed`.
    pub any_failed: bool,

    /// A restart-sensitive step succeeded and reconciliation did not
    /// clear every pending restart.
    pub needs_restart: bool,

    /// Reconciliation outcome; `None` when it was not invoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<ReconcileStatus>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: StepResult) {
        self.any_failed |= result.is_failed();
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn count(&self, outcome: StepOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(StepOutcome::Succeeded)
    }

    pub fn skipped(&self) -> usize {
        self.count(StepOutcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(StepOutcome::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter().filter(|r| r.is_failed())
    }

    /// Process exit code for a batch that ran to completion.
    pub fn exit_code(&self) -> i32 {
        if self.any_failed {
            1
        } else {
            0
        }
    }

    /// e.g. `3 succeeded, 5 skipped, 1 failed`
    pub fn counts_line(&self) -> String {
        format!(
            "{} succeeded, {} skipped, {} failed",
            self.succeeded(),
            self.skipped(),
            self.failed()
        )
    }
}

/// A batch stopped by a fatal environment error, with what ran before it.
#[derive(Debug, Error)]
#[error("Batch aborted after {} step(s): {error}", .report.len())]
pub struct BatchAborted {
    pub report: BatchReport,
    #[source]
    pub error: ArmoryError,
}

impl BatchAborted {
    /// Process exit code for an aborted batch.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::probe::Probe;
    use crate::steps::Step;
    use std::time::Duration;

    fn step(id: &str) -> Step {
        Step::new(
            id,
            id,
            Probe::FileExists(format!("/{}", id)),
            Action::Shell { run: "true".into() },
        )
    }

    #[test]
    fn push_tracks_failures() {
        let mut report = BatchReport::new();
        report.push(StepResult::succeeded(&step("a"), Duration::ZERO));
        assert!(!report.any_failed);
        assert_eq!(report.exit_code(), 0);

        report.push(StepResult::unknown_step("b"));
        report.push(StepResult::skipped(&step("c"), Duration::ZERO));
        assert!(report.any_failed);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.counts_line(), "1 succeeded, 1 skipped, 1 failed");
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn serializes_without_reconciliation_when_not_invoked() {
        let mut report = BatchReport::new();
        report.push(StepResult::skipped(&step("a"), Duration::ZERO));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["step_id"], "a");
        assert_eq!(json["needs_restart"], false);
        assert!(json.get("reconciliation").is_none());
    }

    #[test]
    fn aborted_carries_partial_report() {
        let mut report = BatchReport::new();
        report.push(StepResult::succeeded(&step("a"), Duration::ZERO));
        let aborted = BatchAborted {
            report,
            error: ArmoryError::FatalEnvironment {
                message: "not running as root".into(),
            },
        };
        assert_eq!(aborted.exit_code(), 2);
        assert!(aborted.to_string().contains("after 1 step(s)"));
        assert!(aborted.to_string().contains("not running as root"));
    }
}
