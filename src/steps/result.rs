//! Step outcomes.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use super::Step;

/// How an attempted step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// The precondition was already satisfied; the action never ran.
    Skipped,

    /// The action ran and exited 0.
    Succeeded,

    /// The action exited non-zero, or the step could not be attempted.
    Failed,
}

impl StepOutcome {
    /// Get a display character for this outcome.
    pub fn display_char(&self) -> char {
        match self {
            StepOutcome::Skipped => '⊘',
            StepOutcome::Succeeded => '✓',
            StepOutcome::Failed => '✗',
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepOutcome::Skipped => "skipped",
            StepOutcome::Succeeded => "succeeded",
            StepOutcome::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of attempting one step. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub step_id: String,

    pub description: String,

    pub outcome: StepOutcome,

    /// Exit status of the action. `None` when the action never ran.
    pub exit_code: Option<i32>,

    /// One-line explanation of the outcome.
    pub message: String,

    /// Tail of the action's combined output, kept for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(duration.as_millis() as u64)
}

impl StepResult {
    /// The precondition held, so nothing was done.
    pub fn skipped(step: &Step, duration: Duration) -> Self {
        Self {
            step_id: step.id.clone(),
            description: step.description.clone(),
            outcome: StepOutcome::Skipped,
            exit_code: None,
            message: format!("already satisfied ({})", step.precondition),
            output: None,
            duration,
        }
    }

    /// The action ran and exited 0.
    pub fn succeeded(step: &Step, duration: Duration) -> Self {
        Self {
            step_id: step.id.clone(),
            description: step.description.clone(),
            outcome: StepOutcome::Succeeded,
            exit_code: Some(0),
            message: "completed".to_string(),
            output: None,
            duration,
        }
    }

    /// The action ran and exited non-zero.
    pub fn action_failed(
        step: &Step,
        exit_code: i32,
        message: impl Into<String>,
        output: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            step_id: step.id.clone(),
            description: step.description.clone(),
            outcome: StepOutcome::Failed,
            exit_code: Some(exit_code),
            message: message.into(),
            output: output.filter(|o| !o.trim().is_empty()),
            duration,
        }
    }

    /// The step failed before its action could be invoked.
    pub fn not_attempted(step: &Step, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            step_id: step.id.clone(),
            description: step.description.clone(),
            outcome: StepOutcome::Failed,
            exit_code: None,
            message: message.into(),
            output: None,
            duration,
        }
    }

    /// The requested id is not in the catalog.
    pub fn unknown_step(id: &str) -> Self {
        Self {
            step_id: id.to_string(),
            description: String::new(),
            outcome: StepOutcome::Failed,
            exit_code: None,
            message: "unknown step".to_string(),
            output: None,
            duration: Duration::ZERO,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == StepOutcome::Failed
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        format!("{} {}", self.outcome.display_char(), self.detail_line())
    }

    /// The summary line without its outcome marker.
    pub fn detail_line(&self) -> String {
        match self.outcome {
            StepOutcome::Succeeded => {
                format!("{} ({})", self.step_id, format_duration(self.duration))
            }
            StepOutcome::Skipped => format!("{} (already satisfied)", self.step_id),
            StepOutcome::Failed => match self.exit_code {
                Some(code) => format!("{} - {} (exit {})", self.step_id, self.message, code),
                None => format!("{} - {}", self.step_id, self.message),
            },
        }
    }
}

/// Compact human duration: `850ms`, `4.2s`, `3m 5s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
