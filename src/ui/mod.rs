//! Operator-facing output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI/headless environments
//! - [`MockUI`] for tests
//! - Report rendering, the step selection menu, prompts and spinners
//!
//! The core never formats for a medium: it hands a
//! [`BatchReport`](crate::batch::BatchReport) to [`UserInterface::show_report`].
//!
//! # Example
//!
//! ```
//! use armory::ui::{create_ui, OutputMode};
//!
//! // Use non-interactive mode for testability
//! let mut ui = create_ui(false, OutputMode::Quiet, false);
//! ui.show_header("armory");
//! ui.success("Provisioning complete");
//! ```

pub mod menu;
pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod report;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use menu::{confirm_reboot, select_steps, step_options};
pub use mock::{MockSpinner, MockUI, SpinnerStatus};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use prompts::prompt_user;
pub use report::{report_lines, status_line, ProbeStatus};
pub use spinner::{OutputRelay, ProgressSpinner};
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, ArmoryTheme};

use crate::batch::BatchReport;
use crate::error::Result;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a prompt and get user input.
    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult>;

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header.
    fn show_header(&mut self, title: &str);

    /// Render a finished (or aborted) batch.
    fn show_report(&mut self, report: &BatchReport);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);

    /// Mark as skipped.
    fn finish_skipped(&mut self, msg: &str);

    /// The underlying bar, when the spinner draws one.
    fn progress_bar(&self) -> Option<indicatif::ProgressBar> {
        None
    }
}

/// A prompt to show to the user.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Unique key for the prompt (used for overrides and lookup).
    pub key: String,
    /// The question to display.
    pub question: String,
    /// The type of prompt.
    pub prompt_type: PromptType,
    /// Default value if user just presses enter.
    pub default: Option<String>,
}

/// The type of prompt.
#[derive(Debug, Clone)]
pub enum PromptType {
    /// Yes/no confirmation.
    Confirm,
    /// Select multiple from a list of options.
    MultiSelect { options: Vec<PromptOption> },
}

/// An option in a select prompt.
#[derive(Debug, Clone)]
pub struct PromptOption {
    /// Display label.
    pub label: String,
    /// Value returned when selected.
    pub value: String,
}

/// Result of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// Boolean result from confirm.
    Bool(bool),
    /// Selected values from multi-select.
    Strings(Vec<String>),
}

impl PromptResult {
    /// Get as bool if this is a Bool result.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the selected values; empty for a Bool result.
    pub fn into_strings(self) -> Vec<String> {
        match self {
            Self::Strings(v) => v,
            Self::Bool(_) => Vec::new(),
        }
    }
}

/// Parse a yes/no default such as `"y"`, `"yes"` or `"true"`.
pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

/// Interpret a canned textual answer (override, default) for `prompt`.
pub(crate) fn answer_from_text(prompt: &Prompt, text: &str) -> PromptResult {
    match prompt.prompt_type {
        PromptType::Confirm => PromptResult::Bool(parse_bool(text)),
        PromptType::MultiSelect { .. } => PromptResult::Strings(
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        ),
    }
}
