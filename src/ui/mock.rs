//! Recording UI for tests.
//!
//! `MockUI` keeps every message, spinner, prompt and report it is handed
//! so commands can be driven without a terminal. Prompt answers are
//! canned per key.
//!
//! # Example
//!
//! ```
//! use armory::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("reboot", "yes");
//!
//! ui.message("Provisioning");
//! ui.success("Done!");
//!
//! assert!(ui.has_message("Provisioning"));
//! assert_eq!(ui.successes(), &["Done!"]);
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::batch::BatchReport;
use crate::error::Result;

use super::{
    answer_from_text, OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface,
};

type FinishLog = Rc<RefCell<Vec<(SpinnerStatus, String)>>>;

/// Mock UI implementation for testing.
///
/// Responses set with `set_prompt_response` answer every prompt with that
/// key; `queue_prompt_responses` answers successive prompts in order.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    spinners: Vec<String>,
    finishes: FinishLog,
    reports: Vec<BatchReport>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every prompt with `key` using `response`.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Answer the next prompts with `key` in order, before any fixed response.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(String::from).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Messages of all spinners that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// How each started spinner finished, in finish order.
    pub fn spinner_finishes(&self) -> Vec<(SpinnerStatus, String)> {
        self.finishes.borrow().clone()
    }

    /// Reports passed to `show_report`.
    pub fn reports(&self) -> &[BatchReport] {
        &self.reports
    }

    /// Keys of all prompts that were shown.
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        let queued = self
            .prompt_queues
            .get_mut(&prompt.key)
            .and_then(VecDeque::pop_front);
        let canned = queued
            .or_else(|| self.prompt_responses.get(&prompt.key).cloned())
            .or_else(|| prompt.default.clone());

        Ok(match canned {
            Some(text) => answer_from_text(prompt, &text),
            None => match prompt.prompt_type {
                PromptType::Confirm => PromptResult::Bool(false),
                PromptType::MultiSelect { .. } => PromptResult::Strings(Vec::new()),
            },
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            log: Some(Rc::clone(&self.finishes)),
            ..MockSpinner::default()
        })
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_report(&mut self, report: &BatchReport) {
        self.reports.push(report.clone());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner that captures finish messages.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    finish_message: Option<String>,
    status: Option<SpinnerStatus>,
    log: Option<FinishLog>,
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    Success,
    Error,
    Skipped,
}

impl MockSpinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages set while spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn finish_message(&self) -> Option<&str> {
        self.finish_message.as_deref()
    }

    pub fn status(&self) -> Option<SpinnerStatus> {
        self.status
    }

    fn finish(&mut self, status: SpinnerStatus, msg: &str) {
        self.finish_message = Some(msg.to_string());
        self.status = Some(status);
        if let Some(log) = &self.log {
            log.borrow_mut().push((status, msg.to_string()));
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finish(SpinnerStatus::Success, msg);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish(SpinnerStatus::Error, msg);
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.finish(SpinnerStatus::Skipped, msg);
    }
}
