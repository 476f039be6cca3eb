//! Progress spinners and live action output.

use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::shell::OutputLine;

use super::theme::ArmoryTheme;
use super::SpinnerHandle;

/// A spinner shown while a step runs.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: ArmoryTheme,
}

impl ProgressSpinner {
    pub fn new(message: &str, theme: ArmoryTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar, theme }
    }

    /// A spinner that never draws.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: ArmoryTheme::plain(),
        }
    }

    fn finish(&mut self, line: String) {
        self.bar.set_style(
            ProgressStyle::default_spinner()
                .template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish(line);
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.finish(line);
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if self.bar.is_hidden() {
            None
        } else {
            Some(self.bar.clone())
        }
    }
}

/// Routes action output lines to whichever spinner is current.
///
/// The invoker is created once per batch, while spinners come and go per
/// step; the relay is the handle both sides share.
#[derive(Clone, Default)]
pub struct OutputRelay {
    current: Rc<RefCell<Option<(ProgressBar, String)>>>,
    verbose: bool,
}

impl OutputRelay {
    /// In verbose mode every line is printed; otherwise the latest line is
    /// shown next to the spinner message.
    pub fn new(verbose: bool) -> Self {
        Self {
            current: Rc::default(),
            verbose,
        }
    }

    /// Send lines to `bar`, whose resting message is `base`.
    pub fn attach(&self, bar: Option<ProgressBar>, base: &str) {
        *self.current.borrow_mut() = bar.map(|b| (b, base.to_string()));
    }

    pub fn detach(&self) {
        *self.current.borrow_mut() = None;
    }

    /// Handle one line of action output.
    pub fn relay(&self, line: &OutputLine) {
        let current = self.current.borrow();
        match (current.as_ref(), self.verbose) {
            (Some((bar, _)), true) => bar.println(format!("    {}", line.text())),
            (None, true) => println!("    {}", line.text()),
            (Some((bar, base)), false) => {
                let text = truncate(line.text().trim(), 60);
                if !text.is_empty() {
                    bar.set_message(format!("{} {}", base, console::style(text).dim()));
                }
            }
            (None, false) => {}
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
