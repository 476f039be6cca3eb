//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::batch::BatchReport;
use crate::error::{ArmoryError, Result};

use super::theme::ArmoryTheme;
use super::{
    answer_from_text, report_lines, OutputMode, Prompt, PromptResult, SpinnerHandle,
    UserInterface,
};

/// Prefix of environment variables that answer prompts by key.
const PROMPT_ENV_PREFIX: &str = "ARMORY_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `ARMORY_PROMPT_<KEY>` variables, then the
/// prompt's default. Output is plain text, one line per event.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
    theme: ArmoryTheme,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();
        Self::with_overrides(mode, env_overrides)
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
            theme: ArmoryTheme::plain(),
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_progress() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_progress() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_progress() {
            eprintln!("{}", self.theme.format_warning(msg));
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        if let Some(value) = self.env_overrides.get(&env_key) {
            return Ok(answer_from_text(prompt, value));
        }

        if let Some(default) = &prompt.default {
            return Ok(answer_from_text(prompt, default));
        }

        Err(ArmoryError::ConfigValidationError {
            message: format!(
                "Cannot prompt for '{}' in non-interactive mode (set {})",
                prompt.key, env_key
            ),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let visible = self.mode.shows_progress();
        if visible {
            println!("  {}", message);
        }
        Box::new(LineSpinner {
            visible,
            theme: self.theme.clone(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_progress() {
            println!("\n{}\n", self.theme.format_header(title));
        }
    }

    fn show_report(&mut self, report: &BatchReport) {
        println!();
        for line in report_lines(report, &self.theme) {
            println!("{}", line);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner stand-in that prints only the final line.
struct LineSpinner {
    visible: bool,
    theme: ArmoryTheme,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.visible {
            println!("  {}", self.theme.format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        if self.visible {
            println!("  {}", self.theme.format_error(msg));
        }
    }

    fn finish_skipped(&mut self, msg: &str) {
        if self.visible {
            println!("  {}", self.theme.format_skipped(msg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptType;

    fn confirm(default: Option<&str>) -> Prompt {
        Prompt {
            key: "reboot".to_string(),
            question: "Reboot now?".to_string(),
            prompt_type: PromptType::Confirm,
            default: default.map(String::from),
        }
    }

    fn steps_prompt(default: Option<&str>) -> Prompt {
        Prompt {
            key: "steps".to_string(),
            question: "Select steps".to_string(),
            prompt_type: PromptType::MultiSelect { options: vec![] },
            default: default.map(String::from),
        }
    }

    #[test]
    fn non_interactive_is_not_interactive() {
        let ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(!ui.is_interactive());
    }

    #[test]
    fn confirm_uses_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        let result = ui.prompt(&confirm(Some("no"))).unwrap();
        assert_eq!(result, PromptResult::Bool(false));
    }

    #[test]
    fn prompt_fails_without_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        let err = ui.prompt(&steps_prompt(None)).unwrap_err();
        assert!(err.to_string().contains("ARMORY_PROMPT_STEPS"));
    }

    #[test]
    fn env_override_wins_over_default() {
        let mut overrides = HashMap::new();
        overrides.insert("ARMORY_PROMPT_REBOOT".to_string(), "yes".to_string());

        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, overrides);
        let result = ui.prompt(&confirm(Some("no"))).unwrap();
        assert_eq!(result, PromptResult::Bool(true));
    }

    #[test]
    fn multiselect_override_splits_on_commas() {
        let mut overrides = HashMap::new();
        overrides.insert("ARMORY_PROMPT_STEPS".to_string(), "nmap,ffuf".to_string());

        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, overrides);
        let result = ui.prompt(&steps_prompt(None)).unwrap();
        assert_eq!(result.into_strings(), vec!["nmap", "ffuf"]);
    }

    #[test]
    fn quiet_spinner_prints_nothing() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Quiet, HashMap::new());
        let mut spinner = ui.start_spinner("nmap");
        spinner.finish_success("nmap");
        assert!(spinner.progress_bar().is_none());
    }
}
