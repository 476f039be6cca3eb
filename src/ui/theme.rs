//! Visual theme and styling.

use console::Style;

use crate::steps::StepOutcome;

/// Colors and markers used by terminal output.
#[derive(Debug, Clone)]
pub struct ArmoryTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (yellow).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for running elements (cyan).
    pub info: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for menu keys (bold cyan).
    pub key: Style,
}

impl Default for ArmoryTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmoryTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            key: Style::new().bold().cyan(),
        }
    }

    /// A theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            key: Style::new(),
        }
    }

    /// Colored or plain, per [`should_use_colors`] and the `--no-color` flag.
    pub fn for_terminal(no_color: bool) -> Self {
        if !no_color && should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{}", self.dim.apply_to(format!("⊘ {}", msg)))
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{} {}", self.header.apply_to("▶"), self.highlight.apply_to(title))
    }

    /// Style `text` the way `outcome` is shown.
    pub fn outcome_style(&self, outcome: StepOutcome) -> &Style {
        match outcome {
            StepOutcome::Succeeded => &self.success,
            StepOutcome::Skipped => &self.dim,
            StepOutcome::Failed => &self.error,
        }
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_formats_without_escapes() {
        let theme = ArmoryTheme::plain();
        assert_eq!(theme.format_success("done"), "✓ done");
        assert_eq!(theme.format_error("broke"), "✗ broke");
        assert_eq!(theme.format_skipped("nmap"), "⊘ nmap");
        assert_eq!(theme.format_warning("restart"), "⚠ restart");
    }

    #[test]
    fn no_color_flag_forces_plain() {
        let theme = ArmoryTheme::for_terminal(true);
        assert_eq!(theme.format_header("armory"), "▶ armory");
    }
}
