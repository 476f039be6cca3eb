//! Text rendering of reports and probe sweeps.

use crate::batch::BatchReport;
use crate::steps::{format_duration, Step, StepOutcome, StepResult};

use super::theme::ArmoryTheme;

/// Lines for a batch report: one per result, failure detail, then totals.
pub fn report_lines(report: &BatchReport, theme: &ArmoryTheme) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.len() + 4);

    for result in &report.results {
        lines.push(result_line(result, theme));
        if result.outcome == StepOutcome::Failed {
            if let Some(output) = &result.output {
                for line in output.lines() {
                    lines.push(format!("      {}", theme.dim.apply_to(line)));
                }
            }
        }
    }

    lines.push(String::new());
    let counts = report.counts_line();
    lines.push(if report.any_failed {
        format!("{}", theme.error.apply_to(counts))
    } else {
        format!("{}", theme.success.apply_to(counts))
    });

    match (&report.reconciliation, report.needs_restart) {
        (Some(status), true) => {
            lines.push(theme.format_warning(&format!("Restart pending: {}", status.detail)))
        }
        (None, true) => lines.push(theme.format_warning("Restart pending")),
        (Some(status), false) => lines.push(format!(
            "{}",
            theme
                .dim
                .apply_to(format!("Pending restarts reconciled ({})", status.detail))
        )),
        (None, false) => {}
    }

    lines
}

fn result_line(result: &StepResult, theme: &ArmoryTheme) -> String {
    let style = theme.outcome_style(result.outcome);
    let marker = style.apply_to(result.outcome.display_char());
    let mut label = theme.highlight.apply_to(&result.step_id).to_string();
    if !result.description.is_empty() {
        label = format!("{} - {}", label, result.description);
    }
    match result.outcome {
        StepOutcome::Succeeded => format!(
            "  {} {} {}",
            marker,
            label,
            theme.dim.apply_to(format!("({})", format_duration(result.duration)))
        ),
        StepOutcome::Skipped => format!(
            "  {} {} {}",
            marker,
            label,
            theme.dim.apply_to("(already satisfied)")
        ),
        StepOutcome::Failed => {
            let detail = match result.exit_code {
                Some(code) => format!("{} (exit {})", result.message, code),
                None => result.message.clone(),
            };
            format!("  {} {}: {}", marker, label, style.apply_to(detail))
        }
    }
}

/// Result of probing one step without acting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Present,
    Missing,
    Unknown(String),
}

impl ProbeStatus {
    pub fn label(&self) -> String {
        match self {
            ProbeStatus::Present => "present".to_string(),
            ProbeStatus::Missing => "missing".to_string(),
            ProbeStatus::Unknown(reason) => format!("unknown ({})", reason),
        }
    }
}

/// One `status` line: key, id, description and probe state.
pub fn status_line(step: &Step, status: &ProbeStatus, theme: &ArmoryTheme) -> String {
    let key = step.key.map(|k| k.to_string()).unwrap_or_else(|| " ".into());
    let state = match status {
        ProbeStatus::Present => theme.success.apply_to(status.label()),
        ProbeStatus::Missing => theme.warning.apply_to(status.label()),
        ProbeStatus::Unknown(_) => theme.error.apply_to(status.label()),
    };
    format!(
        "  [{}] {:<16} {:<40} {}",
        theme.key.apply_to(key),
        step.id,
        theme.dim.apply_to(&step.description),
        state
    )
}
