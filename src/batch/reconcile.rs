//! End-of-batch restart reconciliation.

use serde::Serialize;
use tracing::debug;

use crate::action::Invocation;
use crate::config::Settings;
use crate::error::Result;
use crate::shell;

/// What a reconciler reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileStatus {
    /// No restart is pending any more.
    pub all_clear: bool,
    /// Short explanation for the report.
    pub detail: String,
}

impl ReconcileStatus {
    pub fn clear(detail: impl Into<String>) -> Self {
        Self {
            all_clear: true,
            detail: detail.into(),
        }
    }

    pub fn pending(detail: impl Into<String>) -> Self {
        Self {
            all_clear: false,
            detail: detail.into(),
        }
    }
}

/// Handles service and kernel restarts left pending by a batch.
///
/// Called at most once per batch, after the last step.
pub trait Reconciler {
    fn reconcile_restarts(&mut self) -> Result<ReconcileStatus>;
}

/// Runs `settings.reconcile_command`; exit 0 means nothing is pending.
#[derive(Debug, Clone)]
pub struct CommandReconciler {
    command: String,
}

impl CommandReconciler {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Reconciler for CommandReconciler {
    fn reconcile_restarts(&mut self) -> Result<ReconcileStatus> {
        debug!("Reconciling restarts with: {}", self.command);
        let invocation = Invocation::new(shell::system_shell())
            .arg(shell::shell_flag())
            .arg(self.command.clone());
        let output = shell::execute_quiet(&invocation)?;

        if output.success() {
            Ok(ReconcileStatus::clear(format!("{} completed", self.command)))
        } else {
            let last = output.output.lines().last().unwrap_or("").trim().to_string();
            let code = output
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let detail = if last.is_empty() {
                format!("{} exited {}", self.command, code)
            } else {
                format!("{} exited {}: {}", self.command, code, last)
            };
            Ok(ReconcileStatus::pending(detail))
        }
    }
}

/// Used when no reconcile command is configured: restarts stay pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingReconciler;

impl Reconciler for PendingReconciler {
    fn reconcile_restarts(&mut self) -> Result<ReconcileStatus> {
        Ok(ReconcileStatus::pending(
            "no reconcile command configured; restart services manually",
        ))
    }
}

/// The reconciler described by `settings`.
pub fn from_settings(settings: &Settings) -> Box<dyn Reconciler> {
    match settings.reconcile_command.as_deref().map(str::trim) {
        Some(cmd) if !cmd.is_empty() => Box::new(CommandReconciler::new(cmd)),
        _ => Box::new(PendingReconciler),
    }
}
