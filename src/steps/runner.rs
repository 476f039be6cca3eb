//! Single-step execution.

use std::time::Instant;
use tracing::debug;

use super::{Step, StepResult};
use crate::action::{ActionContext, ActionInvoker};
use crate::error::{ArmoryError, Result};
use crate::probe::PresenceChecker;
use crate::shell;

/// Configuration shared by every step a runner executes.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Paths and defaults for actions.
    pub context: ActionContext,
    /// Actions require an effective uid of 0.
    pub require_root: bool,
}

/// Runs one step: probe, then (maybe) act, then classify.
pub struct StepRunner<'a> {
    checker: &'a dyn PresenceChecker,
    invoker: &'a mut dyn ActionInvoker,
    config: RunnerConfig,
    is_privileged: fn() -> bool,
}

impl<'a> StepRunner<'a> {
    pub fn new(
        checker: &'a dyn PresenceChecker,
        invoker: &'a mut dyn ActionInvoker,
        config: RunnerConfig,
    ) -> Self {
        Self {
            checker,
            invoker,
            config,
            is_privileged: shell::is_elevated,
        }
    }

    /// Replace the effective-uid check used when `require_root` is set.
    pub fn with_privilege_check(mut self, check: fn() -> bool) -> Self {
        self.is_privileged = check;
        self
    }

    /// Attempt `step` once.
    ///
    /// Step-level problems come back as a `Failed` result. `Err` is only
    /// returned for [`ArmoryError::FatalEnvironment`].
    pub fn run(&mut self, step: &Step) -> Result<StepResult> {
        let start = Instant::now();

        debug!("Checking {}: {}", step.id, step.precondition);
        match self.checker.check(&step.precondition) {
            Ok(true) => {
                debug!("{} already satisfied", step.id);
                return Ok(StepResult::skipped(step, start.elapsed()));
            }
            Ok(false) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("{} not attempted: {}", step.id, e);
                return Ok(StepResult::not_attempted(step, e.to_string(), start.elapsed()));
            }
        }

        if self.config.require_root && !(self.is_privileged)() {
            return Err(ArmoryError::FatalEnvironment {
                message: format!(
                    "required privilege lost before '{}': not running as root",
                    step.id
                ),
            });
        }

        debug!("Running {}: {}", step.id, step.action.describe(&self.config.context));
        let output = match step.action.execute(&self.config.context, &mut *self.invoker) {
            Ok(output) => output,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("{} failed to start: {}", step.id, e);
                return Ok(StepResult::not_attempted(step, e.to_string(), start.elapsed()));
            }
        };

        if let Some(signal) = output.signal.filter(|s| is_interrupt(*s)) {
            return Err(ArmoryError::FatalEnvironment {
                message: format!("'{}' was interrupted by signal {}", step.id, signal),
            });
        }

        // A child killed by any other signal is reported the way shells do.
        let code = output
            .exit_code
            .or(output.signal.map(|s| 128 + s))
            .unwrap_or(1);

        if code == 0 {
            debug!("{} succeeded", step.id);
            Ok(StepResult::succeeded(step, start.elapsed()))
        } else {
            let failure = ArmoryError::ActionFailed {
                step: step.id.clone(),
                code: Some(code),
            };
            debug!("{}", failure);
            Ok(StepResult::action_failed(
                step,
                code,
                format!("{} action failed", step.action.kind()),
                Some(output.output),
                start.elapsed(),
            ))
        }
    }
}

#[cfg(unix)]
fn is_interrupt(signal: i32) -> bool {
    signal == libc::SIGINT || signal == libc::SIGTERM
}

#[cfg(not(unix))]
fn is_interrupt(_signal: i32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::RecordingInvoker;
    use crate::action::{Action, InvocationOutput};
    use crate::probe::testing::{absent, present, FnChecker};
    use crate::probe::{Probe, SystemChecker};
    use crate::steps::StepOutcome;
    use tempfile::TempDir;

    fn shell_step(id: &str) -> Step {
        Step::new(
            id,
            format!("{} step", id),
            Probe::BinaryOnPath(format!("{}-bin", id)),
            Action::Shell {
                run: format!("install {}", id),
            },
        )
    }

    fn unprivileged() -> bool {
        false
    }

    #[test]
    fn present_precondition_skips_without_invoking() {
        let checker = present();
        let mut invoker = RecordingInvoker::new();
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        let result = runner.run(&shell_step("nmap")).unwrap();

        assert_eq!(result.outcome, StepOutcome::Skipped);
        assert!(invoker.calls.is_empty());
    }

    #[test]
    fn absent_precondition_invokes_action_once() {
        let checker = absent();
        let mut invoker = RecordingInvoker::new();
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        let result = runner.run(&shell_step("nmap")).unwrap();

        assert_eq!(result.outcome, StepOutcome::Succeeded);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(invoker.calls.len(), 1);
    }

    #[test]
    fn nonzero_exit_is_failed_with_output() {
        let checker = absent();
        let mut invoker = RecordingInvoker::new();
        invoker.reply_exit(100, "E: Unable to locate package nmap");
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        let result = runner.run(&shell_step("nmap")).unwrap();

        assert_eq!(result.outcome, StepOutcome::Failed);
        assert_eq!(result.exit_code, Some(100));
        assert!(result
            .output
            .as_deref()
            .unwrap()
            .contains("Unable to locate package"));
    }

    #[test]
    fn unknown_precondition_fails_closed() {
        let checker = FnChecker(|p: &Probe| -> Result<bool> {
            Err(ArmoryError::PreconditionUnknown {
                probe: p.to_string(),
                message: "permission denied".into(),
            })
        });
        let mut invoker = RecordingInvoker::new();
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        let result = runner.run(&shell_step("ssh-config")).unwrap();

        assert_eq!(result.outcome, StepOutcome::Failed);
        assert!(result.message.contains("permission denied"));
        assert_eq!(result.exit_code, None);
        assert!(invoker.calls.is_empty());
    }

    #[test]
    fn missing_root_is_fatal_before_invoking() {
        let checker = absent();
        let mut invoker = RecordingInvoker::new();
        let config = RunnerConfig {
            require_root: true,
            ..Default::default()
        };
        let mut runner =
            StepRunner::new(&checker, &mut invoker, config).with_privilege_check(unprivileged);

        let err = runner.run(&shell_step("nmap")).unwrap_err();

        assert!(err.is_fatal());
        assert!(invoker.calls.is_empty());
    }

    #[test]
    fn missing_root_does_not_matter_for_satisfied_step() {
        let checker = present();
        let mut invoker = RecordingInvoker::new();
        let config = RunnerConfig {
            require_root: true,
            ..Default::default()
        };
        let mut runner =
            StepRunner::new(&checker, &mut invoker, config).with_privilege_check(unprivileged);

        let result = runner.run(&shell_step("nmap")).unwrap();

        assert_eq!(result.outcome, StepOutcome::Skipped);
    }

    #[cfg(unix)]
    #[test]
    fn interrupted_action_is_fatal() {
        let checker = absent();
        let mut invoker = RecordingInvoker::new();
        invoker.reply(Ok(InvocationOutput {
            exit_code: None,
            signal: Some(libc::SIGINT),
            ..Default::default()
        }));
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        let err = runner.run(&shell_step("nmap")).unwrap_err();

        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[test]
    fn other_signal_is_ordinary_failure() {
        let checker = absent();
        let mut invoker = RecordingInvoker::new();
        invoker.reply(Ok(InvocationOutput {
            exit_code: None,
            signal: Some(libc::SIGKILL),
            ..Default::default()
        }));
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        let result = runner.run(&shell_step("nmap")).unwrap();

        assert_eq!(result.outcome, StepOutcome::Failed);
        assert_eq!(result.exit_code, Some(128 + libc::SIGKILL));
    }

    #[test]
    fn fatal_invoker_error_propagates() {
        let checker = absent();
        let mut invoker = RecordingInvoker::new();
        invoker.reply(Err(ArmoryError::FatalEnvironment {
            message: "cannot start sh".into(),
        }));
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        assert!(runner.run(&shell_step("nmap")).unwrap_err().is_fatal());
    }

    #[test]
    fn second_run_after_success_is_skipped() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join("bashrc");
        let rc = rc.to_string_lossy().to_string();
        let step = Step::new(
            "go-path",
            "Go on PATH",
            Probe::FileContains {
                path: rc.clone(),
                pattern: "^export PATH=.*go/bin".into(),
            },
            Action::FilePatch {
                path: rc,
                line: "export PATH=$PATH:/usr/local/go/bin".into(),
            },
        );
        let checker = SystemChecker::new();
        let mut invoker = RecordingInvoker::new();
        let mut runner = StepRunner::new(&checker, &mut invoker, RunnerConfig::default());

        let first = runner.run(&step).unwrap();
        let second = runner.run(&step).unwrap();

        assert_eq!(first.outcome, StepOutcome::Succeeded);
        assert_eq!(second.outcome, StepOutcome::Skipped);
    }
}
