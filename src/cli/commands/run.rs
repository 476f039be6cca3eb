//! Run command implementation.
//!
//! The `armory run` command selects steps, runs them as one batch and
//! reports the outcome of each.

use serde::Serialize;
use tracing::info;

use crate::action::Invocation;
use crate::batch::{
    reconciler_from_settings, BatchAborted, BatchExecutor, BatchProgress, BatchReport, BatchState,
};
use crate::catalog::StepCatalog;
use crate::cli::args::RunArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::probe::SystemChecker;
use crate::shell::{execute_quiet, shell_flag, system_shell, OutputLine, ShellInvoker};
use crate::steps::{RunnerConfig, StepOutcome, StepRunner};
use crate::ui::{confirm_reboot, select_steps, OutputRelay, SpinnerHandle, UserInterface};

use super::dispatcher::{CatalogLocation, Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    location: CatalogLocation,
    args: RunArgs,
}

/// `--json` document for a finished or aborted batch.
#[derive(Debug, Serialize)]
struct RunOutput<'a> {
    state: BatchState,
    #[serde(flatten)]
    report: &'a BatchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RunCommand {
    pub fn new(location: CatalogLocation, args: RunArgs) -> Self {
        Self { location, args }
    }

    /// Step ids to run: a group, everything, explicit ids/keys, or the menu.
    fn selection(&self, catalog: &StepCatalog, ui: &mut dyn UserInterface) -> Result<Vec<String>> {
        if let Some(group) = &self.args.group {
            return catalog.group_ids(group);
        }
        if self.args.all {
            return Ok(catalog.ids());
        }
        if !self.args.steps.is_empty() {
            let tokens: Vec<&str> = self
                .args
                .steps
                .iter()
                .flat_map(|s| s.split_whitespace())
                .collect();
            return Ok(catalog.resolve_selection(&tokens));
        }
        select_steps(ui, catalog)
    }

    fn run_batch(
        &self,
        catalog: &StepCatalog,
        settings: &Settings,
        ids: &[String],
        ui: &mut dyn UserInterface,
    ) -> Result<std::result::Result<BatchReport, BatchAborted>> {
        let config = RunnerConfig {
            context: settings.action_context()?,
            require_root: settings.require_root,
        };
        let quiet = self.args.json;

        let relay = OutputRelay::new(!quiet && ui.output_mode().shows_command_output());
        let sink = relay.clone();
        let mut invoker = ShellInvoker::new().with_output(move |line: &OutputLine| sink.relay(line));
        let checker = SystemChecker::new();
        let mut reconciler = reconciler_from_settings(settings);

        let runner = StepRunner::new(&checker, &mut invoker, config);
        let mut executor = BatchExecutor::new(catalog, runner, reconciler.as_mut());

        let mut spinner: Option<Box<dyn SpinnerHandle>> = None;
        let outcome = executor.execute_with_progress(ids, |event| {
            if quiet {
                return;
            }
            match event {
                BatchProgress::StepStarting { id, index, total } => {
                    let label = match catalog.get(id) {
                        Ok(step) => format!("[{}/{}] {} - {}", index + 1, total, id, step.description),
                        Err(_) => format!("[{}/{}] {}", index + 1, total, id),
                    };
                    let handle = ui.start_spinner(&label);
                    relay.attach(handle.progress_bar(), &label);
                    spinner = Some(handle);
                }
                BatchProgress::StepFinished { result, .. } => {
                    relay.detach();
                    if let Some(mut handle) = spinner.take() {
                        let line = result.detail_line();
                        match result.outcome {
                            StepOutcome::Succeeded => handle.finish_success(&line),
                            StepOutcome::Skipped => handle.finish_skipped(&line),
                            StepOutcome::Failed => handle.finish_error(&line),
                        }
                    }
                }
                BatchProgress::Reconciling => {
                    ui.message("Reconciling pending service restarts...");
                }
            }
        });
        relay.detach();
        if let Some(mut handle) = spinner.take() {
            handle.finish_error("aborted");
        }

        Ok(outcome)
    }

    /// Ask to reboot when restarts are still pending and a command exists.
    fn offer_reboot(
        &self,
        settings: &Settings,
        report: &BatchReport,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        if !report.needs_restart || self.args.json {
            return Ok(());
        }
        let Some(command) = settings
            .reboot_command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        else {
            ui.warning("Services need a restart; reboot when convenient");
            return Ok(());
        };
        if !ui.is_interactive() {
            ui.warning(&format!(
                "Services need a restart; run '{}' when convenient",
                command
            ));
            return Ok(());
        }

        if confirm_reboot(ui)? {
            info!("Rebooting with '{}'", command);
            let invocation = Invocation::new(system_shell())
                .arg(shell_flag())
                .arg(command);
            let output = execute_quiet(&invocation)?;
            if !output.success() {
                ui.error(&format!("Reboot command failed: {}", output.output.trim()));
            }
        }
        Ok(())
    }

    fn print_json(
        &self,
        state: BatchState,
        report: &BatchReport,
        error: Option<String>,
    ) -> Result<()> {
        let doc = RunOutput {
            state,
            report,
            error,
        };
        let json = serde_json::to_string_pretty(&doc).map_err(anyhow::Error::from)?;
        println!("{}", json);
        Ok(())
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = self.location.load()?;
        let ids = self.selection(&loaded.catalog, ui)?;

        if ids.is_empty() {
            ui.warning("No steps selected");
            return Ok(CommandResult::success());
        }

        if !self.args.json {
            ui.show_header(&format!(
                "armory · {} step(s) from {}",
                ids.len(),
                loaded.source
            ));
        }

        match self.run_batch(&loaded.catalog, &loaded.settings, &ids, ui)? {
            Ok(report) => {
                if self.args.json {
                    self.print_json(BatchState::Completed, &report, None)?;
                } else {
                    ui.show_report(&report);
                }
                self.offer_reboot(&loaded.settings, &report, ui)?;
                Ok(CommandResult::from_exit_code(report.exit_code()))
            }
            Err(aborted) => {
                if self.args.json {
                    self.print_json(
                        BatchState::Aborted,
                        &aborted.report,
                        Some(aborted.error.to_string()),
                    )?;
                } else {
                    ui.show_report(&aborted.report);
                    ui.error(&aborted.to_string());
                }
                Ok(CommandResult::from_exit_code(aborted.exit_code()))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::ui::{MockUI, SpinnerStatus};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn catalog_yaml(dir: &Path, reconcile: &str) -> String {
        let d = dir.display();
        format!(
            r#"
settings:
  require_root: false
  reconcile_command: "{reconcile}"
  reboot_command: "true"
steps:
  - id: alpha
    description: Alpha marker
    check: {{ file_exists: {d}/alpha }}
    action: {{ shell: {{ run: "touch {d}/alpha" }} }}
  - id: broken
    description: Always fails
    check: {{ file_exists: {d}/broken }}
    action: {{ shell: {{ run: "echo boom >&2; exit 3" }} }}
  - id: service
    description: Needs restart
    check: {{ file_exists: {d}/service }}
    action: {{ shell: {{ run: "touch {d}/service" }} }}
    restart_sensitive: true
groups:
  - name: good
    steps: [alpha, service]
"#
        )
    }

    fn setup(reconcile: &str) -> (TempDir, CatalogLocation) {
        let temp = TempDir::new().unwrap();
        let yaml = catalog_yaml(temp.path(), reconcile);
        fs::write(temp.path().join("armory.yml"), yaml).unwrap();
        let location = CatalogLocation {
            cwd: temp.path().to_path_buf(),
            explicit: None,
        };
        (temp, location)
    }

    fn run_args(steps: &[&str]) -> RunArgs {
        RunArgs {
            steps: steps.iter().map(|s| s.to_string()).collect(),
            ..RunArgs::default()
        }
    }

    #[test]
    fn runs_selected_steps_and_reports() {
        let (temp, location) = setup("true");
        let mut ui = MockUI::new();

        let result = RunCommand::new(location, run_args(&["alpha"]))
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert!(temp.path().join("alpha").exists());
        assert_eq!(ui.reports().len(), 1);
        assert_eq!(
            ui.spinner_finishes()[0].0,
            SpinnerStatus::Success
        );
    }

    #[test]
    fn second_run_skips_satisfied_steps() {
        let (_temp, location) = setup("true");
        let cmd = RunCommand::new(location, run_args(&["alpha"]));
        cmd.execute(&mut MockUI::new()).unwrap();

        let mut ui = MockUI::new();
        cmd.execute(&mut ui).unwrap();

        assert_eq!(ui.reports()[0].skipped(), 1);
        assert_eq!(ui.spinner_finishes()[0].0, SpinnerStatus::Skipped);
    }

    #[test]
    fn failure_does_not_stop_the_batch() {
        let (temp, location) = setup("true");
        let mut ui = MockUI::new();

        let result = RunCommand::new(location, run_args(&["broken", "alpha"]))
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(temp.path().join("alpha").exists());
        let report = &ui.reports()[0];
        assert_eq!(report.failed(), 1);
        assert_eq!(report.results[0].exit_code, Some(3));
        assert!(report.results[0]
            .output
            .as_deref()
            .is_some_and(|o| o.contains("boom")));
    }

    #[test]
    fn unknown_ids_are_reported_not_fatal() {
        let (_temp, location) = setup("true");
        let mut ui = MockUI::new();

        let result = RunCommand::new(location, run_args(&["nuclei", "alpha"]))
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert_eq!(ui.reports()[0].results[0].message, "unknown step");
        assert_eq!(ui.reports()[0].succeeded(), 1);
    }

    #[test]
    fn group_selection_reconciles_once() {
        let (_temp, location) = setup("true");
        let mut ui = MockUI::new();
        let args = RunArgs {
            group: Some("good".into()),
            ..RunArgs::default()
        };

        RunCommand::new(location, args).execute(&mut ui).unwrap();

        let report = &ui.reports()[0];
        assert_eq!(report.succeeded(), 2);
        assert!(report.reconciliation.as_ref().is_some_and(|r| r.all_clear));
        assert!(!report.needs_restart);
        assert!(ui.has_message("Reconciling"));
    }

    #[test]
    fn pending_restart_offers_reboot_when_interactive() {
        let (_temp, location) = setup("exit 1");
        let mut ui = MockUI::new();
        ui.set_interactive(true);

        RunCommand::new(location, run_args(&["service"]))
            .execute(&mut ui)
            .unwrap();

        assert!(ui.reports()[0].needs_restart);
        assert_eq!(ui.prompts_shown(), &["reboot"]);
    }

    #[test]
    fn pending_restart_only_warns_when_not_interactive() {
        let (_temp, location) = setup("exit 1");
        let mut ui = MockUI::new();

        RunCommand::new(location, run_args(&["service"]))
            .execute(&mut ui)
            .unwrap();

        assert!(ui.prompts_shown().is_empty());
        assert!(ui.has_warning("restart"));
    }

    #[test]
    fn menu_is_used_without_selection() {
        let (temp, location) = setup("true");
        let mut ui = MockUI::new();
        ui.set_prompt_response("steps", "alpha");

        RunCommand::new(location, RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(ui.prompts_shown(), &["steps"]);
        assert!(temp.path().join("alpha").exists());
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let (_temp, location) = setup("true");
        let mut ui = MockUI::new();

        let result = RunCommand::new(location, RunArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.reports().is_empty());
        assert!(ui.has_warning("No steps selected"));
    }
}
