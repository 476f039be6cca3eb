//! Status command implementation.
//!
//! The `armory status` command probes steps without running any action.

use serde::Serialize;
use tracing::debug;

use crate::catalog::StepCatalog;
use crate::cli::args::StatusArgs;
use crate::error::Result;
use crate::probe::{PresenceChecker, SystemChecker};
use crate::steps::Step;
use crate::ui::{status_line, ArmoryTheme, ProbeStatus, UserInterface};

use super::dispatcher::{CatalogLocation, Command, CommandResult};

/// The status command implementation.
pub struct StatusCommand {
    location: CatalogLocation,
    args: StatusArgs,
}

#[derive(Debug, Serialize)]
struct StatusEntry<'a> {
    id: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Probe `ids` (every step when empty) with `checker`.
pub(crate) fn sweep<'c>(
    catalog: &'c StepCatalog,
    ids: &[String],
    checker: &dyn PresenceChecker,
) -> Result<Vec<(&'c Step, ProbeStatus)>> {
    let steps: Vec<&Step> = if ids.is_empty() {
        catalog.all().iter().collect()
    } else {
        catalog
            .resolve_selection(ids)
            .iter()
            .map(|id| catalog.get(id))
            .collect::<Result<_>>()?
    };

    Ok(steps
        .into_iter()
        .map(|step| {
            let status = match checker.check(&step.precondition) {
                Ok(true) => ProbeStatus::Present,
                Ok(false) => ProbeStatus::Missing,
                Err(e) => ProbeStatus::Unknown(e.to_string()),
            };
            debug!("{}: {}", step.id, status.label());
            (step, status)
        })
        .collect())
}

impl StatusCommand {
    pub fn new(location: CatalogLocation, args: StatusArgs) -> Self {
        Self { location, args }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = self.location.load()?;
        let checker = SystemChecker::new();
        let rows = sweep(&loaded.catalog, &self.args.steps, &checker)?;

        if self.args.json {
            let entries: Vec<_> = rows
                .iter()
                .map(|(step, status)| StatusEntry {
                    id: &step.id,
                    status: match status {
                        ProbeStatus::Present => "present",
                        ProbeStatus::Missing => "missing",
                        ProbeStatus::Unknown(_) => "unknown",
                    },
                    reason: match status {
                        ProbeStatus::Unknown(reason) => Some(reason.as_str()),
                        _ => None,
                    },
                })
                .collect();
            let json = serde_json::to_string_pretty(&entries).map_err(anyhow::Error::from)?;
            println!("{}", json);
            return Ok(CommandResult::success());
        }

        let theme = ArmoryTheme::for_terminal(false);
        ui.show_header(&format!("Status ({})", loaded.source));
        for (step, status) in &rows {
            ui.message(&status_line(step, status, &theme));
        }
        let missing = rows
            .iter()
            .filter(|(_, s)| *s != ProbeStatus::Present)
            .count();
        ui.message("");
        ui.message(&format!(
            "{} of {} step(s) satisfied",
            rows.len() - missing,
            rows.len()
        ));

        Ok(CommandResult::success())
    }
}
