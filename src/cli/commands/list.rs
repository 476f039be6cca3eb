//! List command implementation.
//!
//! The `armory list` command shows the catalog in menu order.

use serde::Serialize;

use crate::catalog::StepCatalog;
use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::ui::{ArmoryTheme, UserInterface};

use super::dispatcher::{CatalogLocation, Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    location: CatalogLocation,
    args: ListArgs,
}

#[derive(Debug, Serialize)]
struct StepEntry<'a> {
    key: Option<char>,
    id: &'a str,
    description: &'a str,
    kind: &'static str,
    restart_sensitive: bool,
}

#[derive(Debug, Serialize)]
struct GroupEntry<'a> {
    name: &'a str,
    description: Option<&'a str>,
    steps: &'a [String],
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    steps: Vec<StepEntry<'a>>,
    groups: Vec<GroupEntry<'a>>,
}

impl<'a> Listing<'a> {
    fn of(catalog: &'a StepCatalog) -> Self {
        Self {
            steps: catalog
                .all()
                .iter()
                .map(|s| StepEntry {
                    key: s.key,
                    id: &s.id,
                    description: &s.description,
                    kind: s.action.kind(),
                    restart_sensitive: s.restart_sensitive,
                })
                .collect(),
            groups: catalog
                .groups()
                .iter()
                .map(|g| GroupEntry {
                    name: &g.name,
                    description: g.description.as_deref(),
                    steps: &g.steps,
                })
                .collect(),
        }
    }
}

impl ListCommand {
    pub fn new(location: CatalogLocation, args: ListArgs) -> Self {
        Self { location, args }
    }

    fn render(&self, catalog: &StepCatalog, ui: &mut dyn UserInterface) {
        let theme = ArmoryTheme::for_terminal(false);

        ui.message(&format!("  {}", theme.header.apply_to("Steps:")));
        for step in catalog.all() {
            let key = step.key.map(|k| k.to_string()).unwrap_or_else(|| " ".into());
            let restart = if step.restart_sensitive {
                format!(" {}", theme.warning.apply_to("(restart)"))
            } else {
                String::new()
            };
            ui.message(&format!(
                "    [{}] {:<16} {}{}",
                theme.key.apply_to(key),
                theme.highlight.apply_to(&step.id),
                theme.dim.apply_to(&step.description),
                restart
            ));
        }

        if !catalog.groups().is_empty() {
            ui.message("");
            ui.message(&format!("  {}", theme.header.apply_to("Groups:")));
            for group in catalog.groups() {
                ui.message(&format!(
                    "    {}{} {}",
                    theme.highlight.apply_to(&group.name),
                    theme.dim.apply_to(":"),
                    theme.dim.apply_to(group.steps.join(", ")),
                ));
            }
        }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = self.location.load()?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&Listing::of(&loaded.catalog))
                .map_err(anyhow::Error::from)?;
            println!("{}", json);
        } else {
            ui.message(&format!("  Catalog: {}", loaded.source));
            ui.message("");
            self.render(&loaded.catalog, ui);
        }

        Ok(CommandResult::success())
    }
}
