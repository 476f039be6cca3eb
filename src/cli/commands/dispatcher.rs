//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::StepCatalog;
use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::{load_config, CatalogSource, Settings};
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command, reporting through `ui`.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Process exit code.
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Success when `exit_code` is 0.
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
        }
    }
}

/// Where commands find their catalog.
#[derive(Debug, Clone)]
pub struct CatalogLocation {
    pub cwd: PathBuf,
    pub explicit: Option<PathBuf>,
}

/// A loaded, validated catalog with the settings it came with.
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: StepCatalog,
    pub settings: Settings,
    pub source: CatalogSource,
}

impl CatalogLocation {
    /// Discover, parse and validate the catalog.
    pub fn load(&self) -> Result<LoadedCatalog> {
        let (config, source) = load_config(&self.cwd, self.explicit.as_deref())?;
        let catalog = StepCatalog::from_config(&config)?;
        debug!("Loaded {} step(s) from {}", catalog.len(), source);
        Ok(LoadedCatalog {
            catalog,
            settings: config.settings,
            source,
        })
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    location: CatalogLocation,
}

impl CommandDispatcher {
    pub fn new(cwd: PathBuf, explicit: Option<PathBuf>) -> Self {
        Self {
            location: CatalogLocation { cwd, explicit },
        }
    }

    /// Directory catalog discovery starts from.
    pub fn cwd(&self) -> &Path {
        &self.location.cwd
    }

    /// Route the CLI subcommand to its implementation and execute it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let location = self.location.clone();
        match &cli.command {
            Some(Commands::Run(args)) => {
                super::run::RunCommand::new(location, args.clone()).execute(ui)
            }
            Some(Commands::List(args)) => {
                super::list::ListCommand::new(location, args.clone()).execute(ui)
            }
            Some(Commands::Status(args)) => {
                super::status::StatusCommand::new(location, args.clone()).execute(ui)
            }
            Some(Commands::Completions(args)) => {
                super::completions::CompletionsCommand::new(args.clone()).execute(ui)
            }
            None => super::run::RunCommand::new(location, RunArgs::default()).execute(ui),
        }
    }
}
