//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Armory - idempotent provisioning of a security-testing toolbox.
#[derive(Debug, Parser)]
#[command(name = "armory")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the catalog file (overrides $ARMORY_CONFIG and discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show action output as it runs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final report and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision selected steps (default if no command specified)
    Run(RunArgs),

    /// List catalog steps and groups
    List(ListArgs),

    /// Probe every step without changing anything
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Step ids or menu keys to run, in order (comma or space separated)
    #[arg(value_delimiter = ',')]
    pub steps: Vec<String>,

    /// Run a named group of steps
    #[arg(short, long, conflicts_with_all = ["steps", "all"])]
    pub group: Option<String>,

    /// Run every step in the catalog
    #[arg(short, long, conflicts_with = "steps")]
    pub all: bool,

    /// Never prompt; answer from ARMORY_PROMPT_* or defaults
    #[arg(long, env = "ARMORY_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show status for specific steps only
    #[arg(value_delimiter = ',')]
    pub steps: Vec<String>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
