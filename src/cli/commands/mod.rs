//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations and hands each one the same
//! [`CatalogLocation`].

pub mod completions;
pub mod dispatcher;
pub mod list;
pub mod run;
pub mod status;

pub use dispatcher::{CatalogLocation, Command, CommandDispatcher, CommandResult, LoadedCatalog};
