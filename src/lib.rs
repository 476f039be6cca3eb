//! armory - idempotent provisioning of a security-testing toolbox.
//!
//! armory installs a fixed catalog of tools, runtimes and configuration
//! files on a machine. Every step first probes whether its target already
//! exists and only acts when it does not, so running armory twice is safe.
//!
//! # Modules
//!
//! - [`action`] - What a step does, and the [`ActionInvoker`](action::ActionInvoker) seam
//! - [`batch`] - Running many steps as one batch, with restart reconciliation
//! - [`catalog`] - The ordered, read-only step registry
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Catalog file loading, parsing and interpolation
//! - [`error`] - Error types and result aliases
//! - [`probe`] - Presence probes and the [`PresenceChecker`](probe::PresenceChecker) seam
//! - [`shell`] - Process execution and platform checks
//! - [`steps`] - Step definitions, results and the single-step runner
//! - [`ui`] - Prompts, spinners, menus and report rendering
//!
//! # Example
//!
//! ```
//! use armory::config::{resolve_string, InterpolationContext};
//!
//! let mut ctx = InterpolationContext::new();
//! ctx.set("tools_dir", "/opt/tools");
//! let dest = resolve_string("${tools_dir}/impacket", &ctx).unwrap();
//! assert_eq!(dest, "/opt/tools/impacket");
//! ```

pub mod action;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod probe;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{ArmoryError, Result};
