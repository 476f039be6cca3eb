//! Presence probes.
//!
//! A [`Probe`] describes a read-only check for whether a step's target
//! state already exists on the machine. The set of probe kinds is closed:
//! new steps compose existing kinds (optionally through [`Probe::All`] and
//! [`Probe::Any`]) instead of adding ad hoc checks.
//!
//! Probes are evaluated through the [`PresenceChecker`] trait. Absence is a
//! normal `Ok(false)`; only a probe that cannot be evaluated (permission
//! denied, unreadable process table, bad pattern) returns an error.
//!
//! # Example
//!
//! ```
//! use armory::probe::{PresenceChecker, Probe, SystemChecker};
//!
//! let checker = SystemChecker::new();
//! let probe = Probe::DirectoryExists("/".to_string());
//! assert!(checker.check(&probe).unwrap());
//! ```

pub mod system;

pub use system::{resolve_tool_path, SystemChecker};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::interpolation::{resolve_string, InterpolationContext};
use crate::error::{ArmoryError, Result};

/// A capability probe.
///
/// In a catalog file a probe is written as a single-key map, e.g.
/// `binary_on_path: nmap` or `file_contains: { path: ..., pattern: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    /// An executable with this name is found on PATH. A name containing a
    /// `/` is checked as a path directly.
    BinaryOnPath(String),

    /// A regular file exists at the path.
    FileExists(String),

    /// A directory exists at the path.
    DirectoryExists(String),

    /// The file exists and some line matches the regex `pattern`.
    FileContains { path: String, pattern: String },

    /// A process (or a session/daemon process) with this name is running.
    ProcessActive(String),

    /// A container with this name exists, running or stopped.
    ContainerPresent(String),

    /// Every sub-probe is present.
    All(Vec<Probe>),

    /// At least one sub-probe is present.
    Any(Vec<Probe>),
}

impl Probe {
    /// Expand `${var}` references in every path, name and pattern.
    pub fn interpolate(&self, ctx: &InterpolationContext) -> Result<Probe> {
        Ok(match self {
            Probe::BinaryOnPath(name) => Probe::BinaryOnPath(resolve_string(name, ctx)?),
            Probe::FileExists(path) => Probe::FileExists(resolve_string(path, ctx)?),
            Probe::DirectoryExists(path) => Probe::DirectoryExists(resolve_string(path, ctx)?),
            Probe::FileContains { path, pattern } => Probe::FileContains {
                path: resolve_string(path, ctx)?,
                pattern: resolve_string(pattern, ctx)?,
            },
            Probe::ProcessActive(name) => Probe::ProcessActive(resolve_string(name, ctx)?),
            Probe::ContainerPresent(name) => {
                Probe::ContainerPresent(resolve_string(name, ctx)?)
            }
            Probe::All(probes) => Probe::All(
                probes
                    .iter()
                    .map(|p| p.interpolate(ctx))
                    .collect::<Result<_>>()?,
            ),
            Probe::Any(probes) => Probe::Any(
                probes
                    .iter()
                    .map(|p| p.interpolate(ctx))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Check the probe's static shape: non-empty targets, compilable
    /// patterns, non-empty composites.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| ArmoryError::ConfigValidationError { message };
        match self {
            Probe::BinaryOnPath(s)
            | Probe::FileExists(s)
            | Probe::DirectoryExists(s)
            | Probe::ProcessActive(s)
            | Probe::ContainerPresent(s) => {
                if s.trim().is_empty() {
                    return Err(invalid(format!("probe '{}' has an empty target", self)));
                }
            }
            Probe::FileContains { path, pattern } => {
                if path.trim().is_empty() {
                    return Err(invalid("file_contains probe has an empty path".into()));
                }
                system::compile_pattern(pattern)
                    .map_err(|e| invalid(format!("invalid pattern '{}': {}", pattern, e)))?;
            }
            Probe::All(probes) | Probe::Any(probes) => {
                if probes.is_empty() {
                    return Err(invalid(format!("probe '{}' has no sub-probes", self)));
                }
                for probe in probes {
                    probe.validate()?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::BinaryOnPath(name) => write!(f, "binary_on_path {}", name),
            Probe::FileExists(path) => write!(f, "file_exists {}", path),
            Probe::DirectoryExists(path) => write!(f, "directory_exists {}", path),
            Probe::FileContains { path, pattern } => {
                write!(f, "file_contains {} /{}/", path, pattern)
            }
            Probe::ProcessActive(name) => write!(f, "process_active {}", name),
            Probe::ContainerPresent(name) => write!(f, "container_present {}", name),
            Probe::All(probes) => write!(f, "all of {} probes", probes.len()),
            Probe::Any(probes) => write!(f, "any of {} probes", probes.len()),
        }
    }
}

/// Decides whether a probe's target is already present.
///
/// Implementations must be side-effect free.
pub trait PresenceChecker {
    /// Evaluate a probe.
    ///
    /// Returns `Ok(false)` when the target is absent and
    /// [`ArmoryError::PreconditionUnknown`] when presence cannot be decided.
    fn check(&self, probe: &Probe) -> Result<bool>;
}

/// Evaluate a composite probe with `leaf` deciding the non-composite kinds.
///
/// `All` stops at the first absent sub-probe. `Any` stops at the first
/// present one; if none is present and some sub-probe errored, the error
/// wins so that an undecidable check never reads as "absent".
pub fn evaluate<F>(probe: &Probe, leaf: &F) -> Result<bool>
where
    F: Fn(&Probe) -> Result<bool>,
{
    match probe {
        Probe::All(probes) => {
            for p in probes {
                if !evaluate(p, leaf)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Probe::Any(probes) => {
            let mut first_error = None;
            for p in probes {
                match evaluate(p, leaf) {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            match first_error {
                Some(e) => Err(e),
                None => Ok(false),
            }
        }
        _ => leaf(probe),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Checker answering every probe with a fixed closure.
    pub struct FnChecker<F>(pub F);

    impl<F> PresenceChecker for FnChecker<F>
    where
        F: Fn(&Probe) -> Result<bool>,
    {
        fn check(&self, probe: &Probe) -> Result<bool> {
            evaluate(probe, &self.0)
        }
    }

    pub fn absent() -> FnChecker<fn(&Probe) -> Result<bool>> {
        FnChecker(|_| Ok(false))
    }

    pub fn present() -> FnChecker<fn(&Probe) -> Result<bool>> {
        FnChecker(|_| Ok(true))
    }
}
