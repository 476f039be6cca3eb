//! Probe evaluation against the local machine.
//!
//! Everything here reads the filesystem, PATH, the process table or the
//! local container runtime. Nothing touches the network and nothing is
//! written.

use regex::{Regex, RegexBuilder};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use super::{evaluate, PresenceChecker, Probe};
use crate::error::{ArmoryError, Result};

/// Checks probes against the real system.
#[derive(Debug, Clone)]
pub struct SystemChecker {
    path_entries: Vec<PathBuf>,
    proc_root: PathBuf,
}

impl Default for SystemChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemChecker {
    /// Checker using the process PATH and `/proc`.
    pub fn new() -> Self {
        Self {
            path_entries: parse_system_path(),
            proc_root: PathBuf::from("/proc"),
        }
    }

    /// Replace the PATH entries used for `binary_on_path`.
    pub fn with_path(mut self, entries: Vec<PathBuf>) -> Self {
        self.path_entries = entries;
        self
    }

    /// Replace the process table root used for `process_active`.
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    fn check_leaf(&self, probe: &Probe) -> Result<bool> {
        let present = match probe {
            Probe::BinaryOnPath(name) => self.binary_on_path(name),
            Probe::FileExists(path) => {
                stat(probe, Path::new(path))?.is_some_and(|m| m.is_file())
            }
            Probe::DirectoryExists(path) => {
                stat(probe, Path::new(path))?.is_some_and(|m| m.is_dir())
            }
            Probe::FileContains { path, pattern } => file_contains(probe, path, pattern)?,
            Probe::ProcessActive(name) => self.process_active(probe, name)?,
            Probe::ContainerPresent(name) => self.container_present(probe, name)?,
            Probe::All(_) | Probe::Any(_) => {
                return evaluate(probe, &|p: &Probe| self.check_leaf(p));
            }
        };
        debug!("probe {} -> {}", probe, present);
        Ok(present)
    }

    fn binary_on_path(&self, name: &str) -> bool {
        if name.contains('/') {
            let path = Path::new(name);
            return path.is_file() && is_executable(path);
        }
        resolve_tool_path(name, &self.path_entries).is_some()
    }

    fn process_active(&self, probe: &Probe, name: &str) -> Result<bool> {
        if !self.proc_root.is_dir() {
            return pgrep(probe, name);
        }

        let entries = fs::read_dir(&self.proc_root).map_err(|e| unknown(probe, e))?;
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(pid) = file_name.to_str() else {
                continue;
            };
            if !pid.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            // Processes can exit between listing and reading; unreadable
            // entries are simply not matches.
            if let Ok(comm) = fs::read_to_string(entry.path().join("comm")) {
                if comm.trim_end() == name {
                    return Ok(true);
                }
            }
            if let Ok(cmdline) = fs::read(entry.path().join("cmdline")) {
                let argv0 = cmdline.split(|b| *b == 0).next().unwrap_or_default();
                let argv0 = String::from_utf8_lossy(argv0);
                let base = argv0.rsplit('/').next().unwrap_or_default();
                if !base.is_empty() && base == name {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl SystemChecker {
    /// Ask `docker container inspect` whether `name` exists.
    ///
    /// No docker binary, or no reachable daemon, means no container.
    fn container_present(&self, probe: &Probe, name: &str) -> Result<bool> {
        let Some(docker) = resolve_tool_path("docker", &self.path_entries) else {
            return Ok(false);
        };
        let output = Command::new(docker)
            .args(["container", "inspect", name])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| unknown(probe, e))?;
        if output.status.success() {
            return Ok(true);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lower = stderr.to_lowercase();
        if lower.contains("no such") || lower.contains("cannot connect") {
            Ok(false)
        } else {
            Err(unknown(probe, stderr.trim()))
        }
    }
}

impl PresenceChecker for SystemChecker {
    fn check(&self, probe: &Probe) -> Result<bool> {
        self.check_leaf(probe)
    }
}

fn unknown(probe: &Probe, err: impl std::fmt::Display) -> ArmoryError {
    ArmoryError::PreconditionUnknown {
        probe: probe.to_string(),
        message: err.to_string(),
    }
}

/// `Ok(None)` when the path (or one of its parents) does not exist.
fn stat(probe: &Probe, path: &Path) -> Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if is_absent(&e) => Ok(None),
        Err(e) => Err(unknown(probe, e)),
    }
}

fn is_absent(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

fn file_contains(probe: &Probe, path: &str, pattern: &str) -> Result<bool> {
    let re = compile_pattern(pattern).map_err(|e| unknown(probe, e))?;
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if is_absent(&e) => return Ok(false),
        Err(e) if e.kind() == ErrorKind::IsADirectory => return Ok(false),
        Err(e) => return Err(unknown(probe, e)),
    };
    Ok(re.is_match(&String::from_utf8_lossy(&bytes)))
}

/// Compile a `file_contains` pattern. `^` and `$` match at line boundaries.
pub(crate) fn compile_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).multi_line(true).build()
}

/// Fallback for systems without a `/proc` filesystem.
fn pgrep(probe: &Probe, name: &str) -> Result<bool> {
    let status = Command::new("pgrep")
        .arg("-x")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| unknown(probe, format!("process table unavailable: {}", e)))?;
    match status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        other => Err(unknown(probe, format!("pgrep exited with {:?}", other))),
    }
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Find `tool` in `path_entries`, returning the first executable match.
///
/// Walks PATH directly rather than shelling out to `which`, whose behavior
/// differs between systems.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    path_entries
        .iter()
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
}

/// Split the PATH environment variable into directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}
