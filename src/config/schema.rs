//! Catalog file schema.
//!
//! These structs map one-to-one onto the YAML catalog format:
//!
//! ```yaml
//! settings:
//!   tools_dir: /opt/tools
//!   package_manager: apt
//! steps:
//!   - id: nmap
//!     key: n
//!     description: Network mapper
//!     check:
//!       binary_on_path: nmap
//!     action:
//!       package:
//!         packages: [nmap]
//! groups:
//!   - name: recon
//!     steps: [nmap]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::action::{Action, ActionContext, Invocation};
use crate::config::interpolation::{resolve_string, InterpolationContext};
use crate::error::Result;
use crate::probe::Probe;

/// Root of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArmoryConfig {
    /// Paths and flags passed to every step.
    pub settings: Settings,

    /// Step definitions, in registration (menu) order.
    pub steps: Vec<StepConfig>,

    /// Named selections of step ids.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupConfig>,
}

/// Settings shared by all steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root for cloned repositories and the virtualenv.
    pub tools_dir: String,

    /// Virtualenv used by `python_package` actions.
    pub venv_path: String,

    /// Default package manager for `package` actions.
    pub package_manager: PackageManager,

    /// Refuse to run actions unless the effective uid is 0.
    pub require_root: bool,

    /// Command that reconciles pending service restarts after a batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconcile_command: Option<String>,

    /// Command offered to the operator when a restart is still pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reboot_command: Option<String>,

    /// Extra variables for `${name}` interpolation.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tools_dir: default_tools_dir(),
            venv_path: default_venv_path(),
            package_manager: PackageManager::default(),
            require_root: true,
            reconcile_command: None,
            reboot_command: None,
            vars: BTreeMap::new(),
        }
    }
}

fn default_tools_dir() -> String {
    "/opt/tools".to_string()
}

fn default_venv_path() -> String {
    "${tools_dir}/venv".to_string()
}

impl Settings {
    /// Build the variable set for interpolating step definitions.
    ///
    /// `tools_dir` is expanded first so that `venv_path` and user `vars`
    /// may refer to it. User `vars` may refer to each other in any order;
    /// they are resolved in passes until all are set, and a pass that
    /// makes no progress (a cycle or an undefined name) is an error.
    pub fn interpolation_context(&self) -> Result<InterpolationContext> {
        let mut ctx = InterpolationContext::new();
        ctx.set("package_manager", self.package_manager.to_string());
        let tools_dir = resolve_string(&self.tools_dir, &ctx)?;
        ctx.set("tools_dir", tools_dir);
        let venv_path = resolve_string(&self.venv_path, &ctx)?;
        ctx.set("venv_path", venv_path);
        let mut pending: Vec<(&String, &String)> = self.vars.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut last_err = None;
            pending.retain(|(name, value)| match resolve_string(value, &ctx) {
                Ok(resolved) => {
                    ctx.set((*name).clone(), resolved);
                    false
                }
                Err(e) => {
                    last_err = Some(e);
                    true
                }
            });
            if pending.len() == before {
                if let Some(e) = last_err {
                    return Err(e);
                }
                break;
            }
        }
        Ok(ctx)
    }

    /// Runtime context for actions, with paths already expanded.
    pub fn action_context(&self) -> Result<ActionContext> {
        let ctx = self.interpolation_context()?;
        Ok(ActionContext {
            package_manager: self.package_manager,
            venv_path: ctx.resolve("venv_path").unwrap_or_default().to_string(),
        })
    }
}

/// Supported system package managers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Apt,
    Dnf,
    Pacman,
    Brew,
}

impl PackageManager {
    /// Non-interactive install invocation for `packages`.
    pub fn install(&self, packages: &[String]) -> Invocation {
        let inv = match self {
            PackageManager::Apt => Invocation::new("apt-get")
                .args(["install", "-y"])
                .env("DEBIAN_FRONTEND", "noninteractive"),
            PackageManager::Dnf => Invocation::new("dnf").args(["install", "-y"]),
            PackageManager::Pacman => {
                Invocation::new("pacman").args(["-S", "--noconfirm", "--needed"])
            }
            PackageManager::Brew => Invocation::new("brew").arg("install"),
        };
        inv.args(packages.iter().cloned())
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
            PackageManager::Brew => "brew",
        };
        f.write_str(name)
    }
}

/// One step definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Unique, stable identifier.
    pub id: String,

    /// Menu key; assigned automatically when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<char>,

    /// Human-readable label.
    pub description: String,

    /// Probe deciding whether the step is already satisfied.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub check: Probe,

    /// What to do when the probe reports absent.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub action: Action,

    /// A successful run may leave services needing a restart.
    #[serde(default)]
    pub restart_sensitive: bool,
}

/// A named, ordered selection of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<String>,
}
