//! Provisioning actions.
//!
//! An [`Action`] is the side-effecting half of a step. Every variant except
//! [`Action::FilePatch`] turns into an [`Invocation`] (program + args) that
//! an [`ActionInvoker`] runs; file patches are applied in-process.
//!
//! Actions are idempotent in intent only. Whether an action needs to run at
//! all is decided by the step's probe, not by the action.

pub mod patch;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::interpolation::{resolve_string, InterpolationContext};
use crate::config::PackageManager;
use crate::error::{ArmoryError, Result};

/// A provisioning action, selected by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Install OS packages with the system package manager.
    Package {
        packages: Vec<String>,
        /// Overrides `settings.package_manager` for this step.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        manager: Option<PackageManager>,
    },

    /// Install Python packages into the shared virtualenv.
    PythonPackage { packages: Vec<String> },

    /// Append `line` to the file at `path` unless an identical line exists.
    FilePatch { path: String, line: String },

    /// Shallow-clone a git repository.
    CloneRepo {
        url: String,
        dest: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },

    /// Start a detached container.
    Container {
        image: String,
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
    },

    /// Run a shell snippet with `sh -c`.
    Shell { run: String },
}

/// Settings an action needs at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    /// Default package manager for [`Action::Package`].
    pub package_manager: PackageManager,
    /// Virtualenv used by [`Action::PythonPackage`].
    pub venv_path: String,
}

impl Default for ActionContext {
    fn default() -> Self {
        Self {
            package_manager: PackageManager::Apt,
            venv_path: "/opt/tools/venv".to_string(),
        }
    }
}

/// A program invocation produced by an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables for the child process.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// What an invoker observed when running an [`Invocation`].
#[derive(Debug, Clone, Default)]
pub struct InvocationOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Terminating signal, if any.
    pub signal: Option<i32>,
    /// Combined stdout and stderr.
    pub output: String,
    pub duration: Duration,
}

impl InvocationOutput {
    /// An output that exited with `code`.
    pub fn exited(code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs invocations on behalf of actions.
///
/// A non-zero exit is a normal result, never an `Err`. Implementations
/// return `Err` only for [`ArmoryError::FatalEnvironment`] conditions.
pub trait ActionInvoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<InvocationOutput>;
}

impl Action {
    /// Short label for the action kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Package { .. } => "package",
            Action::PythonPackage { .. } => "python_package",
            Action::FilePatch { .. } => "file_patch",
            Action::CloneRepo { .. } => "clone_repo",
            Action::Container { .. } => "container",
            Action::Shell { .. } => "shell",
        }
    }

    /// Expand `${var}` references in every string field.
    pub fn interpolate(&self, ctx: &InterpolationContext) -> Result<Action> {
        let all = |items: &[String]| -> Result<Vec<String>> {
            items.iter().map(|s| resolve_string(s, ctx)).collect()
        };
        Ok(match self {
            Action::Package { packages, manager } => Action::Package {
                packages: all(packages)?,
                manager: *manager,
            },
            Action::PythonPackage { packages } => Action::PythonPackage {
                packages: all(packages)?,
            },
            Action::FilePatch { path, line } => Action::FilePatch {
                path: resolve_string(path, ctx)?,
                line: resolve_string(line, ctx)?,
            },
            Action::CloneRepo { url, dest, branch } => Action::CloneRepo {
                url: resolve_string(url, ctx)?,
                dest: resolve_string(dest, ctx)?,
                branch: branch
                    .as_deref()
                    .map(|b| resolve_string(b, ctx))
                    .transpose()?,
            },
            Action::Container { image, name, args } => Action::Container {
                image: resolve_string(image, ctx)?,
                name: resolve_string(name, ctx)?,
                args: all(args)?,
            },
            Action::Shell { run } => Action::Shell {
                run: resolve_string(run, ctx)?,
            },
        })
    }

    /// Reject actions that could never do anything useful.
    pub fn validate(&self) -> Result<()> {
        let empty = |what: &str| ArmoryError::ConfigValidationError {
            message: format!("{} action has an empty {}", self.kind(), what),
        };
        match self {
            Action::Package { packages, .. } | Action::PythonPackage { packages } => {
                if packages.iter().all(|p| p.trim().is_empty()) {
                    return Err(empty("package list"));
                }
            }
            Action::FilePatch { path, line } => {
                if path.trim().is_empty() {
                    return Err(empty("path"));
                }
                if line.contains('\n') {
                    return Err(ArmoryError::ConfigValidationError {
                        message: "file_patch line must be a single line".to_string(),
                    });
                }
            }
            Action::CloneRepo { url, dest, .. } => {
                if url.trim().is_empty() {
                    return Err(empty("url"));
                }
                if dest.trim().is_empty() {
                    return Err(empty("destination"));
                }
            }
            Action::Container { image, name, .. } => {
                if image.trim().is_empty() {
                    return Err(empty("image"));
                }
                if name.trim().is_empty() {
                    return Err(empty("name"));
                }
            }
            Action::Shell { run } => {
                if run.trim().is_empty() {
                    return Err(empty("command"));
                }
            }
        }
        Ok(())
    }

    /// The invocation this action runs, or `None` for in-process actions.
    pub fn invocation(&self, ctx: &ActionContext) -> Option<Invocation> {
        match self {
            Action::Package { packages, manager } => {
                Some(manager.unwrap_or(ctx.package_manager).install(packages))
            }
            Action::PythonPackage { packages } => Some(
                Invocation::new(format!("{}/bin/pip", ctx.venv_path.trim_end_matches('/')))
                    .args(["install", "--upgrade"])
                    .args(packages.iter().cloned()),
            ),
            Action::FilePatch { .. } => None,
            Action::CloneRepo { url, dest, branch } => {
                let mut inv = Invocation::new("git").args(["clone", "--depth", "1"]);
                if let Some(branch) = branch {
                    inv = inv.arg("--branch").arg(branch.clone());
                }
                Some(inv.arg(url.clone()).arg(dest.clone()))
            }
            Action::Container { image, name, args } => Some(
                Invocation::new("docker")
                    .args(["run", "-d", "--name"])
                    .arg(name.clone())
                    .args(args.iter().cloned())
                    .arg(image.clone()),
            ),
            Action::Shell { run } => Some(Invocation::new("sh").arg("-c").arg(run.clone())),
        }
    }

    /// Human-readable rendering of what the action will do.
    pub fn describe(&self, ctx: &ActionContext) -> String {
        match self {
            Action::FilePatch { path, line } => format!("append '{}' to {}", line, path),
            other => other
                .invocation(ctx)
                .map(|inv| inv.to_string())
                .unwrap_or_else(|| other.kind().to_string()),
        }
    }

    /// Perform the action.
    ///
    /// Returns the terminal status; a non-zero `exit_code` is a failed
    /// action, not an `Err`.
    pub fn execute(
        &self,
        ctx: &ActionContext,
        invoker: &mut dyn ActionInvoker,
    ) -> Result<InvocationOutput> {
        match self {
            Action::FilePatch { path, line } => Ok(patch::append_line(path, line)),
            other => match other.invocation(ctx) {
                Some(invocation) => invoker.invoke(&invocation),
                None => Ok(InvocationOutput::exited(0, "")),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording invoker shared by tests across the crate.

    use super::*;
    use std::collections::VecDeque;

    /// Records every invocation and replies from a queue (default: exit 0).
    #[derive(Debug, Default)]
    pub struct RecordingInvoker {
        pub calls: Vec<Invocation>,
        pub replies: VecDeque<Result<InvocationOutput>>,
    }

    impl RecordingInvoker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(&mut self, reply: Result<InvocationOutput>) -> &mut Self {
            self.replies.push_back(reply);
            self
        }

        pub fn reply_exit(&mut self, code: i32, output: &str) -> &mut Self {
            self.reply(Ok(InvocationOutput::exited(code, output)))
        }
    }

    impl ActionInvoker for RecordingInvoker {
        fn invoke(&mut self, invocation: &Invocation) -> Result<InvocationOutput> {
            self.calls.push(invocation.clone());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Ok(InvocationOutput::exited(0, "")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingInvoker;
    use super::*;

    fn ctx() -> ActionContext {
        ActionContext {
            package_manager: PackageManager::Apt,
            venv_path: "/opt/tools/venv/".to_string(),
        }
    }

    #[test]
    fn parses_tagged_yaml_forms() {
        let yaml = r#"
- package:
    packages: [nmap, masscan]
- python_package:
    packages: [impacket]
- file_patch:
    path: /root/.zshrc
    line: export PATH=$PATH:/root/go/bin
- clone_repo:
    url: https://github.com/danielmiessler/SecLists.git
    dest: /usr/share/seclists
- container:
    image: specterops/bloodhound
    name: bloodhound
    args: ["-p", "8080:8080"]
- shell:
    run: go install github.com/ffuf/ffuf/v2@latest
"#;
        let actions: Vec<Action> = serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(yaml),
        )
        .unwrap();
        let kinds: Vec<_> = actions.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "package",
                "python_package",
                "file_patch",
                "clone_repo",
                "container",
                "shell"
            ]
        );
    }

    #[test]
    fn package_uses_context_manager_unless_overridden() {
        let apt = Action::Package {
            packages: vec!["nmap".into()],
            manager: None,
        };
        let inv = apt.invocation(&ctx()).unwrap();
        assert_eq!(inv.program, "apt-get");
        assert!(inv.args.contains(&"nmap".to_string()));

        let pacman = Action::Package {
            packages: vec!["nmap".into()],
            manager: Some(PackageManager::Pacman),
        };
        assert_eq!(pacman.invocation(&ctx()).unwrap().program, "pacman");
    }

    #[test]
    fn python_package_uses_venv_pip() {
        let action = Action::PythonPackage {
            packages: vec!["impacket".into()],
        };
        let inv = action.invocation(&ctx()).unwrap();
        assert_eq!(inv.program, "/opt/tools/venv/bin/pip");
        assert_eq!(inv.args, vec!["install", "--upgrade", "impacket"]);
    }

    #[test]
    fn clone_repo_passes_branch_before_url() {
        let action = Action::CloneRepo {
            url: "https://example.com/r.git".into(),
            dest: "/opt/tools/r".into(),
            branch: Some("dev".into()),
        };
        let inv = action.invocation(&ctx()).unwrap();
        assert_eq!(
            inv.args,
            vec![
                "clone",
                "--depth",
                "1",
                "--branch",
                "dev",
                "https://example.com/r.git",
                "/opt/tools/r"
            ]
        );
    }

    #[test]
    fn container_places_image_last() {
        let action = Action::Container {
            image: "neo4j:4.4".into(),
            name: "neo4j".into(),
            args: vec!["-p".into(), "7474:7474".into()],
        };
        let inv = action.invocation(&ctx()).unwrap();
        assert_eq!(inv.program, "docker");
        assert_eq!(inv.args.last().map(String::as_str), Some("neo4j:4.4"));
    }

    #[test]
    fn file_patch_never_reaches_invoker() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("rc");
        let action = Action::FilePatch {
            path: path.to_string_lossy().to_string(),
            line: "alias ll='ls -la'".into(),
        };
        let mut invoker = RecordingInvoker::new();

        let out = action.execute(&ctx(), &mut invoker).unwrap();

        assert!(out.success());
        assert!(invoker.calls.is_empty());
    }

    #[test]
    fn execute_returns_invoker_status() {
        let action = Action::Shell {
            run: "false".into(),
        };
        let mut invoker = RecordingInvoker::new();
        invoker.reply_exit(1, "boom");

        let out = action.execute(&ctx(), &mut invoker).unwrap();

        assert_eq!(out.exit_code, Some(1));
        assert_eq!(invoker.calls.len(), 1);
        assert_eq!(invoker.calls[0].args, vec!["-c", "false"]);
    }

    #[test]
    fn interpolate_expands_fields() {
        let mut vars = InterpolationContext::new();
        vars.set("tools_dir", "/opt/tools");
        let action = Action::CloneRepo {
            url: "https://github.com/x/y.git".into(),
            dest: "${tools_dir}/y".into(),
            branch: None,
        };
        match action.interpolate(&vars).unwrap() {
            Action::CloneRepo { dest, .. } => assert_eq!(dest, "/opt/tools/y"),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_empty_fields() {
        assert!(Action::Shell { run: " ".into() }.validate().is_err());
        assert!(Action::Package {
            packages: vec![],
            manager: None
        }
        .validate()
        .is_err());
        assert!(Action::FilePatch {
            path: "/x".into(),
            line: "a\nb".into()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn invocation_display_quotes_whitespace() {
        let inv = Invocation::new("sh").arg("-c").arg("echo hi");
        assert_eq!(inv.to_string(), "sh -c 'echo hi'");
    }
}
