//! The step catalog.
//!
//! A [`StepCatalog`] is an ordered, read-only registry of steps. It is
//! assembled once through a [`CatalogBuilder`] (or from a catalog file with
//! [`StepCatalog::from_config`]) and never changes afterwards.
//!
//! Registration order is the menu order: the operator picks steps by keys
//! handed out in that order, so [`StepCatalog::all`] must never reorder.
//!
//! # Example
//!
//! ```
//! use armory::action::Action;
//! use armory::catalog::CatalogBuilder;
//! use armory::probe::Probe;
//! use armory::steps::Step;
//!
//! let mut builder = CatalogBuilder::new();
//! for id in ["zsh", "nmap", "ffuf"] {
//!     builder
//!         .register(Step::new(
//!             id,
//!             id,
//!             Probe::BinaryOnPath(id.into()),
//!             Action::Shell { run: format!("install {}", id) },
//!         ))
//!         .unwrap();
//! }
//! let catalog = builder.build().unwrap();
//!
//! let ids: Vec<_> = catalog.all().iter().map(|s| s.id.as_str()).collect();
//! assert_eq!(ids, ["zsh", "nmap", "ffuf"]);
//! assert_eq!(catalog.by_key('b').unwrap().id, "nmap");
//! ```

use std::collections::HashMap;
use tracing::debug;

use crate::config::schema::ArmoryConfig;
use crate::error::{ArmoryError, Result};
use crate::steps::Step;

/// Keys handed out to steps without an explicit one, in order.
pub const MENU_KEYS: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Selection name that always means every step.
pub const ALL_GROUP: &str = "all";

/// A named, ordered selection of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<String>,
}

/// Collects steps and groups, rejecting duplicates as they arrive.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    steps: Vec<Step>,
    index: HashMap<String, usize>,
    keys: HashMap<char, usize>,
    groups: Vec<Group>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step at the end of the catalog.
    ///
    /// # Errors
    ///
    /// `DuplicateStep` if the id is taken, `DuplicateKey` if an explicit
    /// menu key is taken, `ConfigValidationError` for an empty id.
    pub fn register(&mut self, step: Step) -> Result<()> {
        if step.id.trim().is_empty() {
            return Err(ArmoryError::ConfigValidationError {
                message: "step id must not be empty".to_string(),
            });
        }
        if self.index.contains_key(&step.id) {
            return Err(ArmoryError::DuplicateStep { id: step.id });
        }
        if let Some(key) = step.key {
            if key.is_whitespace() {
                return Err(ArmoryError::ConfigValidationError {
                    message: format!("step '{}' has a blank menu key", step.id),
                });
            }
            if let Some(&other) = self.keys.get(&key) {
                return Err(ArmoryError::DuplicateKey {
                    key,
                    first: self.steps[other].id.clone(),
                    second: step.id,
                });
            }
            self.keys.insert(key, self.steps.len());
        }

        debug!("Registered step {}", step.id);
        self.index.insert(step.id.clone(), self.steps.len());
        self.steps.push(step);
        Ok(())
    }

    /// Add a named group. Members are checked in [`build`](Self::build).
    pub fn add_group(&mut self, group: Group) -> Result<()> {
        if group.name == ALL_GROUP {
            return Err(ArmoryError::ConfigValidationError {
                message: format!("group name '{}' is reserved", ALL_GROUP),
            });
        }
        if self.groups.iter().any(|g| g.name == group.name) {
            return Err(ArmoryError::ConfigValidationError {
                message: format!("duplicate group '{}'", group.name),
            });
        }
        self.groups.push(group);
        Ok(())
    }

    /// Freeze the catalog, handing out menu keys to steps without one.
    pub fn build(mut self) -> Result<StepCatalog> {
        for group in &self.groups {
            if let Some(missing) = group.steps.iter().find(|id| !self.index.contains_key(*id)) {
                return Err(ArmoryError::ConfigValidationError {
                    message: format!(
                        "group '{}' references unknown step '{}'",
                        group.name, missing
                    ),
                });
            }
        }

        let free: Vec<char> = MENU_KEYS
            .chars()
            .filter(|c| !self.keys.contains_key(c))
            .collect();
        let mut free = free.into_iter();
        for (pos, step) in self.steps.iter_mut().enumerate() {
            if step.key.is_none() {
                step.key = free.next();
                if let Some(key) = step.key {
                    self.keys.insert(key, pos);
                }
            }
        }

        Ok(StepCatalog {
            steps: self.steps,
            index: self.index,
            keys: self.keys,
            groups: self.groups,
        })
    }
}

/// Ordered, immutable step registry.
#[derive(Debug, Clone, Default)]
pub struct StepCatalog {
    steps: Vec<Step>,
    index: HashMap<String, usize>,
    keys: HashMap<char, usize>,
    groups: Vec<Group>,
}

impl StepCatalog {
    /// Build a catalog from a parsed catalog file.
    ///
    /// Every `${var}` in step fields is expanded from `settings`, and every
    /// probe and action is validated. Any problem is reported before a
    /// single step can run.
    pub fn from_config(config: &ArmoryConfig) -> Result<Self> {
        let vars = config.settings.interpolation_context()?;
        let mut builder = CatalogBuilder::new();

        for def in &config.steps {
            let in_step = |e: ArmoryError| match e {
                ArmoryError::ConfigValidationError { message } => {
                    ArmoryError::ConfigValidationError {
                        message: format!("step '{}': {}", def.id, message),
                    }
                }
                other => other,
            };

            let precondition = def.check.interpolate(&vars).map_err(in_step)?;
            precondition.validate().map_err(in_step)?;
            let action = def.action.interpolate(&vars).map_err(in_step)?;
            action.validate().map_err(in_step)?;
            let description =
                crate::config::resolve_string(&def.description, &vars).map_err(in_step)?;

            let mut step = Step::new(def.id.clone(), description, precondition, action)
                .restart_sensitive(def.restart_sensitive);
            step.key = def.key;
            builder.register(step)?;
        }

        for group in &config.groups {
            builder.add_group(Group {
                name: group.name.clone(),
                description: group.description.clone(),
                steps: group.steps.clone(),
            })?;
        }

        builder.build()
    }

    /// Look up a step by id.
    pub fn get(&self, id: &str) -> Result<&Step> {
        self.index
            .get(id)
            .map(|&i| &self.steps[i])
            .ok_or_else(|| ArmoryError::UnknownStep { id: id.to_string() })
    }

    /// Every step, in registration order.
    pub fn all(&self) -> &[Step] {
        &self.steps
    }

    /// Look up a step by menu key.
    pub fn by_key(&self, key: char) -> Option<&Step> {
        self.keys.get(&key).map(|&i| &self.steps[i])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Named groups, in definition order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Step ids of a group; `all` names the whole catalog.
    pub fn group_ids(&self, name: &str) -> Result<Vec<String>> {
        if name == ALL_GROUP {
            return Ok(self.ids());
        }
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.steps.clone())
            .ok_or_else(|| ArmoryError::ConfigValidationError {
                message: format!("unknown group '{}'", name),
            })
    }

    /// Every step id, in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.id.clone()).collect()
    }

    /// Turn operator input into step ids.
    ///
    /// Each token is taken as a step id, or failing that as a single-char
    /// menu key. Tokens matching neither are kept verbatim so that the batch
    /// reports them as unknown steps. Order is kept and repeats are dropped.
    pub fn resolve_selection<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            let id = if self.index.contains_key(token) {
                token.to_string()
            } else {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => self
                        .by_key(c)
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| token.to_string()),
                    _ => token.to_string(),
                }
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}
