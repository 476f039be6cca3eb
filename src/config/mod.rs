//! Catalog definition loading.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - The embedded fallback catalog in [`builtin`]
//! - `${variable}` expansion in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use armory::config::load_config;
//! use std::fs;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("catalog.yml");
//! fs::write(&path, "settings:\n  tools_dir: /srv/tools\n").unwrap();
//!
//! let (config, _source) = load_config(temp.path(), Some(&path)).unwrap();
//! assert_eq!(config.settings.tools_dir, "/srv/tools");
//! ```
//!
//! # Catalog locations
//!
//! The first existing file wins; catalogs are never merged.
//! 1. `--config <path>`
//! 2. `$ARMORY_CONFIG`
//! 3. `./armory.yml`
//! 4. `~/.config/armory/catalog.yml`
//! 5. `/etc/armory/catalog.yml`
//! 6. The built-in catalog

pub mod builtin;
pub mod interpolation;
pub mod loader;
pub mod schema;

pub use interpolation::{resolve_string, InterpolationContext};
pub use loader::{load_config, load_config_file, parse_config, CatalogPaths, CatalogSource};
pub use schema::{ArmoryConfig, GroupConfig, PackageManager, Settings, StepConfig};
