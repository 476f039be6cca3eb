//! Catalog discovery and loading.

use crate::config::builtin;
use crate::config::schema::ArmoryConfig;
use crate::error::{ArmoryError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a catalog file.
pub const CONFIG_ENV: &str = "ARMORY_CONFIG";

/// File name looked up in the working directory.
pub const LOCAL_CATALOG: &str = "armory.yml";

/// System-wide catalog location.
pub const SYSTEM_CATALOG: &str = "/etc/armory/catalog.yml";

/// Where a catalog came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A catalog file on disk.
    File(PathBuf),
    /// The catalog compiled into the binary.
    Builtin,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Builtin => f.write_str("built-in catalog"),
        }
    }
}

/// Candidate catalog locations, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct CatalogPaths {
    /// `--config` flag
    pub explicit: Option<PathBuf>,
    /// `$ARMORY_CONFIG`
    pub from_env: Option<PathBuf>,
    /// `./armory.yml`
    pub local: PathBuf,
    /// `~/.config/armory/catalog.yml`
    pub user: Option<PathBuf>,
    /// `/etc/armory/catalog.yml`
    pub system: PathBuf,
}

impl CatalogPaths {
    /// Collect candidate locations for a process running in `cwd`.
    pub fn discover(cwd: &Path, explicit: Option<&Path>) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            from_env: std::env::var_os(CONFIG_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            local: cwd.join(LOCAL_CATALOG),
            user: dirs::home_dir().map(|h| h.join(".config").join("armory").join("catalog.yml")),
            system: PathBuf::from(SYSTEM_CATALOG),
        }
    }

    /// Pick the catalog to load. First hit wins; files are never merged.
    ///
    /// An explicitly named file (flag or environment) must exist.
    pub fn resolve(&self) -> Result<CatalogSource> {
        if let Some(path) = self.explicit.as_ref().or(self.from_env.as_ref()) {
            if !path.is_file() {
                return Err(ArmoryError::ConfigNotFound { path: path.clone() });
            }
            return Ok(CatalogSource::File(path.clone()));
        }

        let candidates = std::iter::once(&self.local)
            .chain(self.user.as_ref())
            .chain(std::iter::once(&self.system));
        for path in candidates {
            if path.is_file() {
                return Ok(CatalogSource::File(path.clone()));
            }
        }
        Ok(CatalogSource::Builtin)
    }
}

/// Load and parse a catalog file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<ArmoryConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ArmoryError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ArmoryError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML catalog content. `source_path` is used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ArmoryConfig> {
    if content.trim().is_empty() {
        return Ok(ArmoryConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ArmoryError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the catalog from `source`.
pub fn load_from(source: &CatalogSource) -> Result<ArmoryConfig> {
    match source {
        CatalogSource::File(path) => load_config_file(path),
        CatalogSource::Builtin => builtin::load(),
    }
}

/// Discover and load the catalog for a process running in `cwd`.
pub fn load_config(cwd: &Path, explicit: Option<&Path>) -> Result<(ArmoryConfig, CatalogSource)> {
    let source = CatalogPaths::discover(cwd, explicit).resolve()?;
    tracing::debug!("Loading catalog from {}", source);
    let config = load_from(&source)?;
    Ok((config, source))
}
