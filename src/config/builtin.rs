//! Built-in catalog embedded at compile time.

use crate::config::loader::parse_config;
use crate::config::schema::ArmoryConfig;
use crate::error::{ArmoryError, Result};
use include_dir::{include_dir, Dir};
use std::path::Path;

/// Embedded catalogs directory.
static CATALOGS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/catalogs");

/// Catalog used when no file is found on disk.
pub const DEFAULT_CATALOG: &str = "default.yml";

/// Load the default built-in catalog.
pub fn load() -> Result<ArmoryConfig> {
    load_named(DEFAULT_CATALOG)
}

/// Load an embedded catalog by file name.
pub fn load_named(name: &str) -> Result<ArmoryConfig> {
    let display = Path::new("catalogs").join(name);
    let file = CATALOGS_DIR
        .get_file(name)
        .ok_or_else(|| ArmoryError::ConfigNotFound {
            path: display.clone(),
        })?;

    let content = file
        .contents_utf8()
        .ok_or_else(|| ArmoryError::ConfigParseError {
            path: display.clone(),
            message: "Invalid UTF-8".to_string(),
        })?;

    parse_config(content, &display)
}
