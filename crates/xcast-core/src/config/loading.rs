//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.xcast/config.toml` (global user preferences)
//! 3. **Project config** - `./.xcast/config.toml` (directory-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! Files are merged as TOML tables before deserializing, so a key that a
//! later file does not mention keeps the value from an earlier file.

use crate::config::types::XcastConfig;
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Table;
use tracing::{debug, info};

const CONFIG_DIR: &str = ".xcast";
const CONFIG_FILE: &str = "config.toml";

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed,
/// or if validation of the merged config fails. Missing files are not errors.
pub fn load_hierarchy() -> Result<XcastConfig, ConfigError> {
    let mut paths = Vec::new();
    match dirs::home_dir() {
        Some(home) => paths.push(home.join(CONFIG_DIR).join(CONFIG_FILE)),
        None => debug!(event = "core.config.home_dir_missing"),
    }
    paths.push(std::env::current_dir()?.join(CONFIG_DIR).join(CONFIG_FILE));

    load_from_paths(&paths)
}

/// Load and merge the given config files in order, then validate.
pub fn load_from_paths(paths: &[PathBuf]) -> Result<XcastConfig, ConfigError> {
    let mut merged = Table::new();

    for path in paths {
        match load_table(path)? {
            Some(table) => {
                info!(event = "core.config.file_loaded", path = %path.display());
                merge_tables(&mut merged, table);
            }
            None => debug!(event = "core.config.file_missing", path = %path.display()),
        }
    }

    let config = parse_config(merged, "<merged>")?;
    validate_config(&config)?;
    Ok(config)
}

/// Read a single config file as a TOML table. `Ok(None)` if it does not exist.
fn load_table(path: &Path) -> Result<Option<Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    content
        .parse::<Table>()
        .map(Some)
        .map_err(|e| ConfigError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

fn parse_config(table: Table, origin: &str) -> Result<XcastConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ConfigParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })
}

/// Merge `overlay` into `base`, recursing into nested tables.
///
/// Scalars and arrays in `overlay` replace those in `base`.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
