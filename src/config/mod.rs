//! Configuration management.
//!
//! The config file (`notion.json`) names the databases to pull and, optionally,
//! where documents and offsets live. Credentials come from the environment
//! (`NOTION_TOKEN`, optionally via a `.env` file), never from the config file.
//!
//! Relative paths in the config file resolve against the file's directory,
//! so the tool behaves the same from any working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::sync::{DEFAULT_OFFSET_FILE, PropertyNames};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "notion.json";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "NOTIONSYNC_CONFIG";

/// Environment variable holding the integration token.
pub const TOKEN_ENV: &str = "NOTION_TOKEN";

/// Largest page size the query API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Contents of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Database ids, synced in this order.
    pub databases_id: Vec<String>,
    /// Where documents are written.
    pub output_dir: PathBuf,
    /// Document file extension, without the dot.
    pub extension: String,
    /// Offset store file.
    pub offset_file: PathBuf,
    /// Records per query page (`None` = API default).
    pub page_size: Option<u32>,
    /// Designated property names.
    pub properties: PropertyNames,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            databases_id: Vec::new(),
            output_dir: PathBuf::from("data").join("blog"),
            extension: "mdx".to_string(),
            offset_file: PathBuf::from(DEFAULT_OFFSET_FILE),
            page_size: None,
            properties: PropertyNames::default(),
        }
    }
}

impl SyncConfig {
    /// Check values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if let Some(pos) = self.databases_id.iter().position(|id| id.trim().is_empty()) {
            return Err(Error::Config(format!("databases_id[{pos}] is empty")));
        }
        if let Some(size) = self.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(Error::Config(format!(
                    "page_size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
                )));
            }
        }
        if self.extension.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "extension must not contain path separators: {:?}",
                self.extension
            )));
        }
        Ok(())
    }
}

/// A config file together with where it was read from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path the config was looked up at.
    pub path: PathBuf,
    /// Whether the file existed.
    pub found: bool,
    pub config: SyncConfig,
}

impl LoadedConfig {
    fn base_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    /// Output directory, resolved against the config file's directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.config.output_dir)
    }

    /// Offset file, resolved against the config file's directory.
    #[must_use]
    pub fn offset_file(&self) -> PathBuf {
        self.resolve(&self.config.offset_file)
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `explicit_path` (the `--config` flag, which also reads `NOTIONSYNC_CONFIG`)
/// 2. `notion.json` in the working directory
#[must_use]
pub fn resolve_config_path(explicit_path: Option<&Path>) -> PathBuf {
    explicit_path.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf)
}

/// Load and validate the config file.
///
/// A missing file is not an error: defaults are used (with no databases) and
/// a warning is logged.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read, parsed, or validated.
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Configuration file not found, using defaults");
        return Ok(LoadedConfig {
            path: path.to_path_buf(),
            found: false,
            config: SyncConfig::default(),
        });
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

    let config: SyncConfig = serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;
    config.validate()?;

    debug!(
        path = %path.display(),
        databases = config.databases_id.len(),
        "Loaded configuration"
    );

    Ok(LoadedConfig {
        path: path.to_path_buf(),
        found: true,
        config,
    })
}

/// Load `.env` from the working directory, if present.
///
/// Existing environment variables win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
    }
}

/// Resolve the integration token.
///
/// `explicit` comes from `--token`, which clap also fills from `NOTION_TOKEN`.
///
/// # Errors
///
/// Returns [`Error::MissingToken`] if no non-empty token is available.
pub fn resolve_token(explicit: Option<&str>) -> Result<String> {
    explicit
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(Error::MissingToken)
}
