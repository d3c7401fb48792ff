//! Command implementations.

pub mod completions;
pub mod status;
pub mod sync;
pub mod version;

use std::path::{Path, PathBuf};

use crate::config::{LoadedConfig, load_config, resolve_config_path};
use crate::error::Result;

/// Config plus the effective paths after command-line overrides.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: LoadedConfig,
    pub output_dir: PathBuf,
    pub offset_file: PathBuf,
}

impl Workspace {
    /// Load the config and apply `--offsets` / `--output-dir`.
    ///
    /// Overrides are taken as given (relative to the working directory);
    /// config file paths resolve against the config file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid.
    pub fn resolve(
        config: Option<&Path>,
        offsets: Option<&Path>,
        output_dir: Option<&Path>,
    ) -> Result<Self> {
        let config = load_config(&resolve_config_path(config))?;
        let output_dir = output_dir.map_or_else(|| config.output_dir(), Path::to_path_buf);
        let offset_file = offsets.map_or_else(|| config.offset_file(), Path::to_path_buf);

        Ok(Self {
            config,
            output_dir,
            offset_file,
        })
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.config.config.extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_win_over_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notion.json");
        fs::write(&path, r#"{"databases_id": ["db1"], "output_dir": "posts"}"#).unwrap();

        let ws = Workspace::resolve(Some(&path), None, None).unwrap();
        assert_eq!(ws.output_dir, temp_dir.path().join("posts"));
        assert_eq!(ws.offset_file, temp_dir.path().join("notion_offset.json"));

        let ws = Workspace::resolve(
            Some(&path),
            Some(Path::new("state/offsets.json")),
            Some(Path::new("out")),
        )
        .unwrap();
        assert_eq!(ws.output_dir, PathBuf::from("out"));
        assert_eq!(ws.offset_file, PathBuf::from("state/offsets.json"));
        assert_eq!(ws.extension(), "mdx");
    }
}
