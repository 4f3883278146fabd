//! Configuration file discovery and loading

use super::editor_config::EditorConfig;
use crate::error::QeditError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// Config file names in priority order
pub const CONFIG_FILE_NAMES: [&str; 5] = [
    ".qeditrc.json",
    ".qeditrc.toml",
    "qedit.yaml",
    "qedit.yml",
    "qedit.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Searches each directory for the names in [`CONFIG_FILE_NAMES`], moving
    /// up the tree until a config is found or the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| QeditError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in &CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<EditorConfig> {
        EditorConfig::load(path).map_err(|e| {
            QeditError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from path or auto-discover
    ///
    /// An explicit path must exist. Without one, discovery starts at
    /// `start_dir` (or the current directory) and falls back to the defaults
    /// when nothing is found. Environment overrides are applied last.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<EditorConfig> {
        let config = match custom_path {
            Some(path) => {
                if !path.exists() {
                    return Err(QeditError::config_error(format!(
                        "Config file not found: {}. Run 'qedit config init' to create one.",
                        path.display()
                    )));
                }
                Self::load_from_file(path)?
            }
            None => {
                let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
                match Self::auto_discover(search_dir)? {
                    Some(found) => Self::load_from_file(&found)?,
                    None => {
                        tracing::debug!("No config file found, using defaults");
                        EditorConfig::default()
                    }
                }
            }
        };

        Ok(config.apply_env())
    }
}
