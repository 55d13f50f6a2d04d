//! File-based configuration loading
//!
//! Loads settings from a JSON file

use super::settings::Settings;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name searched by [`Settings::load_default`]
pub const CONFIG_FILE_NAME: &str = "aitranslator.json";

impl Settings {
    /// Load configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| "Failed to parse config JSON")?;

        settings.validate()?;

        debug!("Using model {} at {}", settings.api.model, settings.api.base_url);
        Ok(settings)
    }

    /// Load configuration from default locations
    /// Searches in order:
    /// 1. ~/.config/aitranslator/aitranslator.json
    /// 2. ./aitranslator.json
    ///
    /// Returns error if no configuration file is found.
    pub fn load_default() -> Result<Self> {
        match default_config_paths().into_iter().find(|path| path.exists()) {
            Some(path) => Self::load(&path),
            None => anyhow::bail!(
                "Configuration file not found. Please create one at:\n\
                 - ~/.config/aitranslator/{name} (recommended)\n\
                 - ./{name} (current directory)",
                name = CONFIG_FILE_NAME
            ),
        }
    }
}

/// Candidate configuration paths, most specific first
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("aitranslator").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}
