//! Configuration management

pub mod commands;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::search::highlight::DEFAULT_HIGHLIGHT_CLASS;
use crate::utils::default_actor;

const CONFIG_FILE_NAME: &str = "config.toml";
const DATABASE_FILE_NAME: &str = "archive.db";
const UPLOAD_DIR_NAME: &str = "uploads";
const APP_NAME: &str = "termarchive";
const CONFIG_DIR_ENV: &str = "TERMARCHIVE_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    /// Acting user recorded on created and updated entries
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Archive database file
    #[serde(default)]
    pub database: Option<String>,

    /// Directory uploads are staged in while they are imported
    #[serde(default)]
    pub upload_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Match queries against notes as well as source and target
    #[serde(default = "default_include_notes")]
    pub include_notes: bool,

    /// CSS class of the highlight marker in HTML output
    #[serde(default = "default_highlight_class")]
    pub highlight_class: String,
}

fn default_include_notes() -> bool {
    true
}

fn default_highlight_class() -> String {
    DEFAULT_HIGHLIGHT_CLASS.to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            include_notes: default_include_notes(),
            highlight_class: default_highlight_class(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir));
        }
        dirs::config_dir().map(|p| p.join(APP_NAME))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(CONFIG_FILE_NAME))
    }

    fn data_dir() -> Result<PathBuf> {
        Ok(dirs::data_dir()
            .context("Could not determine data directory")?
            .join(APP_NAME))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config path")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<PathBuf> {
        let dir = Self::config_dir().context("Could not determine config directory")?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content).context("Failed to write config file")?;

        Ok(path)
    }

    /// Database path: command line > config > data directory
    pub fn database_path(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        match &self.storage.database {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(Self::data_dir()?.join(DATABASE_FILE_NAME)),
        }
    }

    pub fn upload_dir(&self) -> Result<PathBuf> {
        match &self.storage.upload_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(Self::data_dir()?.join(UPLOAD_DIR_NAME)),
        }
    }

    /// Acting user: command line > config > login name
    pub fn actor(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| self.general.actor.clone())
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(default_actor)
    }
}
