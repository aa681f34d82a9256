//! Configuration Management
//!
//! Handles persistent configuration storage for labdesk.

use crate::labstep::auth;
use crate::query::DEFAULT_WORKSPACE;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Labstep account email
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Label for the API key, informational only
    #[serde(default)]
    pub api_name: Option<String>,
    /// Last used workspace
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Directory holding the config file and the log
    fn app_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("labdesk"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::app_dir().map(|p| p.join("config.json"))
    }

    /// Log file path, next to the config file when a config dir exists
    pub fn log_path() -> PathBuf {
        Self::app_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".labdesk")))
            .unwrap_or_default()
            .join("labdesk.log")
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file; missing or corrupt files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective email (config > environment)
    pub fn effective_email(&self) -> Option<String> {
        self.email.clone().or_else(auth::get_default_email)
    }

    /// Get effective API key (config > environment)
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(auth::get_default_api_key)
    }

    pub fn effective_api_name(&self) -> String {
        self.api_name
            .clone()
            .or_else(auth::get_default_api_name)
            .unwrap_or_else(|| "labdesk".to_string())
    }

    /// Get effective workspace (config > built-in default)
    pub fn effective_workspace(&self) -> String {
        self.workspace
            .clone()
            .unwrap_or_else(|| DEFAULT_WORKSPACE.to_string())
    }

    /// Get effective API root (config > environment > public API)
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .clone()
            .or_else(auth::get_default_api_url)
            .unwrap_or_else(|| auth::DEFAULT_API_URL.to_string())
    }

    /// Set workspace and save
    pub fn set_workspace(&mut self, workspace: &str) -> Result<()> {
        self.workspace = Some(workspace.to_string());
        self.save()
    }
}
