//! Connection settings
//!
//! Resolution order, later wins: `~/.issuesum/config.json`, then the
//! `ISSUESUM_*` environment variables, then explicit overrides (CLI flags).

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{IssueSumError, Result};

pub const ENV_BASE_URL: &str = "ISSUESUM_BASE_URL";
pub const ENV_EMAIL: &str = "ISSUESUM_EMAIL";
pub const ENV_API_TOKEN: &str = "ISSUESUM_API_TOKEN";

/// Partially-filled settings from one source
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsLayer {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
}

impl SettingsLayer {
    /// Overlay `other` on top of `self`; set values in `other` win
    pub fn merge(self, other: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            base_url: other.base_url.or(self.base_url),
            email: other.email.or(self.email),
            api_token: other.api_token.or(self.api_token),
        }
    }

    /// Read the config file. A missing file is an empty layer.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            IssueSumError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            base_url: var(ENV_BASE_URL),
            email: var(ENV_EMAIL),
            api_token: var(ENV_API_TOKEN),
        }
    }
}

/// Complete connection settings for a Jira Cloud site
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Site root, e.g. `https://example.atlassian.net`, without trailing slash
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl Settings {
    /// Resolve from the default config file, the environment and `overrides`
    pub fn load(overrides: SettingsLayer) -> Result<Self> {
        let file_layer = match Self::default_config_path() {
            Ok(path) => SettingsLayer::from_file(&path)?,
            Err(_) => SettingsLayer::default(),
        };
        Self::resolve(file_layer.merge(SettingsLayer::from_env()).merge(overrides))
    }

    /// Turn a merged layer into settings, failing on missing values
    pub fn resolve(layer: SettingsLayer) -> Result<Self> {
        let required = |value: Option<String>, what: &str, env: &str| {
            value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                IssueSumError::Config(format!("missing {} (set {} or --{})", what, env, what))
            })
        };
        let base_url = required(layer.base_url, "base-url", ENV_BASE_URL)?;
        let email = required(layer.email, "email", ENV_EMAIL)?;
        let api_token = required(layer.api_token, "api-token", ENV_API_TOKEN)?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(IssueSumError::Config(format!(
                "base-url must start with http:// or https://: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_token,
        })
    }

    /// Get the default config path (~/.issuesum/config.json)
    pub fn default_config_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| IssueSumError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".issuesum").join("config.json"))
    }
}
