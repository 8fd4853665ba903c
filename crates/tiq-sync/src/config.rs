//! Engine configuration.
//!
//! Loaded from `tiq/config.toml` under the platform config directory, or
//! built programmatically by embedders that already know the
//! authenticated identity.
//!
//! ```toml
//! user_email = "oncall@example.com"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),
}

/// Sync engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Identity of the authenticated user, stamped onto created tickets.
    /// `None` for anonymous sessions.
    pub user_email: Option<String>,
}

impl SyncConfig {
    /// Config for a known authenticated identity.
    pub fn for_user(user_email: impl Into<String>) -> Self {
        Self {
            user_email: Some(user_email.into()),
        }
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from the standard location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_standard() -> Self {
        let Some(path) = dirs::config_dir().map(|d| d.join("tiq").join("config.toml")) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(%e, "failed to load config, using defaults");
            Self::default()
        })
    }
}
