//! Configuration loader with layered locations
//!
//! Loads configuration from:
//! 1. Default values
//! 2. User-level config: ~/.waypoint/waypoint.toml
//! 3. Project-level config: ./.waypoint/waypoint.toml
//! 4. An explicit `--config` file
//!
//! Later layers override earlier ones key by key, so a project file that only
//! sets `[model] provider` keeps every other model setting from the layers
//! below it.

use super::schema::WaypointConfig;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const CONFIG_DIR: &str = ".waypoint";
const CONFIG_FILE: &str = "waypoint.toml";

/// Configuration loader that merges every available layer
pub struct ConfigLoader {
    user_config_path: Option<PathBuf>,
    project_config_path: PathBuf,
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader for the standard user and project locations
    pub fn new() -> Self {
        Self {
            user_config_path: dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE)),
            project_config_path: PathBuf::from(CONFIG_DIR).join(CONFIG_FILE),
            explicit_path: None,
        }
    }

    /// Loader with every location given explicitly
    pub fn with_paths(user: Option<PathBuf>, project: PathBuf) -> Self {
        Self {
            user_config_path: user,
            project_config_path: project,
            explicit_path: None,
        }
    }

    /// Add a file on top of the standard layers; unlike them it must exist
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// Load and merge every layer
    pub async fn load(&self) -> Result<WaypointConfig> {
        let defaults = toml::Value::try_from(WaypointConfig::default())
            .context("Failed to encode default configuration")?;
        let toml::Value::Table(mut merged) = defaults else {
            bail!("Default configuration is not a table");
        };

        if let Some(user) = &self.user_config_path {
            if let Some(layer) = Self::read_optional(user).await? {
                debug!(path = %user.display(), "Loaded user-level config");
                merge_tables(&mut merged, layer);
            }
        }

        if let Some(layer) = Self::read_optional(&self.project_config_path).await? {
            debug!(path = %self.project_config_path.display(), "Loaded project-level config");
            merge_tables(&mut merged, layer);
        }

        if let Some(explicit) = &self.explicit_path {
            if !explicit.exists() {
                bail!("Config file not found: {}", explicit.display());
            }
            let layer = Self::read(explicit).await?;
            debug!(path = %explicit.display(), "Loaded explicit config");
            merge_tables(&mut merged, layer);
        }

        toml::Value::Table(merged)
            .try_into()
            .context("Invalid configuration")
    }

    async fn read_optional(path: &Path) -> Result<Option<toml::Table>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::read(path).await.map(Some)
    }

    async fn read(path: &Path) -> Result<toml::Table> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        content
            .parse::<toml::Table>()
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge `overlay` into `base`; nested tables merge, everything else replaces
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
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
