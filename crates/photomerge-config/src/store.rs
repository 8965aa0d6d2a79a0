// photomerge - merge photo sidecar metadata into media files
// Copyright (C) 2026  photomerge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Settings persistence.
//!
//! [`SettingsStore`] is the only component that reads or writes the settings
//! file. Everything else receives a [`Config`] value (or a borrowed
//! [`MergeSettings`](crate::MergeSettings) snapshot) from it.

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{ConfigFormat, ConfigLoader};
use crate::schema::Config;
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the user configuration directory
pub const APP_DIR_NAME: &str = "photomerge";

/// Default settings file name
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Owner of the persisted settings document
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by an explicit file; the format follows its extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<user config dir>/photomerge/config.yaml`
    pub fn default_location() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME)))
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Effective settings: the stored document plus `PHOTOMERGE_*` overrides
    pub async fn load_or_init(&self) -> ConfigResult<Config> {
        let mut config = self.load_persisted().await?;
        ConfigLoader::new().apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// The stored document alone, writing defaults first when the file is missing or empty
    pub async fn load_persisted(&self) -> ConfigResult<Config> {
        let needs_defaults = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if needs_defaults {
            info!("Writing default settings to {}", self.path.display());
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }

        let config = ConfigLoader::new().load_file(&self.path).await?;
        debug!("Settings loaded from {}", self.path.display());
        Ok(config)
    }

    /// Persist a committed change
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate()?;
        let format = ConfigFormat::from_path(&self.path)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let text = format.render(config)?;
        std::fs::write(&self.path, text)?;
        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }

    /// Load, apply `change`, validate and save; returns the stored result
    pub async fn update<F>(&self, change: F) -> ConfigResult<Config>
    where
        F: FnOnce(&mut Config) -> ConfigResult<()>,
    {
        let mut config = self.load_persisted().await?;
        change(&mut config)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Replace the stored settings with defaults
    pub fn reset(&self) -> ConfigResult<Config> {
        let config = Config::default();
        self.save(&config)?;
        Ok(config)
    }
}
