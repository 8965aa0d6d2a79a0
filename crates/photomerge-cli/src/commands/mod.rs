// photomerge - merge photo sidecar metadata into media files
// Copyright (C) 2026  photomerge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Command implementations and the context they share.

pub mod check;
pub mod merge;
pub mod settings;

pub use check::CheckCmd;
pub use merge::MergeCmd;
pub use settings::SettingsCmd;

use anyhow::{Context, Result};
use photomerge_config::{ConfigLoader, SettingsStore};
use photomerge_observability::{LogConfig, LogFormat};
use std::path::PathBuf;

/// Global flags every command sees
#[derive(Debug, Clone, Default)]
pub struct CliContext {
    /// Explicit settings file (`--config`)
    pub config: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

impl CliContext {
    /// The settings store selected by `--config`, or the per-user default
    pub fn store(&self) -> Result<SettingsStore> {
        match &self.config {
            Some(path) => Ok(SettingsStore::new(path)),
            None => SettingsStore::default_location()
                .context("Cannot locate the user configuration directory"),
        }
    }

    /// Logging setup for this invocation, or `None` when `-q` silences it
    ///
    /// `-v` forces debug. Otherwise `RUST_LOG` wins over the settings file,
    /// which is only read here if it already exists.
    pub async fn log_config(&self) -> Option<LogConfig> {
        if self.quiet {
            return None;
        }

        let base = LogConfig::new().with_color(console::colors_enabled_stderr());
        if self.verbose {
            return Some(base.with_level("debug"));
        }

        let stored = match self.store() {
            Ok(store) if store.path().exists() => {
                let loader = ConfigLoader::without_validation();
                match loader.load_file(store.path()).await {
                    Ok(mut config) => loader.apply_env_overrides(&mut config).ok().map(|_| config),
                    Err(_) => None,
                }
            }
            _ => None,
        };

        let Some(config) = stored else {
            return Some(base);
        };

        let format = config
            .observability
            .log_format
            .parse::<LogFormat>()
            .unwrap_or_default();
        let base = base.with_format(format);
        if std::env::var_os("RUST_LOG").is_some() {
            Some(base)
        } else {
            Some(base.with_level(config.observability.log_level))
        }
    }
}
