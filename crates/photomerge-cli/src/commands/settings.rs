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

//! `photomerge settings`: view and edit the settings file.

use super::CliContext;
use crate::output;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use photomerge_config::{Config, SETTING_KEYS};

/// View and change persisted settings
///
/// Settings live in `<config dir>/photomerge/config.yaml` unless `--config`
/// points elsewhere. The file is created with defaults on first use.
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # Show every setting
    photomerge settings show

    # Stop writing GPS coordinates
    photomerge settings set merge.fields.gps false

    # Use a fixed offset when no timezone can be inferred
    photomerge settings set merge.timezone_offset +0900")]
pub struct SettingsCmd {
    #[command(subcommand)]
    pub command: SettingsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsSubcommand {
    /// Print all settings
    Show {
        /// Print the settings document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one setting
    Get {
        /// Setting key (e.g. merge.edited_suffix)
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Change one setting and save it
    Set {
        /// Setting key (e.g. merge.fields.title)
        #[arg(value_name = "KEY")]
        key: String,

        /// New value
        #[arg(value_name = "VALUE", allow_hyphen_values = true)]
        value: String,
    },

    /// Restore the default settings
    Reset,

    /// Print the settings file location
    Path,
}

impl SettingsCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match &self.command {
            SettingsSubcommand::Show { json } => self.show(ctx, *json).await,
            SettingsSubcommand::Get { key } => self.get(ctx, key).await,
            SettingsSubcommand::Set { key, value } => self.set(ctx, key, value).await,
            SettingsSubcommand::Reset => self.reset(ctx),
            SettingsSubcommand::Path => {
                println!("{}", ctx.store()?.path().display());
                Ok(())
            }
        }
    }

    async fn show(&self, ctx: &CliContext, json: bool) -> Result<()> {
        let store = ctx.store()?;
        let config = store.load_persisted().await.context("Failed to load settings")?;

        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }

        output::header(&format!("Settings ({})", store.path().display()));
        for (key, value) in setting_lines(&config)? {
            output::detail(key, &value);
        }
        Ok(())
    }

    async fn get(&self, ctx: &CliContext, key: &str) -> Result<()> {
        let config = ctx
            .store()?
            .load_persisted()
            .await
            .context("Failed to load settings")?;
        println!("{}", config.get_value(key)?);
        Ok(())
    }

    async fn set(&self, ctx: &CliContext, key: &str, value: &str) -> Result<()> {
        if key == "merge.timezone_offset" {
            photomerge_core::parse_offset(value)?;
        }

        let store = ctx.store()?;
        let config = store
            .update(|config| config.set_value(key, value))
            .await
            .with_context(|| format!("Failed to set {}", key))?;

        if !ctx.quiet {
            output::success(&format!("{} = {}", key, config.get_value(key)?));
        }
        Ok(())
    }

    fn reset(&self, ctx: &CliContext) -> Result<()> {
        let store = ctx.store()?;
        store.reset().context("Failed to reset settings")?;
        if !ctx.quiet {
            output::success(&format!(
                "Restored default settings in {}",
                store.path().display()
            ));
        }
        Ok(())
    }
}

fn setting_lines(config: &Config) -> Result<Vec<(&'static str, String)>> {
    SETTING_KEYS
        .iter()
        .map(|key| Ok((*key, config.get_value(key)?)))
        .collect()
}
