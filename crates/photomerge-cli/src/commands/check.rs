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

//! `photomerge check`: exiftool availability.

use super::CliContext;
use crate::output;
use crate::progress::ProgressTracker;
use anyhow::{Context, Result};
use clap::Parser;
use photomerge_core::{parse_offset, ExiftoolWriter};

/// Check that exiftool can be started
///
/// Runs `exiftool -ver` with the configured executable and reports the
/// installed version. Also flags a malformed fixed timezone offset.
#[derive(Parser, Debug)]
pub struct CheckCmd {}

impl CheckCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let config = ctx
            .store()?
            .load_or_init()
            .await
            .context("Failed to load settings")?;

        let writer = ExiftoolWriter::new(config.writer.exiftool_path.clone());
        let spinner = ProgressTracker::new(ctx.quiet).spinner("Looking for exiftool...");
        let version = writer.version().await;
        spinner.finish_and_clear();

        if let Err(e) = parse_offset(&config.merge.timezone_offset) {
            output::warning(&format!("{}; capture times will fall back to UTC", e));
        }

        match version {
            Ok(version) => {
                output::success(&format!("exiftool {} is available", version));
                output::detail("Executable", writer.program());
                Ok(())
            }
            Err(e) => {
                output::detail("Executable", writer.program());
                Err(e).context("exiftool is not usable")
            }
        }
    }
}
