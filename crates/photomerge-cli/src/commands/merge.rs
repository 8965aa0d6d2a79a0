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

//! `photomerge merge`: run a merge over files and directories.

use super::CliContext;
use crate::output;
use crate::progress::{ProgressTracker, TerminalSink};
use anyhow::{Context, Result};
use clap::Parser;
use photomerge_config::Config;
use photomerge_core::{
    ExiftoolWriter, MergeOrchestrator, MergeReport, RunOptions, StaticLookup, TimeResolver,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Merge sidecar metadata into media files
///
/// Walks every PATH for `.json` sidecars, pairs each with its media file
/// (and the edited copy when enabled), and writes the enabled fields with
/// exiftool. Problems with single files are reported and the run goes on.
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # Merge a whole export
    photomerge merge ~/Takeout/Photos

    # See what would be written without touching any file
    photomerge merge --dry-run ~/Takeout/Photos

    # Limit parallel exiftool processes and keep a JSON report
    photomerge merge -j 2 --json ~/Takeout/Photos > report.json")]
pub struct MergeCmd {
    /// Files or directories to process
    #[arg(value_name = "PATHS", required = true)]
    pub paths: Vec<PathBuf>,

    /// Plan the writes without running exiftool
    #[arg(long)]
    pub dry_run: bool,

    /// Sidecars processed at once
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Per-file write timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

impl MergeCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let config = ctx
            .store()?
            .load_or_init()
            .await
            .context("Failed to load settings")?;

        let options = self.run_options(&config);
        let writer = ExiftoolWriter::new(config.writer.exiftool_path.clone());
        if !options.dry_run {
            if let Err(e) = writer.version().await {
                warn!(error = %e, "exiftool availability check failed");
                if !self.json && !ctx.quiet {
                    output::warning(&format!("{}; every write will fail", e));
                }
            }
        }

        let orchestrator =
            MergeOrchestrator::new(config.merge.clone(), Arc::new(writer), resolver_for(&config))
                .with_options(options);

        let cancel = orchestrator.cancel_handle();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        let silent = ctx.quiet || self.json;
        if !silent {
            output::progress(&format!(
                "{} {} path(s)",
                if options.dry_run { "Planning" } else { "Merging" },
                self.paths.len()
            ));
        }
        let bar = ProgressTracker::new(silent).file_bar("Merging", 0);
        let sink = TerminalSink::new(bar, silent, ctx.verbose);

        let result = orchestrator.run(self.paths.as_slice(), &sink).await;
        sink.finish();
        interrupt.abort();

        let report = result.context("Merge run aborted")?;
        self.print_report(ctx, &report, options.dry_run)
    }

    fn run_options(&self, config: &Config) -> RunOptions {
        let mut options = RunOptions::from_config(config);
        if let Some(jobs) = self.jobs {
            options.concurrency = usize::from(jobs);
        }
        if let Some(secs) = self.timeout {
            options.write_timeout = Duration::from_secs(secs);
        }
        options.dry_run = self.dry_run;
        debug!(?options, "Run options");
        options
    }

    fn print_report(&self, ctx: &CliContext, report: &MergeReport, dry_run: bool) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
            return Ok(());
        }
        if ctx.quiet {
            return Ok(());
        }

        // Failures were already printed by the sink as they happened
        if dry_run && !ctx.verbose {
            for outcome in report.outcomes.iter().filter(|o| !o.status.is_failure()) {
                output::info(&output::outcome_line(outcome));
            }
        }
        println!();
        output::summary(&report.summary(), dry_run);
        Ok(())
    }
}

/// Timezone lookup is only worth building when GPS inference can apply
fn resolver_for(config: &Config) -> TimeResolver {
    let merge = &config.merge;
    if merge.infer_timezone_from_gps && merge.fields.date_taken {
        TimeResolver::with_default_lookup()
    } else {
        TimeResolver::new(Arc::new(StaticLookup::none()))
    }
}
