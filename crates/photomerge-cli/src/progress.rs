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

//! Progress bars and the terminal event sink.

use crate::output;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use photomerge_core::{EventLevel, EventSink, MergeEvent};
use std::sync::Arc;
use std::time::Duration;

/// Progress tracker for merge runs
///
/// Draws on stderr so stdout stays clean for piping.
pub struct ProgressTracker {
    multi: Arc<MultiProgress>,
    quiet: bool,
}

impl ProgressTracker {
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: Arc::new(if quiet {
                MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
            } else {
                MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
            }),
            quiet,
        }
    }

    /// Create progress bar for sidecar processing
    pub fn file_bar(&self, msg: &str, total: u64) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.magenta} {msg} [{bar:40.magenta/blue}] {pos}/{len} sidecars ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Create a spinner for work of unknown length
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

/// Prints run events above a progress bar
///
/// Warnings and errors are always shown. Per-file info lines only appear
/// when `verbose` is set.
pub struct TerminalSink {
    bar: ProgressBar,
    quiet: bool,
    verbose: bool,
}

impl TerminalSink {
    pub fn new(bar: ProgressBar, quiet: bool, verbose: bool) -> Self {
        Self {
            bar,
            quiet,
            verbose,
        }
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn line(event: &MergeEvent) -> String {
        match event.target.as_ref().or(event.sidecar.as_ref()) {
            Some(path) => format!("{}: {}", path.display(), event.message),
            None => event.message.clone(),
        }
    }
}

impl EventSink for TerminalSink {
    fn emit(&self, event: MergeEvent) {
        if self.quiet || (event.level == EventLevel::Info && !self.verbose) {
            return;
        }

        let line = Self::line(&event);
        self.bar.suspend(|| match event.level {
            EventLevel::Info => output::info(&line),
            EventLevel::Warning => output::warning(&line),
            EventLevel::Error => output::error(&line),
        });
    }

    fn progress(&self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }
}
