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

//! Shared output formatting utilities for CLI commands.
//!
//! Colored, prefixed lines so every command reads the same way.
//!
//! # Examples
//!
//! ```rust
//! use photomerge_cli::output;
//!
//! output::success("Settings saved");
//! output::error("exiftool is not installed");
//! output::detail("Edited suffix", "-edited");
//! ```

use console::style;
use photomerge_core::{FileOutcome, MergeSummary, OutcomeStatus};

/// Print a success message with a green check mark.
pub fn success(msg: &str) {
    println!("{} {}", style("✅").green().bold(), msg);
}

/// Print an error message to stderr with a red cross.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("❌").red().bold(), msg);
}

/// Print an informational message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ️").cyan(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠️").yellow(), msg);
}

/// Print a detail line with key-value formatting.
///
/// ```rust
/// photomerge_cli::output::detail("Timezone offset", "+0100");
/// // Output:   Timezone offset: +0100
/// ```
pub fn detail(key: &str, value: &str) {
    println!("  {}: {}", key, style(value).cyan());
}

/// Print a section header.
pub fn header(msg: &str) {
    println!("{} {}", style("📷").green().bold(), msg);
}

/// Print a progress indicator message.
pub fn progress(msg: &str) {
    println!("{} {}", style("🔄").cyan(), msg);
}

/// One line describing a file outcome, without styling
pub fn outcome_line(outcome: &FileOutcome) -> String {
    let subject = outcome
        .target
        .as_ref()
        .unwrap_or(&outcome.sidecar)
        .display()
        .to_string();

    match &outcome.status {
        OutcomeStatus::Written { fields } => format!(
            "{}: wrote {}",
            subject,
            tag_list(fields.iter().map(|tag| tag.name()))
        ),
        OutcomeStatus::Planned { plan } => format!(
            "{}: would write {}",
            subject,
            tag_list(plan.fields.iter().map(|(tag, _)| tag.name()))
        ),
        OutcomeStatus::NoMedia => format!("{}: no matching media file", subject),
        OutcomeStatus::ParseFailed { reason } => format!("{}: {}", subject, reason),
        OutcomeStatus::WriteFailed { reason } => format!("{}: {}", subject, reason),
    }
}

fn tag_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        "no tags".to_string()
    } else {
        names.join(", ")
    }
}

/// Print the end-of-run summary block.
pub fn summary(summary: &MergeSummary, dry_run: bool) {
    header(if dry_run {
        "Dry run summary"
    } else {
        "Merge summary"
    });
    if dry_run {
        detail("Files planned", &summary.planned.to_string());
    } else {
        detail("Files written", &summary.written.to_string());
    }
    detail("Sidecars without media", &summary.no_media.to_string());
    detail("Unreadable sidecars", &summary.parse_failed.to_string());
    detail("Failed writes", &summary.write_failed.to_string());
    if summary.cancelled > 0 {
        detail("Cancelled", &summary.cancelled.to_string());
    }

    if summary.failed() == 0 && summary.cancelled == 0 {
        success("Done");
    } else {
        warning(&format!("Finished with {}", describe_problems(summary)));
    }
}

fn describe_problems(summary: &MergeSummary) -> String {
    let mut parts = Vec::new();
    if summary.failed() > 0 {
        parts.push(format!("{} failures", summary.failed()));
    }
    if summary.cancelled > 0 {
        parts.push(format!("{} sidecars cancelled", summary.cancelled));
    }
    parts.join(" and ")
}
