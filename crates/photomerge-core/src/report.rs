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

//! Run results

use crate::pairing::CandidateKind;
use crate::plan::{FieldPlan, Tag};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What happened to one sidecar or one of its media files
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The writer accepted the plan
    Written { fields: Vec<Tag> },
    /// Dry run: the plan that would have been written
    Planned { plan: FieldPlan },
    /// The sidecar matched no media file
    NoMedia,
    /// The sidecar could not be read
    ParseFailed { reason: String },
    /// The writer failed or timed out for this file
    WriteFailed { reason: String },
}

impl OutcomeStatus {
    /// Parse and write failures; no-media is not one
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OutcomeStatus::ParseFailed { .. } | OutcomeStatus::WriteFailed { .. }
        )
    }
}

/// Outcome for one (sidecar, target) pair
///
/// `target` is `None` for outcomes that concern the sidecar alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    /// Sidecar the outcome came from
    pub sidecar: PathBuf,
    /// Media file, absent when none was tried
    pub target: Option<PathBuf>,
    pub kind: Option<CandidateKind>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// Time resolution fallbacks for this sidecar
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl FileOutcome {
    /// Outcome that concerns the sidecar alone
    pub fn for_sidecar(sidecar: impl Into<PathBuf>, status: OutcomeStatus) -> Self {
        Self {
            sidecar: sidecar.into(),
            target: None,
            kind: None,
            status,
            warnings: Vec::new(),
        }
    }
}

/// Aggregate of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Sorted by sidecar, then target
    pub outcomes: Vec<FileOutcome>,
    /// Pairs never started because the run was cancelled
    pub cancelled: usize,
}

impl MergeReport {
    /// Sorts outcomes by sidecar, then target
    pub fn new(mut outcomes: Vec<FileOutcome>, cancelled: usize) -> Self {
        outcomes.sort_by(|a, b| (&a.sidecar, &a.target).cmp(&(&b.sidecar, &b.target)));
        Self {
            outcomes,
            cancelled,
        }
    }

    pub fn summary(&self) -> MergeSummary {
        let mut summary = MergeSummary {
            cancelled: self.cancelled,
            ..MergeSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                OutcomeStatus::Written { .. } => summary.written += 1,
                OutcomeStatus::Planned { .. } => summary.planned += 1,
                OutcomeStatus::NoMedia => summary.no_media += 1,
                OutcomeStatus::ParseFailed { .. } => summary.parse_failed += 1,
                OutcomeStatus::WriteFailed { .. } => summary.write_failed += 1,
            }
        }
        summary
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }
}

/// Outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Files the writer accepted
    pub written: usize,
    /// Files planned in a dry run
    pub planned: usize,
    /// Sidecars with no media file
    pub no_media: usize,
    /// Sidecars that could not be read
    pub parse_failed: usize,
    /// Files the writer failed on or timed out for
    pub write_failed: usize,
    /// Sidecars skipped by a cancel
    pub cancelled: usize,
}

impl MergeSummary {
    /// Parse and write failures together
    pub fn failed(&self) -> usize {
        self.parse_failed + self.write_failed
    }
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.planned > 0 {
            write!(f, "{} planned", self.planned)?;
        } else {
            write!(f, "{} written", self.written)?;
        }
        write!(
            f,
            ", {} without media, {} failed",
            self.no_media,
            self.failed()
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        Ok(())
    }
}
