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

//! Sidecar metadata merging for photomerge
//!
//! This crate provides:
//! - Sidecar discovery under files and directories ([`locator`])
//! - Sidecar to media pairing by naming convention ([`pairing`])
//! - Sidecar JSON extraction ([`sidecar`])
//! - Capture time resolution from fixed offsets or GPS ([`time`])
//! - Field planning with typed tags ([`plan`])
//! - Pluggable metadata writers, `exiftool` by default ([`writer`])
//! - A concurrent, cancellable run driver ([`orchestrator`])
//!
//! # Example
//!
//! ```no_run
//! use photomerge_config::MergeSettings;
//! use photomerge_core::{ExiftoolWriter, MergeOrchestrator, TimeResolver, TracingSink};
//! use std::sync::Arc;
//!
//! # async fn demo() -> photomerge_core::Result<()> {
//! let orchestrator = MergeOrchestrator::new(
//!     MergeSettings::default(),
//!     Arc::new(ExiftoolWriter::default()),
//!     TimeResolver::with_default_lookup(),
//! );
//!
//! let report = orchestrator.run(&["Takeout/Google Photos"], &TracingSink).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod events;
pub mod locator;
pub mod orchestrator;
pub mod pairing;
pub mod plan;
pub mod report;
pub mod sidecar;
pub mod time;
pub mod writer;

pub use error::{MergeError, Result};
pub use events::{CollectingSink, EventLevel, EventSink, MergeEvent, TracingSink};
pub use locator::{is_sidecar, locate_sidecars, SIDECAR_EXTENSION};
pub use orchestrator::{CancelHandle, MergeOrchestrator, RunOptions, RunPhase};
pub use pairing::{CandidateKind, FilePairing, MediaCandidate, PairingResolver};
pub use plan::{FieldPlan, MergePlanner, PlannedMerge, Tag, TagValue};
pub use report::{FileOutcome, MergeReport, MergeSummary, OutcomeStatus};
pub use sidecar::{read_sidecar, GeoData, SidecarRecord};
pub use time::{
    parse_offset, ResolvedTime, StaticLookup, TimeResolver, TimeStrategy, TimezoneLookup,
    TzfLookup, EXIF_DATE_FORMAT,
};
pub use writer::{ExiftoolWriter, MetadataWriter};
