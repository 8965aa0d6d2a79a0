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

//! Error types for the merge pipeline

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Merge pipeline errors
///
/// Only [`MergeError::Scan`] ends a run. Every other variant is confined to
/// the sidecar or file it was raised for.
#[derive(Debug, Error)]
pub enum MergeError {
    /// An input root could not be enumerated
    #[error("Cannot scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sidecar could not be read or is not JSON
    #[error("Cannot parse sidecar {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The configured fixed offset is not `+HHMM` / `-HHMM`
    #[error("Invalid timezone offset '{0}': expected +HHMM or -HHMM")]
    TimezoneOffset(String),

    /// No usable timezone for a coordinate pair
    #[error("No timezone for coordinates ({latitude}, {longitude}): {reason}")]
    TimezoneLookup {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    /// The capture time cannot be represented as a calendar date
    #[error("Capture timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    /// The metadata writer reported a failure for one file
    #[error("Failed to write metadata to {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// The metadata writer did not finish in time
    #[error("Writing metadata to {} timed out after {}s", path.display(), timeout.as_secs())]
    WriteTimeout { path: PathBuf, timeout: Duration },

    /// The metadata writer executable could not be started
    #[error("Metadata writer '{program}' is not available: {reason}")]
    ToolUnavailable { program: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    /// True when the whole run must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, MergeError::Scan { .. })
    }

    /// Sidecar read or decode failure for `path`
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MergeError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Writer failure for the media file at `path`
    pub fn write(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MergeError::Write {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;
