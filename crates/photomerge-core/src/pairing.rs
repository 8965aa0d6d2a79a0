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

//! Sidecar to media association
//!
//! Naming convention only: `photo.jpg.json` describes `photo.jpg`, and with a
//! suffix of `-edited` also `photo-edited.jpg`. Names are built by exact
//! concatenation; nothing is guessed.

use crate::locator::{is_sidecar, SIDECAR_EXTENSION};
use photomerge_config::MergeSettings;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a media file relates to its sidecar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// The file the sidecar is named after
    Original,
    /// The original's name with the edited suffix
    Edited,
}

/// A media file a sidecar's metadata should be written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaCandidate {
    pub path: PathBuf,
    pub kind: CandidateKind,
}

/// One sidecar and the media files found for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePairing {
    pub sidecar: PathBuf,
    /// Original first, then the edited variant; empty when nothing matched
    pub candidates: Vec<MediaCandidate>,
}

impl FilePairing {
    /// True when no media file matched
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Strip the sidecar extension: `photo.jpg.json` → `photo.jpg`.
///
/// Returns `None` when the path is not a sidecar or nothing is left of the name.
pub fn original_path(sidecar: &Path) -> Option<PathBuf> {
    let name = sidecar.file_name()?;
    if !is_sidecar(sidecar) || name.len() <= SIDECAR_EXTENSION.len() {
        return None;
    }
    // The extension has no inner dot, so the stem is the name minus the suffix
    Some(sidecar.with_file_name(sidecar.file_stem()?))
}

/// Insert `suffix` between base name and extension: `photo.jpg` → `photo-edited.jpg`.
///
/// Without an extension the suffix is appended.
pub fn edited_path(media: &Path, suffix: &str) -> Option<PathBuf> {
    let stem = media.file_stem()?;
    let mut name = OsString::from(stem);
    name.push(suffix);
    if let Some(ext) = media.extension() {
        name.push(".");
        name.push(ext);
    }
    Some(media.with_file_name(name))
}

/// Resolves sidecars to the media files present on disk
#[derive(Debug, Clone)]
pub struct PairingResolver<'a> {
    settings: &'a MergeSettings,
}

impl<'a> PairingResolver<'a> {
    pub fn new(settings: &'a MergeSettings) -> Self {
        Self { settings }
    }

    /// Pair one sidecar
    pub fn resolve(&self, sidecar: &Path) -> FilePairing {
        let mut candidates = Vec::with_capacity(2);

        if let Some(original) = original_path(sidecar) {
            let edited = if self.settings.process_edited {
                edited_path(&original, &self.settings.edited_suffix)
                    .filter(|edited| *edited != original && edited.is_file())
            } else {
                None
            };

            if original.is_file() {
                candidates.push(MediaCandidate {
                    path: original,
                    kind: CandidateKind::Original,
                });
            }
            if let Some(path) = edited {
                candidates.push(MediaCandidate {
                    path,
                    kind: CandidateKind::Edited,
                });
            }
        }

        debug!(
            sidecar = %sidecar.display(),
            candidates = candidates.len(),
            "Sidecar paired"
        );

        FilePairing {
            sidecar: sidecar.to_path_buf(),
            candidates,
        }
    }

    /// Pair every sidecar; sidecars without media stay in the result
    pub fn resolve_all(&self, sidecars: &[PathBuf]) -> Vec<FilePairing> {
        sidecars.iter().map(|sidecar| self.resolve(sidecar)).collect()
    }
}
