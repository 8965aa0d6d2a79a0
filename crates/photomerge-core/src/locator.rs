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

//! Sidecar discovery
//!
//! Walks the input roots and collects every file whose name ends in
//! [`SIDECAR_EXTENSION`]. An unreadable root or subdirectory aborts the scan:
//! a partial listing would silently drop work.

use crate::error::{MergeError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Sidecar file suffix, matched case-sensitively
pub const SIDECAR_EXTENSION: &str = ".json";

/// True when `path` names a sidecar file
///
/// Matches on the raw name bytes, so names that are not valid UTF-8 qualify too.
pub fn is_sidecar(path: &Path) -> bool {
    path.file_name().is_some_and(|name| {
        name.as_encoded_bytes()
            .ends_with(SIDECAR_EXTENSION.as_bytes())
    })
}

/// Collect the sidecars under `roots`.
///
/// Directory roots are walked recursively; file roots qualify on their own
/// name. The result is sorted and free of duplicates, so overlapping roots
/// yield each sidecar once.
#[instrument(skip_all, fields(roots = roots.len()))]
pub fn locate_sidecars<P: AsRef<Path>>(roots: &[P]) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for root in roots {
        let root = root.as_ref();
        let meta = std::fs::metadata(root).map_err(|source| MergeError::Scan {
            path: root.to_path_buf(),
            source,
        })?;

        if !meta.is_dir() {
            if is_sidecar(root) {
                found.insert(root.to_path_buf());
            }
            continue;
        }

        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| MergeError::Scan {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;

            // Symlinked files count like file roots; directory links are not followed
            if is_sidecar(entry.path()) && entry.path().is_file() {
                found.insert(entry.into_path());
            }
        }
    }

    debug!(count = found.len(), "Sidecar scan finished");
    Ok(found.into_iter().collect())
}
