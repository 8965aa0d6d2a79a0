// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 photomerge Contributors

//! Export-tree fixtures.
//!
//! A [`TakeoutFixture`] owns a temp directory with a `photos/` tree for
//! sidecars and media, and room for a settings file beside it so that the
//! settings never show up in a scan.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sidecar JSON in the bulk-export layout.
///
/// Pass `0.0` for a coordinate to leave it unrecorded.
pub fn sidecar_json(title: &str, epoch: i64, latitude: f64, longitude: f64, altitude: f64) -> String {
    json!({
        "title": title,
        "description": "",
        "url": format!("https://photos.example.com/{}", title),
        "photoTakenTime": { "timestamp": epoch.to_string(), "formatted": "" },
        "geoData": {
            "latitude": latitude,
            "longitude": longitude,
            "altitude": altitude,
            "latitudeSpan": 0.0,
            "longitudeSpan": 0.0
        }
    })
    .to_string()
}

/// Temp directory laid out like a photo export
pub struct TakeoutFixture {
    dir: TempDir,
}

impl TakeoutFixture {
    /// Create an empty fixture with a `photos/` directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir(dir.path().join("photos")).expect("Failed to create photos dir");
        Self { dir }
    }

    /// Fixture root (holds `photos/` and the settings file).
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory that gets scanned.
    pub fn photos(&self) -> PathBuf {
        self.dir.path().join("photos")
    }

    /// Settings file path beside the photos tree.
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Write a settings file with the given TOML content.
    pub fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.config_path();
        fs::write(&path, toml).expect("Failed to write config");
        path
    }

    /// Write a media file at `relative` under `photos/`.
    pub fn media(&self, relative: &str) -> PathBuf {
        self.write(relative, b"\xFF\xD8\xFF\xE0 not really a jpeg")
    }

    /// Write the sidecar for `media_relative` (`<media>.json`).
    pub fn sidecar(&self, media_relative: &str, json: &str) -> PathBuf {
        self.write(&format!("{}.json", media_relative), json.as_bytes())
    }

    /// Media file plus its sidecar; returns (media, sidecar).
    pub fn photo(&self, media_relative: &str, json: &str) -> (PathBuf, PathBuf) {
        (self.media(media_relative), self.sidecar(media_relative, json))
    }

    /// The edited variant of `media_relative` using `suffix`.
    pub fn edited(&self, media_relative: &str, suffix: &str) -> PathBuf {
        let path = Path::new(media_relative);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .expect("media name must be UTF-8");
        let name = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}{}.{}", stem, suffix, ext),
            None => format!("{}{}", stem, suffix),
        };
        let relative = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        };
        self.media(relative.to_str().expect("media name must be UTF-8"))
    }

    fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.photos().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }
}

impl Default for TakeoutFixture {
    fn default() -> Self {
        Self::new()
    }
}
