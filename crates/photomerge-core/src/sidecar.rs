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

//! Sidecar metadata extraction
//!
//! A sidecar is any JSON document. Only these keys are read, each one
//! optional:
//!
//! | Key                        | Field               | Missing |
//! |----------------------------|---------------------|---------|
//! | `title`                    | `title`             | `""`    |
//! | `description`              | `description`       | `""`    |
//! | `url`                      | `source_url`        | `""`    |
//! | `photoTakenTime.timestamp` | `captured_at_epoch` | `0`     |
//! | `geoData.latitude`         | `geo.latitude`      | `0.0`   |
//! | `geoData.longitude`        | `geo.longitude`     | `0.0`   |
//! | `geoData.altitude`         | `geo.altitude`      | `0.0`   |
//!
//! Numbers may arrive as JSON numbers or numeric strings.

use crate::error::{MergeError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Geolocation from a sidecar.
///
/// An axis equal to exactly `0.0` means "not recorded", never the equator,
/// the prime meridian or sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoData {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters
    pub altitude: f64,
}

impl GeoData {
    pub fn latitude(&self) -> Option<f64> {
        recorded(self.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        recorded(self.longitude)
    }

    pub fn altitude(&self) -> Option<f64> {
        recorded(self.altitude)
    }

    /// Both horizontal axes recorded
    pub fn has_coordinates(&self) -> bool {
        self.latitude().is_some() && self.longitude().is_some()
    }
}

fn recorded(value: f64) -> Option<f64> {
    (value != 0.0 && value.is_finite()).then_some(value)
}

/// Parsed contents of one sidecar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidecarRecord {
    pub title: String,
    pub description: String,
    /// Capture instant, UTC seconds since the epoch
    pub captured_at_epoch: i64,
    pub source_url: String,
    /// `None` when no axis is recorded
    pub geo: Option<GeoData>,
}

impl SidecarRecord {
    /// Extract a record from raw sidecar bytes
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        let doc: Value = serde_json::from_slice(bytes)?;

        let geo = GeoData {
            latitude: number(doc.pointer("/geoData/latitude")),
            longitude: number(doc.pointer("/geoData/longitude")),
            altitude: number(doc.pointer("/geoData/altitude")),
        };
        let any_axis = geo.latitude().is_some()
            || geo.longitude().is_some()
            || geo.altitude().is_some();

        Ok(Self {
            title: text(doc.get("title")),
            description: text(doc.get("description")),
            captured_at_epoch: integer(doc.pointer("/photoTakenTime/timestamp")),
            source_url: text(doc.get("url")),
            geo: any_axis.then_some(geo),
        })
    }
}

/// Read and extract one sidecar file.
///
/// Unreadable files and invalid JSON both surface as [`MergeError::Parse`].
pub fn read_sidecar(path: &Path) -> Result<SidecarRecord> {
    let bytes = std::fs::read(path).map_err(|e| MergeError::parse(path, e.to_string()))?;
    SidecarRecord::from_slice(&bytes).map_err(|e| MergeError::parse(path, e.to_string()))
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

fn integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or_default()
        }
        _ => 0,
    }
}
