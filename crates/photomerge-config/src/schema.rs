// photomerge - merge photo sidecar metadata into media files
// Copyright (C) 2026  photomerge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Which sidecar fields are merged and how
    pub merge: MergeSettings,

    /// External metadata writer settings
    pub writer: WriterConfig,

    /// Performance tuning
    pub performance: PerformanceConfig,

    /// Observability settings
    pub observability: ObservabilityConfig,
}

/// Settings consumed by the merge engine.
///
/// The engine reads one snapshot per run; nothing in the engine mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeSettings {
    /// Per-category enable flags
    pub fields: FieldToggles,

    /// Suffix inserted between base name and extension of edited variants
    pub edited_suffix: String,

    /// Also write into `<base><suffix>.<ext>` when it exists
    pub process_edited: bool,

    /// Fixed offset (`+HHMM` / `-HHMM`) applied to capture times
    pub timezone_offset: String,

    /// Prefer the coordinate's timezone over the fixed offset
    pub infer_timezone_from_gps: bool,

    /// Ask the writer to tolerate minor metadata errors
    pub ignore_minor_errors: bool,

    /// Overwrite tags already present in the target file
    pub overwrite_existing_tags: bool,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            fields: FieldToggles::default(),
            edited_suffix: default_edited_suffix(),
            process_edited: true,
            timezone_offset: host_timezone_offset(),
            infer_timezone_from_gps: true,
            ignore_minor_errors: false,
            overwrite_existing_tags: true,
        }
    }
}

/// Enable flags per field category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldToggles {
    pub title: bool,
    pub description: bool,
    /// `DateTimeOriginal`
    pub date_taken: bool,
    pub url: bool,
    /// Latitude, longitude and altitude together
    pub gps: bool,
}

impl Default for FieldToggles {
    fn default() -> Self {
        Self::all()
    }
}

impl FieldToggles {
    /// Every category enabled
    pub fn all() -> Self {
        Self {
            title: true,
            description: true,
            date_taken: true,
            url: true,
            gps: true,
        }
    }

    /// Every category disabled
    pub fn none() -> Self {
        Self {
            title: false,
            description: false,
            date_taken: false,
            url: false,
            gps: false,
        }
    }

    /// True when no category is enabled
    pub fn is_empty(&self) -> bool {
        *self == Self::none()
    }
}

/// External metadata writer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WriterConfig {
    /// Path or name of the exiftool executable
    pub exiftool_path: String,

    /// Per-file write timeout (in seconds)
    pub timeout_secs: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            exiftool_path: "exiftool".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Performance tuning configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Maximum pairs processed at once
    pub max_concurrency: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Logging level
    pub log_level: String,

    /// Log format (pretty, compact, json)
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Keys accepted by [`Config::set_value`] and [`Config::get_value`]
pub const SETTING_KEYS: &[&str] = &[
    "merge.fields.title",
    "merge.fields.description",
    "merge.fields.date_taken",
    "merge.fields.url",
    "merge.fields.gps",
    "merge.edited_suffix",
    "merge.process_edited",
    "merge.timezone_offset",
    "merge.infer_timezone_from_gps",
    "merge.ignore_minor_errors",
    "merge.overwrite_existing_tags",
    "writer.exiftool_path",
    "writer.timeout_secs",
    "performance.max_concurrency",
    "observability.log_level",
    "observability.log_format",
];

impl Config {
    /// Read a single setting as a display string
    pub fn get_value(&self, key: &str) -> ConfigResult<String> {
        let merge = &self.merge;
        let value = match key {
            "merge.fields.title" => merge.fields.title.to_string(),
            "merge.fields.description" => merge.fields.description.to_string(),
            "merge.fields.date_taken" => merge.fields.date_taken.to_string(),
            "merge.fields.url" => merge.fields.url.to_string(),
            "merge.fields.gps" => merge.fields.gps.to_string(),
            "merge.edited_suffix" => merge.edited_suffix.clone(),
            "merge.process_edited" => merge.process_edited.to_string(),
            "merge.timezone_offset" => merge.timezone_offset.clone(),
            "merge.infer_timezone_from_gps" => merge.infer_timezone_from_gps.to_string(),
            "merge.ignore_minor_errors" => merge.ignore_minor_errors.to_string(),
            "merge.overwrite_existing_tags" => merge.overwrite_existing_tags.to_string(),
            "writer.exiftool_path" => self.writer.exiftool_path.clone(),
            "writer.timeout_secs" => self.writer.timeout_secs.to_string(),
            "performance.max_concurrency" => self.performance.max_concurrency.to_string(),
            "observability.log_level" => self.observability.log_level.clone(),
            "observability.log_format" => self.observability.log_format.clone(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// Assign a single setting from its string form
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let merge = &mut self.merge;
        match key {
            "merge.fields.title" => merge.fields.title = parse_bool(key, value)?,
            "merge.fields.description" => merge.fields.description = parse_bool(key, value)?,
            "merge.fields.date_taken" => merge.fields.date_taken = parse_bool(key, value)?,
            "merge.fields.url" => merge.fields.url = parse_bool(key, value)?,
            "merge.fields.gps" => merge.fields.gps = parse_bool(key, value)?,
            "merge.edited_suffix" => merge.edited_suffix = value.to_string(),
            "merge.process_edited" => merge.process_edited = parse_bool(key, value)?,
            "merge.timezone_offset" => merge.timezone_offset = value.to_string(),
            "merge.infer_timezone_from_gps" => {
                merge.infer_timezone_from_gps = parse_bool(key, value)?
            }
            "merge.ignore_minor_errors" => merge.ignore_minor_errors = parse_bool(key, value)?,
            "merge.overwrite_existing_tags" => {
                merge.overwrite_existing_tags = parse_bool(key, value)?
            }
            "writer.exiftool_path" => self.writer.exiftool_path = value.to_string(),
            "writer.timeout_secs" => self.writer.timeout_secs = parse_number(key, value)?,
            "performance.max_concurrency" => {
                self.performance.max_concurrency = parse_number(key, value)?
            }
            "observability.log_level" => self.observability.log_level = value.to_lowercase(),
            "observability.log_format" => self.observability.log_format = value.to_lowercase(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

/// Parse boolean from string (accepts: true, false, yes, no, 1, 0, on, off)
pub(crate) fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(
            field,
            format!(
                "expected 'true', 'false', 'yes', 'no', '1', '0', 'on', or 'off', got '{}'",
                value
            ),
        )),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid_value(field, format!("expected an integer, got '{}'", value)))
}

fn default_edited_suffix() -> String {
    "-edited".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    num_cpus::get().max(1)
}

/// The host's current UTC offset in `+HHMM` form
pub fn host_timezone_offset() -> String {
    chrono::Local::now().format("%z").to_string()
}
