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
use crate::schema::*;

/// Validator for configuration settings
pub trait Validator {
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.merge.validate()?;
        self.writer.validate()?;
        self.performance.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for MergeSettings {
    fn validate(&self) -> ConfigResult<()> {
        // An empty suffix would make the edited variant the original itself.
        if self.edited_suffix.is_empty() {
            return Err(ConfigError::MissingRequired("merge.edited_suffix".to_string()));
        }

        if self.edited_suffix.contains(['/', '\\']) {
            return Err(ConfigError::invalid_value(
                "merge.edited_suffix",
                "must not contain path separators",
            ));
        }

        // timezone_offset is checked at resolution time, where a bad value
        // degrades to UTC with a warning instead of refusing to start.
        Ok(())
    }
}

impl Validator for WriterConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.exiftool_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("writer.exiftool_path".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "writer.timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validator for PerformanceConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::invalid_value(
                "performance.max_concurrency",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}
