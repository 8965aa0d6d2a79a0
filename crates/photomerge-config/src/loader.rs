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
use crate::schema::{parse_bool, Config};
use crate::validation::Validator;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }

    /// Render a configuration in this format
    pub fn render(&self, config: &Config) -> ConfigResult<String> {
        match self {
            ConfigFormat::Toml => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::SerializationError(e.to_string())),
            ConfigFormat::Yaml => serde_yaml::to_string(config)
                .map_err(|e| ConfigError::SerializationError(e.to_string())),
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::SerializationError(e.to_string())),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        let format = ConfigFormat::from_path(path)?;

        debug!(
            "Read {} configuration file: {}",
            format.name(),
            path.display()
        );

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        debug!("Configuration loaded from {}", format.name());

        if self.validate {
            config.validate()?;
        }

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub async fn load_with_overrides<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let mut config = self.load_file(path).await?;
        self.apply_env_overrides(&mut config)?;
        if self.validate {
            config.validate()?;
        }
        Ok(config)
    }

    /// Apply `PHOTOMERGE_*` environment variable overrides
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        if let Ok(value) = std::env::var("PHOTOMERGE_EDITED_SUFFIX") {
            config.merge.edited_suffix = value;
        }
        if let Ok(value) = std::env::var("PHOTOMERGE_TIMEZONE_OFFSET") {
            config.merge.timezone_offset = value;
        }
        if let Ok(value) = std::env::var("PHOTOMERGE_INFER_TIMEZONE_FROM_GPS") {
            config.merge.infer_timezone_from_gps = parse_bool(
                "PHOTOMERGE_INFER_TIMEZONE_FROM_GPS",
                &value,
            )
            .map_err(|_| {
                ConfigError::env_var_parsing_error(
                    "PHOTOMERGE_INFER_TIMEZONE_FROM_GPS",
                    &value,
                    "expected a boolean",
                )
            })?;
        }

        if let Ok(value) = std::env::var("PHOTOMERGE_EXIFTOOL_PATH") {
            config.writer.exiftool_path = value;
        }
        if let Ok(value) = std::env::var("PHOTOMERGE_WRITE_TIMEOUT_SECS") {
            config.writer.timeout_secs = value.parse().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    "PHOTOMERGE_WRITE_TIMEOUT_SECS",
                    &value,
                    "expected number of seconds",
                )
            })?;
        }

        if let Ok(value) = std::env::var("PHOTOMERGE_MAX_CONCURRENCY") {
            config.performance.max_concurrency = value.parse().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    "PHOTOMERGE_MAX_CONCURRENCY",
                    &value,
                    "expected valid integer",
                )
            })?;
        }

        if let Ok(value) = std::env::var("PHOTOMERGE_LOG_LEVEL") {
            config.observability.log_level = value.to_lowercase();
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_path("config.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("config.yaml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("config.json").unwrap(), ConfigFormat::Json);
    }

    #[test]
    fn test_format_detection_error() {
        assert!(ConfigFormat::from_path("config.xml").is_err());
        assert!(ConfigFormat::from_path("config").is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let loader = ConfigLoader::new();
        let toml = r#"
        [merge]
        edited_suffix = "-bearbeitet"

        [merge.fields]
        gps = false
        "#;
        let config = loader.load_from_string(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.merge.edited_suffix, "-bearbeitet");
        assert!(!config.merge.fields.gps);
        assert!(config.merge.fields.title);
        assert!(config.merge.process_edited);
    }

    #[test]
    fn test_parse_yaml() {
        let loader = ConfigLoader::new();
        let yaml = r#"merge:
  timezone_offset: "+0530"
  infer_timezone_from_gps: false
writer:
  timeout_secs: 10"#;
        let config = loader.load_from_string(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.merge.timezone_offset, "+0530");
        assert!(!config.merge.infer_timezone_from_gps);
        assert_eq!(config.writer.timeout_secs, 10);
    }

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new();
        let json = r#"{"performance": {"max_concurrency": 3}}"#;
        let config = loader.load_from_string(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.performance.max_concurrency, 3);
    }

    #[test]
    fn test_validation_applies() {
        let loader = ConfigLoader::new();
        let json = r#"{"performance": {"max_concurrency": 0}}"#;
        assert!(loader.load_from_string(json, ConfigFormat::Json).is_err());

        let lenient = ConfigLoader::without_validation();
        assert!(lenient.load_from_string(json, ConfigFormat::Json).is_ok());
    }

    #[test]
    fn test_render_then_load_each_format() {
        let config = Config::default();
        for format in [ConfigFormat::Toml, ConfigFormat::Yaml, ConfigFormat::Json] {
            let text = format.render(&config).unwrap();
            let loaded = ConfigLoader::new().load_from_string(&text, format).unwrap();
            assert_eq!(loaded, config, "{} render should load back", format.name());
        }
    }
}
