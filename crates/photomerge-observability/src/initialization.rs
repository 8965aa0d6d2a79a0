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
//! Logging initialization and setup.

use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// Initialize tracing with the specified format and optional log level.
///
/// ```ignore
/// use photomerge_observability::{init_tracing, LogFormat};
///
/// init_tracing(LogFormat::Compact, Some("debug"))?;
/// tracing::info!("ready");
/// ```
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let config = LogConfig::new()
        .with_format(format)
        .with_level(level.unwrap_or("info"));
    init_tracing_with_config(&config)
}

/// Initialize tracing with a detailed configuration.
///
/// Returns [`LogError::AlreadyInitialized`] instead of panicking when a
/// global subscriber is already installed.
pub fn init_tracing_with_config(config: &LogConfig) -> Result<(), LogError> {
    let env_filter = build_env_filter(config)?;

    Registry::default()
        .with(env_filter)
        .with(build_layer(config))
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)
}

fn build_layer(config: &LogConfig) -> BoxedLayer {
    let writer = get_writer(config.output);

    match (config.format, config.use_timestamps) {
        (LogFormat::Pretty, true) => fmt::layer()
            .with_writer(writer)
            .with_target(config.include_targets)
            .with_ansi(config.use_color)
            .pretty()
            .boxed(),
        (LogFormat::Pretty, false) => fmt::layer()
            .with_writer(writer)
            .with_target(config.include_targets)
            .with_ansi(config.use_color)
            .without_time()
            .pretty()
            .boxed(),
        (LogFormat::Compact, true) => fmt::layer()
            .with_writer(writer)
            .with_target(config.include_targets)
            .with_ansi(config.use_color)
            .compact()
            .boxed(),
        (LogFormat::Compact, false) => fmt::layer()
            .with_writer(writer)
            .with_target(config.include_targets)
            .with_ansi(config.use_color)
            .without_time()
            .compact()
            .boxed(),
        (LogFormat::Json, true) => fmt::layer()
            .with_writer(writer)
            .json()
            .with_target(config.include_targets)
            .boxed(),
        (LogFormat::Json, false) => fmt::layer()
            .with_writer(writer)
            .json()
            .with_target(config.include_targets)
            .without_time()
            .boxed(),
    }
}

/// Get the writer for the specified output
fn get_writer(output: LogOutput) -> fn() -> Box<dyn io::Write + Send> {
    match output {
        LogOutput::Stderr => || Box::new(io::stderr()),
        LogOutput::Stdout => || Box::new(io::stdout()),
    }
}

/// Build an environment filter for the given configuration
fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let level_str = config.get_effective_level();

    EnvFilter::try_new(&level_str).map_err(|e| LogError::InvalidFilter {
        filter: level_str.clone(),
        reason: e.to_string(),
    })
}
