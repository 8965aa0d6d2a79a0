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
//! Settings management for photomerge
//!
//! This crate owns the settings document: its schema, loading from TOML,
//! YAML or JSON, validation, `PHOTOMERGE_` environment overrides and
//! persistence through [`SettingsStore`].
//!
//! # Example
//!
//! ```no_run
//! use photomerge_config::SettingsStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SettingsStore::default_location()?;
//!     let config = store.load_or_init().await?;
//!
//!     println!("Edited suffix: {}", config.merge.edited_suffix);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;

// Re-export commonly used items
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader};
pub use schema::*;
pub use store::SettingsStore;
pub use validation::Validator;
