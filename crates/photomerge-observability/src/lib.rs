//! Structured logging for photomerge.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` (so
//! `RUST_LOG` keeps working) and one of three output formats: pretty,
//! compact or JSON.
//!
//! ```ignore
//! use photomerge_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Pretty, None)?;
//! tracing::info!("merge started");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
