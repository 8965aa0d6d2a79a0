// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 photomerge Contributors

//! # photomerge Test Utilities
//!
//! Shared test utilities for photomerge crates providing:
//! - CLI command helpers for testing the `photomerge` binary
//! - Export-tree fixtures: sidecars and media files in a temp directory

pub mod cli;
pub mod fixtures;

// Re-export commonly used items at crate root
pub use cli::{photomerge, PhotomergeCommand};
pub use fixtures::{sidecar_json, TakeoutFixture};
