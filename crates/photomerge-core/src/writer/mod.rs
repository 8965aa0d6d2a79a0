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

//! Metadata writer abstraction
//!
//! The pipeline never touches embedded metadata itself. It hands each
//! [`FieldPlan`] to a [`MetadataWriter`]:
//!
//! - [`ExiftoolWriter`]: runs the `exiftool` executable once per file
//! - [`mock::MockWriter`]: in-memory recorder for tests
//!
//! # Implementing a writer
//!
//! 1. Use `#[async_trait]` on the impl block
//! 2. Report a failure for one file as [`MergeError::Write`](crate::MergeError::Write)
//! 3. Report a missing tool as [`MergeError::ToolUnavailable`](crate::MergeError::ToolUnavailable)
//! 4. Treat an empty plan as a successful no-op
//!
//! Calls for different files may run concurrently. The caller enforces the
//! per-call timeout, so a writer does not need its own.

pub mod exiftool;
pub mod mock;

use crate::error::Result;
use crate::plan::FieldPlan;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

pub use exiftool::ExiftoolWriter;

/// Writes a [`FieldPlan`] into one media file
#[async_trait]
pub trait MetadataWriter: Send + Sync + Debug {
    /// Apply `plan` to `target`
    ///
    /// # Errors
    ///
    /// A failure for this file only; the caller carries on with other files.
    async fn write(&self, target: &Path, plan: &FieldPlan) -> Result<()>;
}
