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

//! In-memory mock writer for testing
//!
//! Records every plan it receives instead of touching files.
//!
//! ```rust,no_run
//! use photomerge_core::writer::{mock::MockWriter, MetadataWriter};
//! use photomerge_core::FieldPlan;
//! use std::path::Path;
//!
//! # async fn demo() -> photomerge_core::Result<()> {
//! let writer = MockWriter::new().fail_on("/photos/locked.jpg", "permission denied");
//!
//! writer.write(Path::new("/photos/a.jpg"), &FieldPlan::default()).await?;
//! assert!(writer.plan_for(Path::new("/photos/a.jpg")).await.is_some());
//! # Ok(())
//! # }
//! ```

use super::MetadataWriter;
use crate::error::{MergeError, Result};
use crate::plan::FieldPlan;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Thread-safe recording writer
///
/// Clones share the same records, so a test can keep one handle and give
/// another to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct MockWriter {
    written: Arc<RwLock<HashMap<PathBuf, FieldPlan>>>,
    failures: HashMap<PathBuf, String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write to `path` with `reason`
    pub fn fail_on(mut self, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        self.failures.insert(path.into(), reason.into());
        self
    }

    /// Sleep this long inside every write
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Last plan written per file
    pub async fn written(&self) -> HashMap<PathBuf, FieldPlan> {
        self.written.read().await.clone()
    }

    pub async fn plan_for(&self, path: &Path) -> Option<FieldPlan> {
        self.written.read().await.get(path).cloned()
    }

    /// Number of write calls, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of writes that were running at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts a write as running until dropped, even when the future is cancelled
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataWriter for MockWriter {
    async fn write(&self, target: &Path, plan: &FieldPlan) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.failures.get(target) {
            Some(reason) => Err(MergeError::write(target, reason.clone())),
            None => {
                self.written
                    .write()
                    .await
                    .insert(target.to_path_buf(), plan.clone());
                Ok(())
            }
        }
    }
}
