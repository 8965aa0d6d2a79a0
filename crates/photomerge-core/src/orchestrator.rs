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

//! Merge run driver
//!
//! One run goes `Scanning → Pairing → Processing → Reporting → Idle`.
//! Pairs are processed concurrently, bounded by a semaphore. Within a pair
//! the candidates are written one after another, each with its own timeout
//! and outcome. Only a failed scan ends the run early; everything else is
//! recorded in the [`MergeReport`].
//!
//! A run is a single pass with no resumable state. Re-running over the same
//! inputs and settings produces the same plans.

use crate::error::{MergeError, Result};
use crate::events::{EventSink, MergeEvent};
use crate::locator::locate_sidecars;
use crate::pairing::{FilePairing, PairingResolver};
use crate::plan::{FieldPlan, MergePlanner};
use crate::report::{FileOutcome, MergeReport, OutcomeStatus};
use crate::sidecar::read_sidecar;
use crate::time::TimeResolver;
use crate::writer::MetadataWriter;
use photomerge_config::{Config, MergeSettings, PerformanceConfig, WriterConfig};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

/// Current stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Not running
    Idle,
    Scanning,
    Pairing,
    /// Pairs are being planned and written
    Processing,
    Reporting,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Scanning => "scanning",
            RunPhase::Pairing => "pairing",
            RunPhase::Processing => "processing",
            RunPhase::Reporting => "reporting",
        };
        f.write_str(s)
    }
}

/// Per-run knobs that are not merge settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Pairs processed at once (at least 1)
    pub concurrency: usize,
    /// Limit for a single metadata write
    pub write_timeout: Duration,
    /// Plan only, write nothing
    pub dry_run: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.performance.max_concurrency.max(1),
            write_timeout: Duration::from_secs(config.writer.timeout_secs),
            dry_run: false,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: PerformanceConfig::default().max_concurrency.max(1),
            write_timeout: Duration::from_secs(WriterConfig::default().timeout_secs),
            dry_run: false,
        }
    }
}

/// Stops a run between pairs
///
/// Pairs already being written finish; pairs not yet started are skipped
/// and counted in [`MergeReport::cancelled`]. A cancel stops the current
/// run, or the next one when none is running, and is cleared when that
/// run ends.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip every pair not yet started
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Shared, read-only state for pair tasks
struct PairContext {
    settings: Arc<MergeSettings>,
    writer: Arc<dyn MetadataWriter>,
    resolver: TimeResolver,
    write_timeout: Duration,
    dry_run: bool,
}

enum PairResult {
    Done(Vec<FileOutcome>),
    Cancelled,
}

/// Drives merge runs over a fixed settings snapshot
pub struct MergeOrchestrator {
    settings: Arc<MergeSettings>,
    writer: Arc<dyn MetadataWriter>,
    resolver: TimeResolver,
    options: RunOptions,
    cancel: CancelHandle,
    phase: watch::Sender<RunPhase>,
}

impl MergeOrchestrator {
    /// The settings are copied in and stay fixed for every run of this orchestrator
    pub fn new(
        settings: MergeSettings,
        writer: Arc<dyn MetadataWriter>,
        resolver: TimeResolver,
    ) -> Self {
        let (phase, _) = watch::channel(RunPhase::Idle);
        Self {
            settings: Arc::new(settings),
            writer,
            resolver,
            options: RunOptions::default(),
            cancel: CancelHandle::new(),
            phase,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Use an existing cancel flag instead of a fresh one
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for stopping a run from elsewhere, e.g. a signal handler
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Follow phase changes
    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    /// Stage of the current run
    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    /// Merge every sidecar found under `roots`.
    ///
    /// # Errors
    ///
    /// Only [`MergeError::Scan`]. Per-sidecar and per-file problems end up
    /// in the returned report instead.
    #[instrument(skip_all, fields(roots = roots.len(), dry_run = self.options.dry_run))]
    pub async fn run<P: AsRef<Path>>(
        &self,
        roots: &[P],
        sink: &dyn EventSink,
    ) -> Result<MergeReport> {
        self.set_phase(RunPhase::Scanning);
        let sidecars = match locate_sidecars(roots) {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, "Scan failed");
                sink.emit(MergeEvent::error(e.to_string()));
                self.cancel.reset();
                self.set_phase(RunPhase::Idle);
                return Err(e);
            }
        };
        info!(sidecars = sidecars.len(), "Scan complete");

        self.set_phase(RunPhase::Pairing);
        let pairings = PairingResolver::new(&self.settings).resolve_all(&sidecars);

        self.set_phase(RunPhase::Processing);
        let total = pairings.len();
        sink.progress(0, total);
        let (outcomes, cancelled) = self.process_all(pairings, sink).await;
        self.cancel.reset();

        self.set_phase(RunPhase::Reporting);
        let report = MergeReport::new(outcomes, cancelled);
        let summary = report.summary();
        info!(
            written = summary.written,
            planned = summary.planned,
            no_media = summary.no_media,
            failed = summary.failed(),
            cancelled = summary.cancelled,
            "Merge run complete"
        );
        sink.emit(MergeEvent::info(format!("Run complete: {}", summary)));

        self.set_phase(RunPhase::Idle);
        Ok(report)
    }

    async fn process_all(
        &self,
        pairings: Vec<FilePairing>,
        sink: &dyn EventSink,
    ) -> (Vec<FileOutcome>, usize) {
        let total = pairings.len();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let ctx = Arc::new(PairContext {
            settings: Arc::clone(&self.settings),
            writer: Arc::clone(&self.writer),
            resolver: self.resolver.clone(),
            write_timeout: self.options.write_timeout,
            dry_run: self.options.dry_run,
        });

        let mut tasks = JoinSet::new();
        let mut task_sidecars: HashMap<tokio::task::Id, PathBuf> = HashMap::new();
        for pairing in pairings {
            let semaphore = Arc::clone(&semaphore);
            let ctx = Arc::clone(&ctx);
            let cancel = self.cancel.clone();
            let sidecar = pairing.sidecar.clone();

            let handle = tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return PairResult::Cancelled;
                };
                if cancel.is_cancelled() {
                    return PairResult::Cancelled;
                }
                PairResult::Done(process_pair(&ctx, pairing).await)
            });
            task_sidecars.insert(handle.id(), sidecar);
        }

        let mut outcomes = Vec::new();
        let mut cancelled = 0;
        let mut done = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(PairResult::Done(pair_outcomes)) => {
                    for outcome in &pair_outcomes {
                        emit_outcome(sink, outcome);
                    }
                    outcomes.extend(pair_outcomes);
                }
                Ok(PairResult::Cancelled) => cancelled += 1,
                Err(e) => {
                    error!(error = %e, "Pair task failed");
                    let reason = format!("Internal task failure: {}", e);
                    match task_sidecars.remove(&e.id()) {
                        Some(sidecar) => {
                            let outcome = FileOutcome::for_sidecar(
                                sidecar,
                                OutcomeStatus::WriteFailed { reason },
                            );
                            emit_outcome(sink, &outcome);
                            outcomes.push(outcome);
                        }
                        None => sink.emit(MergeEvent::error(reason)),
                    }
                }
            }
            done += 1;
            sink.progress(done, total);
        }

        if cancelled > 0 {
            sink.emit(MergeEvent::warning(format!(
                "Run cancelled, {} sidecars skipped",
                cancelled
            )));
        }
        (outcomes, cancelled)
    }

    fn set_phase(&self, phase: RunPhase) {
        debug!(%phase, "Run phase");
        self.phase.send_replace(phase);
    }
}

impl fmt::Debug for MergeOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeOrchestrator")
            .field("settings", &self.settings)
            .field("writer", &self.writer)
            .field("options", &self.options)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

async fn process_pair(ctx: &PairContext, pairing: FilePairing) -> Vec<FileOutcome> {
    let sidecar = pairing.sidecar;
    if pairing.candidates.is_empty() {
        debug!(sidecar = %sidecar.display(), "No media for sidecar");
        return vec![FileOutcome::for_sidecar(sidecar, OutcomeStatus::NoMedia)];
    }

    let record = match read_sidecar(&sidecar) {
        Ok(record) => record,
        Err(e) => {
            return vec![FileOutcome::for_sidecar(
                sidecar,
                OutcomeStatus::ParseFailed {
                    reason: e.to_string(),
                },
            )]
        }
    };

    let planned = MergePlanner::new(&ctx.settings, &ctx.resolver).plan(&record);
    let warnings: Vec<String> = planned.warnings.iter().map(ToString::to_string).collect();
    let plan = planned.plan;

    let mut outcomes = Vec::with_capacity(pairing.candidates.len());
    for candidate in pairing.candidates {
        let status = if ctx.dry_run {
            OutcomeStatus::Planned { plan: plan.clone() }
        } else {
            match write_with_timeout(ctx, &candidate.path, &plan).await {
                Ok(()) => OutcomeStatus::Written { fields: plan.tags() },
                Err(e) => OutcomeStatus::WriteFailed {
                    reason: e.to_string(),
                },
            }
        };

        outcomes.push(FileOutcome {
            sidecar: sidecar.clone(),
            target: Some(candidate.path),
            kind: Some(candidate.kind),
            status,
            warnings: warnings.clone(),
        });
    }
    outcomes
}

async fn write_with_timeout(
    ctx: &PairContext,
    target: &Path,
    plan: &FieldPlan,
) -> Result<()> {
    match tokio::time::timeout(ctx.write_timeout, ctx.writer.write(target, plan)).await {
        Ok(result) => result,
        Err(_) => Err(MergeError::WriteTimeout {
            path: target.to_path_buf(),
            timeout: ctx.write_timeout,
        }),
    }
}

fn emit_outcome(sink: &dyn EventSink, outcome: &FileOutcome) {
    for warning in &outcome.warnings {
        let mut event = MergeEvent::warning(warning.clone()).with_sidecar(&outcome.sidecar);
        if let Some(target) = &outcome.target {
            event = event.with_target(target);
        }
        sink.emit(event);
    }

    let event = match &outcome.status {
        OutcomeStatus::Written { fields } => {
            MergeEvent::info(format!("Wrote {} tags", fields.len()))
        }
        OutcomeStatus::Planned { plan } => {
            MergeEvent::info(format!("Would write {} tags", plan.len()))
        }
        OutcomeStatus::NoMedia => MergeEvent::info("No media file matches this sidecar"),
        OutcomeStatus::ParseFailed { reason } => MergeEvent::error(reason.clone()),
        OutcomeStatus::WriteFailed { reason } => MergeEvent::error(reason.clone()),
    };
    let event = event.with_sidecar(&outcome.sidecar);
    sink.emit(match &outcome.target {
        Some(target) => event.with_target(target),
        None => event,
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::{CollectingSink, EventLevel};
    use crate::time::StaticLookup;
    use crate::writer::mock::MockWriter;
    use std::fs;
    use tempfile::TempDir;

    fn orchestrator(writer: MockWriter) -> MergeOrchestrator {
        let settings = MergeSettings {
            timezone_offset: "+0000".to_string(),
            ..MergeSettings::default()
        };
        let resolver = TimeResolver::new(Arc::new(StaticLookup::none()));
        MergeOrchestrator::new(settings, Arc::new(writer), resolver)
    }

    #[test]
    fn test_cancel_handle_shared() {
        let handle = CancelHandle::new();
        let other = handle.clone();
        assert!(!other.is_cancelled());
        handle.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.performance.max_concurrency = 3;
        config.writer.timeout_secs = 7;
        let options = RunOptions::from_config(&config);
        assert_eq!(options.concurrency, 3);
        assert_eq!(options.write_timeout, Duration::from_secs(7));
        assert!(!options.dry_run);
    }

    #[tokio::test]
    async fn test_phase_returns_to_idle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg.json"), r#"{"title":"A"}"#).unwrap();
        fs::write(dir.path().join("a.jpg"), "").unwrap();

        let orch = orchestrator(MockWriter::new());
        let mut phases = orch.subscribe();
        let report = orch.run(&[dir.path()], &CollectingSink::new()).await.unwrap();

        assert_eq!(report.summary().written, 1);
        assert_eq!(orch.phase(), RunPhase::Idle);
        assert!(phases.has_changed().unwrap());
        assert_eq!(*phases.borrow_and_update(), RunPhase::Idle);
    }

    #[tokio::test]
    async fn test_scan_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let sink = CollectingSink::new();
        let err = orchestrator(MockWriter::new())
            .run(&[dir.path().join("missing")], &sink)
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(sink.at_level(EventLevel::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(dir.path().join(format!("{name}.jpg.json")), "{}").unwrap();
            fs::write(dir.path().join(format!("{name}.jpg")), "").unwrap();
        }

        let writer = MockWriter::new();
        let orch = orchestrator(writer.clone());
        orch.cancel_handle().cancel();
        let report = orch.run(&[dir.path()], &CollectingSink::new()).await.unwrap();

        assert_eq!(report.cancelled, 3);
        assert!(report.outcomes.is_empty());
        assert_eq!(writer.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_is_cleared_for_next_run() {
        let dir = TempDir::new().unwrap();
        for name in ["a", "b"] {
            fs::write(dir.path().join(format!("{name}.jpg.json")), "{}").unwrap();
            fs::write(dir.path().join(format!("{name}.jpg")), "").unwrap();
        }

        let writer = MockWriter::new();
        let orch = orchestrator(writer.clone());
        orch.cancel_handle().cancel();
        let first = orch.run(&[dir.path()], &CollectingSink::new()).await.unwrap();
        assert_eq!(first.cancelled, 2);
        assert!(!orch.cancel_handle().is_cancelled());

        let second = orch.run(&[dir.path()], &CollectingSink::new()).await.unwrap();
        assert_eq!(second.cancelled, 0);
        assert_eq!(second.summary().written, 2);
        assert_eq!(writer.calls(), 2);
    }

    /// Panics on one file, records the rest
    #[derive(Debug)]
    struct PanickingWriter {
        poisoned: PathBuf,
        inner: MockWriter,
    }

    #[async_trait::async_trait]
    impl MetadataWriter for PanickingWriter {
        async fn write(&self, target: &Path, plan: &FieldPlan) -> Result<()> {
            if target == self.poisoned {
                panic!("writer crashed on {}", target.display());
            }
            self.inner.write(target, plan).await
        }
    }

    #[tokio::test]
    async fn test_panicking_pair_is_reported_as_failure() {
        let dir = TempDir::new().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(dir.path().join(format!("{name}.jpg.json")), r#"{"title":"T"}"#).unwrap();
            fs::write(dir.path().join(format!("{name}.jpg")), "").unwrap();
        }

        let inner = MockWriter::new();
        let writer = PanickingWriter {
            poisoned: dir.path().join("b.jpg"),
            inner: inner.clone(),
        };
        let settings = MergeSettings {
            timezone_offset: "+0000".to_string(),
            ..MergeSettings::default()
        };
        let resolver = TimeResolver::new(Arc::new(StaticLookup::none()));
        let orch = MergeOrchestrator::new(settings, Arc::new(writer), resolver);
        let sink = CollectingSink::new();
        let report = orch.run(&[dir.path()], &sink).await.unwrap();

        let summary = report.summary();
        assert_eq!(summary.written, 2);
        assert_eq!(summary.write_failed, 1);
        assert_eq!(report.outcomes.len(), 3);

        let failed = report
            .outcomes
            .iter()
            .find(|o| matches!(o.status, OutcomeStatus::WriteFailed { .. }))
            .unwrap();
        assert_eq!(failed.sidecar, dir.path().join("b.jpg.json"));
        assert_eq!(sink.at_level(EventLevel::Error).len(), 1);
    }
}
