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

//! User-facing run events
//!
//! The orchestrator describes what happened; an [`EventSink`] decides where
//! it goes.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    /// Degraded, but the file was still handled
    Warning,
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventLevel::Info => "info",
            EventLevel::Warning => "warning",
            EventLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// One human-readable event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeEvent {
    pub level: EventLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
}

impl MergeEvent {
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            sidecar: None,
            target: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventLevel::Error, message)
    }

    pub fn with_sidecar(mut self, sidecar: impl Into<PathBuf>) -> Self {
        self.sidecar = Some(sidecar.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Receives events as a run progresses
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MergeEvent);

    /// `done` of `total` sidecars finished
    fn progress(&self, _done: usize, _total: usize) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: MergeEvent) {
        let sidecar = event
            .sidecar
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let target = event
            .target
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        match event.level {
            EventLevel::Info => tracing::info!(%sidecar, %target, "{}", event.message),
            EventLevel::Warning => tracing::warn!(%sidecar, %target, "{}", event.message),
            EventLevel::Error => tracing::error!(%sidecar, %target, "{}", event.message),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<MergeEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, in order
    pub fn events(&self) -> Vec<MergeEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Events at exactly `level`
    pub fn at_level(&self, level: EventLevel) -> Vec<MergeEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: MergeEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
