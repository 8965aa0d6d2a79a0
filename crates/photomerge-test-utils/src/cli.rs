// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 photomerge Contributors

//! CLI command helpers for testing the photomerge binary.
//!
//! Provides convenient wrappers around assert_cmd. Every helper that runs a
//! command expects an explicit config path so tests never touch the user's
//! real settings file.

use assert_cmd::Command;
use std::path::Path;

/// Environment variables that would leak host settings into a test run
const OVERRIDE_VARS: &[&str] = &[
    "PHOTOMERGE_EDITED_SUFFIX",
    "PHOTOMERGE_TIMEZONE_OFFSET",
    "PHOTOMERGE_INFER_TIMEZONE_FROM_GPS",
    "PHOTOMERGE_EXIFTOOL_PATH",
    "PHOTOMERGE_WRITE_TIMEOUT_SECS",
    "PHOTOMERGE_MAX_CONCURRENCY",
    "PHOTOMERGE_LOG_LEVEL",
];

/// Creates a new photomerge Command for testing.
///
/// # Example
/// ```ignore
/// use photomerge_test_utils::photomerge;
///
/// photomerge()
///     .args(["--config", "/tmp/x/config.toml", "settings", "show"])
///     .assert()
///     .success();
/// ```
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn photomerge() -> Command {
    let mut cmd = Command::cargo_bin("photomerge").expect("photomerge binary not found");
    for var in OVERRIDE_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Fluent API wrapper for common photomerge command patterns.
pub struct PhotomergeCommand {
    cmd: Command,
}

impl PhotomergeCommand {
    /// Command bound to the given settings file.
    pub fn with_config(config: &Path) -> Self {
        let mut cmd = photomerge();
        cmd.arg("--config").arg(config);
        Self { cmd }
    }

    /// Add an argument to the command.
    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Add multiple arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    /// Execute the command and assert success.
    pub fn run_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Execute the command and assert failure.
    pub fn run_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Get the underlying Command for custom assertions.
    pub fn into_inner(self) -> Command {
        self.cmd
    }

    /// Set one setting, asserting success.
    pub fn set(config: &Path, key: &str, value: &str) {
        Self::with_config(config)
            .args(["settings", "set", key, value])
            .run_success();
    }
}
