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

//! `exiftool` backed writer

use super::MetadataWriter;
use crate::error::{MergeError, Result};
use crate::plan::{FieldPlan, Tag, TagValue};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs `exiftool` once per file
#[derive(Debug, Clone)]
pub struct ExiftoolWriter {
    program: String,
}

impl ExiftoolWriter {
    /// Writer using `program` (a name on `PATH` or a full path)
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable this writer runs
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Installed exiftool version, from `exiftool -ver`
    pub async fn version(&self) -> Result<String> {
        let output = self.run(["-ver"]).await?;
        if !output.status.success() {
            return Err(self.unavailable(failure_text(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Command line arguments for writing `plan` into `target`
    pub fn build_args(target: &Path, plan: &FieldPlan) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-overwrite_original".into()];
        if plan.ignore_minor_errors {
            args.push("-m".into());
        }
        if !plan.overwrite_existing {
            // create missing tags only
            args.push("-wm".into());
            args.push("cg".into());
        }

        for (tag, value) in &plan.fields {
            args.push(format!("-{}={}", tag.name(), magnitude(value)).into());
            if let Some(reference) = gps_reference(*tag, value) {
                args.push(reference.into());
            }
        }

        args.push(target.as_os_str().to_owned());
        args
    }

    async fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => self.unavailable(e.to_string()),
                _ => MergeError::Io(e),
            })
    }

    fn unavailable(&self, reason: String) -> MergeError {
        MergeError::ToolUnavailable {
            program: self.program.clone(),
            reason,
        }
    }
}

impl Default for ExiftoolWriter {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

#[async_trait]
impl MetadataWriter for ExiftoolWriter {
    #[instrument(skip(self, plan), fields(target = %target.display(), tags = plan.len()))]
    async fn write(&self, target: &Path, plan: &FieldPlan) -> Result<()> {
        if plan.is_empty() {
            debug!("Empty plan, nothing to write");
            return Ok(());
        }

        let output = self.run(Self::build_args(target, plan)).await?;
        if !output.status.success() {
            return Err(MergeError::write(target, failure_text(&output)));
        }

        debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "exiftool finished"
        );
        Ok(())
    }
}

/// GPS values are written unsigned; the sign lives in the matching `Ref` tag
fn magnitude(value: &TagValue) -> String {
    match value {
        TagValue::Number(n) => n.abs().to_string(),
        TagValue::Text(s) => s.clone(),
    }
}

fn gps_reference(tag: Tag, value: &TagValue) -> Option<String> {
    let TagValue::Number(n) = value else {
        return None;
    };
    let negative = *n < 0.0;
    let reference = match tag {
        Tag::GpsLatitude => format!("-GPSLatitudeRef={}", if negative { "S" } else { "N" }),
        Tag::GpsLongitude => format!("-GPSLongitudeRef={}", if negative { "W" } else { "E" }),
        Tag::GpsAltitude => format!(
            "-GPSAltitudeRef={}",
            if negative { "Below Sea Level" } else { "Above Sea Level" }
        ),
        _ => return None,
    };
    Some(reference)
}

fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }
    format!("exiftool exited with {}", output.status)
}
