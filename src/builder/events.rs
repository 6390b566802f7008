//! Bind events and pipeline observers.
//!
//! [`BindEvent`] defines the stable JSON schema printed with
//! `--message-format json`, one object per line.
//!
//! # Event Types
//!
//! - `bind-stage`: A pipeline stage started
//! - `compiler-artifact`: An architecture archive was produced
//! - `bind-finished`: The run completed (success or failure)
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::builder::errors::{BindError, Stage};
use crate::core::arch::Arch;
use crate::ops::bind::BindOutcome;

/// A bind event emitted during the run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BindEvent {
    /// A pipeline stage started.
    #[serde(rename = "bind-stage")]
    Stage { stage: Stage },

    /// An architecture archive was produced.
    #[serde(rename = "compiler-artifact")]
    CompilerArtifact {
        /// Architecture tag (e.g., "arm64")
        target: String,
        /// Output filenames
        filenames: Vec<PathBuf>,
    },

    /// Run completed (success or failure).
    #[serde(rename = "bind-finished")]
    BindFinished {
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Framework bundle path on success
        #[serde(skip_serializing_if = "Option::is_none")]
        framework: Option<PathBuf>,
        /// Failing stage on error
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<Stage>,
        /// Offending architecture, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        arch: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl BindEvent {
    /// Create an artifact event.
    pub fn artifact(arch: Arch, path: impl Into<PathBuf>) -> Self {
        BindEvent::CompilerArtifact {
            target: arch.tag().to_string(),
            filenames: vec![path.into()],
        }
    }

    /// Create a finished event from the run result.
    pub fn finished(result: Result<&BindOutcome, &BindError>, elapsed: Duration) -> Self {
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(outcome) => BindEvent::BindFinished {
                success: true,
                duration_ms,
                framework: Some(outcome.framework.clone()),
                stage: None,
                arch: None,
                message: None,
            },
            Err(err) => BindEvent::BindFinished {
                success: false,
                duration_ms,
                framework: None,
                stage: Some(err.stage()),
                arch: err.arch().map(|a| a.tag().to_string()),
                message: Some(err.to_string()),
            },
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives progress notifications from the bind pipeline.
///
/// Observers never affect the outcome of a run.
pub trait BindObserver {
    fn stage_started(&mut self, _stage: Stage) {}

    fn archive_built(&mut self, _arch: Arch, _path: &Path) {}

    fn finished(&mut self, _result: Result<&BindOutcome, &BindError>, _elapsed: Duration) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BindObserver for NoopObserver {}

impl<T: BindObserver + ?Sized> BindObserver for &mut T {
    fn stage_started(&mut self, stage: Stage) {
        (**self).stage_started(stage)
    }

    fn archive_built(&mut self, arch: Arch, path: &Path) {
        (**self).archive_built(arch, path)
    }

    fn finished(&mut self, result: Result<&BindOutcome, &BindError>, elapsed: Duration) {
        (**self).finished(result, elapsed)
    }
}

impl<T: BindObserver + ?Sized> BindObserver for Box<T> {
    fn stage_started(&mut self, stage: Stage) {
        (**self).stage_started(stage)
    }

    fn archive_built(&mut self, arch: Arch, path: &Path) {
        (**self).archive_built(arch, path)
    }

    fn finished(&mut self, result: Result<&BindOutcome, &BindError>, elapsed: Duration) {
        (**self).finished(result, elapsed)
    }
}

/// Forwards every notification to each observer in order.
impl<T: BindObserver> BindObserver for Vec<T> {
    fn stage_started(&mut self, stage: Stage) {
        for o in self.iter_mut() {
            o.stage_started(stage);
        }
    }

    fn archive_built(&mut self, arch: Arch, path: &Path) {
        for o in self.iter_mut() {
            o.archive_built(arch, path);
        }
    }

    fn finished(&mut self, result: Result<&BindOutcome, &BindError>, elapsed: Duration) {
        for o in self.iter_mut() {
            o.finished(result, elapsed);
        }
    }
}

/// Copies each architecture archive into a side directory for inspection.
///
/// Copy failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct ArchiveStash {
    dir: PathBuf,
}

impl ArchiveStash {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArchiveStash { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stash(&self, path: &Path) -> io::Result<PathBuf> {
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "archive path has no file name")
        })?;
        fs::create_dir_all(&self.dir)?;
        let dest = self.dir.join(name);
        fs::copy(path, &dest)?;
        Ok(dest)
    }
}

impl BindObserver for ArchiveStash {
    fn archive_built(&mut self, arch: Arch, path: &Path) {
        match self.stash(path) {
            Ok(dest) => debug!("stashed {} archive at {}", arch, dest.display()),
            Err(e) => warn!(
                "could not stash {} archive in {}: {}",
                arch,
                self.dir.display(),
                e
            ),
        }
    }
}

/// Prints one [`BindEvent`] per line.
#[derive(Debug)]
pub struct JsonEvents<W: Write> {
    out: W,
}

impl JsonEvents<io::Stdout> {
    pub fn stdout() -> Self {
        JsonEvents { out: io::stdout() }
    }
}

impl<W: Write> JsonEvents<W> {
    pub fn new(out: W) -> Self {
        JsonEvents { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &BindEvent) {
        if let Err(e) = writeln!(self.out, "{}", event.to_json()) {
            warn!("could not write event: {}", e);
        }
    }
}

impl<W: Write> BindObserver for JsonEvents<W> {
    fn stage_started(&mut self, stage: Stage) {
        self.emit(&BindEvent::Stage { stage });
    }

    fn archive_built(&mut self, arch: Arch, path: &Path) {
        self.emit(&BindEvent::artifact(arch, path));
    }

    fn finished(&mut self, result: Result<&BindOutcome, &BindError>, elapsed: Duration) {
        self.emit(&BindEvent::finished(result, elapsed));
    }
}
