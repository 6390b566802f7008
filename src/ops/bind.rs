//! Implementation of `macbind bind`.
//!
//! Runs the stages strictly in order, each blocking:
//!
//! 1. validate the configuration and resolve package names
//! 2. run the binding generator once
//! 3. build one static archive per architecture
//! 4. render the bundle skeleton and fuse the archives into it
//! 5. install headers, resources and the module map
//!
//! The first failing stage ends the run.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::info;

use crate::builder::archive;
use crate::builder::errors::{BindError, Stage};
use crate::builder::events::{BindObserver, NoopObserver};
use crate::builder::fat::{self, ArchiveArtifact};
use crate::builder::framework::{self, FrameworkLayout, HeaderPlan};
use crate::builder::generator;
use crate::builder::package_names;
use crate::core::bind_config::BindConfig;
use crate::util::fs::{ensure_dir, DiskFs, Filesystem};
use crate::util::process::{
    CancelToken, Executor, ProcessBuilder, ProcessError, ProcessOutput, SystemExecutor,
};

/// A finished framework.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    /// `<Name>.framework`
    pub framework: PathBuf,
    /// The fat archive inside the bundle
    pub binary: PathBuf,
    /// Per-architecture archives, in target order
    pub archives: Vec<ArchiveArtifact>,
    /// Headers declared in the module map after `ref.h`
    pub headers: Vec<String>,
    pub duration: Duration,
}

/// Refuses to start commands once the token is cancelled.
struct Guarded<'a> {
    inner: &'a mut dyn Executor,
    cancel: Option<&'a CancelToken>,
}

impl Executor for Guarded<'_> {
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(ProcessError::Aborted {
                command: cmd.display_command(),
            });
        }
        self.inner.run(cmd)
    }
}

/// The bind pipeline over an executor and a filesystem.
pub struct Binder<'a> {
    exec: &'a mut dyn Executor,
    fs: &'a mut dyn Filesystem,
    observer: Box<dyn BindObserver + 'a>,
    cancel: Option<CancelToken>,
}

impl<'a> Binder<'a> {
    pub fn new(exec: &'a mut dyn Executor, fs: &'a mut dyn Filesystem) -> Self {
        Binder {
            exec,
            fs,
            observer: Box::new(NoopObserver),
            cancel: None,
        }
    }

    pub fn with_observer(mut self, observer: impl BindObserver + 'a) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Stop before the next command once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the whole pipeline for `config`.
    pub fn run(&mut self, config: &BindConfig) -> Result<BindOutcome, BindError> {
        let start = Instant::now();
        let result = self.run_stages(config, start);
        self.observer.finished(result.as_ref(), start.elapsed());
        result
    }

    fn run_stages(&mut self, config: &BindConfig, start: Instant) -> Result<BindOutcome, BindError> {
        let mut exec = Guarded {
            inner: &mut *self.exec,
            cancel: self.cancel.as_ref(),
        };
        let fs = &mut *self.fs;
        let observer = &mut self.observer;

        observer.stage_started(Stage::Configuration);
        config.validate()?;
        let resolved = package_names::resolve(&mut exec, config)?;
        let config: &BindConfig = &resolved;
        let layout = FrameworkLayout::new(config.output_path()?, config.title());
        info!(
            "binding {} into {}",
            config
                .packages
                .iter()
                .map(|p| p.import_path())
                .collect::<Vec<_>>()
                .join(", "),
            layout.root().display()
        );

        observer.stage_started(Stage::Generation);
        let generated = generator::generate(&mut exec, fs, config)?;

        observer.stage_started(Stage::ArchitectureBuild);
        let mut archives = Vec::with_capacity(config.targets.len());
        for target in &config.targets {
            let path = archive::build_archive(&mut exec, fs, config, target)?;
            observer.archive_built(target.arch, &path);
            archives.push(ArchiveArtifact {
                arch: target.arch,
                path,
            });
        }

        observer.stage_started(Stage::Fusion);
        framework::render_skeleton(fs, &layout)?;
        fat::fuse(&mut exec, fs, config, &archives, &layout.binary_path())?;

        observer.stage_started(Stage::Assembly);
        let plan = HeaderPlan::new(
            layout.title(),
            &config.packages,
            &config.prefix,
            &generated,
        );
        framework::install_contents(fs, &layout, &plan)?;
        info!("framework ready at {}", layout.root().display());

        Ok(BindOutcome {
            framework: layout.root().to_path_buf(),
            binary: layout.binary_path(),
            archives,
            headers: plan.manifest,
            duration: start.elapsed(),
        })
    }
}

/// Scratch directory for one run.
#[derive(Debug)]
pub enum WorkDir {
    /// Removed when dropped
    Temp(TempDir),
    /// Left in place
    Kept(PathBuf),
}

impl WorkDir {
    /// Use `configured` as-is, or create a fresh temporary directory.
    ///
    /// With `keep`, a temporary directory survives the run and its path is
    /// logged.
    pub fn prepare(configured: Option<&Path>, keep: bool) -> Result<Self> {
        if let Some(dir) = configured {
            ensure_dir(dir)?;
            return Ok(WorkDir::Kept(dir.to_path_buf()));
        }

        let tmp = tempfile::Builder::new()
            .prefix("macbind-work-")
            .tempdir()
            .context("failed to create temporary work directory")?;
        if keep {
            #[allow(deprecated)]
            let path = tmp.into_path();
            info!("WORK={}", path.display());
            Ok(WorkDir::Kept(path))
        } else {
            Ok(WorkDir::Temp(tmp))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            WorkDir::Temp(tmp) => tmp.path(),
            WorkDir::Kept(path) => path,
        }
    }
}

/// Options for [`bind`].
#[derive(Default)]
pub struct BindOptions {
    /// Observer notified of stages and artifacts
    pub observer: Option<Box<dyn BindObserver>>,
    /// Abort running commands when set
    pub cancel: Option<CancelToken>,
}

/// Run the pipeline against the real filesystem and real tools.
pub fn bind(config: &BindConfig, options: BindOptions) -> Result<BindOutcome, BindError> {
    let mut exec = SystemExecutor::new();
    if let Some(token) = &options.cancel {
        exec = exec.with_cancel(token.clone());
    }
    let mut disk = DiskFs;

    let mut binder = Binder::new(&mut exec, &mut disk);
    if let Some(observer) = options.observer {
        binder = binder.with_observer(observer);
    }
    if let Some(token) = options.cancel {
        binder = binder.with_cancel(token);
    }
    binder.run(config)
}
