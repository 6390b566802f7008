//! Centralized shell output and progress management.
//!
//! The Shell module provides a unified API for human CLI output:
//! - Status messages with consistent formatting
//! - Progress bars (via indicatif)
//! - A [`BindObserver`] that reports pipeline stages
//!
//! Machine-readable output goes through
//! [`JsonEvents`](crate::builder::events::JsonEvents) instead; in JSON mode
//! the shell prints nothing but errors.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::errors::{BindError, Stage};
use crate::builder::events::BindObserver;
use crate::core::arch::Arch;
use crate::core::bind_config::BindConfig;
use crate::ops::bind::BindOutcome;

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors and progress bars.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    /// Default: status messages + progress bars
    #[default]
    Normal,
    /// --verbose: immediate status lines, no progress bars
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success (green)
    Finished,

    // In progress (cyan)
    Generating,
    Compiling,
    Fusing,
    Assembling,

    // Info (blue)
    Info,

    // Warning (yellow)
    Warning,

    // Error (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Generating => "Generating",
            Status::Compiling => "Compiling",
            Status::Fusing => "Fusing",
            Status::Assembling => "Assembling",
            Status::Info => "Info",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished => "\x1b[1;32m",
            Status::Generating | Status::Compiling | Status::Fusing | Status::Assembling => {
                "\x1b[1;36m"
            }
            Status::Info => "\x1b[1;34m",
            Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Width statuses are right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    /// Create a new shell with the given mode.
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Create a shell from CLI flags with proper precedence.
    ///
    /// JSON mode takes precedence over quiet/verbose.
    pub fn from_flags(quiet: bool, verbose: bool, message_format_json: bool) -> Self {
        let mode = if message_format_json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human {
                verbosity,
                color: ColorChoice::Auto,
            }
        };

        Shell::new(mode)
    }

    pub fn mode(&self) -> &ShellMode {
        &self.mode
    }

    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`
    ///
    /// In quiet and JSON mode, only Error status is printed.
    pub fn status(&self, status: Status, msg: impl Display) {
        if (self.is_quiet() || self.is_json()) && status != Status::Error {
            return;
        }

        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    /// Create a progress bar.
    ///
    /// In quiet, verbose or JSON mode, returns a no-op progress bar.
    pub fn progress(self: &Arc<Self>, total: u64, msg: impl Display) -> Progress {
        Progress::new(Arc::clone(self), total, msg.to_string())
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

/// Progress bar wrapper that respects shell mode.
pub struct Progress {
    shell: Arc<Shell>,
    pb: Option<ProgressBar>,
    total: u64,
    current: u64,
    message: String,
}

impl Progress {
    fn new(shell: Arc<Shell>, total: u64, message: String) -> Self {
        let pb = if shell.is_quiet() || shell.is_verbose() || shell.is_json() || total <= 1 {
            None
        } else {
            let pb = ProgressBar::new(total);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.set_message(message.clone());
            Some(pb)
        };

        Progress {
            shell,
            pb,
            total,
            current: 0,
            message,
        }
    }

    /// Increment progress.
    pub fn inc(&mut self, delta: u64) {
        self.current += delta;

        if let Some(pb) = &self.pb {
            pb.inc(delta);
        }

        if self.shell.is_verbose() {
            eprintln!("  {} [{}/{}]", self.message, self.current, self.total);
        }
    }

    /// Finish the progress bar.
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }

    pub fn position(&self) -> u64 {
        self.current
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Reports bind stages as status lines and a per-architecture progress bar.
pub struct ShellObserver {
    shell: Arc<Shell>,
    packages: Vec<String>,
    archs: Vec<Arch>,
    progress: Option<Progress>,
}

impl ShellObserver {
    pub fn new(shell: Arc<Shell>, config: &BindConfig) -> Self {
        ShellObserver {
            shell,
            packages: config
                .packages
                .iter()
                .map(|p| p.import_path().to_string())
                .collect(),
            archs: config.targets.iter().map(|t| t.arch).collect(),
            progress: None,
        }
    }

    fn finish_progress(&mut self) {
        if let Some(progress) = self.progress.take() {
            progress.finish();
        }
    }
}

impl BindObserver for ShellObserver {
    fn stage_started(&mut self, stage: Stage) {
        match stage {
            Stage::Configuration => {}
            Stage::Generation => {
                self.shell
                    .status(Status::Generating, format!("bindings for {}", self.packages.join(", ")));
            }
            Stage::ArchitectureBuild => {
                let tags: Vec<&str> = self.archs.iter().map(Arch::tag).collect();
                self.shell
                    .status(Status::Compiling, format!("darwin/{{{}}}", tags.join(",")));
                self.progress = Some(self.shell.progress(self.archs.len() as u64, "Compiling"));
            }
            Stage::Fusion => {
                self.finish_progress();
                self.shell
                    .status(Status::Fusing, format!("{} archive(s)", self.archs.len()));
            }
            Stage::Assembly => {
                // The bundle path is reported on finish.
                self.shell
                    .status(Status::Assembling, "headers, resources and module map");
            }
        }
    }

    fn archive_built(&mut self, arch: Arch, path: &Path) {
        if let Some(progress) = &mut self.progress {
            progress.inc(1);
        }
        if self.shell.is_verbose() {
            self.shell
                .note(format!("darwin/{} -> {}", arch, path.display()));
        }
    }

    fn finished(&mut self, result: Result<&BindOutcome, &BindError>, elapsed: Duration) {
        self.finish_progress();
        if let Ok(outcome) = result {
            self.shell.status(
                Status::Finished,
                format!(
                    "{} in {}",
                    outcome.framework.display(),
                    format_duration(elapsed)
                ),
            );
        }
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_modes() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.is_json());

        let quiet_shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        });
        assert!(quiet_shell.is_quiet());

        let json_shell = Shell::new(ShellMode::Json);
        assert!(json_shell.is_json());
        assert!(!json_shell.use_color());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "0.50s");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.00s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });

        let formatted = shell.format_status(Status::Fusing);
        assert_eq!(formatted.trim(), "Fusing");
        assert_eq!(formatted.len(), STATUS_WIDTH);
    }

    #[test]
    fn test_from_flags() {
        assert!(Shell::from_flags(true, false, false).is_quiet());
        assert!(Shell::from_flags(false, true, false).is_verbose());

        // JSON takes precedence
        let shell = Shell::from_flags(true, true, true);
        assert!(shell.is_json());
        assert!(!shell.is_quiet());
    }

    #[test]
    fn test_progress_disabled_when_quiet() {
        let shell = Arc::new(Shell::from_flags(true, false, false));
        let mut progress = shell.progress(3, "Compiling");
        progress.inc(1);
        progress.inc(1);
        assert_eq!(progress.position(), 2);
        assert_eq!(progress.total(), 3);
        assert!(progress.pb.is_none());
    }

    #[test]
    fn test_shell_observer_tracks_archives() {
        use crate::test_support::packages;

        let shell = Arc::new(Shell::from_flags(true, false, false));
        let config = BindConfig::new(packages(&["foo"]), "/work");
        let mut observer = ShellObserver::new(shell, &config);

        observer.stage_started(Stage::ArchitectureBuild);
        observer.archive_built(Arch::Arm64, Path::new("/work/foo-arm64.a"));
        assert_eq!(observer.progress.as_ref().map(Progress::position), Some(1));

        observer.stage_started(Stage::Fusion);
        assert!(observer.progress.is_none());
        assert_eq!(observer.archs, vec![Arch::Arm64, Arch::X86_64]);
    }
}
