//! Environment and toolchain health checks.
//!
//! The `doctor` command performs fast environment checks to verify
//! that all required tools are available and properly configured.
//!
//! ## Usage
//!
//! ```bash
//! macbind doctor           # Quick check
//! macbind doctor --verbose # Detailed output
//! ```
//!
//! ## Checks Performed
//!
//! - Binding generator (`gobind`)
//! - Go toolchain (`go version`)
//! - Archive fusion tool (`xcrun lipo`, or whatever `[tools] lipo` names)
//! - Host platform (optional; frameworks are only loadable on macOS)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::core::bind_config::{ToolCommand, Tools};
use crate::util::process::{find_executable, ProcessBuilder};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..CheckResult::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the tool path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: HashMap<String, String>,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        DoctorReport::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Tool locations to check (from config and flags)
    pub tools: Tools,
}

/// Run the doctor command.
pub fn doctor(options: &DoctorOptions) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    if let Some(gopath) = std::env::var_os("GOPATH") {
        report
            .environment
            .insert("GOPATH".to_string(), gopath.to_string_lossy().into_owned());
    }

    report.add(check_tool("Binding generator", &options.tools.gobind, None));
    report.add(check_tool("Go toolchain", &options.tools.go, Some("version")));
    report.add(check_lipo(&options.tools.lipo));
    report.add(check_host());

    report.total_duration = start.elapsed();
    Ok(report)
}

/// Locate `tool` and, when `version_arg` is given, read the first line it prints.
fn check_tool(name: &str, tool: &ToolCommand, version_arg: Option<&str>) -> CheckResult {
    let start = Instant::now();

    let Some(path) = locate(&tool.program) else {
        return CheckResult::fail(name, format!("{} not found", tool.program.display()))
            .with_duration(start.elapsed());
    };

    let mut result = CheckResult::pass(name, format!("Found {}", tool.program.display()))
        .with_path(path.clone());
    if let Some(arg) = version_arg {
        if let Some(version) = first_line(ProcessBuilder::new(&path).args(&tool.args).arg(arg)) {
            result = result.with_version(version);
        }
    }
    result.with_duration(start.elapsed())
}

/// `xcrun lipo` is checked through `xcrun --find lipo`.
fn check_lipo(tool: &ToolCommand) -> CheckResult {
    let start = Instant::now();
    let name = "Archive fusion";

    let is_xcrun = tool.program.file_name().is_some_and(|n| n == "xcrun");
    if !is_xcrun {
        return check_tool(name, tool, None);
    }

    let Some(xcrun) = locate(&tool.program) else {
        return CheckResult::fail(name, "xcrun not found (install the Xcode command line tools)")
            .with_duration(start.elapsed());
    };

    let found = first_line(ProcessBuilder::new(&xcrun).arg("--find").args(&tool.args));
    match found {
        Some(lipo) => CheckResult::pass(name, format!("Found {}", tool.args.join(" ")))
            .with_path(PathBuf::from(lipo))
            .with_duration(start.elapsed()),
        None => CheckResult::fail(
            name,
            format!("xcrun could not find `{}`", tool.args.join(" ")),
        )
        .with_path(xcrun)
        .with_duration(start.elapsed()),
    }
}

/// Frameworks are built anywhere the tools exist but only load on macOS.
fn check_host() -> CheckResult {
    if cfg!(target_os = "macos") {
        CheckResult::pass("Host", "Running on macOS").optional()
    } else {
        CheckResult::fail(
            "Host",
            format!(
                "Running on {}; xcrun and the darwin cgo toolchain are normally only available on macOS",
                std::env::consts::OS
            ),
        )
        .optional()
    }
}

fn locate(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    find_executable(&program.to_string_lossy())
}

/// First non-empty line of a successful command's output.
fn first_line(cmd: ProcessBuilder) -> Option<String> {
    let output = cmd.exec_and_check().ok()?;
    let text = if output.stdout.trim().is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    writeln!(output, "macbind doctor").unwrap();
    writeln!(output, "==============\n").unwrap();

    if verbose {
        let unknown = "unknown".to_string();
        writeln!(output, "Environment:").unwrap();
        writeln!(
            output,
            "  OS: {} ({})",
            report.environment.get("os").unwrap_or(&unknown),
            report.environment.get("arch").unwrap_or(&unknown)
        )
        .unwrap();
        if let Some(gopath) = report.environment.get("GOPATH") {
            writeln!(output, "  GOPATH: {}", gopath).unwrap();
        }
        writeln!(output).unwrap();
    }

    writeln!(output, "Checks:").unwrap();
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        writeln!(output, "  {} {}{}", status, check.name, required).unwrap();

        if verbose || !check.passed {
            writeln!(output, "      {}", check.message).unwrap();
        }
        if verbose {
            if let Some(path) = &check.path {
                writeln!(output, "      Path: {}", path.display()).unwrap();
            }
            if let Some(version) = &check.version {
                writeln!(output, "      Version: {}", version).unwrap();
            }
        }
    }

    writeln!(output).unwrap();

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    writeln!(output, "Summary: {} passed, {} failed", passed, failed).unwrap();

    if required_failed > 0 {
        writeln!(
            output,
            "\nError: {} required check(s) failed. `macbind bind` will not work.",
            required_failed
        )
        .unwrap();
    } else if failed > 0 {
        writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        )
        .unwrap();
    } else {
        writeln!(output, "\nAll checks passed. macbind is ready to use.").unwrap();
    }

    output
}
