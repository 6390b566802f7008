//! Test utilities and mocks for macbind unit tests.
//!
//! This module provides mock implementations of the two seams the bind
//! pipeline talks through: [`Filesystem`] and [`Executor`].
//!
//! # Example
//!
//! ```rust,ignore
//! use macbind::test_support::{MockExecutor, MockFileSystem, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let mut fs = MockFileSystem::new();
//!     fs.add_file("/work/src/gobind/ref.h", "// ref");
//!
//!     let mut exec = MockExecutor::new();
//!     exec.expect_prefix("gobind", MockProcessOutput::success(""));
//!
//!     // Use mocks in tests...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::util::fs::Filesystem;
use crate::util::process::{Executor, ProcessBuilder, ProcessError, ProcessOutput};

pub use fixtures::*;

/// Symlink hops before resolution gives up.
const MAX_LINK_HOPS: usize = 40;

/// Mock filesystem for testing without real I/O.
///
/// Provides an in-memory tree of files, directories and symlinks. Paths are
/// resolved through symlinks the way the kernel would.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: Vec<PathBuf>,
    links: HashMap<PathBuf, PathBuf>,
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    pub fn new() -> Self {
        MockFileSystem::default()
    }

    /// Add a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = self.resolve(path.as_ref());
        // Ensure parent directories exist
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, content.into());
    }

    /// Add a directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if !self.dirs.contains(&path) {
            // Add all parent directories too
            let mut current = path.clone();
            while let Some(parent) = current.parent() {
                if parent.as_os_str().is_empty() {
                    break;
                }
                if !self.dirs.contains(&parent.to_path_buf()) {
                    self.dirs.push(parent.to_path_buf());
                }
                current = parent.to_path_buf();
            }
            self.dirs.push(path);
        }
    }

    /// Follow symlinks in every component of `path`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let mut pending: Vec<OsString> = Vec::new();
        push_components(&mut pending, path);

        let mut out = PathBuf::new();
        let mut hops = 0;
        while let Some(comp) = pending.pop() {
            if comp.as_os_str() == ".." {
                out.pop();
                continue;
            }
            if comp.as_os_str() == "." {
                continue;
            }
            out.push(&comp);

            if let Some(target) = self.links.get(&out) {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    break;
                }
                out.pop();
                if target.is_absolute() {
                    out = PathBuf::new();
                }
                push_components(&mut pending, target);
            }
        }
        out
    }

    /// The target of the symlink at `path`, without following it.
    pub fn read_link(&self, path: &Path) -> Option<PathBuf> {
        self.links.get(path).cloned()
    }

    /// Read a file's contents.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(&self.resolve(path))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("file not found: {}", path.display()))
    }

    /// Read a file as a string.
    pub fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("invalid UTF-8: {}", e))
    }

    /// Check if a path is a file.
    pub fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&self.resolve(path))
    }

    /// Check if a path is a directory.
    pub fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(&self.resolve(path))
    }

    /// List files directly inside a directory, sorted.
    pub fn list_files(&self, path: &Path) -> Vec<PathBuf> {
        let dir = self.resolve(path);
        let mut files: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect();
        files.sort();
        files
    }

    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.is_dir(parent),
            _ => true,
        }
    }
}

fn push_components(stack: &mut Vec<OsString>, path: &Path) {
    let comps: Vec<OsString> = path
        .components()
        .map(|c| c.as_os_str().to_os_string())
        .collect();
    stack.extend(comps.into_iter().rev());
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl Filesystem for MockFileSystem {
    fn remove_all(&mut self, path: &Path) -> io::Result<()> {
        self.files.retain(|p, _| !p.starts_with(path));
        self.dirs.retain(|d| !d.starts_with(path));
        self.links.retain(|l, _| !l.starts_with(path));
        Ok(())
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        let path = self.resolve(path);
        if self.files.contains_key(&path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {}", path.display()),
            ));
        }
        self.add_dir(path);
        Ok(())
    }

    fn symlink(&mut self, target: &Path, link: &Path) -> io::Result<()> {
        if self.links.contains_key(link) || self.exists(link) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {}", link.display()),
            ));
        }
        if !self.parent_exists(link) {
            return Err(not_found(link));
        }
        self.links.insert(link.to_path_buf(), target.to_path_buf());
        Ok(())
    }

    fn copy_file(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        let content = self
            .files
            .get(&self.resolve(from))
            .cloned()
            .ok_or_else(|| not_found(from))?;
        self.write(to, &content)
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if !self.parent_exists(path) {
            return Err(not_found(path));
        }
        let path = self.resolve(path);
        self.files.insert(path, contents.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let path = self.resolve(path);
        self.files.contains_key(&path) || self.dirs.contains(&path)
    }
}

/// How a mocked command ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    /// Exit with the given status code.
    Exit(i32),
    /// The program could not be started.
    NotFound,
    /// Cancelled while running.
    Aborted,
}

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    pub outcome: MockOutcome,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            outcome: MockOutcome::Exit(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            outcome: MockOutcome::Exit(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// The program does not exist.
    pub fn not_found() -> Self {
        MockProcessOutput {
            outcome: MockOutcome::NotFound,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// The command was cancelled.
    pub fn aborted() -> Self {
        MockProcessOutput {
            outcome: MockOutcome::Aborted,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn into_result(self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        let command = cmd.display_command();
        match self.outcome {
            MockOutcome::Exit(status) => cmd.check(ProcessOutput {
                status: Some(status),
                stdout: self.stdout,
                stderr: self.stderr,
            }),
            MockOutcome::NotFound => Err(ProcessError::Spawn {
                command,
                source: io::Error::new(io::ErrorKind::NotFound, "program not found"),
            }),
            MockOutcome::Aborted => Err(ProcessError::Aborted { command }),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Output to return when matched.
    pub output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    /// Number of times this expectation has been used.
    pub used: usize,
}

impl CommandExpectation {
    /// Create a new expectation.
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            output,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Check if this expectation can still be used.
    pub fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

/// Mock process executor for testing command execution.
///
/// Records every command it is asked to run, with its environment and
/// working directory, and answers from the registered expectations.
#[derive(Debug, Default)]
pub struct MockExecutor {
    expectations: Vec<CommandExpectation>,
    calls: Vec<ProcessBuilder>,
    default_output: Option<MockProcessOutput>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            output,
        ))
    }

    /// Add a custom expectation.
    pub fn expect_pattern(&mut self, expectation: CommandExpectation) -> &mut Self {
        self.expectations.push(expectation);
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.default_output = Some(output);
        self
    }

    /// Get all commands that were run, in order.
    pub fn calls(&self) -> &[ProcessBuilder] {
        &self.calls
    }

    /// Rendered command lines of all calls.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls.iter().map(ProcessBuilder::display_command).collect()
    }

    /// Verify that all expectations with a specific count were satisfied.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.expectations.iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }
}

impl Executor for MockExecutor {
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        let full_cmd = cmd.display_command();
        self.calls.push(cmd.clone());

        // Find matching expectation
        for exp in &mut self.expectations {
            if exp.pattern.matches(&full_cmd) && exp.available() {
                exp.used += 1;
                return exp.output.clone().into_result(cmd);
            }
        }

        // Use default if set
        if let Some(ref default) = self.default_output {
            return default.clone().into_result(cmd);
        }

        Err(ProcessError::Spawn {
            command: full_cmd,
            source: io::Error::new(io::ErrorKind::Other, "unexpected command"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_symlink_resolution() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/b/Versions/A/Headers/x.h", "x");
        fs.symlink(Path::new("A"), Path::new("/b/Versions/Current"))
            .unwrap();
        fs.symlink(
            Path::new("Versions/Current/Headers"),
            Path::new("/b/Headers"),
        )
        .unwrap();

        assert_eq!(
            fs.resolve(Path::new("/b/Headers/x.h")),
            PathBuf::from("/b/Versions/A/Headers/x.h")
        );
        assert_eq!(fs.read_to_string(Path::new("/b/Headers/x.h")).unwrap(), "x");
    }

    #[test]
    fn test_mock_fs_write_requires_parent() {
        let mut fs = MockFileSystem::new();
        assert!(fs.write(Path::new("/nope/file"), b"x").is_err());
        fs.create_dir_all(Path::new("/yes")).unwrap();
        fs.write(Path::new("/yes/file"), b"x").unwrap();
        assert!(fs.is_file(Path::new("/yes/file")));
    }

    #[test]
    fn test_mock_executor_records_and_fails() {
        let mut exec = MockExecutor::new();
        exec.expect_prefix("go build", MockProcessOutput::failure(2, "boom"));

        let cmd = ProcessBuilder::new("go").args(["build", "./gobind"]).env("GOARCH", "arm64");
        let err = exec.run(&cmd).unwrap_err();

        assert!(matches!(err, ProcessError::Failed { code: Some(2), .. }));
        assert_eq!(exec.calls()[0].get_env("GOARCH"), Some("arm64"));
        assert!(exec.run(&ProcessBuilder::new("other")).is_err());
    }

    #[test]
    fn test_mock_executor_times() {
        let mut exec = MockExecutor::new();
        exec.expect_pattern(
            CommandExpectation::new(
                CommandPattern::Regex(r"^lipo -create".to_string()),
                MockProcessOutput::success(""),
            )
            .times(1),
        );

        assert!(exec.verify().is_err());
        exec.run(&ProcessBuilder::new("lipo").arg("-create")).unwrap();
        exec.verify().unwrap();
    }
}
