//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// How often a cancellable child is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Failure to run an external command.
///
/// Every variant keeps the rendered command line so the failing tool can be
/// identified from the error alone.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with exit code {code:?}\n{stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` was cancelled")]
    Aborted { command: String },
}

impl ProcessError {
    /// The command line that failed.
    pub fn command(&self) -> &str {
        match self {
            ProcessError::Spawn { command, .. }
            | ProcessError::Failed { command, .. }
            | ProcessError::Aborted { command } => command,
        }
    }

    /// Captured stderr, falling back to stdout when stderr is empty.
    pub fn output(&self) -> Option<&str> {
        match self {
            ProcessError::Failed { stdout, stderr, .. } => {
                if stderr.trim().is_empty() {
                    Some(stdout.as_str())
                } else {
                    Some(stderr.as_str())
                }
            }
            _ => None,
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (`None` if killed by a signal)
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

impl From<Output> for ProcessOutput {
    fn from(output: Output) -> Self {
        ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Shared flag that aborts running and pending commands.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set several environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (k, v) in vars {
            self = self.env(k, v);
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get an environment override.
    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Get all environment overrides.
    pub fn get_envs(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Get the working directory.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    fn spawn(&self) -> Result<Child, ProcessError> {
        self.build_command()
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: self.display_command(),
                source,
            })
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<ProcessOutput, ProcessError> {
        let child = self.spawn()?;
        let output = child
            .wait_with_output()
            .map_err(|source| ProcessError::Spawn {
                command: self.display_command(),
                source,
            })?;
        Ok(output.into())
    }

    /// Execute, killing the child if `cancel` is set before it exits.
    pub fn exec_cancellable(&self, cancel: &CancelToken) -> Result<ProcessOutput, ProcessError> {
        if cancel.is_cancelled() {
            return Err(ProcessError::Aborted {
                command: self.display_command(),
            });
        }

        let mut child = self.spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Aborted {
                    command: self.display_command(),
                });
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    return Err(ProcessError::Spawn {
                        command: self.display_command(),
                        source,
                    })
                }
            }
        };

        Ok(ProcessOutput {
            status: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }

    /// Turn a non-zero exit into [`ProcessError::Failed`].
    pub fn check(&self, output: ProcessOutput) -> Result<ProcessOutput, ProcessError> {
        if output.success() {
            Ok(output)
        } else {
            Err(ProcessError::Failed {
                command: self.display_command(),
                code: output.status,
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }

    /// Execute and require success.
    pub fn exec_and_check(&self) -> Result<ProcessOutput, ProcessError> {
        let output = self.exec()?;
        self.check(output)
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Runs external commands on behalf of the pipeline.
pub trait Executor {
    /// Run `cmd` to completion; a non-zero exit is an error.
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError>;
}

/// Executor backed by real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    cancel: Option<CancelToken>,
}

impl SystemExecutor {
    pub fn new() -> Self {
        SystemExecutor::default()
    }

    /// Abort the running command when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl Executor for SystemExecutor {
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        tracing::debug!("running `{}`", cmd.display_command());
        let output = match &self.cancel {
            Some(token) => cmd.exec_cancellable(token)?,
            None => cmd.exec()?,
        };
        cmd.check(output)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
