//! Bind pipeline error types and diagnostics.

use std::fmt;
use std::io;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::arch::Arch;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::process::ProcessError;

/// Pipeline stage, used to tag errors and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Configuration,
    Generation,
    ArchitectureBuild,
    Fusion,
    Assembly,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Configuration => "configuration",
            Stage::Generation => "generation",
            Stage::ArchitectureBuild => "architecture build",
            Stage::Fusion => "fusion",
            Stage::Assembly => "assembly",
        })
    }
}

/// Why an external-tool stage failed.
#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed `go list -m -json` output")]
    ModuleList(#[source] serde_json::Error),

    #[error("expected {} to exist after the tool succeeded", path.display())]
    MissingOutput { path: PathBuf },

    #[error("no archive was built for {arch}")]
    MissingArtifact { arch: Arch },
}

/// Error from a bind run. Each variant names the stage that failed.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BindError {
    #[error("{message}")]
    #[diagnostic(code(macbind::bind::configuration))]
    Configuration { message: String },

    #[error("binding generator failed: {source}")]
    #[diagnostic(
        code(macbind::bind::generation),
        help("Check that every package path builds with `go build`")
    )]
    Generation {
        #[source]
        source: ToolFailure,
    },

    #[error("build failed for darwin/{arch}: {source}")]
    #[diagnostic(code(macbind::bind::architecture))]
    ArchitectureBuild {
        arch: Arch,
        #[source]
        source: ToolFailure,
    },

    #[error("could not create the fat archive: {source}")]
    #[diagnostic(code(macbind::bind::fusion))]
    Fusion {
        #[source]
        source: ToolFailure,
    },

    #[error("framework assembly failed at {}: {source}", path.display())]
    #[diagnostic(code(macbind::bind::assembly))]
    Assembly {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage} aborted while running `{command}`")]
    #[diagnostic(code(macbind::bind::aborted))]
    Aborted {
        stage: Stage,
        arch: Option<Arch>,
        command: String,
    },
}

impl BindError {
    pub fn configuration(message: impl Into<String>) -> Self {
        BindError::Configuration {
            message: message.into(),
        }
    }

    pub fn generation(failure: impl Into<ToolFailure>) -> Self {
        Self::tool(Stage::Generation, None, failure.into())
    }

    pub fn architecture(arch: Arch, failure: impl Into<ToolFailure>) -> Self {
        Self::tool(Stage::ArchitectureBuild, Some(arch), failure.into())
    }

    pub fn fusion(failure: impl Into<ToolFailure>) -> Self {
        Self::tool(Stage::Fusion, None, failure.into())
    }

    pub fn assembly(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BindError::Assembly {
            path: path.into(),
            source,
        }
    }

    /// Cancellation observed between commands.
    pub fn aborted(stage: Stage, arch: Option<Arch>, command: impl Into<String>) -> Self {
        BindError::Aborted {
            stage,
            arch,
            command: command.into(),
        }
    }

    fn tool(stage: Stage, arch: Option<Arch>, failure: ToolFailure) -> Self {
        if let ToolFailure::Process(ProcessError::Aborted { command }) = failure {
            return BindError::Aborted {
                stage,
                arch,
                command,
            };
        }
        match (stage, arch) {
            (Stage::ArchitectureBuild, Some(arch)) => BindError::ArchitectureBuild {
                arch,
                source: failure,
            },
            (Stage::Fusion, _) => BindError::Fusion { source: failure },
            _ => BindError::Generation { source: failure },
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            BindError::Configuration { .. } => Stage::Configuration,
            BindError::Generation { .. } => Stage::Generation,
            BindError::ArchitectureBuild { .. } => Stage::ArchitectureBuild,
            BindError::Fusion { .. } => Stage::Fusion,
            BindError::Assembly { .. } => Stage::Assembly,
            BindError::Aborted { stage, .. } => *stage,
        }
    }

    /// The architecture being built when the error happened, if any.
    pub fn arch(&self) -> Option<Arch> {
        match self {
            BindError::ArchitectureBuild { arch, .. } => Some(*arch),
            BindError::Fusion {
                source: ToolFailure::MissingArtifact { arch },
            } => Some(*arch),
            BindError::Aborted { arch, .. } => *arch,
            _ => None,
        }
    }

    fn process(&self) -> Option<&ProcessError> {
        match self {
            BindError::Generation { source }
            | BindError::ArchitectureBuild { source, .. }
            | BindError::Fusion { source } => match source {
                ToolFailure::Process(err) => Some(err),
                _ => None,
            },
            _ => None,
        }
    }

    /// The external command line that failed.
    pub fn command(&self) -> Option<&str> {
        match self {
            BindError::Aborted { command, .. } => Some(command),
            _ => self.process().map(ProcessError::command),
        }
    }

    /// Captured output of the failing command.
    pub fn output(&self) -> Option<&str> {
        self.process().and_then(ProcessError::output)
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let headline = match self {
            BindError::Configuration { message } => message.clone(),
            BindError::Generation { .. } => "binding generator failed".to_string(),
            BindError::ArchitectureBuild { arch, .. } => {
                format!("build failed for darwin/{}", arch)
            }
            BindError::Fusion { .. } => "could not create the fat archive".to_string(),
            other => other.to_string(),
        };
        let mut diag = Diagnostic::error(headline);

        if let Some(command) = self.command() {
            diag = diag.with_context(format!("command: {}", command));
        }
        match self.process() {
            Some(ProcessError::Spawn { source, .. }) => {
                diag = diag.with_context(source.to_string());
            }
            Some(ProcessError::Failed { code, .. }) => {
                diag = diag.with_context(format!("exit code: {:?}", code));
            }
            _ => {}
        }
        if let Some(output) = self.output() {
            if !output.trim().is_empty() {
                diag = diag.with_context(output.trim_end().to_string());
            }
        }

        match self {
            BindError::Configuration { message } => {
                if message.contains(".framework") {
                    diag = diag.with_suggestion(suggestions::FRAMEWORK_NAME);
                }
            }
            BindError::Generation { source } => {
                if let ToolFailure::Process(ProcessError::Spawn { .. }) = source {
                    diag = diag.with_suggestion(suggestions::INSTALL_GOBIND);
                }
                diag = diag.with_suggestion(suggestions::RUN_VERBOSE);
            }
            BindError::ArchitectureBuild { source, .. } => {
                match source {
                    ToolFailure::Process(ProcessError::Spawn { .. }) => {
                        diag = diag.with_suggestion(suggestions::INSTALL_GO);
                    }
                    ToolFailure::Write { path, source } => {
                        diag = diag.with_location(path).with_context(source.to_string());
                    }
                    _ => {}
                }
                diag = diag.with_suggestion(suggestions::RUN_VERBOSE);
            }
            BindError::Fusion { source } => {
                if let ToolFailure::Process(ProcessError::Spawn { .. }) = source {
                    diag = diag.with_suggestion(suggestions::INSTALL_XCODE);
                }
                diag = diag.with_suggestion(suggestions::RUN_DOCTOR);
            }
            BindError::Assembly { path, .. } => {
                diag = diag
                    .with_location(path)
                    .with_context("the framework directory is incomplete and must not be used");
            }
            BindError::Aborted { .. } => {}
        }

        diag
    }
}
