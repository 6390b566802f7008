//! User-friendly diagnostic messages.
//!
//! Every error printed by the CLI carries its root cause, the context needed
//! to reproduce it, and suggested fixes.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when the generator is missing.
    pub const INSTALL_GOBIND: &str =
        "Install the generator: `go install golang.org/x/mobile/cmd/gobind@latest`";

    /// Suggestion when the Go toolchain is missing.
    pub const INSTALL_GO: &str = "Install Go from https://go.dev/dl/ and make sure `go` is on PATH";

    /// Suggestion when lipo is missing.
    pub const INSTALL_XCODE: &str =
        "Install the Xcode command line tools: `xcode-select --install`";

    /// Suggestion when any stage fails.
    pub const RUN_VERBOSE: &str = "Run `macbind bind --verbose --work` to keep the work directory and see every command";

    /// Suggestion for checking the environment.
    pub const RUN_DOCTOR: &str = "Run `macbind doctor` to check the toolchain";

    /// Suggestion when the output name is wrong.
    pub const FRAMEWORK_NAME: &str = "Name the output like `-o Hello.framework`";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            for line in ctx.lines() {
                output.push_str(&format!("  | {}\n", line));
            }
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("build failed for darwin/arm64")
            .with_context("command: go build -buildmode=c-archive")
            .with_context("# example.com/hello\nundefined: Foo")
            .with_location("/tmp/work/src")
            .with_suggestion(suggestions::RUN_VERBOSE);

        let output = diag.format(false);
        assert!(output.starts_with("error: build failed for darwin/arm64\n"));
        assert!(output.contains("  --> /tmp/work/src"));
        assert!(output.contains("  | undefined: Foo"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Run `macbind bind --verbose --work`"));
    }

    #[test]
    fn test_warning_severity() {
        let diag = Diagnostic::warning("could not stash archive");
        assert_eq!(diag.severity, Severity::Warning);
        assert!(diag.to_string().starts_with("warning:"));
    }
}
