//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use macbind::{Arch, PackageDescriptor};

/// macbind - bind Go packages into a multi-architecture static macOS framework
#[derive(Parser)]
#[command(name = "macbind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate bindings and assemble a .framework bundle
    Bind(BindArgs),

    /// Check that gobind, go and lipo are available
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args)]
pub struct BindArgs {
    /// Go import paths to bind; the first names the framework.
    /// `path=name` skips the `go list` name lookup
    #[arg(value_name = "PKG")]
    pub packages: Vec<PackageDescriptor>,

    /// Output bundle path (must end in .framework)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Target architectures (comma separated)
    #[arg(long = "arch", value_delimiter = ',', value_name = "ARCH")]
    pub archs: Vec<Arch>,

    /// Extra build tags (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "TAGS")]
    pub tags: Vec<String>,

    /// Prefix for generated Objective-C names
    #[arg(long)]
    pub prefix: Option<String>,

    /// Keep the temporary work directory and print its path
    #[arg(long)]
    pub work: bool,

    /// Use this directory for intermediate files
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Binding generator to run
    #[arg(long, env = "MACBIND_GOBIND", value_name = "PATH")]
    pub gobind: Option<PathBuf>,

    /// Go toolchain to run
    #[arg(long, env = "MACBIND_GO", value_name = "PATH")]
    pub go: Option<PathBuf>,

    /// Archive fusion tool to run
    #[arg(long, value_name = "PATH")]
    pub lipo: Option<PathBuf>,

    /// Linker flags passed to each archive build
    #[arg(long)]
    pub ldflags: Option<String>,

    /// Remove file system paths from the compiled archives
    #[arg(long)]
    pub trimpath: bool,

    /// Print the commands run by each archive build
    #[arg(short = 'x')]
    pub print_commands: bool,

    /// Copy each architecture archive into this directory
    #[arg(long, value_name = "DIR")]
    pub stash_archives: Option<PathBuf>,

    /// Output format for progress messages
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Also report optional checks as failures in the exit code
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
