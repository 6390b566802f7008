//! The immutable description of one bind run.
//!
//! Every stage of the pipeline reads its inputs from a borrowed [`BindConfig`];
//! nothing is taken from process-wide state except the ambient environment
//! that child processes inherit.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::builder::errors::BindError;
use crate::core::arch::{Arch, ArchTarget};
use crate::core::package::{title_case, PackageDescriptor};

/// Directory suffix every static framework carries.
pub const FRAMEWORK_SUFFIX: &str = ".framework";

/// Build tag appended to the caller's tags for darwin builds.
pub const PLATFORM_TAG: &str = "ios";

/// Package the generator writes its output under, relative to `<work>/src`.
pub const GENERATED_NAMESPACE: &str = "gobind";

/// An external program plus leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Locations of the three external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub gobind: ToolCommand,
    pub go: ToolCommand,
    pub lipo: ToolCommand,
}

impl Default for Tools {
    fn default() -> Self {
        Tools {
            gobind: ToolCommand::new("gobind"),
            go: ToolCommand::new("go"),
            lipo: ToolCommand::new("xcrun").with_args(["lipo"]),
        }
    }
}

/// Inputs for a bind run.
#[derive(Debug, Clone)]
pub struct BindConfig {
    /// Packages to bind, in generator order
    pub packages: Vec<PackageDescriptor>,

    /// Architectures to build, in fusion order
    pub targets: Vec<ArchTarget>,

    /// Symbol prefix handed to the generator
    pub prefix: String,

    /// Explicit output bundle path; must end in `.framework`
    pub output: Option<PathBuf>,

    /// Caller build tags (the platform tag is added automatically)
    pub tags: Vec<String>,

    /// Directory the generator and `go list` run from
    pub project_dir: PathBuf,

    /// Scratch directory, written once per run
    pub work_dir: PathBuf,

    /// Overrides applied to every architecture build
    pub env: BTreeMap<String, String>,

    /// External tool locations
    pub tools: Tools,

    /// Extra `-ldflags` for the archive builds
    pub ldflags: Option<String>,

    /// Pass `-trimpath` to the archive builds
    pub trimpath: bool,

    /// Pass `-x` to the archive builds
    pub print_commands: bool,
}

impl BindConfig {
    /// Create a config with default architectures and tools.
    pub fn new(packages: Vec<PackageDescriptor>, work_dir: impl Into<PathBuf>) -> Self {
        BindConfig {
            packages,
            targets: Arch::DEFAULT.into_iter().map(ArchTarget::new).collect(),
            prefix: String::new(),
            output: None,
            tags: Vec::new(),
            project_dir: PathBuf::from("."),
            work_dir: work_dir.into(),
            env: BTreeMap::new(),
            tools: Tools::default(),
            ldflags: None,
            trimpath: false,
            print_commands: false,
        }
    }

    pub fn with_targets(mut self, targets: Vec<ArchTarget>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    pub fn with_tools(mut self, tools: Tools) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Check the caller's input before anything runs.
    pub fn validate(&self) -> Result<(), BindError> {
        if self.packages.is_empty() {
            return Err(BindError::configuration("no packages to bind"));
        }
        if self.targets.is_empty() {
            return Err(BindError::configuration("no target architectures"));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.arch) {
                return Err(BindError::configuration(format!(
                    "architecture `{}` requested more than once",
                    target.arch
                )));
            }
        }

        if self.prefix.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
            return Err(BindError::configuration(format!(
                "symbol prefix `{}` must contain only letters, digits and `_`",
                self.prefix
            )));
        }

        self.output_path().map(|_| ())
    }

    /// The first package; it names the framework and the archives.
    pub fn primary(&self) -> &PackageDescriptor {
        &self.packages[0]
    }

    /// Title-cased name of the primary package.
    pub fn title(&self) -> String {
        title_case(self.primary().name())
    }

    /// Where the framework bundle goes.
    pub fn output_path(&self) -> Result<PathBuf, BindError> {
        match &self.output {
            Some(output) => {
                let has_suffix = output
                    .file_name()
                    .map(|n| {
                        let n = n.to_string_lossy();
                        n.len() > FRAMEWORK_SUFFIX.len() && n.ends_with(FRAMEWORK_SUFFIX)
                    })
                    .unwrap_or(false);
                if !has_suffix {
                    return Err(BindError::configuration(format!(
                        "static framework name {:?} missing {} suffix",
                        output.display().to_string(),
                        FRAMEWORK_SUFFIX
                    )));
                }
                Ok(self.project_dir.join(output))
            }
            None => {
                let title = self.packages.first().map(|p| p.title()).ok_or_else(|| {
                    BindError::configuration("no packages to bind")
                })?;
                Ok(self
                    .project_dir
                    .join(format!("{}{}", title, FRAMEWORK_SUFFIX)))
            }
        }
    }

    /// Caller tags followed by the platform tag.
    pub fn build_tags(&self) -> Vec<String> {
        let mut tags = self.tags.clone();
        if !tags.iter().any(|t| t == PLATFORM_TAG) {
            tags.push(PLATFORM_TAG.to_string());
        }
        tags
    }

    /// `<work>/src`, the compiler's resolution root.
    pub fn src_dir(&self) -> PathBuf {
        self.work_dir.join("src")
    }

    /// `<work>/src/gobind`, where generated sources land.
    pub fn generated_dir(&self) -> PathBuf {
        self.src_dir().join(GENERATED_NAMESPACE)
    }

    /// Deterministic archive path for one architecture.
    pub fn archive_path(&self, arch: Arch) -> PathBuf {
        archive_path(&self.work_dir, self.primary().name(), arch)
    }
}

/// `<dir>/<name>-<tag>.a`
pub fn archive_path(dir: &Path, name: &str, arch: Arch) -> PathBuf {
    dir.join(format!("{}-{}.a", name, arch.tag()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::errors::Stage;

    fn pkgs(names: &[&str]) -> Vec<PackageDescriptor> {
        names
            .iter()
            .map(|n| PackageDescriptor::new(format!("example.com/{}", n), *n).unwrap())
            .collect()
    }

    #[test]
    fn test_default_output_from_title() {
        let config = BindConfig::new(pkgs(&["foo"]), "/work").with_project_dir("/proj");
        assert_eq!(
            config.output_path().unwrap(),
            PathBuf::from("/proj/Foo.framework")
        );
    }

    #[test]
    fn test_output_requires_suffix() {
        let config = BindConfig::new(pkgs(&["foo"]), "/work").with_output("out/Foo");
        let err = config.validate().unwrap_err();
        assert_eq!(err.stage(), Stage::Configuration);
        assert!(err.to_string().contains(".framework"));

        let bare = BindConfig::new(pkgs(&["foo"]), "/work").with_output(".framework");
        assert!(bare.validate().is_err());
    }

    #[test]
    fn test_output_with_directory() {
        let config = BindConfig::new(pkgs(&["foo"]), "/work")
            .with_project_dir("/proj")
            .with_output("out/Lib.framework");
        assert_eq!(
            config.output_path().unwrap(),
            PathBuf::from("/proj/out/Lib.framework")
        );
    }

    #[test]
    fn test_empty_packages_rejected() {
        let config = BindConfig::new(Vec::new(), "/work");
        assert_eq!(config.validate().unwrap_err().stage(), Stage::Configuration);
    }

    #[test]
    fn test_duplicate_arch_rejected() {
        let config = BindConfig::new(pkgs(&["foo"]), "/work").with_targets(vec![
            ArchTarget::new(Arch::Arm64),
            ArchTarget::new(Arch::Arm64),
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_tags_append_platform() {
        let config = BindConfig::new(pkgs(&["foo"]), "/work").with_tags(["release"]);
        assert_eq!(config.build_tags(), vec!["release", "ios"]);
    }

    #[test]
    fn test_archive_path() {
        let config = BindConfig::new(pkgs(&["foo", "bar"]), "/work");
        assert_eq!(
            config.archive_path(Arch::X86_64),
            PathBuf::from("/work/foo-x86_64.a")
        );
    }
}
