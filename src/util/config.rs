//! Configuration file support for macbind.
//!
//! macbind supports two configuration file locations:
//! - Global: `~/.macbind/config.toml` - User-wide defaults
//! - Project: `.macbind/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config; command-line flags
//! take precedence over both.
//!
//! ```toml
//! [bind]
//! archs = ["arm64", "x86_64"]
//! tags = ["release"]
//! prefix = "XY"
//! trimpath = true
//!
//! [tools]
//! gobind = "/opt/go/bin/gobind"
//! lipo = ["xcrun", "lipo"]
//!
//! [env]
//! GOFLAGS = "-mod=mod"
//!
//! [arch.arm64.env]
//! CGO_CFLAGS = "-arch arm64 -mmacosx-version-min=11.0"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::arch::{Arch, ArchTarget};
use crate::core::bind_config::{ToolCommand, Tools};

/// macbind configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind settings
    pub bind: BindSettings,

    /// External tool locations
    pub tools: ToolSettings,

    /// Environment overrides for every tool invocation
    pub env: BTreeMap<String, String>,

    /// Per-architecture settings, keyed by architecture name
    pub arch: BTreeMap<String, ArchSettings>,
}

/// `[bind]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BindSettings {
    /// Architectures to build (e.g., ["arm64", "x86_64"])
    pub archs: Vec<String>,

    /// Extra build tags
    pub tags: Vec<String>,

    /// Symbol prefix for generated Objective-C names
    pub prefix: Option<String>,

    /// Fixed work directory, never removed
    pub work_dir: Option<PathBuf>,

    /// `-ldflags` for archive builds
    pub ldflags: Option<String>,

    /// Pass `-trimpath` to archive builds
    pub trimpath: Option<bool>,
}

/// `[tools]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub gobind: Option<ToolSpec>,
    pub go: Option<ToolSpec>,
    pub lipo: Option<ToolSpec>,
}

/// A tool given either as a program path or as `[program, args...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolSpec {
    Program(PathBuf),
    Command(Vec<String>),
}

impl ToolSpec {
    /// Convert to a [`ToolCommand`]; an empty list yields `None`.
    pub fn to_command(&self) -> Option<ToolCommand> {
        match self {
            ToolSpec::Program(path) => Some(ToolCommand::new(path.clone())),
            ToolSpec::Command(parts) => {
                let (program, args) = parts.split_first()?;
                Some(ToolCommand::new(program).with_args(args.iter().cloned()))
            }
        }
    }
}

/// `[arch.<name>]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchSettings {
    /// Environment overrides for this architecture's build
    pub env: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if !other.bind.archs.is_empty() {
            self.bind.archs = other.bind.archs;
        }
        if !other.bind.tags.is_empty() {
            self.bind.tags = other.bind.tags;
        }
        if other.bind.prefix.is_some() {
            self.bind.prefix = other.bind.prefix;
        }
        if other.bind.work_dir.is_some() {
            self.bind.work_dir = other.bind.work_dir;
        }
        if other.bind.ldflags.is_some() {
            self.bind.ldflags = other.bind.ldflags;
        }
        if other.bind.trimpath.is_some() {
            self.bind.trimpath = other.bind.trimpath;
        }

        if other.tools.gobind.is_some() {
            self.tools.gobind = other.tools.gobind;
        }
        if other.tools.go.is_some() {
            self.tools.go = other.tools.go;
        }
        if other.tools.lipo.is_some() {
            self.tools.lipo = other.tools.lipo;
        }

        self.env.extend(other.env);
        for (name, settings) in other.arch {
            self.arch.entry(name).or_default().env.extend(settings.env);
        }
    }

    /// Tool locations, with defaults for anything not configured.
    pub fn tools(&self) -> Tools {
        let mut tools = Tools::default();
        if let Some(cmd) = self.tools.gobind.as_ref().and_then(ToolSpec::to_command) {
            tools.gobind = cmd;
        }
        if let Some(cmd) = self.tools.go.as_ref().and_then(ToolSpec::to_command) {
            tools.go = cmd;
        }
        if let Some(cmd) = self.tools.lipo.as_ref().and_then(ToolSpec::to_command) {
            tools.lipo = cmd;
        }
        tools
    }

    /// Configured architectures, parsed.
    pub fn archs(&self) -> Result<Vec<Arch>> {
        self.bind
            .archs
            .iter()
            .map(|a| a.parse::<Arch>().map_err(|e| anyhow!("[bind] archs: {}", e)))
            .collect()
    }

    /// Build targets for `archs` (or the configured/default list when empty).
    ///
    /// Each target's env is its defaults, then `[env]`, then `[arch.<name>.env]`.
    pub fn targets(&self, archs: &[Arch]) -> Result<Vec<ArchTarget>> {
        let archs = if !archs.is_empty() {
            archs.to_vec()
        } else {
            let configured = self.archs()?;
            if configured.is_empty() {
                Arch::DEFAULT.to_vec()
            } else {
                configured
            }
        };

        let mut per_arch: BTreeMap<Arch, &BTreeMap<String, String>> = BTreeMap::new();
        for (name, settings) in &self.arch {
            let arch = name
                .parse::<Arch>()
                .map_err(|e| anyhow!("[arch.{}]: {}", name, e))?;
            per_arch.insert(arch, &settings.env);
        }

        Ok(archs
            .into_iter()
            .map(|arch| {
                let target = ArchTarget::new(arch).with_env(self.env.clone());
                match per_arch.get(&arch) {
                    Some(env) => target.with_env(env.iter().map(|(k, v)| (k.clone(), v.clone()))),
                    None => target,
                }
            })
            .collect())
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.macbind/config.toml)
/// 2. Global config (~/.macbind/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));
    config
}

/// Get the global macbind config directory (~/.macbind).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".macbind"))
}

/// Get the global config path (~/.macbind/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.macbind/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".macbind").join("config.toml")
}
