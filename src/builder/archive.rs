//! Per-architecture static archive builds.
//!
//! For each target: write `<work>/src/go.mod` from the project's module
//! graph, then run `go build -buildmode=c-archive` against the generated
//! `gobind` package.

use std::env;
use std::ffi::OsString;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::builder::errors::{BindError, ToolFailure};
use crate::core::arch::ArchTarget;
use crate::core::bind_config::{BindConfig, GENERATED_NAMESPACE};
use crate::util::fs::Filesystem;
use crate::util::process::{Executor, ProcessBuilder, ProcessError};

/// Module name of the generated aggregator.
pub const MODULE_NAME: &str = "gobind";

/// One entry of `go list -m -json all`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GoModule {
    pub path: String,
    pub version: String,
    pub main: bool,
    pub dir: String,
    pub go_version: String,
    pub replace: Option<Box<GoModule>>,
}

/// Decode the concatenated JSON objects `go list -m -json` prints.
pub fn parse_module_list(output: &str) -> Result<Vec<GoModule>, serde_json::Error> {
    serde_json::Deserializer::from_str(output)
        .into_iter::<GoModule>()
        .collect()
}

/// Whether a replacement path names a local directory rather than a module.
fn is_directory_path(path: &str) -> bool {
    path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/')
        || path.starts_with(".\\")
        || path.starts_with("..\\")
        || path == "."
        || path == ".."
        || Path::new(path).is_absolute()
}

/// Render the aggregator's `go.mod`.
pub fn render_go_mod(modules: &[GoModule]) -> String {
    let mut out = String::new();
    writeln!(out, "module {}", MODULE_NAME).unwrap();

    if let Some(main) = modules.iter().find(|m| m.main && !m.go_version.is_empty()) {
        writeln!(out).unwrap();
        writeln!(out, "go {}", main.go_version).unwrap();
    }

    let requires: Vec<&GoModule> = modules
        .iter()
        .filter(|m| m.replace.is_none() && !m.version.is_empty())
        .collect();
    if !requires.is_empty() {
        writeln!(out).unwrap();
        for m in requires {
            writeln!(out, "require {} {}", m.path, m.version).unwrap();
        }
    }

    let mut replaces = Vec::new();
    for m in modules {
        let old = if m.version.is_empty() {
            m.path.clone()
        } else {
            format!("{} {}", m.path, m.version)
        };
        match &m.replace {
            Some(r) => {
                let new = if is_directory_path(&r.path) {
                    r.dir.clone()
                } else if r.version.is_empty() {
                    r.path.clone()
                } else {
                    format!("{} {}", r.path, r.version)
                };
                replaces.push(format!("replace {} => {}", old, new));
            }
            // Local modules (the main module included) have no version.
            None if m.version.is_empty() && !m.dir.is_empty() => {
                replaces.push(format!("replace {} => {}", m.path, m.dir));
            }
            None => {}
        }
    }
    if !replaces.is_empty() {
        writeln!(out).unwrap();
        for line in replaces {
            writeln!(out, "{}", line).unwrap();
        }
    }

    out
}

/// `go list -m -json -tags=<tags> all` for one target.
pub fn module_list_command(config: &BindConfig, target: &ArchTarget) -> ProcessBuilder {
    let tool = &config.tools.go;
    ProcessBuilder::new(&tool.program)
        .args(&tool.args)
        .args(["list", "-m", "-json"])
        .arg(format!("-tags={}", config.build_tags().join(",")))
        .arg("all")
        .envs(&config.env)
        .envs(&target.env)
        .cwd(&config.project_dir)
}

/// Write `<work>/src/go.mod` for `target`.
///
/// Returns `Ok(None)` when module information is unavailable and no file
/// was written.
pub fn write_go_mod(
    exec: &mut dyn Executor,
    fs: &mut dyn Filesystem,
    config: &BindConfig,
    target: &ArchTarget,
) -> Result<Option<PathBuf>, BindError> {
    let cmd = module_list_command(config, target);
    let output = match exec.run(&cmd) {
        Ok(output) => output,
        Err(e @ ProcessError::Aborted { .. }) => {
            return Err(BindError::architecture(target.arch, e))
        }
        Err(e) => {
            debug!("module information unavailable: {}", e);
            return Ok(None);
        }
    };

    let modules = parse_module_list(&output.stdout)
        .map_err(|e| BindError::architecture(target.arch, ToolFailure::ModuleList(e)))?;

    let path = config.src_dir().join("go.mod");
    fs.write(&path, render_go_mod(&modules).as_bytes())
        .map_err(|source| {
            BindError::architecture(
                target.arch,
                ToolFailure::Write {
                    path: path.clone(),
                    source,
                },
            )
        })?;
    debug!("wrote {}", path.display());
    Ok(Some(path))
}

/// GOPATH for the build: the work directory, then the ambient GOPATH.
///
/// The ambient value comes from the configured env, then `$GOPATH`, then
/// `$HOME/go`.
pub fn build_gopath(config: &BindConfig) -> String {
    let ambient: Option<OsString> = config
        .env
        .get("GOPATH")
        .map(OsString::from)
        .or_else(|| env::var_os("GOPATH").filter(|v| !v.is_empty()))
        .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join("go").into()));

    let mut paths = vec![config.work_dir.clone().into_os_string()];
    paths.extend(ambient);
    match env::join_paths(&paths) {
        Ok(joined) => joined.to_string_lossy().into_owned(),
        Err(_) => config.work_dir.display().to_string(),
    }
}

/// `go build -buildmode=c-archive ... ./gobind` for one target.
pub fn build_command(config: &BindConfig, target: &ArchTarget) -> ProcessBuilder {
    let tool = &config.tools.go;
    let mut cmd = ProcessBuilder::new(&tool.program)
        .args(&tool.args)
        .args(["build", "-buildmode=c-archive"])
        .arg(format!("-tags={}", config.build_tags().join(",")));

    if let Some(ldflags) = &config.ldflags {
        cmd = cmd.arg(format!("-ldflags={}", ldflags));
    }
    if config.trimpath {
        cmd = cmd.arg("-trimpath");
    }
    if config.print_commands {
        cmd = cmd.arg("-x");
    }

    cmd.arg("-o")
        .arg(config.archive_path(target.arch))
        .arg(format!("./{}", GENERATED_NAMESPACE))
        .envs(&config.env)
        .envs(&target.env)
        .env("GOPATH", build_gopath(config))
        .cwd(config.src_dir())
}

/// Build the archive for one target and return its path.
pub fn build_archive(
    exec: &mut dyn Executor,
    fs: &mut dyn Filesystem,
    config: &BindConfig,
    target: &ArchTarget,
) -> Result<PathBuf, BindError> {
    info!("building darwin/{}", target.arch);
    write_go_mod(exec, fs, config, target)?;

    let cmd = build_command(config, target);
    debug!("build env for {}: {:?}", target.arch, cmd.get_envs());
    let output = exec
        .run(&cmd)
        .map_err(|e| BindError::architecture(target.arch, e))?;
    if config.print_commands {
        for line in output.stderr.lines() {
            info!("{}", line);
        }
    }

    let archive = config.archive_path(target.arch);
    if !fs.exists(&archive) {
        return Err(BindError::architecture(
            target.arch,
            ToolFailure::MissingOutput { path: archive },
        ));
    }
    Ok(archive)
}
