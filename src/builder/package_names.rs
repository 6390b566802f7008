//! Package clause name resolution.
//!
//! Packages given without `=name` carry a name guessed from the import
//! path. The generator names its files after the package clause, which can
//! differ (`example.com/go-hello` may declare `package hello`), so the real
//! names are asked of `go list` before anything is derived from them.

use std::borrow::Cow;

use tracing::{debug, info};

use crate::builder::errors::{BindError, Stage};
use crate::core::bind_config::BindConfig;
use crate::core::package::PackageDescriptor;
use crate::util::process::{Executor, ProcessBuilder, ProcessError};

/// Output template printing one clause name per package.
pub const NAME_FORMAT: &str = "{{.Name}}";

/// `go list -f {{.Name}} -tags=<tags> <paths>` run from the project.
pub fn names_command(config: &BindConfig, pkgs: &[&PackageDescriptor]) -> ProcessBuilder {
    let tool = &config.tools.go;
    let mut cmd = ProcessBuilder::new(&tool.program)
        .args(&tool.args)
        .args(["list", "-f", NAME_FORMAT])
        .arg(format!("-tags={}", config.build_tags().join(",")))
        .args(pkgs.iter().map(|p| p.import_path()))
        .envs(&config.env)
        .cwd(&config.project_dir);
    // Build constraints follow the first target's GOOS/GOARCH.
    if let Some(target) = config.targets.first() {
        cmd = cmd.envs(&target.env);
    }
    cmd
}

/// Replace guessed package names with their clause names.
///
/// Returns the config unchanged when every name was given explicitly.
pub fn resolve<'a>(
    exec: &mut dyn Executor,
    config: &'a BindConfig,
) -> Result<Cow<'a, BindConfig>, BindError> {
    let pending: Vec<&PackageDescriptor> = config
        .packages
        .iter()
        .filter(|p| p.is_name_inferred())
        .collect();
    if pending.is_empty() {
        return Ok(Cow::Borrowed(config));
    }

    let cmd = names_command(config, &pending);
    let output = match exec.run(&cmd) {
        Ok(output) => output,
        Err(ProcessError::Aborted { command }) => {
            return Err(BindError::aborted(Stage::Configuration, None, command))
        }
        Err(e) => {
            let detail = e.output().map(str::trim).unwrap_or_default();
            return Err(BindError::configuration(if detail.is_empty() {
                format!("could not resolve package names: {}", e)
            } else {
                format!("could not resolve package names: {}", detail)
            }));
        }
    };

    let names: Vec<&str> = output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if names.len() != pending.len() {
        return Err(BindError::configuration(format!(
            "`{}` printed {} package name(s) for {} package(s)",
            cmd.display_command(),
            names.len(),
            pending.len()
        )));
    }

    let mut names = names.into_iter();
    let mut resolved = config.clone();
    for pkg in resolved.packages.iter_mut().filter(|p| p.is_name_inferred()) {
        // Counts were checked above.
        let Some(name) = names.next() else { break };
        if name != pkg.name() {
            debug!("package {} declares `{}`", pkg.import_path(), name);
        }
        *pkg = pkg.with_name(name).map_err(BindError::configuration)?;
    }
    info!(
        "resolved package names: {}",
        resolved
            .packages
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(Cow::Owned(resolved))
}
