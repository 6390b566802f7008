//! Binding generator invocation.
//!
//! Runs the generator once for the whole package list and checks that it
//! left sources under `<work>/src/gobind`.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::builder::errors::{BindError, ToolFailure};
use crate::core::bind_config::BindConfig;
use crate::util::fs::Filesystem;
use crate::util::process::{Executor, ProcessBuilder};

/// Language pair the generator emits glue for.
pub const LANGUAGES: &str = "go,objc";

/// Build the generator command for `config`.
pub fn generator_command(config: &BindConfig) -> ProcessBuilder {
    let tool = &config.tools.gobind;
    let mut cmd = ProcessBuilder::new(&tool.program)
        .args(&tool.args)
        .arg(format!("-lang={}", LANGUAGES))
        .arg(format!("-outdir={}", config.work_dir.display()))
        .arg(format!("-tags={}", config.build_tags().join(",")));

    if !config.prefix.is_empty() {
        cmd = cmd.arg(format!("-prefix={}", config.prefix));
    }

    cmd.args(config.packages.iter().map(|p| p.import_path()))
        .env("GOOS", "darwin")
        .env("CGO_ENABLED", "1")
        .envs(&config.env)
        .cwd(&config.project_dir)
}

/// Run the generator and return the generated source directory.
pub fn generate(
    exec: &mut dyn Executor,
    fs: &dyn Filesystem,
    config: &BindConfig,
) -> Result<PathBuf, BindError> {
    let cmd = generator_command(config);
    info!(
        "generating bindings for {} package(s)",
        config.packages.len()
    );
    debug!("generator env: {:?}", cmd.get_envs());

    exec.run(&cmd).map_err(BindError::generation)?;

    let generated = config.generated_dir();
    if !fs.exists(&generated) {
        return Err(BindError::generation(ToolFailure::MissingOutput {
            path: generated,
        }));
    }
    Ok(generated)
}
