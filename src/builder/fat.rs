//! Fat archive fusion with `lipo -create`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::builder::errors::{BindError, ToolFailure};
use crate::core::arch::Arch;
use crate::core::bind_config::BindConfig;
use crate::util::fs::Filesystem;
use crate::util::process::{Executor, ProcessBuilder};

/// Per-architecture archive produced by the archive builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveArtifact {
    pub arch: Arch,
    pub path: PathBuf,
}

/// Pair every configured target with its artifact, in target order.
///
/// Fails on the first target without an artifact on disk.
pub fn collect_inputs<'a>(
    fs: &dyn Filesystem,
    config: &BindConfig,
    artifacts: &'a [ArchiveArtifact],
) -> Result<Vec<&'a ArchiveArtifact>, BindError> {
    config
        .targets
        .iter()
        .map(|target| {
            artifacts
                .iter()
                .find(|a| a.arch == target.arch && fs.exists(&a.path))
                .ok_or_else(|| {
                    BindError::fusion(ToolFailure::MissingArtifact { arch: target.arch })
                })
        })
        .collect()
}

/// `lipo -create -arch <tag> <path>... -o <output>`
pub fn fusion_command(
    config: &BindConfig,
    inputs: &[&ArchiveArtifact],
    output: &Path,
) -> ProcessBuilder {
    let tool = &config.tools.lipo;
    let mut cmd = ProcessBuilder::new(&tool.program)
        .args(&tool.args)
        .arg("-create");
    for input in inputs {
        cmd = cmd.arg("-arch").arg(input.arch.tag()).arg(&input.path);
    }
    cmd.arg("-o")
        .arg(output)
        .envs(&config.env)
        .cwd(&config.project_dir)
}

/// Fuse all artifacts into the fat archive at `output`.
pub fn fuse(
    exec: &mut dyn Executor,
    fs: &dyn Filesystem,
    config: &BindConfig,
    artifacts: &[ArchiveArtifact],
    output: &Path,
) -> Result<(), BindError> {
    let inputs = collect_inputs(fs, config, artifacts)?;
    info!(
        "fusing {} archive(s) into {}",
        inputs.len(),
        output.display()
    );
    exec.run(&fusion_command(config, &inputs, output))
        .map_err(BindError::fusion)?;
    Ok(())
}
