//! Filesystem utilities.
//!
//! Bundle layout goes through the [`Filesystem`] trait so it can be rendered
//! against an in-memory tree in tests; [`DiskFs`] is the real implementation.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

/// The filesystem primitives the bind pipeline needs.
pub trait Filesystem {
    /// Remove a file, symlink or directory tree. Missing paths are not an error.
    fn remove_all(&mut self, path: &Path) -> io::Result<()>;

    /// Create a directory and all missing parents.
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;

    /// Create a symlink at `link` whose contents are `target`.
    fn symlink(&mut self, target: &Path, link: &Path) -> io::Result<()>;

    /// Copy a regular file.
    fn copy_file(&mut self, from: &Path, to: &Path) -> io::Result<()>;

    /// Write a file, replacing any existing content.
    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Whether anything exists at `path` (symlinks are followed).
    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl Filesystem for DiskFs {
    fn remove_all(&mut self, path: &Path) -> io::Result<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn symlink(&mut self, target: &Path, link: &Path) -> io::Result<()> {
        symlink(target, link)
    }

    fn copy_file(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    // Relative targets resolve against the link's directory.
    let resolved = dst.parent().map(|p| p.join(src)).unwrap_or_else(|| src.to_path_buf());
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}
