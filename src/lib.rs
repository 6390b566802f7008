//! macbind - Bind Go packages into a multi-architecture static macOS framework
//!
//! This crate provides the library behind the `macbind` binary: the bind
//! pipeline, its configuration, and the environment checks.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for macbind unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations for the filesystem
/// and process execution.
#[cfg(test)]
pub mod test_support;

pub use builder::{BindError, Stage};
pub use core::{Arch, ArchTarget, BindConfig, PackageDescriptor};
pub use ops::{BindOutcome, Binder};
