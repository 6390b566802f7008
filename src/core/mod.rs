//! Core data structures for macbind.
//!
//! This module contains the inputs of a bind run:
//! - Package descriptors and file base names
//! - Architecture targets and their environments
//! - The immutable run configuration

pub mod arch;
pub mod bind_config;
pub mod package;

pub use arch::{Arch, ArchTarget};
pub use bind_config::{BindConfig, ToolCommand, Tools};
pub use package::PackageDescriptor;
