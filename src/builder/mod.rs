//! The bind pipeline stages.
//!
//! This module turns a [`BindConfig`](crate::core::BindConfig) into a
//! static framework: package name resolution, generator invocation,
//! per-architecture archive builds, fat archive fusion, and bundle layout.

pub mod archive;
pub mod errors;
pub mod events;
pub mod fat;
pub mod framework;
pub mod generator;
pub mod package_names;
pub mod templates;

pub use errors::{BindError, Stage, ToolFailure};
pub use events::{ArchiveStash, BindEvent, BindObserver, JsonEvents, NoopObserver};
pub use fat::ArchiveArtifact;
pub use framework::{FrameworkLayout, HeaderPlan};
