//! Command implementations

pub mod bind;
pub mod completions;
pub mod doctor;
