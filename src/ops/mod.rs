//! High-level operations.
//!
//! This module contains the implementation of macbind commands.

pub mod bind;
pub mod doctor;

pub use bind::{bind, BindOptions, BindOutcome, Binder, WorkDir};
pub use doctor::{doctor, format_report, DoctorOptions, DoctorReport};
