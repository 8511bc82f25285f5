// src/cli/mod.rs
//! Command-line interface definitions

/// Argument structures for every subcommand
pub mod commands;

pub use commands::{Action, Commands, ConfigOptions, SetFields, SetOptions, StartOptions};
