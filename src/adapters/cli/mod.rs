//! CLI Adapter
//!
//! Command-line interface for the token vetter.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, EvaluateCmd, ReplayCmd, RunCmd};
