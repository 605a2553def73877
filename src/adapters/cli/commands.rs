//! CLI Commands
//!
//! Argument definitions for the token vetter. Handlers live in the binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Token Vetter - Listing feed screening agent
#[derive(Parser, Debug)]
#[command(
    name = "token-vetter",
    version = env!("CARGO_PKG_VERSION"),
    about = "Screens newly listed tokens and records trade intents for the survivors",
    long_about = "Token Vetter polls listing feeds, checks every candidate against a safety \
                  service and a chain of filters, ranks the survivors by score and hands \
                  high-confidence picks to a trade recorder and the operator."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the polling loop (Ctrl+C to stop)
    Run(RunCmd),

    /// Evaluate a single contract address
    Evaluate(EvaluateCmd),

    /// Run one cycle against recorded fixtures (offline, paper mode)
    Replay(ReplayCmd),

    /// Validate the configuration file and exit
    CheckConfig,
}

/// Start the polling loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Record trades locally even if the config enables the relay
    #[arg(short, long)]
    pub paper: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Override the feed categories (comma separated)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub categories: Option<Vec<String>>,
}

/// Evaluate one token
#[derive(Parser, Debug)]
pub struct EvaluateCmd {
    /// Token contract address
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Record trades locally even if the config enables the relay
    #[arg(short, long)]
    pub paper: bool,

    /// Print the verdict as JSON
    #[arg(long)]
    pub json: bool,
}

/// Replay recorded fixtures
#[derive(Parser, Debug)]
pub struct ReplayCmd {
    /// Fixture file (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub fixtures: PathBuf,

    /// Print the ranked batch as JSON
    #[arg(long)]
    pub json: bool,
}
