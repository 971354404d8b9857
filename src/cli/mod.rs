//! Command-line interface.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "flowsmith",
    version,
    about = "Turn a natural-language automation goal into a validated workflow graph"
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Load configuration from a specific file instead of the standard
    /// .flowsmith/ merge
    #[arg(long, global = true, env = "FLOWSMITH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .flowsmith/config.yaml
    Init(commands::init::InitArgs),
    /// Run a goal through the pipeline
    Run(commands::run::RunArgs),
    /// Show engine status
    Status,
}

/// Print an error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        eprintln!(
            "{}",
            serde_json::json!({"error": format!("{err:#}")})
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
