//! Syncer CLI
//!
//! Command-line tools for inspecting what a sync server publishes.
//!
//! # Commands
//!
//! - `diff` - Show the patch an update from one document to another publishes
//! - `replay` - Feed a sequence of documents through a server and verify a
//!   subscriber converges

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Syncer command-line tools.
#[derive(Parser)]
#[command(name = "syncer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the patch published when the state moves from OLD to NEW
    Diff {
        /// Document holding the current state
        old: PathBuf,

        /// Document holding the next state
        new: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Replay newline-delimited JSON documents through a server
    Replay {
        /// File with one JSON document per line; the first is the initial state
        input: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Diff { old, new, format } => {
            commands::diff::run(&old, &new, &format)?;
        }
        Commands::Replay { input, format } => {
            commands::replay::run(&input, &format)?;
        }
        Commands::Version => {
            println!("Syncer CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Version field: {}", syncer_protocol::VERSION_KEY);
        }
    }

    Ok(())
}
