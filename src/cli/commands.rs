//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - vote: run an interactive tournament over a list of names
//! - queue: inspect, drain, or repair the pending save queue

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tourney - pairwise name tournaments with an offline-safe save queue
#[derive(Parser, Debug)]
#[command(name = "tourney")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Vote on every pair of names read from a file
    Vote {
        /// File with one name per line
        #[arg(short, long)]
        names: PathBuf,

        /// User the ratings are saved for
        #[arg(short, long)]
        user: String,

        /// Start offline and keep every save queued
        #[arg(long)]
        offline: bool,
    },

    /// Pending save queue commands
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
}

/// Queue maintenance subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueueCommands {
    /// Show pending and dead-lettered saves
    Status,

    /// Deliver pending saves now
    Drain,

    /// Move dead-lettered saves back to the pending queue
    RequeueDead,
}
