//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::runtime::lifetime::startup::MAINTENANCE_BATCH_SIZE;

/// URL shortener with base62 keys, read replicas and write-through caching
#[derive(Parser, Debug)]
#[command(name = "shortener")]
#[command(version)]
#[command(about = "A URL shortener service", long_about = None)]
pub struct Cli {
    /// Configuration file; missing files are ignored
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Assign keys to records left unkeyed by an interrupted create
    Reconcile {
        #[arg(long, default_value_t = MAINTENANCE_BATCH_SIZE)]
        batch_size: u64,
    },

    /// Re-add every assigned key to the membership filter
    RebuildFilter {
        #[arg(long, default_value_t = MAINTENANCE_BATCH_SIZE)]
        batch_size: u64,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print a sample config, or write it to PATH
    Generate {
        path: Option<String>,

        /// Overwrite PATH if it exists
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// The subcommand to run, `serve` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
