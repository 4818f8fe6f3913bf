//! CLI argument definitions using clap
//!
//! Commands:
//! - tablec check --manifest <path>
//! - tablec compile --manifest <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tablec - a strict, deterministic configuration table compiler
#[derive(Parser, Debug)]
#[command(name = "tablec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the schema and every table, producing no output
    Check {
        /// Path to the project manifest
        #[arg(long, default_value = "./tablec.json")]
        manifest: PathBuf,
    },

    /// Validate and report per-table summaries for emitters
    Compile {
        /// Path to the project manifest
        #[arg(long, default_value = "./tablec.json")]
        manifest: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
