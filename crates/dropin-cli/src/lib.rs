//! dropin - partition co-installed plugins into dropin packages
#![allow(clippy::missing_errors_doc)]
//!
//! Reads an install plan (TOML), runs the resolution pipeline of
//! `dropin-core` over it and prints the resulting placement.

pub mod cmd;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command line.
#[derive(Debug, Parser)]
#[command(name = "dropin")]
#[command(author, version, about = "dropin - partition co-installed plugins into dropin packages")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins if set
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve an install plan and print where every unit goes
    Plan {
        /// Install plan file
        file: PathBuf,
        /// Override the main package name of the plan
        #[arg(long)]
        main: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Load and validate an install plan without resolving it
    Check {
        /// Install plan file
        file: PathBuf,
    },
}

/// How `plan` prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Default log filter for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
