//! dropin CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dropin_cli::{Cli, Commands, cmd, log_level};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs on stderr, results on stdout
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan { file, main, format } => cmd::plan::plan(&file, main.as_deref(), format),
        Commands::Check { file } => cmd::check::check(&file),
    }
}
