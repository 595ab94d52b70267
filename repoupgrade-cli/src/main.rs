//! repoupgrade CLI - Command-line interface
//!
//! Upgrades Package Control repository files to newer schema versions and
//! manages the tool's persistent settings.

mod commands;
mod error;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::config::ConfigCommands;
use commands::inspect::InspectArgs;
use commands::upgrade::UpgradeArgs;

#[derive(Debug, Parser)]
#[command(name = "repoupgrade", version)]
#[command(about = "Upgrade Package Control repository JSON files to newer schema versions")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upgrade a repository file to a newer schema
    Upgrade(UpgradeArgs),

    /// Show the schema version and size of a repository file
    Inspect(InspectArgs),

    /// View or change configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Upgrade(args) => commands::upgrade::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Config(command) => commands::config::run(command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
