//! stationlog CLI - interactive tracker console
//!
//! `stationlog run` opens every simulated tracker and hands the terminal to
//! the control loop; `stationlog init` writes a default configuration file.

mod commands;
mod error;
mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stationlog::config::config_file_path;

use commands::run::RunArgs;

#[derive(Debug, Parser)]
#[command(name = "stationlog")]
#[command(version = stationlog::VERSION)]
#[command(about = "Poll, configure and log motion tracker stations", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.stationlog/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for CSV log files (overrides [logging] directory)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the interactive console
    Run(RunArgs),

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config_file_path);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(&config_path, cli.log_dir, args),
        Commands::Init { force } => commands::init::run(&config_path, force),
    };

    if let Err(e) = result {
        e.exit();
    }
}
