//! CLI error handling with user-friendly messages.
//!
//! Centralizes error reporting for the CLI, providing consistent formatting
//! and exit codes: 2 when no tracker was found, 1 for everything else.

use std::fmt;
use std::path::PathBuf;
use std::process;

use stationlog::config::ConfigFileError;
use stationlog::session::SessionError;

/// Exit code when no tracker could be opened.
pub const EXIT_NO_TRACKERS: i32 = 2;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read, parsed or written
    ConfigFile(ConfigFileError),
    /// Invalid command line value
    Config(String),
    /// Configuration file exists and `--force` was not given
    ConfigExists(PathBuf),
    /// Session could not start
    Session(SessionError),
    /// Terminal setup or console output failed
    Terminal(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Session(SessionError::NoTrackers) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Tracker not powered or not connected");
                eprintln!("  2. Serial port in use by another application");
                eprintln!("  3. [simulator] trackers set to 0 in the config file");
                process::exit(EXIT_NO_TRACKERS)
            }
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it with defaults.");
            }
            CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Run 'stationlog init --force' to regenerate a valid file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigExists(path) => {
                write!(f, "Configuration file already exists: {}", path.display())
            }
            CliError::Session(e) => write!(f, "{}", e),
            CliError::Terminal(e) => write!(f, "Terminal error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Terminal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}
