//! Configuration file handling for `~/.stationlog/config.ini`.
//!
//! The file is optional. Every key has a default, values present in the file
//! overlay those defaults, and command line flags override both.
//!
//! # Sections
//!
//! - `[logging]`: log directory and initial decimation skip count
//! - `[display]`: live line refresh interval and temperature display
//! - `[poll]`: idle sleep between control loop ticks
//! - `[simulator]`: simulated trackers and stations for the `run` command

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, DisplaySettings, LoggingSettings, PollSettings, SimulatorSettings,
};
