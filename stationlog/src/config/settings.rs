//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;

use crate::driver::TrackerModel;

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub logging: LoggingSettings,
    pub display: DisplaySettings,
    pub poll: PollSettings,
    pub simulator: SimulatorSettings,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory the CSV log files are created in.
    pub directory: PathBuf,
    /// Samples dropped between kept samples when the session starts.
    pub skip: u16,
}

/// `[display]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    /// Minimum interval between live line refreshes.
    pub refresh_ms: u64,
    pub show_temperature: bool,
}

/// `[poll]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    /// Sleep between control loop ticks.
    pub sleep_ms: u64,
}

/// `[simulator]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorSettings {
    /// Number of simulated trackers.
    pub trackers: u32,
    /// Connected stations per tracker.
    pub stations: u8,
    pub model: TrackerModel,
    /// Generated samples per second per station.
    pub rate_hz: f64,
}
