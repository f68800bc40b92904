//! Default values for every configuration key.

use std::path::PathBuf;

use super::settings::*;
use crate::driver::{TrackerModel, MAX_STATIONS, MAX_TRACKERS};

pub const DEFAULT_LOG_DIRECTORY: &str = ".";
pub const DEFAULT_SKIP: u16 = 0;
pub const DEFAULT_REFRESH_MS: u64 = 50;
pub const DEFAULT_SLEEP_MS: u64 = 5;
pub const DEFAULT_SIM_TRACKERS: u32 = 1;
pub const DEFAULT_SIM_STATIONS: u8 = 4;
pub const DEFAULT_SIM_MODEL: TrackerModel = TrackerModel::Is900;
pub const DEFAULT_SIM_RATE_HZ: f64 = 180.0;

/// Upper bound for `[simulator] trackers`.
pub const MAX_SIM_TRACKERS: u32 = MAX_TRACKERS as u32;
/// Upper bound for `[simulator] stations`.
pub const MAX_SIM_STATIONS: u8 = MAX_STATIONS as u8;
/// Upper bound for `[simulator] rate_hz`.
pub const MAX_SIM_RATE_HZ: f64 = 1000.0;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
                skip: DEFAULT_SKIP,
            },
            display: DisplaySettings {
                refresh_ms: DEFAULT_REFRESH_MS,
                show_temperature: false,
            },
            poll: PollSettings {
                sleep_ms: DEFAULT_SLEEP_MS,
            },
            simulator: SimulatorSettings {
                trackers: DEFAULT_SIM_TRACKERS,
                stations: DEFAULT_SIM_STATIONS,
                model: DEFAULT_SIM_MODEL,
                rate_hz: DEFAULT_SIM_RATE_HZ,
            },
        }
    }
}
