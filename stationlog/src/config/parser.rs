//! INI parsing: `Ini` to [`ConfigFile`].
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::defaults::{MAX_SIM_RATE_HZ, MAX_SIM_STATIONS, MAX_SIM_TRACKERS};
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::driver::TrackerModel;

/// Parse an `Ini` into a `ConfigFile`, overlaying `ConfigFile::default()`.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("skip") {
            config.logging.skip = parse_number("logging", "skip", v, "expected 0 to 65535")?;
        }
    }

    // [display] section
    if let Some(section) = ini.section(Some("display")) {
        if let Some(v) = section.get("refresh_ms") {
            config.display.refresh_ms =
                parse_number("display", "refresh_ms", v, "expected milliseconds")?;
        }
        if let Some(v) = section.get("show_temperature") {
            config.display.show_temperature = parse_bool(v);
        }
    }

    // [poll] section
    if let Some(section) = ini.section(Some("poll")) {
        if let Some(v) = section.get("sleep_ms") {
            config.poll.sleep_ms = parse_number("poll", "sleep_ms", v, "expected milliseconds")?;
        }
    }

    // [simulator] section
    if let Some(section) = ini.section(Some("simulator")) {
        if let Some(v) = section.get("trackers") {
            let trackers: u32 = parse_number("simulator", "trackers", v, "expected a count")?;
            if !(1..=MAX_SIM_TRACKERS).contains(&trackers) {
                return Err(invalid(
                    "simulator",
                    "trackers",
                    v,
                    &format!("must be between 1 and {}", MAX_SIM_TRACKERS),
                ));
            }
            config.simulator.trackers = trackers;
        }
        if let Some(v) = section.get("stations") {
            let stations: u8 = parse_number("simulator", "stations", v, "expected a count")?;
            if !(1..=MAX_SIM_STATIONS).contains(&stations) {
                return Err(invalid(
                    "simulator",
                    "stations",
                    v,
                    &format!("must be between 1 and {}", MAX_SIM_STATIONS),
                ));
            }
            config.simulator.stations = stations;
        }
        if let Some(v) = section.get("model") {
            config.simulator.model = TrackerModel::from_config_str(v).ok_or_else(|| {
                invalid(
                    "simulator",
                    "model",
                    v,
                    "must be one of: is300, is600, is900, is1200, inertiacube, intertrax",
                )
            })?;
        }
        if let Some(v) = section.get("rate_hz") {
            let rate: f64 = parse_number("simulator", "rate_hz", v, "expected a number")?;
            if !(rate > 0.0 && rate <= MAX_SIM_RATE_HZ) {
                return Err(invalid(
                    "simulator",
                    "rate_hz",
                    v,
                    &format!("must be above 0 and at most {}", MAX_SIM_RATE_HZ),
                ));
            }
            config.simulator.rate_hz = rate;
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a boolean value from config.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
