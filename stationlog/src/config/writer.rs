//! INI serialization: [`ConfigFile`] to the commented text written by
//! `stationlog init`.

use super::settings::ConfigFile;
use crate::driver::TrackerModel;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[logging]
; Directory the CSV log files (stationdata.log, stationsdata.log, alldata.log)
; are created in. Existing files are overwritten when logging starts.
directory = {}
; Samples dropped between logged samples (0 logs every sample)
skip = {}

[display]
; Minimum milliseconds between live status line refreshes
refresh_ms = {}
; Show station temperature on the status line
show_temperature = {}

[poll]
; Milliseconds to sleep between control loop iterations
sleep_ms = {}

[simulator]
; Number of simulated trackers (1-32)
trackers = {}
; Connected stations per tracker (1-8)
stations = {}
; Tracker model: is300, is600, is900, is1200, inertiacube, intertrax
model = {}
; Generated samples per second per station
rate_hz = {}
"#,
        config.logging.directory.display(),
        config.logging.skip,
        config.display.refresh_ms,
        config.display.show_temperature,
        config.poll.sleep_ms,
        config.simulator.trackers,
        config.simulator.stations,
        model_key(config.simulator.model),
        config.simulator.rate_hz,
    )
}

fn model_key(model: TrackerModel) -> &'static str {
    match model {
        TrackerModel::Is300 => "is300",
        TrackerModel::Is600 => "is600",
        TrackerModel::Is1200 => "is1200",
        TrackerModel::InertiaCube => "inertiacube",
        TrackerModel::InterTrax => "intertrax",
        TrackerModel::Is900 | TrackerModel::Unknown => "is900",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_model_key_parses_back() {
        for model in [
            TrackerModel::Is300,
            TrackerModel::Is600,
            TrackerModel::Is900,
            TrackerModel::Is1200,
            TrackerModel::InertiaCube,
            TrackerModel::InterTrax,
        ] {
            assert_eq!(TrackerModel::from_config_str(model_key(model)), Some(model));
        }
    }

    #[test]
    fn test_default_config_text() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("[logging]\n"));
        assert!(text.contains("skip = 0\n"));
        assert!(text.contains("model = is900\n"));
        assert!(text.contains("rate_hz = 180\n"));
    }
}
