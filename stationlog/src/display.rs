//! Console rendering.
//!
//! The live status line is rewritten in place (it ends in `\r`), so every
//! formatter here returns a plain `String` and leaves writing to the caller.

use std::fmt::Write;

use crate::csvlog::tracking_quality;
use crate::driver::{
    AngleFormat, CommStats, StationConfig, StationHardwareInfo, StationKey, StationSample,
    TrackerDriver, TrackerInfo,
};
use crate::session::Session;
use crate::VERSION;

/// Blanks the live line before its layout changes width.
pub const CLEAR_LINE: &str =
    "                                                                              \r";

/// Default interval between live line refreshes, in seconds.
pub const DEFAULT_REFRESH_SECS: f64 = 0.05;

pub const HELP_TEXT: &str = "\
h -- Display this help text
=========================================
[1-8] -- Make station number current
n -- Cycle tracker number
=========================================
l -- Log current tracker / current station to 'stationdata.log' (overwrites)
L -- Log current tracker / all stations to 'stationsdata.log' (overwrites)
a -- Log all trackers / all stations to 'alldata.log' (overwrites)
x -- Stop logging (log file NOT deleted)
=========================================
< -- Show/hide AUX data (hex)
> -- Show/hide joystick data (binary, hex)
m -- Show/hide temperature
, -- Set AUX out bytes (hex)
[ -- Reduce recording rate (skip 1 more record)
] -- Increase recording rate (skip 1 less record)
=========================================
d -- Display current settings
e/p/c/s -- Cycle perceptual enhancement, prediction, compass, sensitivity
t -- Toggle timestamps
r -- Reset heading (3DOF only)
b/u -- Full boresight/unboresight (all trackers)
/ -- Send protocol commands
q -- Quit application
";

/// Format the live status line for one station.
pub fn format_station_line(
    comm: &CommStats,
    tracker: &TrackerInfo,
    config: &StationConfig,
    sample: &StationSample,
    hardware: Option<&StationHardwareInfo>,
    show_temperature: bool,
) -> String {
    let mut line = String::with_capacity(160);

    let _ = write!(
        line,
        "{:3.0}Kb {}R TQ/CI:{:3}/{:3}",
        comm.kbits_per_sec,
        comm.records_per_sec,
        tracking_quality(sample.tracking_status),
        sample.comm_integrity
    );

    if tracker.tracker_model.has_position() {
        let [x, y, z] = sample.position.map(|v| v * 100.0);
        let _ = write!(line, " ({:5.0},{:5.0},{:4.0})cm ", x, y, z);
    }

    match config.angle_format {
        AngleFormat::Quaternion => {
            let [w, x, y, z] = sample.quaternion;
            let _ = write!(line, "({:5.1},{:5.1},{:5.1},{:5.1})quat ", w, x, y, z);
        }
        AngleFormat::Euler => {
            let [yaw, pitch, roll] = sample.euler;
            let _ = write!(line, "({:6.1},{:5.1},{:6.1})deg ", yaw, pitch, roll);
        }
    }

    if config.aux_inputs {
        line.push_str("AUX:");
        let count = hardware.map(|hw| usize::from(hw.aux_inputs)).unwrap_or(0);
        for value in sample.aux_inputs.iter().take(count) {
            let _ = write!(line, "{:02X}", value);
        }
        line.push(' ');
    }

    if show_temperature {
        let _ = write!(line, "{:.1}C ", sample.temperature);
    }

    if config.digital_inputs {
        line.push_str("JOY:");
        let (buttons, channels) = hardware
            .map(|hw| (usize::from(hw.num_buttons), usize::from(hw.num_channels)))
            .unwrap_or((0, 0));
        for pressed in sample.buttons.iter().take(buttons) {
            line.push(if *pressed { '1' } else { '0' });
        }
        for value in sample.analog.iter().take(channels) {
            let _ = write!(line, " {:02X}", value);
        }
        line.push(' ');
    }

    let _ = write!(line, "{:.1}s \r", sample.timestamp);
    line
}

/// Format the tracker and station summary shown by `d` and after most
/// setting changes.
pub fn format_tracker_stats<D: TrackerDriver + ?Sized>(driver: &D, session: &Session) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\n\n========================== Tracker Information =========================="
    );
    let _ = writeln!(
        out,
        "Ver: {}, Lib: {:.4}. LogRatio: 1:{}. Press 'h' for help",
        VERSION,
        session.store().lib_version().unwrap_or(-1.0),
        u32::from(session.skip()) + 1
    );
    let logging = match session.mode().target() {
        Some(target) => format!("{} ({})", target.description(), target.file_name()),
        None => "None".to_string(),
    };
    let _ = writeln!(out, "LOGGING: {}\n", logging);

    let selected = session.selected_key();
    for (i, handle) in session.handles().iter().enumerate() {
        let Ok(tracker) = driver.tracker_config(*handle) else {
            let _ = writeln!(out, "Tracker configuration unavailable\n");
            continue;
        };
        let model_name = driver
            .system_hardware_info(*handle)
            .ok()
            .filter(|hw| hw.valid)
            .map(|hw| hw.model_name)
            .unwrap_or_else(|| "Unknown Tracker".to_string());
        let marker = if *handle == selected.tracker { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "[{}] Tracker {}, port {}: {}",
            marker,
            i + 1,
            tracker.port,
            model_name
        );

        let _ = writeln!(out, "  Sta Serial  FWVer TStamp State Enh. Sens. Comp. Pred.");
        for station in 1..=tracker.tracker_model.station_slots() as u8 {
            let key = StationKey::new(*handle, station);
            let Some(hw) = driver
                .station_hardware_info(key)
                .ok()
                .or_else(|| session.store().hardware(key).cloned())
                .filter(|hw| hw.valid)
            else {
                continue;
            };
            let Ok(config) = driver.station_config(key) else {
                continue;
            };
            if !config.state {
                continue;
            }

            let _ = writeln!(
                out,
                "{} {:<4}{:<8}{:<6}{:<8}{:<5}{:<5}{:<6}{:<6}{:<5}",
                if key == selected { '>' } else { ' ' },
                station,
                hw.serial_num,
                hw.firmware_rev,
                if config.timestamped { "ON" } else { "OFF" },
                if config.state { "ON" } else { "OFF" },
                config.enhancement,
                config.sensitivity,
                config.compass,
                config.prediction
            );
        }
        out.push('\n');
    }

    out
}

/// Rate limit for the live line, driven by the driver clock.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    interval: f64,
    last: Option<f64>,
}

impl RefreshGate {
    /// Gate allowing one refresh per `interval` seconds.
    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(0.0),
            last: None,
        }
    }

    /// Whether a refresh is due at `now`; marks it done if so.
    pub fn ready(&mut self, now: f64) -> bool {
        match self.last {
            Some(last) if now - last < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SimulatedDriver, SimulatedTracker, TrackerModel};
    use crate::session::SessionSettings;

    fn tracker(model: TrackerModel) -> TrackerInfo {
        TrackerInfo {
            tracker_model: model,
            ..Default::default()
        }
    }

    fn comm() -> CommStats {
        CommStats {
            kbits_per_sec: 57.6,
            records_per_sec: 180,
        }
    }

    #[test]
    fn test_station_line_with_position() {
        let sample = StationSample {
            position: [0.1, -0.25, 1.5],
            euler: [10.0, -5.0, 180.0],
            tracking_status: 255,
            comm_integrity: 100,
            timestamp: 12.34,
            ..Default::default()
        };
        let line = format_station_line(
            &comm(),
            &tracker(TrackerModel::Is900),
            &StationConfig::default(),
            &sample,
            None,
            false,
        );

        assert_eq!(
            line,
            " 58Kb 180R TQ/CI:100/100 (   10,  -25, 150)cm (  10.0, -5.0, 180.0)deg 12.3s \r"
        );
    }

    #[test]
    fn test_station_line_orientation_only() {
        let sample = StationSample {
            quaternion: [1.0, 0.0, 0.0, 0.0],
            ..Default::default()
        };
        let config = StationConfig {
            angle_format: AngleFormat::Quaternion,
            ..Default::default()
        };
        let line = format_station_line(
            &comm(),
            &tracker(TrackerModel::InertiaCube),
            &config,
            &sample,
            None,
            false,
        );

        assert!(!line.contains("cm"));
        assert!(line.contains("TQ/CI:  0/  0(  1.0,  0.0,  0.0,  0.0)quat "));
    }

    #[test]
    fn test_station_line_optional_fields() {
        let mut sample = StationSample {
            temperature: 31.5,
            aux_inputs: [0x0A, 0xFF, 0, 0],
            ..Default::default()
        };
        sample.buttons[0] = true;
        sample.analog[0] = 0x7F;
        let config = StationConfig {
            aux_inputs: true,
            digital_inputs: true,
            ..Default::default()
        };
        let hardware = StationHardwareInfo {
            aux_inputs: 2,
            num_buttons: 3,
            num_channels: 1,
            ..Default::default()
        };
        let line = format_station_line(
            &comm(),
            &tracker(TrackerModel::InertiaCube),
            &config,
            &sample,
            Some(&hardware),
            true,
        );

        assert!(line.contains("AUX:0AFF 31.5C JOY:100 7F 0.0s \r"));
    }

    #[test]
    fn test_refresh_gate() {
        let mut gate = RefreshGate::new(0.05);
        assert!(gate.ready(10.0));
        assert!(!gate.ready(10.02));
        assert!(gate.ready(10.06));
        assert!(!gate.ready(10.1));
    }

    #[test]
    fn test_tracker_stats() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = SimulatedDriver::new()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 3).with_stations(4, 2))
            .with_tracker(SimulatedTracker::new(TrackerModel::InertiaCube, 4));
        let settings = SessionSettings {
            log_directory: dir.path().to_path_buf(),
            skip: 2,
            ..Default::default()
        };
        let session = Session::start(&mut driver, &settings).unwrap();

        let text = format_tracker_stats(&driver, &session);

        assert!(text.contains("LogRatio: 1:3"));
        assert!(text.contains("LOGGING: None"));
        assert!(text.contains("[*] Tracker 1, port 3:"));
        assert!(text.contains("[ ] Tracker 2, port 4:"));
        assert!(text.contains(">  1   1001    "));
        assert!(text.contains("\n  2   1002    "));
        assert!(!text.contains("1003"));
    }
}
