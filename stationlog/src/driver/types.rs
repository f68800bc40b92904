//! Value types exchanged with the tracker driver.
//!
//! These mirror the records the vendor driver hands back: tracker and station
//! configuration, hardware descriptors, link statistics and tracking samples.
//! They are plain data; all behavior lives in the driver and the session.

use std::fmt;

/// Maximum number of trackers a process may hold open at once.
pub const MAX_TRACKERS: usize = 32;

/// Maximum number of stations per tracker.
pub const MAX_STATIONS: usize = 8;

/// Maximum number of digital buttons reported per station.
pub const MAX_BUTTONS: usize = 8;

/// Maximum number of analog channels reported per station.
pub const MAX_CHANNELS: usize = 10;

/// Maximum number of auxiliary input bytes per station.
pub const MAX_AUX_INPUTS: usize = 4;

/// Maximum number of auxiliary output bytes per station.
pub const MAX_AUX_OUTPUTS: usize = 4;

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque handle for an open tracker.
///
/// Handles are 1-based ordinals assigned by the driver; `0` never names a
/// tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackerHandle(u32);

impl TrackerHandle {
    /// Create a handle from its 1-based ordinal. Returns `None` for `0`.
    pub fn new(ordinal: u32) -> Option<Self> {
        (ordinal > 0).then_some(Self(ordinal))
    }

    /// The 1-based ordinal.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The 0-based slot index.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for TrackerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one station on one tracker. Station numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationKey {
    pub tracker: TrackerHandle,
    pub station: u8,
}

impl StationKey {
    pub fn new(tracker: TrackerHandle, station: u8) -> Self {
        Self { tracker, station }
    }

    /// The 0-based station slot.
    pub fn slot(&self) -> usize {
        usize::from(self.station.saturating_sub(1))
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tracker {} station {}", self.tracker, self.station)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracker-level records
// ─────────────────────────────────────────────────────────────────────────────

/// Product family of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerType {
    #[default]
    Unknown,
    PrecisionSeries,
    InterTraxSeries,
}

impl TrackerType {
    /// Numeric code used in log metadata.
    pub fn code(self) -> u32 {
        match self {
            TrackerType::Unknown => 0,
            TrackerType::PrecisionSeries => 1,
            TrackerType::InterTraxSeries => 2,
        }
    }

    /// Human-readable family name.
    pub fn name(self) -> &'static str {
        match self {
            TrackerType::Unknown => "Unknown",
            TrackerType::PrecisionSeries => "IS Precision Series",
            TrackerType::InterTraxSeries => "InterTrax Series",
        }
    }
}

/// Tracker model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerModel {
    #[default]
    Unknown,
    Is300,
    Is600,
    Is900,
    Is1200,
    InertiaCube,
    InterTrax,
}

impl TrackerModel {
    /// Numeric code used in log metadata.
    pub fn code(self) -> u32 {
        match self {
            TrackerModel::Unknown => 0,
            TrackerModel::Is300 => 1,
            TrackerModel::Is600 => 2,
            TrackerModel::Is900 => 3,
            TrackerModel::InterTrax => 4,
            TrackerModel::InertiaCube => 5,
            TrackerModel::Is1200 => 6,
        }
    }

    /// Model name as printed on the hardware.
    pub fn name(self) -> &'static str {
        match self {
            TrackerModel::Unknown => "Unknown Tracker",
            TrackerModel::Is300 => "IS-300",
            TrackerModel::Is600 => "IS-600",
            TrackerModel::Is900 => "IS-900",
            TrackerModel::Is1200 => "IS-1200",
            TrackerModel::InertiaCube => "InertiaCube",
            TrackerModel::InterTrax => "InterTrax",
        }
    }

    /// Product family the model belongs to.
    pub fn tracker_type(self) -> TrackerType {
        match self {
            TrackerModel::Unknown => TrackerType::Unknown,
            TrackerModel::InterTrax => TrackerType::InterTraxSeries,
            _ => TrackerType::PrecisionSeries,
        }
    }

    /// Whether the model reports position as well as orientation.
    pub fn has_position(self) -> bool {
        matches!(
            self,
            TrackerModel::Is600 | TrackerModel::Is900 | TrackerModel::Is1200
        )
    }

    /// Number of station slots shown for this model.
    pub fn station_slots(self) -> usize {
        match self {
            TrackerModel::Is300 | TrackerModel::Is1200 => 4,
            TrackerModel::Is600 | TrackerModel::Is900 => MAX_STATIONS,
            _ => 1,
        }
    }

    /// Parse a model name as used in configuration files.
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "").as_str() {
            "is300" => Some(TrackerModel::Is300),
            "is600" => Some(TrackerModel::Is600),
            "is900" => Some(TrackerModel::Is900),
            "is1200" => Some(TrackerModel::Is1200),
            "inertiacube" => Some(TrackerModel::InertiaCube),
            "intertrax" => Some(TrackerModel::InterTrax),
            _ => None,
        }
    }
}

/// Tracker-level configuration and identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerInfo {
    pub lib_version: f32,
    pub tracker_type: TrackerType,
    pub tracker_model: TrackerModel,
    pub port: u32,
    pub sync_state: u32,
    pub sync_rate: f32,
    pub sync_phase: u32,
    pub interface: u32,
    pub ult_timeout: u32,
    pub ult_volume: u32,
    pub firmware_rev: f32,
    pub led_enable: bool,
}

/// Link throughput statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommStats {
    pub kbits_per_sec: f32,
    pub records_per_sec: u32,
}

/// System-level hardware descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HardwareInfo {
    pub valid: bool,
    pub model_name: String,
    pub max_stations: u8,
}

// ─────────────────────────────────────────────────────────────────────────────
// Station-level records
// ─────────────────────────────────────────────────────────────────────────────

/// Orientation representation a station reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleFormat {
    #[default]
    Euler,
    Quaternion,
}

/// Per-station configuration as held by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StationConfig {
    /// Station reported itself connected.
    pub state: bool,
    pub extended_data: bool,
    pub aux_inputs: bool,
    pub digital_inputs: bool,
    pub timestamped: bool,
    pub angle_format: AngleFormat,
    /// Perceptual enhancement level, 0..=2.
    pub enhancement: u8,
    /// Compass mode, 0..=2.
    pub compass: u8,
    /// Sensitivity level, 1..=4.
    pub sensitivity: u8,
    /// Prediction horizon in milliseconds, 0..=50 in steps of 10.
    pub prediction: u8,
}

/// Per-station hardware descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationHardwareInfo {
    pub valid: bool,
    pub serial_num: u32,
    pub firmware_rev: f32,
    pub station_type: u32,
    pub desc_version: String,
    pub cal_date: String,
    pub port: u32,
    pub aux_inputs: u8,
    pub aux_outputs: u8,
    pub num_buttons: u8,
    pub num_channels: u8,
}

/// One tracking record for one station.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StationSample {
    /// Set when the driver has not handed this record out before.
    pub new_data: bool,
    pub position: [f32; 3],
    pub euler: [f32; 3],
    pub quaternion: [f32; 4],
    pub angular_vel_body: [f32; 3],
    pub angular_vel_nav: [f32; 3],
    pub angular_vel_raw: [f32; 3],
    pub accel_body: [f32; 3],
    pub accel_nav: [f32; 3],
    pub mag_body: [f32; 3],
    pub compass_yaw: f32,
    /// Raw tracking quality, 0..=255.
    pub tracking_status: u8,
    pub comm_integrity: u8,
    pub meas_quality: u8,
    /// Device timestamp in seconds.
    pub timestamp: f32,
    pub timestamp_seconds: u32,
    pub timestamp_micros: u32,
    pub os_timestamp_seconds: u32,
    pub os_timestamp_micros: u32,
    pub aux_inputs: [u8; MAX_AUX_INPUTS],
    pub buttons: [bool; MAX_BUTTONS],
    pub analog: [u8; MAX_CHANNELS],
    pub still_time: f32,
    pub battery_level: f32,
    pub temperature: f32,
}

impl StationSample {
    /// Device timestamp at full precision, in seconds.
    pub fn device_time(&self) -> f64 {
        f64::from(self.timestamp_seconds) + f64::from(self.timestamp_micros) * 1.0e-6
    }

    /// OS-correlated timestamp, in seconds.
    pub fn os_time(&self) -> f64 {
        f64::from(self.os_timestamp_seconds) + f64::from(self.os_timestamp_micros) * 1.0e-6
    }
}

/// One fetch worth of samples for a tracker, indexed by station slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackingData {
    pub stations: [StationSample; MAX_STATIONS],
}

impl TrackingData {
    /// Sample for a 1-based station number.
    pub fn station(&self, station: u8) -> Option<&StationSample> {
        usize::from(station)
            .checked_sub(1)
            .and_then(|slot| self.stations.get(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_handle_rejects_zero() {
        assert!(TrackerHandle::new(0).is_none());
        let handle = TrackerHandle::new(3).unwrap();
        assert_eq!(handle.get(), 3);
        assert_eq!(handle.index(), 2);
    }

    #[test]
    fn test_model_position_support() {
        assert!(TrackerModel::Is900.has_position());
        assert!(TrackerModel::Is1200.has_position());
        assert!(!TrackerModel::InertiaCube.has_position());
        assert!(!TrackerModel::Is300.has_position());
    }

    #[test]
    fn test_model_from_config_str() {
        assert_eq!(TrackerModel::from_config_str("IS-900"), Some(TrackerModel::Is900));
        assert_eq!(
            TrackerModel::from_config_str("inertiacube"),
            Some(TrackerModel::InertiaCube)
        );
        assert_eq!(TrackerModel::from_config_str("vive"), None);
    }

    #[test]
    fn test_sample_precise_times() {
        let sample = StationSample {
            timestamp_seconds: 12,
            timestamp_micros: 500_000,
            os_timestamp_seconds: 1000,
            os_timestamp_micros: 250_000,
            ..Default::default()
        };
        assert!((sample.device_time() - 12.5).abs() < 1e-9);
        assert!((sample.os_time() - 1000.25).abs() < 1e-9);
    }

    #[test]
    fn test_tracking_data_station_lookup() {
        let data = TrackingData::default();
        assert!(data.station(0).is_none());
        assert!(data.station(1).is_some());
        assert!(data.station(8).is_some());
        assert!(data.station(9).is_none());
    }
}
