//! Tracker driver boundary.
//!
//! The vendor driver owns device discovery, protocol framing, transport,
//! ring buffering and timestamp reconciliation. This crate only talks to it
//! through the [`TrackerDriver`] trait, which mirrors the driver's public
//! operations one to one.
//!
//! # Conventions
//!
//! - Tracker handles are 1-based ordinals ([`TrackerHandle`]).
//! - Station numbers are 1-based (`1..=MAX_STATIONS`).
//! - Every call is fallible and non-blocking. [`TrackerDriver::tracking_data`]
//!   returns immediately with the next buffered record per station, flagged
//!   with `new_data`, or the last record with `new_data == false` when
//!   nothing newer exists.
//! - Configuration changes are read-modify-write: callers read the current
//!   [`StationConfig`], change the fields they manage and write it back, so
//!   fields managed by the driver are never clobbered.
//!
//! # Implementations
//!
//! [`SimulatedDriver`] models trackers in-process. It backs the CLI when no
//! hardware driver is available and drives the test suite.

mod error;
pub mod simulated;
mod types;

pub use error::DriverError;
pub use simulated::{Passthrough, SimOp, SimulatedDriver, SimulatedTracker};
pub use types::{
    AngleFormat, CommStats, HardwareInfo, StationConfig, StationHardwareInfo, StationKey,
    StationSample, TrackerHandle, TrackerInfo, TrackerModel, TrackerType, TrackingData,
    MAX_AUX_INPUTS, MAX_AUX_OUTPUTS, MAX_BUTTONS, MAX_CHANNELS, MAX_STATIONS, MAX_TRACKERS,
};

/// Result alias for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// Operations exposed by a tracker driver.
pub trait TrackerDriver {
    /// Detect and open every available tracker. Fails with
    /// [`DriverError::NoTrackers`] when nothing is found.
    fn open_all(&mut self) -> DriverResult<Vec<TrackerHandle>>;

    /// Open a single tracker by port. Port `0` opens the first available one.
    fn open(&mut self, port: u32) -> DriverResult<TrackerHandle>;

    /// Close an open tracker.
    fn close(&mut self, handle: TrackerHandle) -> DriverResult<()>;

    /// Handles of all currently open trackers, in ascending order.
    fn open_handles(&self) -> Vec<TrackerHandle>;

    /// Read tracker-level configuration.
    fn tracker_config(&self, handle: TrackerHandle) -> DriverResult<TrackerInfo>;

    /// Write tracker-level configuration.
    fn set_tracker_config(&mut self, handle: TrackerHandle, info: &TrackerInfo)
        -> DriverResult<()>;

    /// Read a station's configuration.
    fn station_config(&self, key: StationKey) -> DriverResult<StationConfig>;

    /// Write a station's configuration.
    fn set_station_config(&mut self, key: StationKey, config: &StationConfig)
        -> DriverResult<()>;

    /// Read the system hardware descriptor.
    fn system_hardware_info(&self, handle: TrackerHandle) -> DriverResult<HardwareInfo>;

    /// Read a station's hardware descriptor.
    fn station_hardware_info(&self, key: StationKey) -> DriverResult<StationHardwareInfo>;

    /// Fetch the next tracking record for every station of a tracker.
    fn tracking_data(&mut self, handle: TrackerHandle) -> DriverResult<TrackingData>;

    /// Read link statistics.
    fn comm_info(&self, handle: TrackerHandle) -> DriverResult<CommStats>;

    /// Reset the heading of a station to zero.
    fn reset_heading(&mut self, key: StationKey) -> DriverResult<()>;

    /// Boresight a station to its current orientation.
    fn boresight(&mut self, key: StationKey) -> DriverResult<()>;

    /// Undo a previous boresight.
    fn unboresight(&mut self, key: StationKey) -> DriverResult<()>;

    /// Send auxiliary output bytes to a station.
    fn aux_output(&mut self, key: StationKey, bytes: &[u8]) -> DriverResult<()>;

    /// Send raw protocol commands to a tracker.
    fn send_script(&mut self, handle: TrackerHandle, script: &str) -> DriverResult<()>;

    /// Size a station's ring buffer, in samples.
    fn ring_buffer_setup(&mut self, key: StationKey, samples: usize) -> DriverResult<()>;

    /// Start buffering samples for a station.
    fn ring_buffer_start(&mut self, key: StationKey) -> DriverResult<()>;

    /// Driver clock, in seconds.
    fn time(&self) -> f64;
}
