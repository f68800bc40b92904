//! Console session state.
//!
//! A [`Session`] owns everything the control loop mutates: the open tracker
//! handles, the current tracker and station selection, the logging mode,
//! the decimator, the station store, the log streams and the latest sample
//! seen per station. It is passed explicitly to every operation; there is no
//! process-wide state.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::csvlog::{LogStreams, LogTarget};
use crate::decimator::Decimator;
use crate::driver::{
    DriverError, StationKey, StationSample, TrackerDriver, TrackerHandle, TrackerInfo,
};
use crate::station::StationStore;

/// Station count assumed when the hardware descriptor is unavailable.
const FALLBACK_MAX_STATIONS: u8 = 4;

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No tracker could be opened.
    #[error("Did not detect any tracking devices")]
    NoTrackers,

    /// The driver failed while opening trackers.
    #[error("Driver error: {0}")]
    Driver(DriverError),
}

impl From<DriverError> for SessionError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::NoTrackers => SessionError::NoTrackers,
            other => SessionError::Driver(other),
        }
    }
}

/// Active logging mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Off,
    Station,
    TrackerStations,
    AllTrackers,
}

impl LogMode {
    /// Log target written in this mode.
    pub fn target(self) -> Option<LogTarget> {
        match self {
            LogMode::Off => None,
            LogMode::Station => Some(LogTarget::Station),
            LogMode::TrackerStations => Some(LogTarget::TrackerStations),
            LogMode::AllTrackers => Some(LogTarget::AllTrackers),
        }
    }

    pub fn from_target(target: LogTarget) -> Self {
        match target {
            LogTarget::Station => LogMode::Station,
            LogTarget::TrackerStations => LogMode::TrackerStations,
            LogTarget::AllTrackers => LogMode::AllTrackers,
        }
    }
}

/// Settings a session starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Directory the log files are created in.
    pub log_directory: PathBuf,
    /// Samples dropped between kept samples.
    pub skip: u16,
    pub show_temperature: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("."),
            skip: 0,
            show_temperature: false,
        }
    }
}

impl From<&ConfigFile> for SessionSettings {
    fn from(config: &ConfigFile) -> Self {
        Self {
            log_directory: config.logging.directory.clone(),
            skip: config.logging.skip,
            show_temperature: config.display.show_temperature,
        }
    }
}

/// Mutable state of one console session.
#[derive(Debug)]
pub struct Session {
    pub(crate) handles: Vec<TrackerHandle>,
    pub(crate) current: usize,
    pub(crate) station: u8,
    pub(crate) max_stations: u8,
    pub(crate) mode: LogMode,
    pub(crate) skip: u16,
    pub(crate) decimator: Decimator,
    pub(crate) store: StationStore,
    pub(crate) streams: LogStreams,
    pub(crate) latest: HashMap<StationKey, StationSample>,
    pub(crate) show_temperature: bool,
    pub(crate) tracker_info: TrackerInfo,
}

impl Session {
    /// Open every tracker, apply station defaults and select the first
    /// connected station of the first tracker.
    pub fn start<D: TrackerDriver + ?Sized>(
        driver: &mut D,
        settings: &SessionSettings,
    ) -> Result<Self, SessionError> {
        let handles = driver.open_all()?;
        if handles.is_empty() {
            return Err(SessionError::NoTrackers);
        }
        info!(trackers = handles.len(), "Found/opened trackers");

        let mut store = StationStore::new();
        for handle in &handles {
            let valid = store.configure_defaults(driver, *handle);
            store.load_hardware(driver, *handle);
            info!(tracker = %handle, valid_stations = valid, "Configured tracker defaults");
        }

        let station = store
            .valid_stations(handles[0])
            .first()
            .copied()
            .unwrap_or(1);

        let mut session = Self {
            handles,
            current: 0,
            station,
            max_stations: FALLBACK_MAX_STATIONS,
            mode: LogMode::Off,
            skip: settings.skip,
            decimator: Decimator::new(),
            store,
            streams: LogStreams::new(settings.log_directory.clone()),
            latest: HashMap::new(),
            show_temperature: settings.show_temperature,
            tracker_info: TrackerInfo::default(),
        };
        session.refresh_current_tracker(driver);
        Ok(session)
    }

    /// Re-read the current tracker's configuration and station capacity.
    pub fn refresh_current_tracker<D: TrackerDriver + ?Sized>(&mut self, driver: &D) {
        let handle = self.current_tracker();
        self.tracker_info = driver.tracker_config(handle).unwrap_or_default();
        self.max_stations = driver
            .system_hardware_info(handle)
            .ok()
            .filter(|hw| hw.valid)
            .map(|hw| hw.max_stations)
            .unwrap_or(FALLBACK_MAX_STATIONS);
    }

    pub fn handles(&self) -> &[TrackerHandle] {
        &self.handles
    }

    /// Index of the current tracker in [`Self::handles`].
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_tracker(&self) -> TrackerHandle {
        self.handles[self.current]
    }

    /// Selected 1-based station number.
    pub fn station(&self) -> u8 {
        self.station
    }

    pub fn selected_key(&self) -> StationKey {
        StationKey::new(self.current_tracker(), self.station)
    }

    /// Station capacity of the current tracker.
    pub fn max_stations(&self) -> u8 {
        self.max_stations
    }

    pub fn mode(&self) -> LogMode {
        self.mode
    }

    pub fn skip(&self) -> u16 {
        self.skip
    }

    pub fn store(&self) -> &StationStore {
        &self.store
    }

    pub fn streams(&self) -> &LogStreams {
        &self.streams
    }

    pub fn show_temperature(&self) -> bool {
        self.show_temperature
    }

    /// Configuration of the current tracker as last read.
    pub fn tracker_info(&self) -> &TrackerInfo {
        &self.tracker_info
    }

    /// Most recent fresh sample seen for a station.
    pub fn latest(&self, key: StationKey) -> Option<&StationSample> {
        self.latest.get(&key)
    }

    /// Stations to drain for the active mode, grouped by tracker.
    ///
    /// With logging off or single-station logging only the selected station
    /// is drained; otherwise every valid station of the involved trackers.
    pub fn poll_plan(&self) -> Vec<(TrackerHandle, Vec<u8>)> {
        let current = self.current_tracker();
        match self.mode {
            LogMode::Off | LogMode::Station => vec![(current, vec![self.station])],
            LogMode::TrackerStations => vec![(current, self.store.valid_stations(current))],
            LogMode::AllTrackers => self
                .handles
                .iter()
                .map(|h| (*h, self.store.valid_stations(*h)))
                .collect(),
        }
    }

    /// Record a fresh sample: remember it for display and, when logging,
    /// pass it through the decimator into the active stream.
    ///
    /// Returns whether a row was written.
    pub fn record_sample<D: TrackerDriver + ?Sized>(
        &mut self,
        driver: &D,
        key: StationKey,
        sample: &StationSample,
    ) -> bool {
        self.latest.insert(key, *sample);

        let Some(target) = self.mode.target() else {
            return false;
        };
        if !self.decimator.should_keep(key, self.skip) {
            return false;
        }
        let Some(stream) = self.streams.get_mut(target) else {
            return false;
        };
        match stream.write(driver, &self.store, &self.handles, key, sample) {
            Ok(()) => true,
            Err(e) => {
                warn!(%key, error = %e, "Failed to write log row");
                false
            }
        }
    }

    /// Turn logging off, close every stream and reset decimation.
    pub fn stop_logging(&mut self) {
        self.mode = LogMode::Off;
        self.streams.close_all();
        self.decimator.reset();
    }

    /// Close every stream and the current tracker.
    pub fn shutdown<D: TrackerDriver + ?Sized>(&mut self, driver: &mut D) {
        self.stop_logging();
        let handle = self.current_tracker();
        match driver.close(handle) {
            Ok(()) => info!(tracker = %handle, "Tracker closed"),
            Err(e) => debug!(tracker = %handle, error = %e, "Tracker close failed"),
        }
    }
}
