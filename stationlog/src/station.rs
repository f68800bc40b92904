//! Station configuration store and validity table.
//!
//! Holds the local mirror of every (tracker, station) configuration along
//! with its hardware descriptor and whether the station reported itself
//! connected when its tracker was last configured.
//!
//! The driver is the source of truth. Every mutation goes through
//! [`StationStore::update`], which reads the current record from the driver,
//! applies one change and writes it back, so fields the console does not
//! manage are never overwritten with stale local values.

use std::collections::BTreeMap;

use tracing::debug;

use crate::driver::{
    DriverResult, StationConfig, StationHardwareInfo, StationKey, TrackerDriver, TrackerHandle,
    MAX_STATIONS,
};

/// Ring buffer size requested for every connected station.
///
/// Roughly one second of data at the typical rate of wired devices.
pub const RING_BUFFER_SAMPLES: usize = 180;

/// Everything known locally about one station.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationRecord {
    /// Last configuration read from or written to the driver.
    pub config: StationConfig,
    /// Hardware descriptor, if it could be read.
    pub hardware: StationHardwareInfo,
    /// Station was connected when its tracker was configured.
    pub valid: bool,
}

/// Per-(tracker, station) records for every open tracker.
#[derive(Debug, Default)]
pub struct StationStore {
    records: BTreeMap<StationKey, StationRecord>,
    lib_version: Option<f32>,
}

impl StationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply console defaults to every station of a tracker and rebuild its
    /// validity entries.
    ///
    /// Defaults: extended data on, aux inputs off, timestamps on, digital
    /// inputs off. Connected stations get a ring buffer of
    /// [`RING_BUFFER_SAMPLES`]. Write failures are tolerated. Returns the
    /// number of valid stations.
    pub fn configure_defaults<D: TrackerDriver + ?Sized>(
        &mut self,
        driver: &mut D,
        handle: TrackerHandle,
    ) -> usize {
        let mut valid = 0;

        for station in 1..=MAX_STATIONS as u8 {
            let key = StationKey::new(handle, station);
            let record = self.records.entry(key).or_default();

            let mut config = match driver.station_config(key) {
                Ok(config) => config,
                Err(e) => {
                    debug!(%key, error = %e, "Station configuration unavailable");
                    record.config = StationConfig::default();
                    record.valid = false;
                    continue;
                }
            };

            if self.lib_version.is_none() {
                self.lib_version = driver.tracker_config(handle).ok().map(|t| t.lib_version);
            }

            config.extended_data = true;
            config.aux_inputs = false;
            config.timestamped = true;
            config.digital_inputs = false;

            if let Err(e) = driver.set_station_config(key, &config) {
                debug!(%key, error = %e, "Default station configuration not applied");
            }

            record.config = config;
            record.valid = config.state;

            if config.state {
                valid += 1;
                if let Err(e) = driver
                    .ring_buffer_setup(key, RING_BUFFER_SAMPLES)
                    .and_then(|_| driver.ring_buffer_start(key))
                {
                    debug!(%key, error = %e, "Ring buffer not started");
                }
            }
        }

        valid
    }

    /// Read hardware descriptors for every station slot of a tracker.
    /// Unreadable descriptors are stored as invalid.
    pub fn load_hardware<D: TrackerDriver + ?Sized>(&mut self, driver: &D, handle: TrackerHandle) {
        for station in 1..=MAX_STATIONS as u8 {
            let key = StationKey::new(handle, station);
            let hardware = driver.station_hardware_info(key).unwrap_or_default();
            self.records.entry(key).or_default().hardware = hardware;
        }
    }

    /// Read-modify-write one station's configuration.
    ///
    /// The local mirror changes only when both the read and the write
    /// succeed.
    pub fn update<D, F>(
        &mut self,
        driver: &mut D,
        key: StationKey,
        mutate: F,
    ) -> DriverResult<StationConfig>
    where
        D: TrackerDriver + ?Sized,
        F: FnOnce(&mut StationConfig),
    {
        let mut config = driver.station_config(key)?;
        mutate(&mut config);
        driver.set_station_config(key, &config)?;
        self.records.entry(key).or_default().config = config;
        Ok(config)
    }

    /// Re-read one station's configuration from the driver.
    pub fn refresh<D: TrackerDriver + ?Sized>(
        &mut self,
        driver: &D,
        key: StationKey,
    ) -> DriverResult<StationConfig> {
        let config = driver.station_config(key)?;
        self.records.entry(key).or_default().config = config;
        Ok(config)
    }

    /// Forget the local configuration mirror of a tracker. Validity and
    /// hardware entries are kept.
    pub fn clear_configs(&mut self, handle: TrackerHandle) {
        for (_, record) in self.records.range_mut(tracker_range(handle)) {
            record.config = StationConfig::default();
        }
    }

    /// Local configuration for a station, default if unknown.
    pub fn config(&self, key: StationKey) -> StationConfig {
        self.records
            .get(&key)
            .map(|r| r.config)
            .unwrap_or_default()
    }

    /// Hardware descriptor for a station.
    pub fn hardware(&self, key: StationKey) -> Option<&StationHardwareInfo> {
        self.records.get(&key).map(|r| &r.hardware)
    }

    /// Whether the station was connected at configuration time.
    pub fn is_valid(&self, key: StationKey) -> bool {
        self.records.get(&key).is_some_and(|r| r.valid)
    }

    /// Valid station numbers of a tracker, ascending.
    pub fn valid_stations(&self, handle: TrackerHandle) -> Vec<u8> {
        self.records
            .range(tracker_range(handle))
            .filter(|(_, r)| r.valid)
            .map(|(key, _)| key.station)
            .collect()
    }

    /// Driver library version, read from the first tracker configured.
    pub fn lib_version(&self) -> Option<f32> {
        self.lib_version
    }
}

fn tracker_range(handle: TrackerHandle) -> std::ops::RangeInclusive<StationKey> {
    StationKey::new(handle, 0)..=StationKey::new(handle, u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SimOp, SimulatedDriver, SimulatedTracker, TrackerModel};

    fn handle(n: u32) -> TrackerHandle {
        TrackerHandle::new(n).unwrap()
    }

    fn open_driver() -> SimulatedDriver {
        let mut driver = SimulatedDriver::new()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1).with_stations(4, 2));
        driver.open_all().unwrap();
        driver
    }

    #[test]
    fn test_configure_defaults_marks_connected_stations_valid() {
        let mut driver = open_driver();
        let mut store = StationStore::new();

        let valid = store.configure_defaults(&mut driver, handle(1));

        assert_eq!(valid, 2);
        assert_eq!(store.valid_stations(handle(1)), vec![1, 2]);
        assert!(!store.is_valid(StationKey::new(handle(1), 3)));
        assert!(store.lib_version().is_some());
    }

    #[test]
    fn test_configure_defaults_pushes_defaults_to_driver() {
        let mut driver = open_driver();
        let mut store = StationStore::new();
        store.configure_defaults(&mut driver, handle(1));

        let key = StationKey::new(handle(1), 1);
        let config = driver.station_config(key).unwrap();
        assert!(config.extended_data);
        assert!(config.timestamped);
        assert!(!config.aux_inputs);
        assert!(!config.digital_inputs);
        assert_eq!(store.config(key), config);
    }

    #[test]
    fn test_configure_defaults_tolerates_write_failure() {
        let mut driver = open_driver();
        driver.fail(SimOp::SetStationConfig);
        let mut store = StationStore::new();

        let valid = store.configure_defaults(&mut driver, handle(1));
        assert_eq!(valid, 2);
    }

    #[test]
    fn test_update_reads_driver_before_writing() {
        let mut driver = open_driver();
        let mut store = StationStore::new();
        store.configure_defaults(&mut driver, handle(1));
        let key = StationKey::new(handle(1), 1);

        // Change a field behind the store's back.
        let mut external = driver.station_config(key).unwrap();
        external.prediction = 30;
        driver.set_station_config(key, &external).unwrap();

        store
            .update(&mut driver, key, |c| c.timestamped = !c.timestamped)
            .unwrap();

        let config = driver.station_config(key).unwrap();
        assert_eq!(config.prediction, 30, "unmanaged field survives");
        assert!(!config.timestamped);
        assert_eq!(store.config(key), config);
    }

    #[test]
    fn test_update_failure_leaves_mirror_unchanged() {
        let mut driver = open_driver();
        let mut store = StationStore::new();
        store.configure_defaults(&mut driver, handle(1));
        let key = StationKey::new(handle(1), 1);
        let before = store.config(key);

        driver.fail(SimOp::SetStationConfig);
        assert!(store.update(&mut driver, key, |c| c.enhancement = 0).is_err());
        assert_eq!(store.config(key), before);
    }

    #[test]
    fn test_load_hardware_and_clear_configs() {
        let mut driver = open_driver();
        let mut store = StationStore::new();
        store.configure_defaults(&mut driver, handle(1));
        store.load_hardware(&driver, handle(1));

        let key = StationKey::new(handle(1), 2);
        assert!(store.hardware(key).unwrap().valid);
        assert!(!store.hardware(StationKey::new(handle(1), 8)).unwrap().valid);

        store.clear_configs(handle(1));
        assert_eq!(store.config(key), StationConfig::default());
        assert!(store.is_valid(key), "validity survives a config reset");
    }
}
