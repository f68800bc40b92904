//! In-process simulated tracker driver.
//!
//! Models everything the control loop observes through [`TrackerDriver`]:
//! open/close bookkeeping, per-station configuration records with
//! driver-managed fields, hardware descriptors, bounded ring buffers of
//! samples, link statistics and a driver clock.
//!
//! Samples come from two sources:
//!
//! - **Scripted**: [`SimulatedDriver::push_sample`] enqueues a record for a
//!   station. Tests use this to feed exact sequences.
//! - **Generated**: with [`SimulatedDriver::with_generator`], every open
//!   connected station produces synthetic motion at a fixed rate, driven by
//!   either the wall clock or a manual clock ([`SimulatedDriver::advance`]).
//!
//! Passthrough operations (heading reset, boresight, aux output, scripts)
//! are recorded and exposed through [`SimulatedDriver::operations`]. Any
//! operation class can be made to fail with [`SimulatedDriver::fail`].

use std::collections::{HashSet, VecDeque};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use super::{
    AngleFormat, CommStats, DriverError, DriverResult, HardwareInfo, StationConfig,
    StationHardwareInfo, StationKey, StationSample, TrackerDriver, TrackerHandle, TrackerInfo,
    TrackerModel, TrackingData, MAX_AUX_INPUTS, MAX_AUX_OUTPUTS, MAX_BUTTONS, MAX_CHANNELS,
    MAX_STATIONS, MAX_TRACKERS,
};

/// Ring buffer capacity before [`TrackerDriver::ring_buffer_setup`] is called.
pub const DEFAULT_RING_CAPACITY: usize = 180;

/// Library version reported by simulated trackers.
const SIMULATED_LIB_VERSION: f32 = 4.2381;

/// Approximate size of one extended-data record on the wire, in kilobits.
const RECORD_KBITS: f32 = 0.55;

/// OS clock origin used with the manual clock, in seconds since the epoch.
const MANUAL_OS_EPOCH: f64 = 1_400_000_000.0;

// ─────────────────────────────────────────────────────────────────────────────
// Public description types
// ─────────────────────────────────────────────────────────────────────────────

/// Classes of driver operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    OpenAll,
    TrackerConfig,
    SetTrackerConfig,
    StationConfig,
    SetStationConfig,
    SystemHardwareInfo,
    StationHardwareInfo,
    TrackingData,
    CommInfo,
    Passthrough,
}

/// A passthrough operation received by the simulated driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Passthrough {
    ResetHeading(StationKey),
    Boresight(StationKey),
    Unboresight(StationKey),
    AuxOutput(StationKey, Vec<u8>),
    Script(TrackerHandle, String),
}

/// Description of one simulated tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTracker {
    pub model: TrackerModel,
    pub port: u32,
    /// Station slots the hardware reports.
    pub max_stations: u8,
    /// Leading stations that report themselves connected.
    pub connected: u8,
    pub aux_inputs: u8,
    pub aux_outputs: u8,
    pub buttons: u8,
    pub channels: u8,
}

impl SimulatedTracker {
    /// A tracker with one connected station and no inputs or outputs.
    pub fn new(model: TrackerModel, port: u32) -> Self {
        Self {
            model,
            port,
            max_stations: model.station_slots() as u8,
            connected: 1,
            aux_inputs: 0,
            aux_outputs: 0,
            buttons: 0,
            channels: 0,
        }
    }

    /// Set the number of station slots and how many of them are connected.
    pub fn with_stations(mut self, max_stations: u8, connected: u8) -> Self {
        self.max_stations = max_stations.clamp(1, MAX_STATIONS as u8);
        self.connected = connected.min(self.max_stations);
        self
    }

    /// Set auxiliary input and output byte counts.
    pub fn with_aux(mut self, inputs: u8, outputs: u8) -> Self {
        self.aux_inputs = inputs.min(MAX_AUX_INPUTS as u8);
        self.aux_outputs = outputs.min(MAX_AUX_OUTPUTS as u8);
        self
    }

    /// Set digital button and analog channel counts.
    pub fn with_inputs(mut self, buttons: u8, channels: u8) -> Self {
        self.buttons = buttons.min(MAX_BUTTONS as u8);
        self.channels = channels.min(MAX_CHANNELS as u8);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal state
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct StationState {
    config: StationConfig,
    hardware: StationHardwareInfo,
    pending: VecDeque<StationSample>,
    capacity: usize,
    buffering: bool,
    last: StationSample,
    next_due: f64,
}

impl StationState {
    fn enqueue(&mut self, mut sample: StationSample) {
        sample.new_data = true;
        self.pending.push_back(sample);
        while self.pending.len() > self.capacity {
            self.pending.pop_front();
        }
    }

    /// Oldest buffered record when buffering, otherwise the newest one.
    fn next_record(&mut self) -> StationSample {
        let next = if self.buffering {
            self.pending.pop_front()
        } else {
            let newest = self.pending.pop_back();
            self.pending.clear();
            newest
        };

        match next {
            Some(sample) => {
                self.last = sample;
                self.last.new_data = false;
                sample
            }
            None => self.last,
        }
    }
}

#[derive(Debug)]
struct TrackerState {
    spec: SimulatedTracker,
    info: TrackerInfo,
    stations: Vec<StationState>,
    open: bool,
}

impl TrackerState {
    fn new(spec: SimulatedTracker, ordinal: u32) -> Self {
        let info = TrackerInfo {
            lib_version: SIMULATED_LIB_VERSION,
            tracker_type: spec.model.tracker_type(),
            tracker_model: spec.model,
            port: spec.port,
            interface: 1,
            firmware_rev: 4.13,
            led_enable: true,
            ..Default::default()
        };

        let stations = (1..=spec.max_stations)
            .map(|station| {
                let connected = station <= spec.connected;
                StationState {
                    config: StationConfig {
                        state: connected,
                        angle_format: AngleFormat::Euler,
                        enhancement: 2,
                        compass: 2,
                        sensitivity: 3,
                        ..Default::default()
                    },
                    hardware: StationHardwareInfo {
                        valid: connected,
                        serial_num: ordinal * 1000 + u32::from(station),
                        firmware_rev: 4.17,
                        station_type: 1,
                        desc_version: "2.0".to_string(),
                        cal_date: "2014-05-15".to_string(),
                        port: u32::from(station),
                        aux_inputs: spec.aux_inputs,
                        aux_outputs: spec.aux_outputs,
                        num_buttons: spec.buttons,
                        num_channels: spec.channels,
                    },
                    pending: VecDeque::new(),
                    capacity: DEFAULT_RING_CAPACITY,
                    buffering: false,
                    last: StationSample::default(),
                    next_due: 0.0,
                }
            })
            .collect();

        Self {
            spec,
            info,
            stations,
            open: false,
        }
    }
}

#[derive(Debug)]
enum Clock {
    Wall(Instant),
    Manual(f64),
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver
// ─────────────────────────────────────────────────────────────────────────────

/// Simulated implementation of [`TrackerDriver`].
#[derive(Debug)]
pub struct SimulatedDriver {
    trackers: Vec<TrackerState>,
    rate_hz: Option<f64>,
    clock: Clock,
    os_epoch: f64,
    faults: HashSet<SimOp>,
    operations: Vec<Passthrough>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    /// A driver with no trackers, wall clock and no sample generator.
    pub fn new() -> Self {
        let os_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(MANUAL_OS_EPOCH);

        Self {
            trackers: Vec::new(),
            rate_hz: None,
            clock: Clock::Wall(Instant::now()),
            os_epoch,
            faults: HashSet::new(),
            operations: Vec::new(),
        }
    }

    /// Make a tracker available for opening. Trackers beyond
    /// [`MAX_TRACKERS`] are ignored.
    pub fn with_tracker(mut self, spec: SimulatedTracker) -> Self {
        if self.trackers.len() < MAX_TRACKERS {
            let ordinal = self.trackers.len() as u32 + 1;
            self.trackers.push(TrackerState::new(spec, ordinal));
        }
        self
    }

    /// Generate synthetic samples at `rate_hz` per connected station.
    pub fn with_generator(mut self, rate_hz: f64) -> Self {
        self.rate_hz = (rate_hz > 0.0).then_some(rate_hz);
        self
    }

    /// Use a manual clock starting at zero, advanced with [`Self::advance`].
    pub fn with_manual_clock(mut self) -> Self {
        self.clock = Clock::Manual(0.0);
        self.os_epoch = MANUAL_OS_EPOCH;
        self
    }

    /// Advance the manual clock. No effect on the wall clock.
    pub fn advance(&mut self, secs: f64) {
        if let Clock::Manual(now) = &mut self.clock {
            *now += secs.max(0.0);
        }
    }

    /// Enqueue a scripted sample for a station.
    pub fn push_sample(&mut self, key: StationKey, sample: StationSample) -> DriverResult<()> {
        self.station_mut(key)?.enqueue(sample);
        Ok(())
    }

    /// Number of samples waiting in a station's buffer.
    pub fn pending(&self, key: StationKey) -> usize {
        self.station(key).map(|s| s.pending.len()).unwrap_or(0)
    }

    /// Make every call of the given class fail until [`Self::recover`].
    pub fn fail(&mut self, op: SimOp) {
        self.faults.insert(op);
    }

    /// Stop failing calls of the given class.
    pub fn recover(&mut self, op: SimOp) {
        self.faults.remove(&op);
    }

    /// Passthrough operations received so far, oldest first.
    pub fn operations(&self) -> &[Passthrough] {
        &self.operations
    }

    fn now(&self) -> f64 {
        match &self.clock {
            Clock::Wall(start) => start.elapsed().as_secs_f64(),
            Clock::Manual(now) => *now,
        }
    }

    fn check(&self, op: SimOp) -> DriverResult<()> {
        if self.faults.contains(&op) {
            return Err(DriverError::Rejected(format!("simulated {:?} failure", op)));
        }
        Ok(())
    }

    fn tracker(&self, handle: TrackerHandle) -> DriverResult<&TrackerState> {
        self.trackers
            .get(handle.index())
            .filter(|t| t.open)
            .ok_or(DriverError::UnknownTracker(handle))
    }

    fn tracker_mut(&mut self, handle: TrackerHandle) -> DriverResult<&mut TrackerState> {
        self.trackers
            .get_mut(handle.index())
            .filter(|t| t.open)
            .ok_or(DriverError::UnknownTracker(handle))
    }

    fn station(&self, key: StationKey) -> DriverResult<&StationState> {
        self.tracker(key.tracker)?
            .stations
            .get(usize::from(key.station).wrapping_sub(1))
            .ok_or(DriverError::StationOutOfRange {
                tracker: key.tracker,
                station: key.station,
            })
    }

    fn station_mut(&mut self, key: StationKey) -> DriverResult<&mut StationState> {
        self.tracker_mut(key.tracker)?
            .stations
            .get_mut(usize::from(key.station).wrapping_sub(1))
            .ok_or(DriverError::StationOutOfRange {
                tracker: key.tracker,
                station: key.station,
            })
    }

    fn connected_station_mut(&mut self, key: StationKey) -> DriverResult<&mut StationState> {
        let station = self.station_mut(key)?;
        if !station.config.state {
            return Err(DriverError::StationNotConnected(key));
        }
        Ok(station)
    }

    /// Produce generated samples due up to the current clock.
    fn generate(&mut self) {
        let Some(rate) = self.rate_hz else {
            return;
        };
        let now = self.now();
        let period = 1.0 / rate;
        let os_epoch = self.os_epoch;

        for tracker in self.trackers.iter_mut().filter(|t| t.open) {
            let spec = tracker.spec.clone();
            for (slot, station) in tracker.stations.iter_mut().enumerate() {
                if !station.config.state {
                    continue;
                }
                let backlog_start = now - station.capacity as f64 * period;
                if station.next_due < backlog_start {
                    station.next_due = backlog_start.max(0.0);
                }
                while station.next_due <= now {
                    let sample = synthesize(station.next_due, slot as u8 + 1, os_epoch, &spec);
                    station.enqueue(sample);
                    station.next_due += period;
                }
            }
        }
    }
}

impl TrackerDriver for SimulatedDriver {
    fn open_all(&mut self) -> DriverResult<Vec<TrackerHandle>> {
        self.check(SimOp::OpenAll)?;
        if self.trackers.is_empty() {
            return Err(DriverError::NoTrackers);
        }
        for (index, tracker) in self.trackers.iter_mut().enumerate() {
            if !tracker.open {
                tracker.open = true;
                info!(
                    tracker = index + 1,
                    model = tracker.spec.model.name(),
                    port = tracker.spec.port,
                    "Opened simulated tracker"
                );
            }
        }
        Ok(self.open_handles())
    }

    fn open(&mut self, port: u32) -> DriverResult<TrackerHandle> {
        if self.trackers.iter().filter(|t| t.open).count() >= MAX_TRACKERS {
            return Err(DriverError::TooManyTrackers(MAX_TRACKERS));
        }
        let index = self
            .trackers
            .iter()
            .position(|t| !t.open && (port == 0 || t.spec.port == port))
            .ok_or(DriverError::NoTrackers)?;

        self.trackers[index].open = true;
        info!(tracker = index + 1, port, "Opened simulated tracker");
        TrackerHandle::new(index as u32 + 1).ok_or(DriverError::NoTrackers)
    }

    fn close(&mut self, handle: TrackerHandle) -> DriverResult<()> {
        let tracker = self.tracker_mut(handle)?;
        tracker.open = false;
        for station in &mut tracker.stations {
            station.buffering = false;
            station.pending.clear();
        }
        info!(tracker = %handle, "Closed simulated tracker");
        Ok(())
    }

    fn open_handles(&self) -> Vec<TrackerHandle> {
        self.trackers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.open)
            .filter_map(|(index, _)| TrackerHandle::new(index as u32 + 1))
            .collect()
    }

    fn tracker_config(&self, handle: TrackerHandle) -> DriverResult<TrackerInfo> {
        self.check(SimOp::TrackerConfig)?;
        Ok(self.tracker(handle)?.info.clone())
    }

    fn set_tracker_config(
        &mut self,
        handle: TrackerHandle,
        info: &TrackerInfo,
    ) -> DriverResult<()> {
        self.check(SimOp::SetTrackerConfig)?;
        let current = &mut self.tracker_mut(handle)?.info;
        // Identity fields belong to the hardware.
        current.sync_state = info.sync_state;
        current.sync_rate = info.sync_rate;
        current.sync_phase = info.sync_phase;
        current.ult_timeout = info.ult_timeout;
        current.ult_volume = info.ult_volume;
        current.led_enable = info.led_enable;
        Ok(())
    }

    fn station_config(&self, key: StationKey) -> DriverResult<StationConfig> {
        self.check(SimOp::StationConfig)?;
        Ok(self.station(key)?.config)
    }

    fn set_station_config(
        &mut self,
        key: StationKey,
        config: &StationConfig,
    ) -> DriverResult<()> {
        self.check(SimOp::SetStationConfig)?;
        let station = self.station_mut(key)?;
        let state = station.config.state;
        station.config = *config;
        station.config.state = state;
        debug!(%key, ?config, "Station configuration updated");
        Ok(())
    }

    fn system_hardware_info(&self, handle: TrackerHandle) -> DriverResult<HardwareInfo> {
        self.check(SimOp::SystemHardwareInfo)?;
        let tracker = self.tracker(handle)?;
        Ok(HardwareInfo {
            valid: true,
            model_name: tracker.spec.model.name().to_string(),
            max_stations: tracker.spec.max_stations,
        })
    }

    fn station_hardware_info(&self, key: StationKey) -> DriverResult<StationHardwareInfo> {
        self.check(SimOp::StationHardwareInfo)?;
        Ok(self.station(key)?.hardware.clone())
    }

    fn tracking_data(&mut self, handle: TrackerHandle) -> DriverResult<TrackingData> {
        self.check(SimOp::TrackingData)?;
        self.tracker(handle)?;
        self.generate();

        let tracker = self.tracker_mut(handle)?;
        let mut data = TrackingData::default();
        for (slot, station) in tracker.stations.iter_mut().enumerate() {
            data.stations[slot] = station.next_record();
        }
        Ok(data)
    }

    fn comm_info(&self, handle: TrackerHandle) -> DriverResult<CommStats> {
        self.check(SimOp::CommInfo)?;
        let tracker = self.tracker(handle)?;
        let records_per_sec = match self.rate_hz {
            Some(rate) => (rate * f64::from(tracker.spec.connected)).round() as u32,
            None => 0,
        };
        Ok(CommStats {
            kbits_per_sec: records_per_sec as f32 * RECORD_KBITS,
            records_per_sec,
        })
    }

    fn reset_heading(&mut self, key: StationKey) -> DriverResult<()> {
        self.check(SimOp::Passthrough)?;
        self.connected_station_mut(key)?;
        self.operations.push(Passthrough::ResetHeading(key));
        Ok(())
    }

    fn boresight(&mut self, key: StationKey) -> DriverResult<()> {
        self.check(SimOp::Passthrough)?;
        self.connected_station_mut(key)?;
        self.operations.push(Passthrough::Boresight(key));
        Ok(())
    }

    fn unboresight(&mut self, key: StationKey) -> DriverResult<()> {
        self.check(SimOp::Passthrough)?;
        self.connected_station_mut(key)?;
        self.operations.push(Passthrough::Unboresight(key));
        Ok(())
    }

    fn aux_output(&mut self, key: StationKey, bytes: &[u8]) -> DriverResult<()> {
        self.check(SimOp::Passthrough)?;
        let outputs = usize::from(self.connected_station_mut(key)?.hardware.aux_outputs);
        if outputs == 0 {
            return Err(DriverError::Unsupported("aux output"));
        }
        if bytes.len() > outputs {
            return Err(DriverError::Rejected(format!(
                "{} aux output bytes sent, station accepts {}",
                bytes.len(),
                outputs
            )));
        }
        self.operations
            .push(Passthrough::AuxOutput(key, bytes.to_vec()));
        Ok(())
    }

    fn send_script(&mut self, handle: TrackerHandle, script: &str) -> DriverResult<()> {
        self.check(SimOp::Passthrough)?;
        self.tracker(handle)?;
        let script = script.trim_end();
        if script.trim().is_empty() {
            return Err(DriverError::Rejected("empty protocol command".to_string()));
        }
        self.operations
            .push(Passthrough::Script(handle, script.to_string()));
        Ok(())
    }

    fn ring_buffer_setup(&mut self, key: StationKey, samples: usize) -> DriverResult<()> {
        let station = self.station_mut(key)?;
        station.capacity = samples.max(1);
        while station.pending.len() > station.capacity {
            station.pending.pop_front();
        }
        Ok(())
    }

    fn ring_buffer_start(&mut self, key: StationKey) -> DriverResult<()> {
        self.station_mut(key)?.buffering = true;
        Ok(())
    }

    fn time(&self) -> f64 {
        self.now()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Synthetic motion
// ─────────────────────────────────────────────────────────────────────────────

/// Synthetic record for a station at driver time `t`.
fn synthesize(t: f64, station: u8, os_epoch: f64, spec: &SimulatedTracker) -> StationSample {
    let phase = f64::from(station) * 0.7;
    let yaw = (t * 20.0 + f64::from(station) * 45.0).rem_euclid(360.0) - 180.0;
    let pitch = 10.0 * (t + phase).sin();
    let roll = 5.0 * (t * 0.5 + phase).cos();

    let yaw_rate = 20.0_f64.to_radians();
    let pitch_rate = (10.0 * (t + phase).cos()).to_radians();
    let roll_rate = (-2.5 * (t * 0.5 + phase).sin()).to_radians();
    let gyro = [roll_rate as f32, pitch_rate as f32, yaw_rate as f32];

    let os_time = os_epoch + t;

    let mut buttons = [false; MAX_BUTTONS];
    let ticks = t as u64;
    for (i, pressed) in buttons.iter_mut().enumerate().take(usize::from(spec.buttons)) {
        *pressed = (ticks >> i) & 1 == 1;
    }

    let mut analog = [0u8; MAX_CHANNELS];
    for (i, value) in analog.iter_mut().enumerate().take(usize::from(spec.channels)) {
        *value = (127.5 + 127.0 * (t + i as f64).sin()) as u8;
    }

    let mut aux_inputs = [0u8; MAX_AUX_INPUTS];
    for (i, value) in aux_inputs
        .iter_mut()
        .enumerate()
        .take(usize::from(spec.aux_inputs))
    {
        *value = station.wrapping_mul(16).wrapping_add(i as u8);
    }

    StationSample {
        new_data: false,
        position: [
            (0.5 * (t * 0.5 + phase).sin()) as f32,
            (0.5 * (t * 0.5 + phase).cos()) as f32,
            (1.5 + 0.1 * t.sin()) as f32,
        ],
        euler: [yaw as f32, pitch as f32, roll as f32],
        quaternion: euler_to_quaternion(yaw, pitch, roll),
        angular_vel_body: gyro,
        angular_vel_nav: gyro,
        angular_vel_raw: gyro,
        accel_body: [0.0, 0.0, -9.81],
        accel_nav: [0.0, 0.0, -9.81],
        mag_body: [0.21, 0.02, 0.43],
        compass_yaw: yaw as f32,
        tracking_status: 255,
        comm_integrity: 100,
        meas_quality: 100,
        timestamp: t as f32,
        timestamp_seconds: t.trunc() as u32,
        timestamp_micros: (t.fract() * 1.0e6) as u32,
        os_timestamp_seconds: os_time.trunc() as u32,
        os_timestamp_micros: (os_time.fract() * 1.0e6) as u32,
        aux_inputs,
        buttons,
        analog,
        still_time: 0.0,
        battery_level: 3.7,
        temperature: (25.0 + 0.5 * (t / 60.0).sin()) as f32,
    }
}

/// Convert yaw/pitch/roll in degrees to a `[w, x, y, z]` quaternion.
fn euler_to_quaternion(yaw: f64, pitch: f64, roll: f64) -> [f32; 4] {
    let (sy, cy) = (yaw.to_radians() / 2.0).sin_cos();
    let (sp, cp) = (pitch.to_radians() / 2.0).sin_cos();
    let (sr, cr) = (roll.to_radians() / 2.0).sin_cos();

    [
        (cr * cp * cy + sr * sp * sy) as f32,
        (sr * cp * cy - cr * sp * sy) as f32,
        (cr * sp * cy + sr * cp * sy) as f32,
        (cr * cp * sy - sr * sp * cy) as f32,
    ]
}
