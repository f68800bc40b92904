//! Draining buffered samples from the driver.
//!
//! Each pass fetches tracking data for every tracker involved in the active
//! mode and keeps fetching while any involved station still reports a fresh
//! sample, so a ring buffer backlog is emptied within one pass. Fresh
//! samples go through [`Session::record_sample`] which caches them for the
//! display and hands them to the decimator and the active log stream.

use tracing::{debug, trace};

use crate::driver::{StationKey, TrackerDriver};
use crate::session::Session;
use crate::station::RING_BUFFER_SAMPLES;

/// Upper bound on fetches per tracker in one pass.
///
/// A full ring buffer empties in [`RING_BUFFER_SAMPLES`] fetches; the extra
/// fetch observes the empty buffer. Samples arriving while draining wait for
/// the next pass.
pub const MAX_DRAIN_FETCHES: usize = RING_BUFFER_SAMPLES + 1;

/// Counters for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Tracking data fetches issued.
    pub fetches: usize,
    /// Fresh samples seen across all involved stations.
    pub fresh: usize,
    /// Rows written to the active log stream.
    pub logged: usize,
}

/// Drain every involved station until no fresh sample remains.
///
/// Driver failures end the pass for that tracker and are logged at debug
/// level; they never abort the session.
pub fn drain<D: TrackerDriver + ?Sized>(session: &mut Session, driver: &mut D) -> DrainStats {
    let mut stats = DrainStats::default();

    for (handle, stations) in session.poll_plan() {
        if stations.is_empty() {
            continue;
        }

        for _ in 0..MAX_DRAIN_FETCHES {
            let data = match driver.tracking_data(handle) {
                Ok(data) => data,
                Err(e) => {
                    debug!(tracker = %handle, error = %e, "Tracking data unavailable");
                    break;
                }
            };
            stats.fetches += 1;

            let mut any_fresh = false;
            for &station in &stations {
                let Some(sample) = data.station(station).filter(|s| s.new_data) else {
                    continue;
                };
                any_fresh = true;
                stats.fresh += 1;
                if session.record_sample(driver, StationKey::new(handle, station), sample) {
                    stats.logged += 1;
                }
            }

            if !any_fresh {
                break;
            }
        }
    }

    if stats.fresh > 0 {
        trace!(
            fetches = stats.fetches,
            fresh = stats.fresh,
            logged = stats.logged,
            "Drain pass complete"
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SimOp, SimulatedDriver, SimulatedTracker, StationSample, TrackerModel};
    use crate::session::{LogMode, SessionSettings};

    fn fresh(timestamp: f32) -> StationSample {
        StationSample {
            new_data: true,
            timestamp,
            ..Default::default()
        }
    }

    fn start(driver: &mut SimulatedDriver, dir: &std::path::Path) -> Session {
        let settings = SessionSettings {
            log_directory: dir.to_path_buf(),
            ..Default::default()
        };
        Session::start(driver, &settings).unwrap()
    }

    #[test]
    fn test_drain_empties_backlog_in_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = SimulatedDriver::new()
            .with_manual_clock()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1));
        let mut session = start(&mut driver, dir.path());
        let key = session.selected_key();
        for i in 1..=5 {
            driver.push_sample(key, fresh(i as f32)).unwrap();
        }

        let stats = drain(&mut session, &mut driver);

        assert_eq!(stats.fresh, 5);
        assert_eq!(stats.fetches, 6);
        assert_eq!(stats.logged, 0);
        assert_eq!(driver.pending(key), 0);
        assert_eq!(session.latest(key).unwrap().timestamp, 5.0);
    }

    #[test]
    fn test_drain_without_data_fetches_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = SimulatedDriver::new()
            .with_manual_clock()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1));
        let mut session = start(&mut driver, dir.path());

        let stats = drain(&mut session, &mut driver);
        assert_eq!(stats, DrainStats { fetches: 1, fresh: 0, logged: 0 });
    }

    #[test]
    fn test_drain_tolerates_driver_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = SimulatedDriver::new()
            .with_manual_clock()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1));
        let mut session = start(&mut driver, dir.path());
        driver.fail(SimOp::TrackingData);

        let stats = drain(&mut session, &mut driver);
        assert_eq!(stats, DrainStats::default());
    }

    #[test]
    fn test_drain_logs_decimated_rows_per_station() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = SimulatedDriver::new()
            .with_manual_clock()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1).with_stations(4, 2));
        let mut session = start(&mut driver, dir.path());
        let handle = session.current_tracker();
        session.skip = 1;
        session.mode = LogMode::TrackerStations;
        assert!(session.streams.open(crate::csvlog::LogTarget::TrackerStations));

        for station in 1..=2 {
            for i in 1..=4 {
                driver
                    .push_sample(StationKey::new(handle, station), fresh(i as f32))
                    .unwrap();
            }
        }

        let stats = drain(&mut session, &mut driver);

        assert_eq!(stats.fresh, 8);
        assert_eq!(stats.logged, 4);
    }
}
