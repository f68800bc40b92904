//! Driver error types.

use thiserror::Error;

use super::types::{StationKey, TrackerHandle};

/// Errors reported by a tracker driver.
///
/// Every driver call may fail. Callers in the control loop treat these as
/// transient: state is left unchanged and the operation is not retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DriverError {
    /// No tracker could be detected.
    #[error("No tracking devices detected")]
    NoTrackers,

    /// The handle does not name an open tracker.
    #[error("Tracker {0} is not open")]
    UnknownTracker(TrackerHandle),

    /// The station number is outside the tracker's range.
    #[error("Station {station} is out of range for tracker {tracker}")]
    StationOutOfRange { tracker: TrackerHandle, station: u8 },

    /// The station exists but is not connected.
    #[error("{0} is not connected")]
    StationNotConnected(StationKey),

    /// The tracker model does not support the operation.
    #[error("Operation '{0}' is not supported by this tracker")]
    Unsupported(&'static str),

    /// The driver refused the request.
    #[error("Driver rejected request: {0}")]
    Rejected(String),

    /// The maximum number of open trackers has been reached.
    #[error("Cannot open more than {0} trackers")]
    TooManyTrackers(usize),
}
