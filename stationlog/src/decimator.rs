//! Per-station sample decimation.
//!
//! Keeps one sample out of every `skip + 1` for each station key. Counters
//! are independent per key and must be reset whenever the skip count
//! changes or logging restarts.

use std::collections::HashMap;

use crate::driver::StationKey;

/// Upper bound for the skip count.
pub const MAX_SKIP: u16 = u16::MAX;

/// Drop-N-keep-one filter keyed by station.
#[derive(Debug, Default)]
pub struct Decimator {
    skipped: HashMap<StationKey, u16>,
}

impl Decimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether the next sample for `key` is kept.
    ///
    /// Below `skip`, the counter is incremented and the sample dropped;
    /// otherwise the counter resets and the sample is kept.
    pub fn should_keep(&mut self, key: StationKey, skip: u16) -> bool {
        let count = self.skipped.entry(key).or_insert(0);
        if *count < skip {
            *count += 1;
            false
        } else {
            *count = 0;
            true
        }
    }

    /// Reset every counter.
    pub fn reset(&mut self) {
        self.skipped.clear();
    }
}
