//! Argument types shared across CLI commands.

use clap::ValueEnum;
use stationlog::driver::TrackerModel;

/// Tracker model selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModelArg {
    /// IS-300 orientation tracker (4 stations)
    Is300,
    /// IS-600 tracker (8 stations)
    Is600,
    /// IS-900 tracker (8 stations)
    Is900,
    /// IS-1200 tracker (4 stations)
    Is1200,
    /// InertiaCube single-station sensor
    Inertiacube,
    /// InterTrax single-station sensor
    Intertrax,
}

impl From<ModelArg> for TrackerModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Is300 => TrackerModel::Is300,
            ModelArg::Is600 => TrackerModel::Is600,
            ModelArg::Is900 => TrackerModel::Is900,
            ModelArg::Is1200 => TrackerModel::Is1200,
            ModelArg::Inertiacube => TrackerModel::InertiaCube,
            ModelArg::Intertrax => TrackerModel::InterTrax,
        }
    }
}
