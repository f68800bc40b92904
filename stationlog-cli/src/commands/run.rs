//! `stationlog run` - the interactive console.

use std::path::{Path, PathBuf};

use clap::Args;
use stationlog::config::{
    config_directory, ConfigFile, SimulatorSettings, MAX_SIM_STATIONS, MAX_SIM_TRACKERS,
};
use stationlog::control::{ControlLoop, ControlSettings};
use stationlog::driver::{SimulatedDriver, SimulatedTracker};
use stationlog::logging::{default_log_file, init_logging};
use stationlog::session::SessionSettings;
use tracing::info;

use super::common::ModelArg;
use crate::error::CliError;
use crate::terminal::{ConsoleOut, CrosstermKeys, DialoguerPrompter, RawModeGuard};

/// Arguments for the run command.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Number of simulated trackers
    #[arg(long)]
    pub trackers: Option<u32>,

    /// Connected stations per simulated tracker
    #[arg(long)]
    pub stations: Option<u8>,

    /// Simulated tracker model
    #[arg(long, value_enum)]
    pub model: Option<ModelArg>,

    /// Samples dropped between logged samples
    #[arg(long)]
    pub skip: Option<u16>,
}

/// Run the console until the operator quits.
pub fn run(config_path: &Path, log_dir: Option<PathBuf>, args: RunArgs) -> Result<(), CliError> {
    let mut config = ConfigFile::load_from(config_path)?;
    apply_overrides(&mut config, log_dir, &args)?;

    let _logging = init_logging(&config_directory(), default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;
    info!(
        config = %config_path.display(),
        trackers = config.simulator.trackers,
        "Starting stationlog {}",
        stationlog::VERSION
    );

    let driver = build_driver(&config.simulator);
    let _raw = RawModeGuard::enable().map_err(CliError::Terminal)?;

    let mut control = ControlLoop::start(
        driver,
        &SessionSettings::from(&config),
        ControlSettings::from(&config),
        CrosstermKeys,
        DialoguerPrompter::new(),
        ConsoleOut::stdout(),
    )?;

    control.run().map_err(CliError::Terminal)
}

/// Apply command line overrides on top of the loaded configuration.
fn apply_overrides(
    config: &mut ConfigFile,
    log_dir: Option<PathBuf>,
    args: &RunArgs,
) -> Result<(), CliError> {
    if let Some(dir) = log_dir {
        config.logging.directory = dir;
    }
    if let Some(skip) = args.skip {
        config.logging.skip = skip;
    }
    if let Some(model) = args.model {
        config.simulator.model = model.into();
    }
    if let Some(trackers) = args.trackers {
        if trackers > MAX_SIM_TRACKERS {
            return Err(CliError::Config(format!(
                "--trackers must be at most {}",
                MAX_SIM_TRACKERS
            )));
        }
        config.simulator.trackers = trackers;
    }
    if let Some(stations) = args.stations {
        if stations == 0 || stations > MAX_SIM_STATIONS {
            return Err(CliError::Config(format!(
                "--stations must be between 1 and {}",
                MAX_SIM_STATIONS
            )));
        }
        config.simulator.stations = stations;
    }
    Ok(())
}

/// Build the simulated driver described by `[simulator]`.
fn build_driver(settings: &SimulatorSettings) -> SimulatedDriver {
    let slots = settings.model.station_slots() as u8;
    let connected = settings.stations.min(slots);

    (0..settings.trackers).fold(
        SimulatedDriver::new().with_generator(settings.rate_hz),
        |driver, i| {
            driver.with_tracker(
                SimulatedTracker::new(settings.model, i + 1)
                    .with_stations(slots, connected)
                    .with_aux(2, 2)
                    .with_inputs(6, 2),
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stationlog::driver::{TrackerDriver, TrackerModel};

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = ConfigFile::default();
        let args = RunArgs {
            trackers: Some(2),
            stations: Some(3),
            model: Some(ModelArg::Is600),
            skip: Some(4),
        };

        apply_overrides(&mut config, Some(PathBuf::from("/tmp/logs")), &args).unwrap();

        assert_eq!(config.simulator.trackers, 2);
        assert_eq!(config.simulator.stations, 3);
        assert_eq!(config.simulator.model, TrackerModel::Is600);
        assert_eq!(config.logging.skip, 4);
        assert_eq!(config.logging.directory, PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn test_overrides_reject_out_of_range() {
        let mut config = ConfigFile::default();
        let args = RunArgs {
            stations: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            apply_overrides(&mut config, None, &args),
            Err(CliError::Config(_))
        ));

        let args = RunArgs {
            trackers: Some(MAX_SIM_TRACKERS + 1),
            ..Default::default()
        };
        assert!(apply_overrides(&mut config, None, &args).is_err());
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = ConfigFile::default();
        apply_overrides(&mut config, None, &RunArgs::default()).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_build_driver_opens_configured_trackers() {
        let settings = SimulatorSettings {
            trackers: 2,
            stations: 3,
            model: TrackerModel::Is900,
            rate_hz: 100.0,
        };
        let mut driver = build_driver(&settings);

        let handles = driver.open_all().unwrap();
        assert_eq!(handles.len(), 2);
        let tracker = driver.tracker_config(handles[1]).unwrap();
        assert_eq!(tracker.port, 2);
    }

    #[test]
    fn test_build_driver_without_trackers() {
        let settings = SimulatorSettings {
            trackers: 0,
            ..ConfigFile::default().simulator
        };
        let mut driver = build_driver(&settings);
        assert!(driver.open_all().is_err());
    }
}
