//! Log metadata written once at the top of each log file.
//!
//! Three blocks describe the log, the open trackers and the connected
//! stations, so a file can be interpreted without remembering the settings
//! in effect when it was recorded. The data column header follows.

use std::io::{self, Write};

use chrono::Local;

use super::row::COLUMN_HEADER;
use crate::driver::{StationKey, TrackerDriver, TrackerHandle};
use crate::station::StationStore;

/// Version written into the log metadata.
pub const LOG_VERSION: &str = crate::VERSION;

const TRACKER_COLUMNS: &str = "TrackerNum,LibVersion,TrackerType,TrackerModel,Port,SyncState,\
SyncRate,SyncPhase,Interface,UltTimeout,UltVolume,FirmwareRev,LedEnable";

const STATION_COLUMNS: &str = "TrackerNum,StationNum,Serial,FW,StationType,Descriptor,CalDate,\
Port,Timestamp,State,Enhancement,Sensitivity,Compass,Prediction";

/// Current local time in `asctime` layout, e.g. `Sat Oct 18 15:22:07 2026`.
pub fn log_date() -> String {
    Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Write the metadata blocks and the column header.
pub fn write_header<W, D>(
    out: &mut W,
    driver: &D,
    store: &StationStore,
    handles: &[TrackerHandle],
    log_date: &str,
) -> io::Result<()>
where
    W: Write + ?Sized,
    D: TrackerDriver + ?Sized,
{
    writeln!(out, "[BEGIN LOG INFO]")?;
    writeln!(out, "Version,LogDate")?;
    writeln!(out, "{},{}", LOG_VERSION, log_date)?;
    writeln!(out, "[END LOG INFO]")?;
    writeln!(out)?;

    writeln!(out, "[BEGIN TRACKER INFO]")?;
    writeln!(out, "{}", TRACKER_COLUMNS)?;
    for (i, handle) in handles.iter().enumerate() {
        let num = i + 1;
        match driver.tracker_config(*handle) {
            Ok(t) => writeln!(
                out,
                "{},{:.4},{},{},{},{},{:.6},{},{},{},{},{:.4},{}",
                num,
                t.lib_version,
                t.tracker_type.code(),
                t.tracker_model.code(),
                t.port,
                t.sync_state,
                t.sync_rate,
                t.sync_phase,
                t.interface,
                t.ult_timeout,
                t.ult_volume,
                t.firmware_rev,
                u8::from(t.led_enable)
            )?,
            Err(_) => writeln!(out, "{},{}", num, errors(12))?,
        }
    }
    writeln!(out, "[END TRACKER INFO]")?;
    writeln!(out)?;

    writeln!(out, "[BEGIN STATION INFO]")?;
    writeln!(out, "{}", STATION_COLUMNS)?;
    for (i, handle) in handles.iter().enumerate() {
        let num = i + 1;
        let tracker = match driver.tracker_config(*handle) {
            Ok(t) => t,
            Err(_) => {
                writeln!(out, "{},{}", num, errors(13))?;
                continue;
            }
        };

        for station in 1..=tracker.tracker_model.station_slots() as u8 {
            let key = StationKey::new(*handle, station);
            let Some(hw) = store.hardware(key).filter(|hw| hw.valid) else {
                continue;
            };
            match driver.station_config(key) {
                Ok(config) if config.state => writeln!(
                    out,
                    "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                    num,
                    station,
                    hw.serial_num,
                    hw.firmware_rev,
                    hw.station_type,
                    hw.desc_version,
                    hw.cal_date,
                    hw.port,
                    on_off(config.timestamped),
                    on_off(config.state),
                    config.enhancement,
                    config.sensitivity,
                    config.compass,
                    config.prediction
                )?,
                Ok(_) => {}
                Err(_) => writeln!(out, "{},{},{}", num, station, errors(12))?,
            }
        }
    }
    writeln!(out, "[END STATION INFO]")?;
    writeln!(out)?;

    writeln!(out, "{}", COLUMN_HEADER)
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

fn errors(count: usize) -> String {
    vec!["ERR"; count].join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SimOp, SimulatedDriver, SimulatedTracker, TrackerModel};

    fn setup() -> (SimulatedDriver, StationStore, Vec<TrackerHandle>) {
        let mut driver = SimulatedDriver::new()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1).with_stations(4, 2))
            .with_tracker(SimulatedTracker::new(TrackerModel::InertiaCube, 2));
        let handles = driver.open_all().unwrap();
        let mut store = StationStore::new();
        for handle in &handles {
            store.configure_defaults(&mut driver, *handle);
            store.load_hardware(&driver, *handle);
        }
        (driver, store, handles)
    }

    fn render(driver: &SimulatedDriver, store: &StationStore, handles: &[TrackerHandle]) -> String {
        let mut out = Vec::new();
        write_header(&mut out, driver, store, handles, "Sat Oct 18 15:22:07 2026").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_block_order() {
        let (driver, store, handles) = setup();
        let text = render(&driver, &store, &handles);

        let order = [
            "[BEGIN LOG INFO]",
            "[END LOG INFO]",
            "[BEGIN TRACKER INFO]",
            "[END TRACKER INFO]",
            "[BEGIN STATION INFO]",
            "[END STATION INFO]",
            COLUMN_HEADER,
        ];
        let positions: Vec<usize> = order.iter().map(|m| text.find(m).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.ends_with(&format!("{}\n", COLUMN_HEADER)));
        assert!(text.contains(&format!("{},Sat Oct 18 15:22:07 2026", LOG_VERSION)));
    }

    #[test]
    fn test_one_row_per_tracker_and_connected_station() {
        let (driver, store, handles) = setup();
        let text = render(&driver, &store, &handles);
        let lines: Vec<&str> = text.lines().collect();

        let tracker_rows: Vec<&&str> = lines
            .iter()
            .skip_while(|l| **l != TRACKER_COLUMNS)
            .skip(1)
            .take_while(|l| **l != "[END TRACKER INFO]")
            .collect();
        assert_eq!(tracker_rows.len(), 2);
        assert!(tracker_rows[0].starts_with("1,4.2381,1,3,1,"));

        let station_rows: Vec<&&str> = lines
            .iter()
            .skip_while(|l| **l != STATION_COLUMNS)
            .skip(1)
            .take_while(|l| **l != "[END STATION INFO]")
            .collect();
        assert_eq!(station_rows.len(), 3);
        assert!(station_rows[0].starts_with("1,1,1001,"));
        assert!(station_rows[2].starts_with("2,1,2001,"));
        for row in station_rows {
            assert_eq!(row.split(',').count(), 14);
        }
    }

    #[test]
    fn test_unreadable_tracker_writes_err_fields() {
        let (mut driver, store, handles) = setup();
        driver.fail(SimOp::TrackerConfig);
        let text = render(&driver, &store, &handles);

        let err_row = format!("1,{}", errors(12));
        assert!(text.lines().any(|l| l == err_row));
        assert_eq!(err_row.split(',').count(), 13);
    }
}
