//! A single log stream: a sink plus its one-shot header state and clock
//! offset.

use std::io::{self, Seek, Write};

use super::header::{log_date, write_header};
use super::row::{format_row, RowInput};
use crate::driver::{StationKey, StationSample, TrackerDriver, TrackerHandle};
use crate::station::StationStore;

/// An open log sink.
///
/// The header is written before the first row when the sink was at its
/// start position on creation. The OS clock offset is fixed by the first
/// row written and applied to every row after it.
#[derive(Debug)]
pub struct LogStream<W: Write> {
    sink: W,
    header_pending: bool,
    os_offset: Option<f64>,
    rows: u64,
}

impl<W: Write + Seek> LogStream<W> {
    /// Wrap a sink. A sink not at position zero is treated as already
    /// carrying a header.
    pub fn new(mut sink: W) -> io::Result<Self> {
        let at_start = sink.stream_position()? == 0;
        Ok(Self {
            sink,
            header_pending: at_start,
            os_offset: None,
            rows: 0,
        })
    }
}

impl<W: Write> LogStream<W> {
    /// Append one sample, writing the header first if still pending.
    pub fn write<D: TrackerDriver + ?Sized>(
        &mut self,
        driver: &D,
        store: &StationStore,
        handles: &[TrackerHandle],
        key: StationKey,
        sample: &StationSample,
    ) -> io::Result<()> {
        if self.header_pending {
            write_header(&mut self.sink, driver, store, handles, &log_date())?;
            self.header_pending = false;
        }

        let os_offset = *self
            .os_offset
            .get_or_insert_with(|| sample.os_time() - f64::from(sample.timestamp));

        let config = store.config(key);
        let row = format_row(&RowInput {
            tracker_num: key.tracker.get(),
            station: key.station,
            sample,
            config: &config,
            hardware: store.hardware(key),
            os_offset,
        });
        writeln!(self.sink, "{}", row)?;
        self.rows += 1;
        Ok(())
    }

    /// Clock offset fixed by the first row, if any row was written.
    pub fn os_offset(&self) -> Option<f64> {
        self.os_offset
    }

    /// Rows written through this stream.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Flush and return the sink.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::csvlog::row::COLUMN_HEADER;
    use crate::driver::{SimulatedDriver, SimulatedTracker, TrackerModel};

    fn setup() -> (SimulatedDriver, StationStore, Vec<TrackerHandle>) {
        let mut driver = SimulatedDriver::new()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1).with_stations(2, 2));
        let handles = driver.open_all().unwrap();
        let mut store = StationStore::new();
        store.configure_defaults(&mut driver, handles[0]);
        store.load_hardware(&driver, handles[0]);
        (driver, store, handles)
    }

    fn sample(device: f32, os_secs: u32, os_micros: u32) -> StationSample {
        StationSample {
            new_data: true,
            timestamp: device,
            os_timestamp_seconds: os_secs,
            os_timestamp_micros: os_micros,
            ..Default::default()
        }
    }

    fn data_rows(text: &str) -> Vec<&str> {
        text.lines()
            .skip_while(|l| *l != COLUMN_HEADER)
            .skip(1)
            .collect()
    }

    #[test]
    fn test_header_written_once() {
        let (driver, store, handles) = setup();
        let key = StationKey::new(handles[0], 1);
        let mut stream = LogStream::new(Cursor::new(Vec::new())).unwrap();

        stream.write(&driver, &store, &handles, key, &sample(1.0, 100, 0)).unwrap();
        stream.write(&driver, &store, &handles, key, &sample(2.0, 101, 0)).unwrap();

        let text = String::from_utf8(stream.into_inner().unwrap().into_inner()).unwrap();
        assert_eq!(text.matches("[BEGIN LOG INFO]").count(), 1);
        assert_eq!(text.matches(COLUMN_HEADER).count(), 1);
        assert_eq!(data_rows(&text).len(), 2);
    }

    #[test]
    fn test_sink_not_at_start_skips_header() {
        let (driver, store, handles) = setup();
        let key = StationKey::new(handles[0], 1);
        let mut cursor = Cursor::new(b"existing\n".to_vec());
        cursor.seek(io::SeekFrom::End(0)).unwrap();
        let mut stream = LogStream::new(cursor).unwrap();

        stream.write(&driver, &store, &handles, key, &sample(1.0, 100, 0)).unwrap();

        let text = String::from_utf8(stream.into_inner().unwrap().into_inner()).unwrap();
        assert!(!text.contains("[BEGIN LOG INFO]"));
        assert!(text.starts_with("existing\n1,1,"));
    }

    #[test]
    fn test_os_timestamp_corrected_by_first_offset() {
        let (driver, store, handles) = setup();
        let key = StationKey::new(handles[0], 1);
        let mut stream = LogStream::new(Cursor::new(Vec::new())).unwrap();

        // d0 = 2.0, o0 = 1000.5 => offset 998.5
        stream.write(&driver, &store, &handles, key, &sample(2.0, 1000, 500_000)).unwrap();
        // o1 = 1003.25 => 1003.25 - 998.5 = 4.75
        stream.write(&driver, &store, &handles, key, &sample(9.0, 1003, 250_000)).unwrap();

        assert_eq!(stream.os_offset(), Some(998.5));
        let text = String::from_utf8(stream.into_inner().unwrap().into_inner()).unwrap();
        let rows = data_rows(&text);
        assert_eq!(rows[0].split(',').nth(10), Some("2.0000"));
        assert_eq!(rows[1].split(',').nth(10), Some("4.7500"));
    }

    #[test]
    fn test_optional_columns_follow_logged_station_config() {
        let (mut driver, mut store, handles) = setup();
        let key1 = StationKey::new(handles[0], 1);
        let key2 = StationKey::new(handles[0], 2);
        store.update(&mut driver, key2, |c| c.digital_inputs = true).unwrap();

        let mut stream = LogStream::new(Cursor::new(Vec::new())).unwrap();
        let mut with_buttons = sample(1.0, 10, 0);
        with_buttons.buttons[1] = true;
        stream.write(&driver, &store, &handles, key1, &with_buttons).unwrap();
        stream.write(&driver, &store, &handles, key2, &with_buttons).unwrap();

        let text = String::from_utf8(stream.into_inner().unwrap().into_inner()).unwrap();
        let rows = data_rows(&text);
        assert_eq!(rows[0].split(',').nth(35), Some("-1"));
        assert_eq!(rows[1].split(',').nth(35), Some("2"));
        assert_eq!(rows[0].split(',').count(), rows[1].split(',').count());
    }
}
