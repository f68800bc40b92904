//! CSV logging of tracking samples.
//!
//! Three independent destinations exist, one per [`LogTarget`]. Each file
//! starts with a metadata block describing the trackers and stations, then a
//! fixed column header, then one row per kept sample.
//!
//! # File lifecycle
//!
//! - A target's file is created (truncating any previous content) the first
//!   time the target is activated in a process run. Later activations append
//!   to it, and activating it again while open reuses the open stream.
//! - Stopping logging flushes and closes every stream. Files are never
//!   deleted.
//! - If a file cannot be created the stream stays closed and writes to it
//!   are no-ops.

mod header;
mod row;
mod stream;

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use header::{log_date, write_header, LOG_VERSION};
pub use row::{
    format_row, pack_buttons, tracking_quality, RowInput, COLUMN_COUNT, COLUMN_HEADER,
};
pub use stream::LogStream;

/// Which stations a log file records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTarget {
    /// The selected station of the current tracker.
    Station,
    /// Every valid station of the current tracker.
    TrackerStations,
    /// Every valid station of every open tracker.
    AllTrackers,
}

impl LogTarget {
    pub const ALL: [LogTarget; 3] = [
        LogTarget::Station,
        LogTarget::TrackerStations,
        LogTarget::AllTrackers,
    ];

    /// File name inside the log directory.
    pub fn file_name(self) -> &'static str {
        match self {
            LogTarget::Station => "stationdata.log",
            LogTarget::TrackerStations => "stationsdata.log",
            LogTarget::AllTrackers => "alldata.log",
        }
    }

    /// Description shown in the tracker summary.
    pub fn description(self) -> &'static str {
        match self {
            LogTarget::Station => "Current Tracker / Current Station",
            LogTarget::TrackerStations => "Current Tracker / All Stations",
            LogTarget::AllTrackers => "All Trackers / All Stations",
        }
    }

    fn slot(self) -> usize {
        match self {
            LogTarget::Station => 0,
            LogTarget::TrackerStations => 1,
            LogTarget::AllTrackers => 2,
        }
    }
}

/// File-backed log stream.
pub type FileLogStream = LogStream<BufWriter<File>>;

/// The three optional log streams of a session.
#[derive(Debug)]
pub struct LogStreams {
    directory: PathBuf,
    streams: [Option<FileLogStream>; 3],
    /// Targets opened at least once; reopening these appends.
    activated: [bool; 3],
}

impl LogStreams {
    /// Streams writing into `directory`. Nothing is opened yet.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            streams: [None, None, None],
            activated: [false; 3],
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path of a target's file.
    pub fn path(&self, target: LogTarget) -> PathBuf {
        self.directory.join(target.file_name())
    }

    /// Open a target's file unless it is already open.
    ///
    /// The first activation truncates the file; later ones append to it
    /// without repeating the header.
    ///
    /// Returns whether the stream is open afterwards. Failures are logged
    /// and leave the stream closed.
    pub fn open(&mut self, target: LogTarget) -> bool {
        if self.is_open(target) {
            return true;
        }

        let path = self.path(target);
        let append = self.activated[target.slot()];
        let stream =
            open_file(&path, append).and_then(|file| LogStream::new(BufWriter::new(file)));
        match stream {
            Ok(stream) => {
                info!(path = %path.display(), append, "Log file opened");
                self.streams[target.slot()] = Some(stream);
                self.activated[target.slot()] = true;
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to open log file");
                false
            }
        }
    }

    pub fn is_open(&self, target: LogTarget) -> bool {
        self.streams[target.slot()].is_some()
    }

    /// Open stream for a target, if any.
    pub fn get_mut(&mut self, target: LogTarget) -> Option<&mut FileLogStream> {
        self.streams[target.slot()].as_mut()
    }

    /// Flush and close every open stream.
    pub fn close_all(&mut self) {
        for target in LogTarget::ALL {
            if let Some(stream) = self.streams[target.slot()].take() {
                let rows = stream.rows();
                match stream.into_inner() {
                    Ok(_) => info!(file = target.file_name(), rows, "Log file closed"),
                    Err(e) => warn!(file = target.file_name(), error = %e, "Failed to flush log file"),
                }
            }
        }
    }
}

/// Create or truncate `path`, or open it positioned at its end.
fn open_file(path: &Path, append: bool) -> io::Result<File> {
    if !append {
        return File::create(path);
    }
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    // Append mode reports position 0 until the first write.
    file.seek(SeekFrom::End(0))?;
    Ok(file)
}

impl Drop for LogStreams {
    fn drop(&mut self) {
        self.close_all();
    }
}
