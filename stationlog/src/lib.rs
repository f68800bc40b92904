//! stationlog - interactive console and CSV logger for motion trackers
//!
//! Opens every tracker the driver reports, applies station defaults, shows
//! a live status line for the selected station and records samples to CSV
//! files on demand. Operator keys reconfigure stations and switch logging
//! modes while data keeps flowing.
//!
//! # High-Level API
//!
//! ```ignore
//! use stationlog::control::{ControlLoop, ControlSettings};
//! use stationlog::driver::SimulatedDriver;
//! use stationlog::session::SessionSettings;
//!
//! let mut control = ControlLoop::start(
//!     driver,
//!     &SessionSettings::default(),
//!     ControlSettings::default(),
//!     keys,
//!     prompter,
//!     std::io::stdout(),
//! )?;
//! control.run()?;
//! ```
//!
//! The hardware is reached only through the [`driver::TrackerDriver`]
//! trait; [`driver::SimulatedDriver`] implements it in process.

pub mod command;
pub mod config;
pub mod control;
pub mod csvlog;
pub mod decimator;
pub mod display;
pub mod driver;
pub mod logging;
pub mod poll;
pub mod session;
pub mod station;

/// Version of the stationlog library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
