//! Keyboard commands.
//!
//! A key press maps to a [`Command`]; [`transition`] decides how the logging
//! mode and streams react, and [`dispatch`] applies the command to a
//! [`Session`](crate::session::Session).
//!
//! # Key map
//!
//! Letters are case-insensitive except `l` / `L`, which select different
//! log targets. Unknown keys show the help text.

mod dispatch;
mod transition;

pub use dispatch::{dispatch, parse_aux_byte, Outcome, Prompter, SCRIPT_LIMIT};
pub use transition::{transition, StreamEffect, Transition};

use crate::csvlog::LogTarget;

/// Escape key.
pub const ESCAPE: char = '\u{1b}';

/// A console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select station 1..=8 on the current tracker.
    SelectStation(u8),
    /// Switch to the next open tracker.
    CycleTracker,
    /// Start logging into a target.
    StartLog(LogTarget),
    /// Stop all logging.
    StopLog,
    ToggleAuxInputs,
    ToggleDigitalInputs,
    ToggleTemperature,
    /// Prompt for and send auxiliary output bytes.
    AuxOutput,
    /// Drop one more sample between kept samples.
    SkipMore,
    /// Drop one fewer sample between kept samples.
    SkipLess,
    ShowSettings,
    CycleEnhancement,
    CyclePrediction,
    CycleCompass,
    CycleSensitivity,
    ToggleTimestamps,
    ResetHeading,
    Boresight,
    Unboresight,
    /// Prompt for and send a protocol command.
    SendScript,
    Quit,
    Help,
}

impl Command {
    /// Map a key to its command.
    pub fn from_key(key: char) -> Command {
        let key = if key == 'L' { key } else { key.to_ascii_lowercase() };
        match key {
            '1'..='8' => Command::SelectStation(key as u8 - b'0'),
            'n' => Command::CycleTracker,
            'l' => Command::StartLog(LogTarget::Station),
            'L' => Command::StartLog(LogTarget::TrackerStations),
            'a' => Command::StartLog(LogTarget::AllTrackers),
            'x' => Command::StopLog,
            '<' => Command::ToggleAuxInputs,
            '>' => Command::ToggleDigitalInputs,
            'm' => Command::ToggleTemperature,
            ',' => Command::AuxOutput,
            '[' => Command::SkipMore,
            ']' => Command::SkipLess,
            'd' => Command::ShowSettings,
            'e' => Command::CycleEnhancement,
            'p' => Command::CyclePrediction,
            'c' => Command::CycleCompass,
            's' => Command::CycleSensitivity,
            't' => Command::ToggleTimestamps,
            'r' => Command::ResetHeading,
            'b' => Command::Boresight,
            'u' => Command::Unboresight,
            '/' => Command::SendScript,
            'q' | ESCAPE => Command::Quit,
            _ => Command::Help,
        }
    }
}
