//! Logging mode transitions.
//!
//! Pure table of how each command moves the logging mode and what happens to
//! the log streams. Commands that do not touch logging keep the mode.

use super::Command;
use crate::csvlog::LogTarget;
use crate::session::LogMode;

/// What to do with the log streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEffect {
    Keep,
    /// Open the target's stream unless already open.
    Open(LogTarget),
    /// Flush and close every stream.
    CloseAll,
}

/// Result of applying a command to a logging mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub mode: LogMode,
    pub streams: StreamEffect,
    /// Zero every decimation counter.
    pub reset_decimator: bool,
}

impl Transition {
    fn keep(mode: LogMode) -> Self {
        Self {
            mode,
            streams: StreamEffect::Keep,
            reset_decimator: false,
        }
    }

    fn stop() -> Self {
        Self {
            mode: LogMode::Off,
            streams: StreamEffect::CloseAll,
            reset_decimator: true,
        }
    }
}

/// Next logging state for `command` issued in `mode`.
pub fn transition(mode: LogMode, command: &Command) -> Transition {
    match (mode, command) {
        (current, Command::StartLog(target)) => {
            let next = LogMode::from_target(*target);
            Transition {
                mode: next,
                streams: StreamEffect::Open(*target),
                reset_decimator: current != next,
            }
        }
        (_, Command::StopLog) => Transition::stop(),
        (LogMode::AllTrackers, Command::CycleTracker) => Transition::keep(LogMode::AllTrackers),
        (_, Command::CycleTracker) => Transition::stop(),
        (current, Command::SkipMore | Command::SkipLess) => Transition {
            reset_decimator: true,
            ..Transition::keep(current)
        },
        (_, Command::Quit) => Transition {
            reset_decimator: false,
            ..Transition::stop()
        },
        (current, _) => Transition::keep(current),
    }
}
