//! Applying commands to a session.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use super::transition::{transition, StreamEffect};
use super::Command;
use crate::decimator::MAX_SKIP;
use crate::display::{format_tracker_stats, CLEAR_LINE, HELP_TEXT};
use crate::driver::{DriverResult, StationConfig, TrackerDriver};
use crate::session::Session;

/// Longest protocol command forwarded to the driver, in bytes.
pub const SCRIPT_LIMIT: usize = 4096;

/// Source of operator text input for prompted commands.
pub trait Prompter {
    /// Show `message` and read one line. `None` when input is unavailable.
    fn prompt_line(&mut self, message: &str) -> Option<String>;
}

/// Whether the control loop keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Parse one auxiliary output byte typed as hex, with or without `0x`.
pub fn parse_aux_byte(input: &str) -> Option<u8> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u8::from_str_radix(digits, 16).ok()
}

/// Apply one command.
///
/// Console feedback goes to `out`; only failures writing to `out` are
/// returned. Driver failures are logged and leave the session unchanged.
pub fn dispatch<D, P, W>(
    session: &mut Session,
    driver: &mut D,
    command: Command,
    prompter: &mut P,
    out: &mut W,
) -> io::Result<Outcome>
where
    D: TrackerDriver + ?Sized,
    P: Prompter + ?Sized,
    W: Write + ?Sized,
{
    let step = transition(session.mode, &command);
    match step.streams {
        StreamEffect::Keep => {}
        StreamEffect::Open(target) => {
            session.streams.open(target);
        }
        StreamEffect::CloseAll => session.streams.close_all(),
    }
    if step.mode != session.mode {
        info!(from = ?session.mode, to = ?step.mode, "Logging mode changed");
    }
    session.mode = step.mode;
    if step.reset_decimator {
        session.decimator.reset();
    }

    match command {
        Command::SelectStation(n) => {
            if n == 1 || n <= session.max_stations {
                session.station = n;
                writeln!(out, "\n>> Current Station is set to {} <<", n)?;
                let key = session.selected_key();
                if let Err(e) = session.store.update(driver, key, |c| c.extended_data = true) {
                    debug!(%key, error = %e, "Could not request extended data");
                }
            }
        }
        Command::CycleTracker => {
            session.current = (session.current + 1) % session.handles.len();
            session.station = 1;
            let handle = session.current_tracker();
            session.store.clear_configs(handle);
            session.store.configure_defaults(driver, handle);
            session.refresh_current_tracker(driver);
            info!(tracker = %handle, "Switched tracker");
            write_stats(out, driver, session)?;
        }
        Command::StartLog(_) | Command::StopLog | Command::ShowSettings => {
            write_stats(out, driver, session)?;
        }
        Command::SkipMore => {
            session.skip = session.skip.saturating_add(1).min(MAX_SKIP);
            write_stats(out, driver, session)?;
        }
        Command::SkipLess => {
            session.skip = session.skip.saturating_sub(1);
            write_stats(out, driver, session)?;
        }
        Command::ToggleAuxInputs => {
            write!(out, "{}", CLEAR_LINE)?;
            out.flush()?;
            modify(session, driver, |c| c.aux_inputs = !c.aux_inputs).ok();
        }
        Command::ToggleDigitalInputs => {
            write!(out, "{}", CLEAR_LINE)?;
            out.flush()?;
            modify(session, driver, |c| c.digital_inputs = !c.digital_inputs).ok();
        }
        Command::ToggleTemperature => {
            write!(out, "{}", CLEAR_LINE)?;
            out.flush()?;
            session.show_temperature = !session.show_temperature;
        }
        Command::CycleEnhancement => {
            if modify(session, driver, |c| c.enhancement = (c.enhancement + 1) % 3).is_ok() {
                write_stats(out, driver, session)?;
            }
        }
        Command::CyclePrediction => {
            if modify(session, driver, |c| c.prediction = (c.prediction + 10) % 60).is_ok() {
                write_stats(out, driver, session)?;
            }
        }
        Command::CycleCompass => {
            if modify(session, driver, |c| c.compass = (c.compass + 1) % 3).is_ok() {
                write_stats(out, driver, session)?;
            }
        }
        Command::CycleSensitivity => {
            let cycled = modify(session, driver, |c| {
                c.sensitivity = (c.sensitivity + 1) % 5;
                if c.sensitivity == 0 {
                    c.sensitivity = 1;
                }
            });
            if cycled.is_ok() {
                write_stats(out, driver, session)?;
            }
        }
        Command::ToggleTimestamps => {
            if modify(session, driver, |c| c.timestamped = !c.timestamped).is_ok() {
                write_stats(out, driver, session)?;
            }
        }
        Command::ResetHeading => {
            let key = session.selected_key();
            if let Err(e) = driver.reset_heading(key) {
                debug!(%key, error = %e, "Heading reset failed");
            }
        }
        Command::Boresight => {
            let key = session.selected_key();
            if let Err(e) = driver.boresight(key) {
                debug!(%key, error = %e, "Boresight failed");
            }
        }
        Command::Unboresight => {
            let key = session.selected_key();
            if let Err(e) = driver.unboresight(key) {
                debug!(%key, error = %e, "Unboresight failed");
            }
        }
        Command::AuxOutput => send_aux_output(session, driver, prompter, out)?,
        Command::SendScript => send_script(session, driver, prompter, out)?,
        Command::Quit => {
            writeln!(out, "\n")?;
            return Ok(Outcome::Quit);
        }
        Command::Help => write!(out, "\n\n{}", HELP_TEXT)?,
    }

    Ok(Outcome::Continue)
}

/// Read-modify-write the selected station's configuration.
fn modify<D, F>(session: &mut Session, driver: &mut D, change: F) -> DriverResult<StationConfig>
where
    D: TrackerDriver + ?Sized,
    F: FnOnce(&mut StationConfig),
{
    let key = session.selected_key();
    let result = session.store.update(driver, key, change);
    if let Err(e) = &result {
        debug!(%key, error = %e, "Station configuration unchanged");
    }
    result
}

fn write_stats<D, W>(out: &mut W, driver: &D, session: &Session) -> io::Result<()>
where
    D: TrackerDriver + ?Sized,
    W: Write + ?Sized,
{
    write!(out, "{}", format_tracker_stats(driver, session))?;
    out.flush()
}

fn send_aux_output<D, P, W>(
    session: &Session,
    driver: &mut D,
    prompter: &mut P,
    out: &mut W,
) -> io::Result<()>
where
    D: TrackerDriver + ?Sized,
    P: Prompter + ?Sized,
    W: Write + ?Sized,
{
    let key = session.selected_key();
    let outputs = session
        .store
        .hardware(key)
        .map(|hw| hw.aux_outputs)
        .unwrap_or(0);

    if outputs == 0 {
        writeln!(
            out,
            "\nThis station does not support AUX output, please check descriptor"
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "\nPlease enter the values to send out in hex format, no leading '0x'"
    )?;
    out.flush()?;

    let mut bytes = Vec::with_capacity(usize::from(outputs));
    for i in 0..outputs {
        let entry = prompter.prompt_line(&format!("AUX{} (hex): 0x", i));
        let byte = match entry.as_deref().and_then(parse_aux_byte) {
            Some(byte) => byte,
            None => {
                warn!(%key, index = i, input = ?entry, "Invalid AUX output entry");
                writeln!(out, "Invalid entry for AUX{}, using 00 instead", i)?;
                0
            }
        };
        bytes.push(byte);
    }

    if let Err(e) = driver.aux_output(key, &bytes) {
        debug!(%key, error = %e, "AUX output rejected");
    }
    Ok(())
}

fn send_script<D, P, W>(
    session: &Session,
    driver: &mut D,
    prompter: &mut P,
    out: &mut W,
) -> io::Result<()>
where
    D: TrackerDriver + ?Sized,
    P: Prompter + ?Sized,
    W: Write + ?Sized,
{
    writeln!(out, "\n***WARNING***")?;
    writeln!(out, "The library may not be aware of some changes made with")?;
    writeln!(
        out,
        "this command; recommended only for testing and configuration of options not"
    )?;
    writeln!(out, "configurable using normal keyboard commands.\n")?;
    out.flush()?;

    let Some(mut script) =
        prompter.prompt_line("Please enter a protocol command to send (4096 byte limit)")
    else {
        return Ok(());
    };
    if script.len() > SCRIPT_LIMIT {
        let mut end = SCRIPT_LIMIT;
        while !script.is_char_boundary(end) {
            end -= 1;
        }
        script.truncate(end);
    }

    let handle = session.current_tracker();
    if let Err(e) = driver.send_script(handle, &script) {
        debug!(tracker = %handle, error = %e, "Protocol command rejected");
    }
    Ok(())
}
