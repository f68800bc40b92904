//! The interactive control loop.
//!
//! Each [`ControlLoop::tick`] handles at most one key, drains the involved
//! stations and refreshes the live line when the [`RefreshGate`] allows it.
//! [`ControlLoop::run`] repeats ticks with a short idle sleep until the
//! operator quits, then shuts the session down.
//!
//! Keyboard and prompt input are abstracted behind [`KeySource`] and
//! [`Prompter`] so the loop can be driven by a terminal or by a script.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use tracing::info;

pub use crate::command::Prompter;
use crate::command::{dispatch, Command, Outcome};
use crate::config::ConfigFile;
use crate::display::{format_station_line, RefreshGate, DEFAULT_REFRESH_SECS};
use crate::driver::TrackerDriver;
use crate::poll::drain;
use crate::session::{Session, SessionError, SessionSettings};

/// Default sleep between ticks.
pub const DEFAULT_IDLE: Duration = Duration::from_millis(5);

/// Non-blocking source of key presses.
pub trait KeySource {
    /// Next pending key, if one was pressed.
    fn poll_key(&mut self) -> Option<char>;
}

/// Timing of the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSettings {
    /// Minimum interval between live line refreshes, in seconds.
    pub refresh_interval: f64,
    /// Sleep between ticks.
    pub idle: Duration,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_SECS,
            idle: DEFAULT_IDLE,
        }
    }
}

impl From<&ConfigFile> for ControlSettings {
    fn from(config: &ConfigFile) -> Self {
        Self {
            refresh_interval: config.display.refresh_ms as f64 / 1000.0,
            idle: Duration::from_millis(config.poll.sleep_ms),
        }
    }
}

/// The running console: a session plus its driver and I/O.
pub struct ControlLoop<D, K, P, W> {
    driver: D,
    session: Session,
    keys: K,
    prompter: P,
    out: W,
    gate: RefreshGate,
    idle: Duration,
    finished: bool,
}

impl<D, K, P, W> ControlLoop<D, K, P, W>
where
    D: TrackerDriver,
    K: KeySource,
    P: Prompter,
    W: Write,
{
    /// Start a session on `driver` and print the initial tracker summary.
    pub fn start(
        mut driver: D,
        session_settings: &SessionSettings,
        settings: ControlSettings,
        keys: K,
        prompter: P,
        mut out: W,
    ) -> Result<Self, SessionError> {
        let session = Session::start(&mut driver, session_settings)?;
        let summary = crate::display::format_tracker_stats(&driver, &session);
        // A console that cannot be written to does not stop the session.
        let _ = write!(out, "{}", summary).and_then(|_| out.flush());

        Ok(Self {
            driver,
            session,
            keys,
            prompter,
            out,
            gate: RefreshGate::new(settings.refresh_interval),
            idle: settings.idle,
            finished: false,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn keys_mut(&mut self) -> &mut K {
        &mut self.keys
    }

    pub fn prompter_mut(&mut self) -> &mut P {
        &mut self.prompter
    }

    /// One iteration: key, drain, display.
    pub fn tick(&mut self) -> io::Result<Outcome> {
        if let Some(key) = self.keys.poll_key() {
            let command = Command::from_key(key);
            let outcome = dispatch(
                &mut self.session,
                &mut self.driver,
                command,
                &mut self.prompter,
                &mut self.out,
            )?;
            if outcome == Outcome::Quit {
                return Ok(Outcome::Quit);
            }
        }

        drain(&mut self.session, &mut self.driver);

        if self.gate.ready(self.driver.time()) {
            self.render()?;
        }
        Ok(Outcome::Continue)
    }

    /// Tick until quit, then shut down. The session is shut down even when
    /// console output fails.
    pub fn run(&mut self) -> io::Result<()> {
        info!("Control loop started");
        let result = loop {
            match self.tick() {
                Ok(Outcome::Continue) => thread::sleep(self.idle),
                Ok(Outcome::Quit) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.shutdown();
        result
    }

    /// Close streams and the current tracker. Idempotent.
    pub fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let _ = writeln!(self.out, "Closing application").and_then(|_| self.out.flush());
        self.session.shutdown(&mut self.driver);
        info!("Control loop stopped");
    }

    fn render(&mut self) -> io::Result<()> {
        let key = self.session.selected_key();
        let comm = self.driver.comm_info(key.tracker).unwrap_or_default();
        let sample = self.session.latest(key).copied().unwrap_or_default();
        let line = format_station_line(
            &comm,
            self.session.tracker_info(),
            &self.session.store().config(key),
            &sample,
            self.session.store().hardware(key),
            self.session.show_temperature(),
        );
        write!(self.out, "{}", line)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::driver::{SimOp, SimulatedDriver, SimulatedTracker, StationSample, TrackerModel};

    struct Keys(VecDeque<char>);

    impl KeySource for Keys {
        fn poll_key(&mut self) -> Option<char> {
            self.0.pop_front()
        }
    }

    struct NoPrompts;

    impl Prompter for NoPrompts {
        fn prompt_line(&mut self, _message: &str) -> Option<String> {
            None
        }
    }

    fn start(
        keys: &str,
        dir: &std::path::Path,
    ) -> ControlLoop<SimulatedDriver, Keys, NoPrompts, Vec<u8>> {
        let driver = SimulatedDriver::new()
            .with_manual_clock()
            .with_tracker(SimulatedTracker::new(TrackerModel::Is900, 1));
        let session_settings = SessionSettings {
            log_directory: dir.to_path_buf(),
            ..Default::default()
        };
        let settings = ControlSettings {
            refresh_interval: 0.05,
            idle: Duration::ZERO,
        };
        ControlLoop::start(
            driver,
            &session_settings,
            settings,
            Keys(keys.chars().collect()),
            NoPrompts,
            Vec::new(),
        )
        .unwrap()
    }

    fn output(control: &ControlLoop<SimulatedDriver, Keys, NoPrompts, Vec<u8>>) -> String {
        String::from_utf8_lossy(control.output()).into_owned()
    }

    #[test]
    fn test_start_prints_summary() {
        let dir = tempfile::tempdir().unwrap();
        let control = start("", dir.path());
        assert!(output(&control).contains("Tracker Information"));
    }

    #[test]
    fn test_tick_renders_through_gate() {
        let dir = tempfile::tempdir().unwrap();
        let mut control = start("", dir.path());
        let key = control.session().selected_key();
        control
            .driver_mut()
            .push_sample(
                key,
                StationSample {
                    timestamp: 7.5,
                    ..Default::default()
                },
            )
            .unwrap();

        control.tick().unwrap();
        control.tick().unwrap();

        let text = output(&control);
        assert_eq!(text.matches("7.5s \r").count(), 1);

        control.driver_mut().advance(0.1);
        control.tick().unwrap();
        assert_eq!(output(&control).matches("7.5s \r").count(), 2);
    }

    #[test]
    fn test_render_survives_link_stats_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut control = start("", dir.path());
        let key = control.session().selected_key();
        control.driver_mut().fail(SimOp::CommInfo);
        control
            .driver_mut()
            .push_sample(
                key,
                StationSample {
                    timestamp: 3.5,
                    ..Default::default()
                },
            )
            .unwrap();

        control.tick().unwrap();

        let text = output(&control);
        assert!(text.contains("  0Kb 0R TQ/CI:"));
        assert!(text.contains("3.5s \r"));
    }

    #[test]
    fn test_run_until_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut control = start("lq", dir.path());

        control.run().unwrap();

        assert!(output(&control).contains("Closing application"));
        assert!(control.driver().open_handles().is_empty());
        assert!(!control
            .session()
            .streams()
            .is_open(crate::csvlog::LogTarget::Station));
    }
}
