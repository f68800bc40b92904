//! Terminal input and output for the interactive console.
//!
//! The console runs with the terminal in raw mode so single key presses
//! arrive without Enter. Raw mode also disables output newline translation,
//! so console output goes through [`ConsoleOut`], and prompts leave raw mode
//! while they read a full line.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use stationlog::command::ESCAPE;
use stationlog::control::{KeySource, Prompter};
use tracing::{debug, warn};

/// Keeps the terminal in raw mode until dropped.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}

/// Non-blocking keyboard reader.
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn poll_key(&mut self) -> Option<char> {
        match event::poll(Duration::ZERO) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                debug!(error = %e, "Keyboard poll failed");
                return None;
            }
        }

        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                match (key.code, key.modifiers) {
                    // Ctrl-C does not raise a signal in raw mode.
                    (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(ESCAPE),
                    (KeyCode::Char(c), _) => Some(c),
                    (KeyCode::Esc, _) => Some(ESCAPE),
                    _ => None,
                }
            }
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Keyboard read failed");
                None
            }
        }
    }
}

/// Line prompts via dialoguer, outside raw mode.
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompter for DialoguerPrompter {
    fn prompt_line(&mut self, message: &str) -> Option<String> {
        if let Err(e) = disable_raw_mode() {
            debug!(error = %e, "Could not leave raw mode for prompt");
        }

        let answer = Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .interact_text();

        if let Err(e) = enable_raw_mode() {
            warn!(error = %e, "Could not re-enter raw mode after prompt");
        }

        match answer {
            Ok(line) => Some(line),
            Err(e) => {
                debug!(error = %e, "Prompt aborted");
                None
            }
        }
    }
}

/// Stdout writer that emits `\r\n` for every `\n`.
pub struct ConsoleOut<W: Write = Stdout> {
    inner: W,
}

impl ConsoleOut<Stdout> {
    pub fn stdout() -> Self {
        Self {
            inner: io::stdout(),
        }
    }
}

impl<W: Write> ConsoleOut<W> {
    #[cfg(test)]
    fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for ConsoleOut<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (i, byte) in buf.iter().enumerate() {
            if *byte == b'\n' {
                self.inner.write_all(&buf[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
