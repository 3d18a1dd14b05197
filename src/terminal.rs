//! Keyboard polling and the full screen terminal.
//!
//! The clock runs with the terminal in raw mode so single key presses arrive
//! straight away. Prompts that need a whole line switch back to line mode for
//! the duration of the read. Whatever happens, dropping the [`Terminal`] puts
//! the terminal back the way it was.

use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Print, ResetColor},
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use log::{debug, warn};

use crate::render::{Frame, TerminalSize};

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    /// Ctrl+C, raw mode turns it into a key instead of a signal
    Interrupt,
    Other,
}

pub trait KeySource {
    /// Returns a pressed key if there is one, without waiting.
    ///
    /// # Errors
    /// if the keyboard can't be read
    fn try_read_key(&mut self) -> io::Result<Option<Key>>;

    /// Puts a key back, the next read returns it again.
    fn unread(&mut self, key: Key);

    /// Waits for a key.
    ///
    /// # Errors
    /// if the keyboard can't be read
    fn read_key(&mut self) -> io::Result<Key> {
        loop {
            if let Some(key) = self.try_read_key()? {
                return Ok(key);
            }
            thread::sleep(KEY_POLL_INTERVAL);
        }
    }

    /// Waits up to `timeout` for input without consuming it.
    /// Returns true if something is ready to be read.
    ///
    /// # Errors
    /// if the keyboard can't be read
    fn wait_for_key(&mut self, timeout: Duration) -> io::Result<bool> {
        thread::sleep(timeout);
        Ok(false)
    }
}

pub trait LineSource {
    /// Reads one line with echo on, without the line ending.
    /// `None` at end of input.
    ///
    /// # Errors
    /// if stdin can't be read
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Everything the clock needs from the user's terminal.
pub trait Console: KeySource + LineSource {
    fn size(&self) -> TerminalSize {
        TerminalSize::default()
    }
}

/// Clears the screen and paints `frame` from the top left corner.
///
/// # Errors
/// if writing to `out` fails
pub fn draw<W: Write>(out: &mut W, frame: &Frame) -> io::Result<()> {
    queue!(
        out,
        ResetColor,
        Clear(ClearType::All),
        MoveTo(0, 0),
        Print(frame)
    )?;
    out.flush()
}

/// The real terminal, in raw mode on the alternate screen while it lives.
///
/// Once `shutdown` is set every read returns [`Key::Interrupt`], so a signal
/// ends waits for a key the same way Ctrl+C does.
#[derive(Debug)]
pub struct Terminal {
    pending: VecDeque<Key>,
    shutdown: Arc<AtomicBool>,
}

impl Terminal {
    /// # Errors
    /// if raw mode or the alternate screen can't be set up
    pub fn enter(shutdown: Arc<AtomicBool>) -> io::Result<Self> {
        enable_raw_mode()?;
        // from here on Drop restores the terminal
        let screen = Self {
            pending: VecDeque::new(),
            shutdown,
        };
        execute!(io::stdout(), terminal::EnterAlternateScreen, Hide)?;
        Ok(screen)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(err) = execute!(io::stdout(), ResetColor, Show, terminal::LeaveAlternateScreen) {
            warn!("couldn't leave the alternate screen: {err}");
        }
        if let Err(err) = disable_raw_mode() {
            warn!("couldn't restore the terminal mode: {err}");
        }
    }
}

impl KeySource for Terminal {
    fn try_read_key(&mut self) -> io::Result<Option<Key>> {
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }
        if self.shutdown.load(Ordering::Relaxed) {
            return Ok(Some(Key::Interrupt));
        }
        while event::poll(Duration::ZERO)? {
            if let Some(key) = key_from_event(&event::read()?) {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn unread(&mut self, key: Key) {
        self.pending.push_front(key);
    }

    fn read_key(&mut self) -> io::Result<Key> {
        loop {
            if let Some(key) = self.try_read_key()? {
                return Ok(key);
            }
            self.wait_for_key(KEY_POLL_INTERVAL)?;
        }
    }

    fn wait_for_key(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.pending.is_empty() || self.shutdown.load(Ordering::Relaxed) {
            return Ok(true);
        }
        match event::poll(timeout) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(false),
            result => result,
        }
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let _line_mode = LineMode::enter()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl Console for Terminal {
    fn size(&self) -> TerminalSize {
        terminal::size().map_or_else(
            |err| {
                debug!("couldn't read the terminal size: {err}");
                TerminalSize::default()
            },
            |(columns, rows)| TerminalSize::new(columns, rows),
        )
    }
}

/// Echo and line editing back on until dropped.
struct LineMode;

impl LineMode {
    fn enter() -> io::Result<Self> {
        disable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), Show)?;
        Ok(guard)
    }
}

impl Drop for LineMode {
    fn drop(&mut self) {
        if let Err(err) = enable_raw_mode().and_then(|()| execute!(io::stdout(), Hide)) {
            warn!("couldn't switch back to raw mode: {err}");
        }
    }
}

fn key_from_event(event: &Event) -> Option<Key> {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind,
        ..
    }) = event
    else {
        return None;
    };
    if *kind == KeyEventKind::Release {
        return None;
    }
    Some(match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Key::Interrupt,
        KeyCode::Char(c) => Key::Char(*c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        _ => Key::Other,
    })
}
