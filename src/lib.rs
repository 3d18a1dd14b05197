#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{NaiveDateTime, Timelike};
use command::{CommandRunner, ShellCommand};
use log::{error, info, warn};
use menu::{AlarmMenu, MenuExit};
use render::ClockRenderer;
use scheduler::{AlarmScheduler, Outcome};
use storage::AlarmRepository;
use store::AlarmStore;
use terminal::{draw, Console, Key};
use time::{TimeSource, WallClock};

pub mod alarm;
pub mod command;
pub mod config;
pub mod error;
pub mod menu;
pub mod render;
pub mod scheduler;
/// seven segment encoding of decimal digits
pub mod segment;
pub mod sound;
pub mod storage;
pub mod store;
pub mod terminal;
pub mod time;

#[cfg(test)]
mod testing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Shutdown,
}

/// The clock screen and everything it drives: ringing alarms, the alarm
/// menu and saving the alarms.
pub struct Clock<C: Console, R: CommandRunner = ShellCommand> {
    renderer: ClockRenderer,
    store: AlarmStore,
    repository: Box<dyn AlarmRepository>,
    scheduler: AlarmScheduler<R>,
    time: Box<dyn TimeSource>,
    console: C,
    shutdown: Arc<AtomicBool>,
    // set while the store is empty only because loading failed
    keep_stored: bool,
}

impl<C: Console, R: CommandRunner> Clock<C, R> {
    /// Loads the stored alarms, starting with none if they can't be read.
    pub fn new(
        console: C,
        repository: Box<dyn AlarmRepository>,
        scheduler: AlarmScheduler<R>,
    ) -> Self {
        let (store, keep_stored) = match repository.load_all() {
            Ok(alarms) => (AlarmStore::from_alarms(alarms), false),
            Err(err) => {
                error!("couldn't load alarms, starting without any: {err}");
                (AlarmStore::new(), true)
            }
        };
        let shutdown = Arc::new(AtomicBool::new(false));
        Self {
            renderer: ClockRenderer::default(),
            store,
            repository,
            scheduler: scheduler.with_shutdown_flag(Arc::clone(&shutdown)),
            time: Box::new(WallClock::local()),
            console,
            shutdown,
            keep_stored,
        }
    }

    #[must_use]
    pub const fn with_renderer(mut self, renderer: ClockRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn with_time_source(mut self, time: impl TimeSource + 'static) -> Self {
        self.time = Box::new(time);
        self
    }

    /// Setting the flag stops the clock, also while an alarm rings or the
    /// menu waits for a key.
    #[must_use]
    pub fn with_shutdown_flag(self, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            scheduler: self.scheduler.with_shutdown_flag(Arc::clone(&shutdown)),
            shutdown,
            ..self
        }
    }

    #[must_use]
    pub const fn store(&self) -> &AlarmStore {
        &self.store
    }

    /// One pass of the main loop: draw the clock, ring whatever is due, then
    /// open the menu if a key was pressed.
    ///
    /// # Errors
    /// if the terminal can't be drawn to or read from while in the menu
    pub fn tick<W: Write>(&mut self, now: NaiveDateTime, out: &mut W) -> io::Result<Tick> {
        if self.shutting_down() {
            return Ok(Tick::Shutdown);
        }
        draw(out, &self.renderer.render(now, self.console.size()))?;

        let episodes = self
            .scheduler
            .tick(now, &mut self.store, &mut self.console, out)?;
        if episodes.iter().any(|e| e.outcome == Outcome::Removed) {
            self.save();
        }
        if self.shutting_down() {
            return Ok(Tick::Shutdown);
        }

        let key = match self.console.try_read_key() {
            Ok(Some(key)) => key,
            Ok(None) => return Ok(Tick::Continue),
            Err(err) => {
                warn!("couldn't read the keyboard: {err}");
                return Ok(Tick::Continue);
            }
        };
        match key {
            Key::Interrupt => return Ok(Tick::Shutdown),
            // menu keys act straight away
            Key::Char('a' | 'x' | 'm') => self.console.unread(key),
            _ => {}
        }
        let outcome = AlarmMenu::new(&mut self.console, out)
            .with_shutdown_flag(Arc::clone(&self.shutdown))
            .run(&mut self.store)?;
        if outcome.changed {
            self.save();
        }
        Ok(match outcome.exit {
            MenuExit::BackToClock => Tick::Continue,
            MenuExit::Shutdown => Tick::Shutdown,
        })
    }

    /// Ticks about once a second until shut down, then saves the alarms.
    ///
    /// # Errors
    /// if the terminal stops working
    pub fn run<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        info!("clock started with {} alarms", self.store.len());
        let result = loop {
            match self.tick(self.time.now(), out) {
                Ok(Tick::Continue) => {}
                Ok(Tick::Shutdown) => break Ok(()),
                Err(err) => break Err(err),
            }
            if let Err(err) = self.console.wait_for_key(until_next_second(self.time.now())) {
                warn!("couldn't wait for the keyboard: {err}");
            }
        };
        if self.keep_stored {
            warn!("alarms were never loaded, leaving the alarm file alone");
        } else {
            self.save();
        }
        info!("clock stopped");
        result
    }

    fn shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Writes the alarms out, failures are only logged.
    pub fn save(&mut self) {
        match self.repository.save_all(self.store.list()) {
            Ok(()) => self.keep_stored = false,
            Err(err) => error!("couldn't save alarms: {err}"),
        }
    }
}

fn until_next_second(now: NaiveDateTime) -> Duration {
    let nanos = u64::from(now.nanosecond() % 1_000_000_000);
    Duration::from_nanos(1_000_000_000 - nanos)
}
