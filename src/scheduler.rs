//! Deciding when alarms ring and walking each one through its ring episode.
//!
//! An alarm goes `Idle -> Due -> Ringing -> Acknowledged` and then is either
//! removed (one-shot alarms) or kept for its next occurrence (repeating ones).
//! Episodes never overlap: when several alarms are due on the same tick they
//! ring one after the other, in store order.
//!
//! Every minute is swept once. A sweep looks back over the minutes the
//! scheduler has not seen yet, at most [`MAX_CATCH_UP_MINUTES`] of them, so an
//! alarm isn't lost when the tick on its exact minute is late or the menu was
//! open at the time.

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use chrono::{Duration as ChronoDuration, NaiveDateTime, Timelike};
use log::{debug, error, info, warn};

use crate::{
    alarm::Alarm,
    command::{CommandRunner, ShellCommand},
    render::ring_screen,
    sound::{RingState, SoundPlayer, SoundTask},
    store::AlarmStore,
    terminal::{draw, Key, KeySource},
};

pub const MAX_CATCH_UP_MINUTES: i64 = 5;
const ACK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What happened to an alarm after it was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Removed,
    Retained,
}

/// One finished ring episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingEpisode {
    pub alarm: Alarm,
    pub outcome: Outcome,
    /// the key that stopped it, `None` when the keyboard failed
    pub stopped_by: Option<Key>,
}

pub struct AlarmScheduler<R = ShellCommand> {
    player: Arc<dyn SoundPlayer>,
    runner: R,
    default_sound: PathBuf,
    ring: RingState,
    last_swept: Option<NaiveDateTime>,
    ack_poll: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<R: CommandRunner> AlarmScheduler<R> {
    pub fn new(player: Arc<dyn SoundPlayer>, runner: R, default_sound: PathBuf) -> Self {
        Self {
            player,
            runner,
            default_sound,
            ring: RingState::new(),
            last_swept: None,
            ack_poll: ACK_POLL_INTERVAL,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// How often the keyboard is checked while an alarm rings.
    #[must_use]
    pub const fn with_ack_poll(mut self, interval: Duration) -> Self {
        self.ack_poll = interval;
        self
    }

    /// Setting the flag stops a ringing alarm as if Ctrl+C was pressed and
    /// skips the alarms still due.
    #[must_use]
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    #[must_use]
    pub const fn ring_state(&self) -> &RingState {
        &self.ring
    }

    /// Rings every alarm due at `now`, one full episode at a time.
    ///
    /// Blocks while an alarm rings, until a key acknowledges it.
    ///
    /// # Errors
    /// if the ring screen can't be drawn; the sound is stopped first
    pub fn tick<K, W>(
        &mut self,
        now: NaiveDateTime,
        store: &mut AlarmStore,
        keys: &mut K,
        out: &mut W,
    ) -> io::Result<Vec<RingEpisode>>
    where
        K: KeySource + ?Sized,
        W: Write,
    {
        let Some(window) = self.sweep(now) else {
            return Ok(Vec::new());
        };
        let mut episodes = Vec::new();
        let mut index = 1;
        while let Some(alarm) = store.get(index).cloned() {
            if self.shutting_down() {
                info!("shutting down, not ringing the remaining alarms");
                break;
            }
            if !window.contains(&alarm) {
                index += 1;
                continue;
            }
            let stopped_by = self.ring(&alarm, keys, out)?;
            let outcome = if alarm.repeat {
                index += 1;
                Outcome::Retained
            } else {
                // the next alarm moves into this slot, so index stays
                if let Err(err) = store.remove(index) {
                    error!("couldn't remove alarm {index} after it rang: {err}");
                    index += 1;
                }
                Outcome::Removed
            };
            info!(
                "alarm {:02}:{:02} {:?} {}",
                alarm.hour(),
                alarm.minute(),
                alarm.description(),
                match outcome {
                    Outcome::Removed => "removed",
                    Outcome::Retained => "kept for next time",
                }
            );
            episodes.push(RingEpisode {
                alarm,
                outcome,
                stopped_by,
            });
        }
        Ok(episodes)
    }

    /// Marks the minute of `now` as swept and returns the minutes that still
    /// need checking, `None` if this minute was already handled.
    fn sweep(&mut self, now: NaiveDateTime) -> Option<Window> {
        let minute = start_of_minute(now);
        let oldest = minute - ChronoDuration::minutes(MAX_CATCH_UP_MINUTES);
        let after = match self.last_swept {
            Some(last) if last == minute => return None,
            Some(last) if last > minute => {
                warn!("clock went back from {last} to {minute}");
                minute - ChronoDuration::minutes(1)
            }
            Some(last) => last.max(oldest),
            None => minute - ChronoDuration::minutes(1),
        };
        self.last_swept = Some(minute);
        Some(Window {
            after,
            until: minute,
        })
    }

    /// Runs one ring episode and returns once the sound task has exited.
    fn ring<K, W>(&self, alarm: &Alarm, keys: &mut K, out: &mut W) -> io::Result<Option<Key>>
    where
        K: KeySource + ?Sized,
        W: Write,
    {
        info!(
            "alarm {:02}:{:02} {:?} ringing",
            alarm.hour(),
            alarm.minute(),
            alarm.description()
        );
        self.ring.start();
        discard_early_keys(keys);
        let sound = alarm.sound_path(&self.default_sound);
        // dropping the task stops and joins it, also on the error path below
        let task = match SoundTask::spawn(Arc::clone(&self.player), sound, self.ring.clone()) {
            Ok(task) => Some(task),
            Err(err) => {
                error!("couldn't start the alarm sound: {err}");
                None
            }
        };
        if let Some(command) = &alarm.command {
            self.runner.run(command);
        }
        let screen = draw(out, &ring_screen(alarm));
        let stopped_by = match screen {
            Ok(()) => self.wait_for_ack(keys),
            Err(err) => {
                self.ring.request_stop();
                return Err(err);
            }
        };
        self.ring.request_stop();
        if let Some(task) = task {
            task.stop();
        }
        info!("alarm {:02}:{:02} stopped", alarm.hour(), alarm.minute());
        Ok(stopped_by)
    }

    fn wait_for_ack<K: KeySource + ?Sized>(&self, keys: &mut K) -> Option<Key> {
        loop {
            if self.shutting_down() {
                return Some(Key::Interrupt);
            }
            match keys.try_read_key() {
                Ok(Some(key)) => {
                    if key == Key::Interrupt {
                        // still stops the alarm, the main loop sees it next
                        keys.unread(key);
                    }
                    return Some(key);
                }
                Ok(None) => thread::sleep(self.ack_poll),
                Err(err) => {
                    warn!("can't read the keyboard ({err}), stopping the alarm");
                    return None;
                }
            }
        }
    }

    fn shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Drops keys pressed before the alarm started, only a key pressed while it
/// rings stops it. Ctrl+C is kept.
fn discard_early_keys<K: KeySource + ?Sized>(keys: &mut K) {
    loop {
        match keys.try_read_key() {
            Ok(Some(Key::Interrupt)) => {
                keys.unread(Key::Interrupt);
                return;
            }
            Ok(Some(key)) => debug!("ignoring {key:?} pressed before the alarm rang"),
            Ok(None) | Err(_) => return,
        }
    }
}

/// The minutes `(after, until]` a sweep covers.
#[derive(Debug, Clone, Copy)]
struct Window {
    after: NaiveDateTime,
    until: NaiveDateTime,
}

impl Window {
    fn contains(&self, alarm: &Alarm) -> bool {
        let mut minute = self.until;
        while minute > self.after {
            if minute.time() == alarm.time() {
                return true;
            }
            minute -= ChronoDuration::minutes(1);
        }
        false
    }
}

fn start_of_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}
