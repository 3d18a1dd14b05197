//! Playing the alarm sound in the background.
//!
//! One [`SoundTask`] exists per ring episode. It replays the sound until the
//! shared [`RingState`] says to stop, and stopping waits for the thread to
//! finish so two episodes never overlap.
//!
//! A player stuck inside a device call that never returns can't be killed,
//! stopping then blocks until the call comes back.

use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error};
use rodio::{Decoder, OutputStream, Sink};

use crate::error::SoundError;

/// How often a playing sound checks whether it should stop.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Pause before the sound starts over.
pub const REPLAY_GAP: Duration = Duration::from_millis(500);

pub trait SoundPlayer: Send + Sync {
    /// Plays the file once, returning early as soon as `should_continue`
    /// returns false. It has to be polled at least once per audio buffer.
    ///
    /// # Errors
    /// if the file can't be opened or decoded or there is no audio device
    fn play(&self, path: &Path, should_continue: &dyn Fn() -> bool) -> Result<(), SoundError>;
}

/// Plays through the default output device.
#[derive(Debug, Clone, Copy)]
pub struct RodioPlayer {
    /// 0 to 100
    volume: f32,
}

impl RodioPlayer {
    #[must_use]
    pub fn new(volume: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 100.0),
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl SoundPlayer for RodioPlayer {
    fn play(&self, path: &Path, should_continue: &dyn Fn() -> bool) -> Result<(), SoundError> {
        let file = File::open(path).map_err(|source| SoundError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let input = Decoder::new(BufReader::new(file)).map_err(|source| SoundError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        // the stream has to stay alive while the sink plays
        let (_stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;
        sink.set_volume(self.volume / 100.0);
        sink.append(input);
        sink.play();
        while !sink.empty() {
            if !should_continue() {
                sink.stop();
                break;
            }
            thread::sleep(STOP_POLL_INTERVAL);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingFlags {
    /// a sound task should be playing
    pub ringing: bool,
    /// the user acknowledged the alarm
    pub stop_requested: bool,
}

/// Flags shared between the main loop and the sound task, always accessed
/// under the lock.
#[derive(Debug, Clone, Default)]
pub struct RingState {
    flags: Arc<Mutex<RingFlags>>,
}

impl RingState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        *self.lock() = RingFlags {
            ringing: true,
            stop_requested: false,
        };
    }

    pub fn request_stop(&self) {
        *self.lock() = RingFlags {
            ringing: false,
            stop_requested: true,
        };
    }

    #[must_use]
    pub fn should_continue(&self) -> bool {
        let flags = self.lock();
        flags.ringing && !flags.stop_requested
    }

    #[must_use]
    pub fn flags(&self) -> RingFlags {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, RingFlags> {
        // the flags are plain data, a panicking holder can't leave them half written
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The background thread playing one alarm.
#[derive(Debug)]
pub struct SoundTask {
    ring: RingState,
    handle: Option<JoinHandle<()>>,
}

impl SoundTask {
    /// Starts replaying `path` for as long as `ring` keeps ringing.
    ///
    /// # Errors
    /// if the thread can't be spawned
    pub fn spawn(
        player: Arc<dyn SoundPlayer>,
        path: PathBuf,
        ring: RingState,
    ) -> io::Result<Self> {
        let state = ring.clone();
        let handle = thread::Builder::new()
            .name("alarm-sound".to_string())
            .spawn(move || play_until_stopped(player.as_ref(), &path, &state))?;
        Ok(Self {
            ring,
            handle: Some(handle),
        })
    }

    /// Tells the task to stop and waits until it has.
    pub fn stop(mut self) {
        self.shutdown();
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn shutdown(&mut self) {
        self.ring.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("the alarm sound thread panicked");
            }
        }
    }
}

impl Drop for SoundTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn play_until_stopped(player: &dyn SoundPlayer, path: &Path, ring: &RingState) {
    let keep_going = || ring.should_continue();
    while keep_going() {
        if let Err(err) = player.play(path, &keep_going) {
            error!("alarm sound stopped: {err}");
            return;
        }
        let replay_at = Instant::now() + REPLAY_GAP;
        while keep_going() && Instant::now() < replay_at {
            thread::sleep(STOP_POLL_INTERVAL);
        }
    }
    debug!("alarm sound {} finished", path.display());
}
