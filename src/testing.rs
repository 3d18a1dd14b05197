//! Fakes for the clock's collaborators, used by the unit tests.

use std::{
    collections::VecDeque,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use crate::{
    alarm::Alarm,
    command::CommandRunner,
    error::{PersistError, SoundError},
    sound::SoundPlayer,
    storage::AlarmRepository,
    terminal::{Console, Key, KeySource, LineSource},
};

/// Keyboard and prompts fed from a script.
///
/// Every key poll takes the next entry, `None` meaning nothing was pressed.
/// Polling past the end of the script is an error so a test can't hang.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    keys: VecDeque<Option<Key>>,
    pending: VecDeque<Key>,
    lines: VecDeque<String>,
    polls: usize,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(mut self, keys: impl IntoIterator<Item = Option<Key>>) -> Self {
        self.keys.extend(keys);
        self
    }

    /// Each character becomes one key press.
    pub fn typed(mut self, keys: &str) -> Self {
        self.keys.extend(keys.chars().map(|c| Some(Key::Char(c))));
        self
    }

    pub fn idle(mut self, polls: usize) -> Self {
        self.keys.extend(std::iter::repeat(None).take(polls));
        self
    }

    pub fn lines<'a>(mut self, lines: impl IntoIterator<Item = &'a str>) -> Self {
        self.lines.extend(lines.into_iter().map(str::to_string));
        self
    }

    pub const fn polls(&self) -> usize {
        self.polls
    }

    pub fn keys_left(&self) -> usize {
        self.keys.len() + self.pending.len()
    }

    pub fn lines_left(&self) -> usize {
        self.lines.len()
    }
}

impl KeySource for ScriptedConsole {
    fn try_read_key(&mut self) -> io::Result<Option<Key>> {
        self.polls += 1;
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }
        self.keys.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "key script exhausted")
        })
    }

    fn unread(&mut self, key: Key) {
        self.pending.push_front(key);
    }

    fn read_key(&mut self) -> io::Result<Key> {
        loop {
            if let Some(key) = self.try_read_key()? {
                return Ok(key);
            }
        }
    }

    fn wait_for_key(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.pending.is_empty() || matches!(self.keys.front(), Some(Some(_))))
    }
}

impl LineSource for ScriptedConsole {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

impl Console for ScriptedConsole {}

/// Remembers what it was asked to play, optionally taking its time or failing.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlayer {
    paths: Arc<Mutex<Vec<PathBuf>>>,
    play_for: Duration,
    fail: bool,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn play_for(mut self, duration: Duration) -> Self {
        self.play_for = duration;
        self
    }

    pub const fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn plays(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

impl SoundPlayer for RecordingPlayer {
    fn play(&self, path: &Path, should_continue: &dyn Fn() -> bool) -> Result<(), SoundError> {
        self.paths.lock().unwrap().push(path.to_path_buf());
        if self.fail {
            return Err(SoundError::File {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such sound"),
            });
        }
        let end = Instant::now() + self.play_for;
        while should_continue() && Instant::now() < end {
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    commands: Arc<Mutex<Vec<String>>>,
}

impl RecordingRunner {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command_line: &str) {
        self.commands.lock().unwrap().push(command_line.to_string());
    }
}

/// Alarm storage kept in memory, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    alarms: Arc<Mutex<Vec<Alarm>>>,
    saves: Arc<Mutex<usize>>,
    broken: bool,
}

impl MemoryRepository {
    pub fn with_alarms(alarms: Vec<Alarm>) -> Self {
        Self {
            alarms: Arc::new(Mutex::new(alarms)),
            ..Self::default()
        }
    }

    /// Every load and save fails.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn alarms(&self) -> Vec<Alarm> {
        self.alarms.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    fn failure() -> PersistError {
        PersistError::Io {
            path: PathBuf::from("memory"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read only"),
        }
    }
}

impl AlarmRepository for MemoryRepository {
    fn load_all(&self) -> Result<Vec<Alarm>, PersistError> {
        if self.broken {
            return Err(Self::failure());
        }
        Ok(self.alarms())
    }

    fn save_all(&self, alarms: &[Alarm]) -> Result<(), PersistError> {
        *self.saves.lock().unwrap() += 1;
        if self.broken {
            return Err(Self::failure());
        }
        *self.alarms.lock().unwrap() = alarms.to_vec();
        Ok(())
    }
}
