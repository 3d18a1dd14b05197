//! The alarm menu: list, add, delete and modify alarms.
//!
//! Menu choices are single key presses. The questions asked while adding or
//! changing an alarm are answered with whole lines.

use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use chrono::NaiveTime;
use log::info;

use crate::{
    alarm::{parse_time, Alarm, AlarmEdit},
    error::{StoreError, ValidationError},
    render::{Frame, TerminalSize},
    store::AlarmStore,
    terminal::{draw, Console, Key},
};

const MENU_HINT: &str = "'a' add  'x' delete  'm' modify  'q' back to clock";
const CANCELLED: &str = "Cancelled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuExit {
    BackToClock,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOutcome {
    pub exit: MenuExit,
    /// the alarms were changed and need saving
    pub changed: bool,
}

pub struct AlarmMenu<'a, C: Console + ?Sized, W: Write> {
    console: &'a mut C,
    out: &'a mut W,
    status: String,
    shutdown: Arc<AtomicBool>,
}

impl<'a, C: Console + ?Sized, W: Write> AlarmMenu<'a, C, W> {
    pub fn new(console: &'a mut C, out: &'a mut W) -> Self {
        Self {
            console,
            out,
            status: String::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Once the flag is set the menu closes with [`MenuExit::Shutdown`]
    /// instead of waiting for more input.
    #[must_use]
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Shows the menu until the user goes back to the clock.
    ///
    /// # Errors
    /// if the terminal can't be read or drawn to
    pub fn run(&mut self, store: &mut AlarmStore) -> io::Result<MenuOutcome> {
        let mut changed = false;
        loop {
            if self.shutting_down() {
                return Ok(MenuOutcome {
                    exit: MenuExit::Shutdown,
                    changed,
                });
            }
            let size = self.console.size();
            draw(&mut *self.out, &menu_screen(store, size, &self.status))?;
            let key = self.console.read_key()?;
            self.status.clear();
            let exit = match key {
                Key::Char('a') => {
                    changed |= self.add(store)?;
                    None
                }
                Key::Char('x') => {
                    changed |= self.delete(store)?;
                    None
                }
                Key::Char('m') => {
                    changed |= self.modify(store)?;
                    None
                }
                Key::Char('q') | Key::Escape => Some(MenuExit::BackToClock),
                Key::Interrupt => Some(MenuExit::Shutdown),
                _ => {
                    self.status = "Invalid choice.".to_string();
                    None
                }
            };
            if let Some(exit) = exit {
                return Ok(MenuOutcome { exit, changed });
            }
        }
    }

    fn add(&mut self, store: &mut AlarmStore) -> io::Result<bool> {
        if store.is_full() {
            self.status = StoreError::CapacityExceeded {
                capacity: store.capacity(),
            }
            .to_string();
            return Ok(false);
        }
        let Some(time) = self.ask_time("Alarm time (HH:MM): ")? else {
            self.status = CANCELLED.to_string();
            return Ok(false);
        };
        let description = self.ask("Description: ")?.unwrap_or_default();
        let repeat = self.ask("Repeat every day? (y/n): ")?.is_some_and(|a| yes(&a));
        let sound = self.ask("Custom sound file (empty for the default): ")?;
        let command = self.ask("Command to run when it rings (empty for none): ")?;
        if self.shutting_down() {
            self.status = CANCELLED.to_string();
            return Ok(false);
        }

        let mut alarm = Alarm::new(time, &description).repeating(repeat);
        if let Some(sound) = sound.filter(|s| !s.trim().is_empty()) {
            alarm = alarm.with_sound(sound.trim());
        }
        if let Some(command) = command {
            alarm = alarm.with_command(command);
        }
        match store.add(alarm) {
            Ok(index) => {
                info!("added alarm {index}: {}", store.list()[index - 1]);
                self.status = format!("Alarm {index} added.");
                Ok(true)
            }
            Err(err) => {
                self.status = format!("{err}.");
                Ok(false)
            }
        }
    }

    fn delete(&mut self, store: &mut AlarmStore) -> io::Result<bool> {
        let Some(index) = self.ask_index("Number of the alarm to delete: ", store)? else {
            return Ok(false);
        };
        match store.remove(index) {
            Ok(alarm) => {
                info!("deleted alarm {index}: {alarm}");
                self.status = format!("Alarm {index} deleted.");
                Ok(true)
            }
            Err(err) => {
                self.status = format!("{err}.");
                Ok(false)
            }
        }
    }

    fn modify(&mut self, store: &mut AlarmStore) -> io::Result<bool> {
        let Some(index) = self.ask_index("Number of the alarm to modify: ", store)? else {
            return Ok(false);
        };
        let Some(current) = store.get(index).cloned() else {
            self.status = format!(
                "{}.",
                StoreError::OutOfRange {
                    index,
                    len: store.len()
                }
            );
            return Ok(false);
        };
        self.write_line(&format!("Changing {current}, empty answers keep the old value"))?;

        let mut edits = Vec::new();
        let time_prompt = format!(
            "New time (HH:MM) [{:02}:{:02}]: ",
            current.hour(),
            current.minute()
        );
        if let Some(time) = self.ask_time(&time_prompt)? {
            edits.push(AlarmEdit::Time(time));
        }
        let description_prompt = format!("New description [{}]: ", current.description());
        if let Some(description) = self.ask(&description_prompt)?.filter(|d| !d.is_empty()) {
            edits.push(AlarmEdit::Description(description));
        }
        let repeat_prompt = format!(
            "Repeat every day? (y/n) [{}]: ",
            if current.repeat { "y" } else { "n" }
        );
        if let Some(answer) = self.ask(&repeat_prompt)?.filter(|a| !a.trim().is_empty()) {
            edits.push(AlarmEdit::Repeat(yes(&answer)));
        }
        let sound_prompt = format!(
            "Sound file, '-' for the default [{}]: ",
            current
                .sound
                .as_ref()
                .map_or_else(|| "default".to_string(), |p| p.display().to_string())
        );
        if let Some(sound) = self.ask(&sound_prompt)? {
            match sound.trim() {
                "" => {}
                "-" => edits.push(AlarmEdit::Sound(None)),
                path => edits.push(AlarmEdit::Sound(Some(path.into()))),
            }
        }
        let command_prompt = format!(
            "Command, '-' for none [{}]: ",
            current.command.as_deref().unwrap_or("none")
        );
        if let Some(command) = self.ask(&command_prompt)? {
            match command.trim() {
                "" => {}
                "-" => edits.push(AlarmEdit::Command(None)),
                line => edits.push(AlarmEdit::Command(Some(line.to_string()))),
            }
        }

        if self.shutting_down() {
            self.status = CANCELLED.to_string();
            return Ok(false);
        }
        if edits.is_empty() {
            self.status = format!("Alarm {index} unchanged.");
            return Ok(false);
        }
        match store.modify(index, edits) {
            Ok(()) => {
                info!("modified alarm {index}: {}", store.list()[index - 1]);
                self.status = format!("Alarm {index} modified.");
                Ok(true)
            }
            Err(err) => {
                self.status = format!("{err}.");
                Ok(false)
            }
        }
    }

    /// Asks until it gets a valid time. `None` when the answer is empty.
    fn ask_time(&mut self, prompt: &str) -> io::Result<Option<NaiveTime>> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            if answer.trim().is_empty() {
                return Ok(None);
            }
            match parse_time(&answer) {
                Ok(time) => return Ok(Some(time)),
                Err(err) => self.write_line(&err.to_string())?,
            }
        }
    }

    /// `None` with the status set when the answer isn't a usable number.
    fn ask_index(&mut self, prompt: &str, store: &AlarmStore) -> io::Result<Option<usize>> {
        if store.is_empty() {
            self.status = "There are no alarms.".to_string();
            return Ok(None);
        }
        let Some(answer) = self.ask(prompt)? else {
            self.status = CANCELLED.to_string();
            return Ok(None);
        };
        if answer.trim().is_empty() {
            self.status = CANCELLED.to_string();
            return Ok(None);
        }
        match parse_index(&answer) {
            Ok(index) => Ok(Some(index)),
            Err(err) => {
                self.status = format!("{err}.");
                Ok(None)
            }
        }
    }

    /// The line typed after `prompt`, `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.shutting_down() {
            return Ok(None);
        }
        write!(self.out, "\r\n{prompt}")?;
        self.out.flush()?;
        self.console.read_line()
    }

    fn shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        write!(self.out, "\r\n{line}")?;
        self.out.flush()
    }
}

/// The numbered alarm list with every free slot, the status of the last
/// action and the key hint at the bottom.
#[must_use]
pub fn menu_screen(store: &AlarmStore, size: TerminalSize, status: &str) -> Frame {
    let mut lines = vec!["Alarms:".to_string()];
    for number in 1..=store.capacity() {
        lines.push(match store.get(number) {
            Some(alarm) => format!("{number}. {alarm}"),
            None => format!("{number}."),
        });
    }
    let padding = usize::from(size.rows).saturating_sub(lines.len() + 2);
    lines.extend(std::iter::repeat(String::new()).take(padding));
    lines.push(status.to_string());
    lines.push(MENU_HINT.to_string());
    Frame::from(lines)
}

/// Parses a 1-based alarm number.
///
/// # Errors
/// [`ValidationError::Index`] unless it's a whole number.
pub fn parse_index(input: &str) -> Result<usize, ValidationError> {
    let trimmed = input.trim();
    trimmed
        .parse()
        .map_err(|_| ValidationError::Index(trimmed.to_string()))
}

fn yes(answer: &str) -> bool {
    matches!(answer.trim().chars().next(), Some('y' | 'Y'))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        store::MAX_ALARMS,
        terminal::{KeySource, LineSource},
        testing::ScriptedConsole,
    };

    fn alarm(hour: u32, minute: u32, description: &str) -> Alarm {
        Alarm::new(NaiveTime::from_hms_opt(hour, minute, 0).unwrap(), description)
    }

    fn run(console: &mut ScriptedConsole, store: &mut AlarmStore) -> (MenuOutcome, String) {
        let mut out = Vec::new();
        let outcome = AlarmMenu::new(console, &mut out).run(store).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_indexes() {
        assert_eq!(parse_index(" 3\n"), Ok(3));
        assert_eq!(parse_index("0"), Ok(0));
        assert_eq!(parse_index("two"), Err(ValidationError::Index("two".to_string())));
        assert_eq!(parse_index("-1"), Err(ValidationError::Index("-1".to_string())));
    }

    #[test]
    fn screen_lists_every_slot() {
        let mut store = AlarmStore::new();
        store.add(alarm(7, 30, "Wake")).unwrap();
        let frame = menu_screen(&store, TerminalSize::new(80, 24), "Alarm 1 added.");
        let lines = frame.lines();
        assert_eq!(lines.len(), 24);
        assert_eq!(
            lines[1],
            "1. 07:30 - Wake (repeat: no, custom sound: no, command: no)"
        );
        assert_eq!(lines[2], "2.");
        assert_eq!(lines[MAX_ALARMS], format!("{MAX_ALARMS}."));
        assert_eq!(lines[22], "Alarm 1 added.");
        assert_eq!(lines[23], MENU_HINT);
    }

    #[test]
    fn quit_and_escape_go_back() {
        let mut store = AlarmStore::new();
        for key in [Key::Char('q'), Key::Escape] {
            let mut console = ScriptedConsole::new().keys([Some(key)]);
            let (outcome, _) = run(&mut console, &mut store);
            assert_eq!(
                outcome,
                MenuOutcome {
                    exit: MenuExit::BackToClock,
                    changed: false
                }
            );
        }
    }

    #[test]
    fn ctrl_c_shuts_down() {
        let mut store = AlarmStore::new();
        let mut console = ScriptedConsole::new().keys([Some(Key::Interrupt)]);
        let (outcome, _) = run(&mut console, &mut store);
        assert_eq!(outcome.exit, MenuExit::Shutdown);
    }

    #[test]
    fn adds_an_alarm() {
        let mut store = AlarmStore::new();
        let mut console = ScriptedConsole::new().typed("aq").lines([
            "07:30",
            "Wake",
            "y",
            "",
            "touch done.txt",
        ]);
        let (outcome, out) = run(&mut console, &mut store);
        assert!(outcome.changed);
        assert_eq!(store.len(), 1);
        let added = store.get(1).unwrap();
        assert_eq!((added.hour(), added.minute()), (7, 30));
        assert_eq!(added.description(), "Wake");
        assert!(added.repeat);
        assert_eq!(added.sound, None);
        assert_eq!(added.command.as_deref(), Some("touch done.txt"));
        assert!(out.contains("Alarm 1 added."));
        assert_eq!(console.lines_left(), 0);
    }

    #[test]
    fn invalid_time_asks_again() {
        let mut store = AlarmStore::new();
        let mut console = ScriptedConsole::new()
            .typed("aq")
            .lines(["25:00", "soon", "6:05", "", "n", "/tmp/bell.wav", ""]);
        let (_, out) = run(&mut console, &mut store);
        assert!(out.contains("25:00 is not a valid time of day"));
        assert!(out.contains("expected a time as HH:MM"));
        let added = store.get(1).unwrap();
        assert_eq!((added.hour(), added.minute()), (6, 5));
        assert_eq!(added.sound, Some(PathBuf::from("/tmp/bell.wav")));
        assert_eq!(added.command, None);
    }

    #[test]
    fn empty_time_cancels_adding() {
        let mut store = AlarmStore::new();
        let mut console = ScriptedConsole::new().typed("aq").lines([""]);
        let (outcome, out) = run(&mut console, &mut store);
        assert!(!outcome.changed);
        assert!(store.is_empty());
        assert!(out.contains(CANCELLED));
    }

    #[test]
    fn full_store_refuses_without_asking() {
        let mut store = AlarmStore::new();
        for minute in 0..10 {
            store.add(alarm(5, minute, "x")).unwrap();
        }
        let mut console = ScriptedConsole::new().typed("aq").lines(["08:00"]);
        let (outcome, out) = run(&mut console, &mut store);
        assert!(!outcome.changed);
        assert_eq!(store.len(), MAX_ALARMS);
        assert!(out.contains("maximum number of alarms reached (10)."));
        assert_eq!(console.lines_left(), 1);
    }

    #[test]
    fn deletes_by_number() {
        let mut store = AlarmStore::new();
        store.add(alarm(6, 0, "first")).unwrap();
        store.add(alarm(7, 0, "second")).unwrap();
        let mut console = ScriptedConsole::new().typed("xq").lines(["1"]);
        let (outcome, out) = run(&mut console, &mut store);
        assert!(outcome.changed);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().description(), "second");
        assert!(out.contains("Alarm 1 deleted."));
    }

    #[test]
    fn bad_numbers_change_nothing() {
        let mut store = AlarmStore::new();
        store.add(alarm(6, 0, "only")).unwrap();
        let before = store.clone();
        let mut console = ScriptedConsole::new().typed("xxmq").lines(["0", "abc", "5"]);
        let (outcome, out) = run(&mut console, &mut store);
        assert!(!outcome.changed);
        assert_eq!(store, before);
        assert!(out.contains("there is no alarm number 0 (have 1)."));
        assert!(out.contains("expected an alarm number, got \"abc\"."));
        assert!(out.contains("there is no alarm number 5 (have 1)."));
    }

    #[test]
    fn modifies_in_place() {
        let mut store = AlarmStore::new();
        store.add(alarm(6, 0, "first")).unwrap();
        store
            .add(alarm(7, 0, "second").with_sound("/tmp/a.wav").with_command("echo hi"))
            .unwrap();
        let mut console = ScriptedConsole::new()
            .typed("mq")
            .lines(["2", "7:45", "", "y", "-", "-"]);
        let (outcome, out) = run(&mut console, &mut store);
        assert!(outcome.changed);
        let modified = store.get(2).unwrap();
        assert_eq!((modified.hour(), modified.minute()), (7, 45));
        assert_eq!(modified.description(), "second");
        assert!(modified.repeat);
        assert_eq!(modified.sound, None);
        assert_eq!(modified.command, None);
        assert_eq!(store.get(1).unwrap().description(), "first");
        assert!(out.contains("Alarm 2 modified."));
    }

    #[test]
    fn unknown_keys_are_reported() {
        let mut store = AlarmStore::new();
        let mut console = ScriptedConsole::new().typed("zq");
        let (outcome, out) = run(&mut console, &mut store);
        assert!(!outcome.changed);
        assert!(out.contains("Invalid choice."));
    }

    #[test]
    fn empty_store_has_nothing_to_delete() {
        let mut store = AlarmStore::new();
        let mut console = ScriptedConsole::new().typed("xq");
        let (_, out) = run(&mut console, &mut store);
        assert!(out.contains("There are no alarms."));
    }

    #[test]
    fn shutdown_flag_closes_the_menu() {
        let mut store = AlarmStore::new();
        store.add(alarm(6, 0, "kept")).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        // nothing scripted, reading a key would fail
        let mut console = ScriptedConsole::new();
        let mut out = Vec::new();
        let outcome = AlarmMenu::new(&mut console, &mut out)
            .with_shutdown_flag(flag)
            .run(&mut store)
            .unwrap();
        assert_eq!(
            outcome,
            MenuOutcome {
                exit: MenuExit::Shutdown,
                changed: false
            }
        );
        assert_eq!(console.polls(), 0);
        assert_eq!(store.len(), 1);
    }

    /// Sets the shutdown flag as soon as the first line is answered.
    struct SignalAfterFirstLine {
        inner: ScriptedConsole,
        flag: Arc<AtomicBool>,
    }

    impl KeySource for SignalAfterFirstLine {
        fn try_read_key(&mut self) -> io::Result<Option<Key>> {
            self.inner.try_read_key()
        }

        fn unread(&mut self, key: Key) {
            self.inner.unread(key);
        }
    }

    impl LineSource for SignalAfterFirstLine {
        fn read_line(&mut self) -> io::Result<Option<String>> {
            let line = self.inner.read_line();
            self.flag.store(true, Ordering::Relaxed);
            line
        }
    }

    impl Console for SignalAfterFirstLine {}

    #[test]
    fn shutdown_during_prompts_drops_the_half_entered_alarm() {
        let mut store = AlarmStore::new();
        let flag = Arc::new(AtomicBool::new(false));
        let mut console = SignalAfterFirstLine {
            inner: ScriptedConsole::new()
                .typed("a")
                .lines(["07:30", "Wake", "y", "", ""]),
            flag: Arc::clone(&flag),
        };
        let mut out = Vec::new();
        let outcome = AlarmMenu::new(&mut console, &mut out)
            .with_shutdown_flag(flag)
            .run(&mut store)
            .unwrap();
        assert_eq!(
            outcome,
            MenuOutcome {
                exit: MenuExit::Shutdown,
                changed: false
            }
        );
        assert!(store.is_empty());
        assert_eq!(console.inner.lines_left(), 4);
    }
}
