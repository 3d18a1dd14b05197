use std::{fmt, path::PathBuf};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest description kept, anything after is cut off.
pub const MAX_DESCRIPTION_LEN: usize = 99;

/// represents an alarm
/// contains the time that the alarm should go off at (always on a whole minute),
/// an optional custom sound and an optional command to run when it rings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Alarm {
    #[serde(with = "toml_datetime_compat")]
    time: NaiveTime,
    #[serde(default)]
    description: String,
    /// if false the alarm is removed after it has rung and been stopped
    #[serde(default)]
    pub repeat: bool,
    /// there is a default sound, `None` uses it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Alarm {
    #[must_use]
    pub fn new(time: NaiveTime, description: &str) -> Self {
        Self {
            time: whole_minute(time),
            description: bounded(description),
            repeat: false,
            sound: None,
            command: None,
        }
    }

    #[must_use]
    pub const fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<PathBuf>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        let command: String = command.into();
        self.command = Some(command).filter(|c| !c.trim().is_empty());
        self
    }

    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    #[must_use]
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The sound to play, falling back to `default` when no custom one is set.
    #[must_use]
    pub fn sound_path(&self, default: &std::path::Path) -> PathBuf {
        self.sound
            .clone()
            .unwrap_or_else(|| default.to_path_buf())
    }

    pub(crate) fn apply(&mut self, edit: AlarmEdit) {
        match edit {
            AlarmEdit::Time(time) => self.time = whole_minute(time),
            AlarmEdit::Description(description) => self.description = bounded(&description),
            AlarmEdit::Repeat(repeat) => self.repeat = repeat,
            AlarmEdit::Sound(sound) => self.sound = sound,
            AlarmEdit::Command(command) => {
                self.command = command.filter(|c| !c.trim().is_empty());
            }
        }
    }

    /// Keeps the serialized invariants after loading from disk.
    pub(crate) fn normalized(mut self) -> Self {
        self.time = whole_minute(self.time);
        self.description = bounded(&self.description);
        self
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02} - {} (repeat: {}, custom sound: {}, command: {})",
            self.hour(),
            self.minute(),
            self.description,
            yes_no(self.repeat),
            self.sound
                .as_ref()
                .map_or_else(|| "no".to_string(), |p| p.display().to_string()),
            self.command.as_deref().unwrap_or("no"),
        )
    }
}

const fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// A single field change applied by [`crate::store::AlarmStore::modify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmEdit {
    Time(NaiveTime),
    Description(String),
    Repeat(bool),
    Sound(Option<PathBuf>),
    Command(Option<String>),
}

/// Collects the raw text from prompts or the command line and validates it
/// into an [`Alarm`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmBuilder {
    pub time: String,
    pub description: String,
    pub repeat: bool,
    pub sound: Option<PathBuf>,
    pub command: Option<String>,
}

impl AlarmBuilder {
    /// # Errors
    /// if the time isn't a valid `HH:MM`
    pub fn build(self) -> Result<Alarm, ValidationError> {
        let time = parse_time(&self.time)?;
        let mut alarm = Alarm::new(time, &self.description).repeating(self.repeat);
        alarm.sound = self.sound.filter(|p| !p.as_os_str().is_empty());
        if let Some(command) = self.command {
            alarm = alarm.with_command(command);
        }
        Ok(alarm)
    }
}

/// Parses `HH:MM` (24 hour clock, one or two digits each).
///
/// # Errors
/// [`ValidationError::TimeFormat`] when it isn't two numbers around a colon,
/// [`ValidationError::TimeRange`] when they aren't a time of day.
pub fn parse_time(input: &str) -> Result<NaiveTime, ValidationError> {
    let input = input.trim();
    let format_error = || ValidationError::TimeFormat(input.to_string());
    let (hour, minute) = input.split_once(':').ok_or_else(format_error)?;
    let field = |s: &str| -> Result<u32, ValidationError> {
        if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format_error());
        }
        s.parse().map_err(|_| format_error())
    };
    let (hour, minute) = (field(hour)?, field(minute)?);
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ValidationError::TimeRange { hour, minute })
}

fn whole_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

fn bounded(description: &str) -> String {
    description
        .trim_end_matches(['\r', '\n'])
        .chars()
        .take(MAX_DESCRIPTION_LEN)
        .collect()
}
