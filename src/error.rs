//! Error types shared across the clock.
//!
//! Each concern gets its own enum. None of them is allowed to stop the main
//! loop; callers log or report them and carry on.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Bad input typed at a prompt or on the command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected a time as HH:MM, got {0:?}")]
    TimeFormat(String),
    #[error("{hour:02}:{minute:02} is not a valid time of day")]
    TimeRange { hour: u32, minute: u32 },
    #[error("expected an alarm number, got {0:?}")]
    Index(String),
}

/// Rejected store operations. The store is left untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("maximum number of alarms reached ({capacity})")]
    CapacityExceeded { capacity: usize },
    #[error("there is no alarm number {index} (have {len})")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("could not open audio device: {0}")]
    Device(#[from] rodio::StreamError),
    #[error("could not start playback: {0}")]
    Playback(#[from] rodio::PlayError),
    #[error("could not open audio file {}: {source}", path.display())]
    File { path: PathBuf, source: io::Error },
    #[error("could not decode audio file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: rodio::decoder::DecoderError,
    },
}

/// Loading or saving the alarm file failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("alarm file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("couldn't parse alarm file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize alarms: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("couldn't determine the home directory")]
    NoHomeDirectory,
}
