use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, render::Language};

const APP_NAME: &str = "roosty_term_clock";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// language of the date line under the clock
    pub language: Language,
    /// fixed offset from UTC, the system's local time when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
    /// played by alarms without a sound of their own
    pub default_sound: PathBuf,
    /// 0 to 100
    pub volume: u8,
    /// where the alarms are kept, `<data dir>/alarms.toml` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarms_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::default(),
            utc_offset_minutes: None,
            default_sound: Self::sounds_path()
                .unwrap_or_else(|_| PathBuf::from("sounds"))
                .join("beep_beep.mp3"),
            volume: 100,
            alarms_file: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the config at `path`, a missing file gives the defaults.
    ///
    /// # Errors
    /// if the file exists but can't be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(config) => config,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: Self = toml::from_str(&config)?;
        if config.volume > 100 {
            warn!("volume {} is above 100, capping it", config.volume);
        }
        Ok(config)
    }

    /// # Errors
    /// if the config can't be serialized or written
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_error)?;
        }
        fs::write(path, config).map_err(io_error)
    }

    /// # Errors
    /// if there is no home directory to put the data directory in
    pub fn alarms_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.alarms_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("alarms.toml")),
        }
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        f32::from(self.volume.min(100))
    }

    fn project_dirs() -> Result<ProjectDirs, ConfigError> {
        ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoHomeDirectory)
    }

    /// # Errors
    /// if there is no home directory
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// # Errors
    /// if there is no home directory
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// # Errors
    /// if there is no home directory
    pub fn sounds_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::data_dir()?.join("sounds"))
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().is_ok_and(|path| path.exists())
    }
}
