use std::{fs, io, path::PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{alarm::Alarm, error::PersistError};

pub trait AlarmRepository {
    /// a missing file is no alarms
    fn load_all(&self) -> Result<Vec<Alarm>, PersistError>;

    fn save_all(&self, alarms: &[Alarm]) -> Result<(), PersistError>;
}

#[derive(Debug, Deserialize)]
struct AlarmFile {
    #[serde(default)]
    alarms: Vec<Alarm>,
}

#[derive(Debug, Serialize)]
struct AlarmFileRef<'a> {
    alarms: &'a [Alarm],
}

/// Alarms in a TOML file, one `[[alarms]]` table each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TomlAlarmFile {
    path: PathBuf,
}

impl TomlAlarmFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl AlarmRepository for TomlAlarmFile {
    fn load_all(&self) -> Result<Vec<Alarm>, PersistError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no alarm file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(self.io_error(err)),
        };
        let file: AlarmFile = toml::from_str(&contents)?;
        info!(
            "loaded {} alarms from {}",
            file.alarms.len(),
            self.path.display()
        );
        Ok(file.alarms)
    }

    fn save_all(&self, alarms: &[Alarm]) -> Result<(), PersistError> {
        let contents = toml::to_string(&AlarmFileRef { alarms })?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;
        }
        // a crash halfway through leaves the old file intact
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, contents).map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))?;
        debug!("saved {} alarms to {}", alarms.len(), self.path.display());
        Ok(())
    }
}
