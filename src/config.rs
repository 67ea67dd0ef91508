use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cue::{CueConfig, IntervalUnit, DEFAULT_CUE_DURATION_SECS};

/// Persisted user preferences. The cue cadence survives restarts so the
/// options panel does not have to be re-filled every session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub cue_every: u64,
    pub cue_unit: IntervalUnit,
    pub sound_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cue_every: 0,
            cue_unit: IntervalUnit::Seconds,
            sound_enabled: true,
        }
    }
}

impl Config {
    pub fn cue_config(&self) -> CueConfig {
        CueConfig {
            interval_value: self.cue_every,
            interval_unit: self.cue_unit,
            cue_duration_secs: DEFAULT_CUE_DURATION_SECS,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "tally") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("tally_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
