//! Persisted query and helper text.
//!
//! Stored as `<config dir>/lineq/LineQuery.json`:
//!
//! ```json
//! { "config": { "query": "from l in lines\nselect l", "helpers": "" } }
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Name the config file is derived from.
pub const PLUGIN_NAME: &str = "LineQuery";

/// The text fields remembered between sessions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SavedQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub helpers: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigDocument {
    config: SavedQuery,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{path} is not a valid config file: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigSaveError {
    #[error("cannot write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Default directory for the config file.
pub fn default_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lineq"))
}

/// Reads and writes the config file in one directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ConfigStore { dir: dir.into() }
    }

    /// Store in the platform config directory, if one can be determined.
    pub fn default_location() -> Option<Self> {
        default_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", PLUGIN_NAME))
    }

    /// Load the saved query; `Ok(None)` when nothing was saved yet.
    pub fn load(&self) -> Result<Option<SavedQuery>, ConfigLoadError> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no saved config");
                return Ok(None);
            }
            Err(source) => return Err(ConfigLoadError::Io { path, source }),
        };
        let document: ConfigDocument = serde_json::from_str(&text)
            .map_err(|source| ConfigLoadError::Malformed { path, source })?;
        Ok(Some(document.config))
    }

    /// Write `saved`, creating the directory on demand.
    pub fn save(&self, saved: &SavedQuery) -> Result<(), ConfigSaveError> {
        let path = self.path();
        fs::create_dir_all(&self.dir).map_err(|source| ConfigSaveError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let document = ConfigDocument {
            config: saved.clone(),
        };
        let text = serde_json::to_string_pretty(&document)?;
        fs::write(&path, text).map_err(|source| ConfigSaveError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "saved config");
        Ok(())
    }
}
