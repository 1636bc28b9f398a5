//! Configuration loading utilities.
//!
//! Handles paths and parsing for the radiod TOML file (`~/.radiod/radiod.toml`).
//! A missing file yields defaults; a malformed file is an error so a typo never
//! silently disables a radio.

use crate::error::{RadioError, Result};
use radio_protocol::RadioKind;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "RADIOD_CONFIG";
const CONFIG_FILE_NAME: &str = "radiod.toml";

/// Returns the radiod state directory (~/.radiod).
pub fn get_radiod_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".radiod"))
}

/// Returns the config path, honouring the `RADIOD_CONFIG` override.
pub fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    get_radiod_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Which radios the registry manages.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RadiosConfig {
    #[serde(default)]
    pub disabled: Vec<RadioKind>,
}

/// Core configuration; other sections of the file are ignored here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RadioConfig {
    #[serde(default)]
    pub radios: RadiosConfig,
}

impl RadioConfig {
    pub fn is_enabled(&self, kind: RadioKind) -> bool {
        !self.radios.disabled.contains(&kind)
    }
}

/// Loads a TOML config of any shape, returning defaults if the file doesn't exist.
///
/// `path` of `None` resolves the default location.
pub fn load_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => get_config_path().ok_or(RadioError::ConfigPathUnavailable)?,
    };

    let content = match fs_err::read_to_string(&config_path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %config_path.display(), "No config file; using defaults");
            return Ok(T::default());
        }
        Err(source) => {
            return Err(RadioError::ConfigRead {
                path: config_path,
                source,
            })
        }
    };

    toml::from_str::<T>(&content).map_err(|err| RadioError::ConfigMalformed {
        path: config_path,
        details: err.to_string(),
    })
}
