//! Optional TOML config file. Command-line flags override every field.
//!
//! ```toml
//! cart = "f4"
//! cpu = "table"
//! policy = "skip"
//! no_delay = true
//!
//! [delays]
//! playfield = 4
//! player = 1
//! enable = 1
//! color = 1
//! control = 1
//! ```

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use vcs_core::device::tia::FuturePixels;
use vcs_machines::OpcodePolicy;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub delays: Option<FuturePixels>,
    /// Bank scheme name, as accepted by `-c`.
    pub cart: Option<String>,
    /// Dispatch strategy name, as accepted by `--cpu`.
    pub cpu: Option<String>,
    pub policy: Option<OpcodePolicy>,
    pub no_delay: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "config {}: {e}", path.display()),
            Self::Parse(path, e) => write!(f, "config {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Parse(_, e) => Some(e),
        }
    }
}

/// `<config dir>/vcs/config.toml`, e.g. `~/.config/vcs/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vcs").join("config.toml"))
}

impl Config {
    /// Load `explicit` if given (it must exist), else the default path if
    /// present, else an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let text =
            std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let config = Self::parse(&text).map_err(|e| ConfigError::Parse(path.clone(), e))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Configured delays brought into the supported range.
    pub fn delays(&self) -> FuturePixels {
        let Some(delays) = self.delays else {
            return FuturePixels::default();
        };
        let clamped = delays.clamped();
        if clamped != delays {
            warn!("future-pixel delays clamped to 1..=9: {clamped:?}");
        }
        clamped
    }
}
