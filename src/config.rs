//! Configuration loaded from `config.toml`
//!
//! ```toml
//! vault_path = "/home/me/notes"
//! completion_threshold = 80
//! debounce_ms = 150
//! marker = "#segment"
//! durable_announcements = true
//! ```
//!
//! Every field is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::DEFAULT_MARKER;

const APP_DIR: &str = "lectern";
const CONFIG_FILE: &str = "config.toml";

const MIN_DEBOUNCE_MS: u64 = 100;
const MAX_DEBOUNCE_MS: u64 = 200;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory of Markdown notes
    pub vault_path: Option<PathBuf>,
    /// Where the announcement ledger lives
    pub state_dir: Option<PathBuf>,
    /// Default completion threshold in percent
    pub completion_threshold: u32,
    pub debounce_ms: u64,
    /// Text that marks a task line as a segment
    pub marker: String,
    /// Remember series announcements across restarts
    pub durable_announcements: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_path: None,
            state_dir: None,
            completion_threshold: 80,
            debounce_ms: 150,
            marker: DEFAULT_MARKER.to_string(),
            durable_announcements: true,
        }
    }
}

impl Config {
    /// `<config dir>/lectern/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()
    }

    /// Load `path`, or the default location, falling back to defaults when
    /// the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Config::default().validate(),
            },
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Config::default().validate();
        }
        log::info!("Loading config from {}", path.display());
        Self::load(&path)
    }

    pub fn validate(mut self) -> Result<Self> {
        if !(1..=100).contains(&self.completion_threshold) {
            return Err(ConfigError::Invalid(format!(
                "completion_threshold must be between 1 and 100, got {}",
                self.completion_threshold
            )));
        }
        if self.marker.trim().is_empty() {
            return Err(ConfigError::Invalid("marker must not be empty".to_string()));
        }
        let clamped = self.debounce_ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS);
        if clamped != self.debounce_ms {
            log::warn!(
                "debounce_ms {} is outside {}-{}ms, using {}",
                self.debounce_ms,
                MIN_DEBOUNCE_MS,
                MAX_DEBOUNCE_MS,
                clamped
            );
            self.debounce_ms = clamped;
        }
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Configured state directory, or `<local data dir>/lectern`
    pub fn state_dir(&self) -> Option<PathBuf> {
        self.state_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR)))
    }
}
