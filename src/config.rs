//! TOML configuration for the console.
//!
//! ```toml
//! [repository]
//! page_size = 10
//!
//! [log]
//! level = "info"
//! ```

use crate::error::{ScheduleError, ScheduleResult};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepositorySettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_page_size() -> usize {
    10
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for RepositorySettings {
    fn default() -> Self {
        RepositorySettings {
            page_size: default_page_size(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> ScheduleResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)?;
        Config::parse(&text)
    }

    pub fn parse(text: &str) -> ScheduleResult<Self> {
        let config: Config = toml::from_str(text)?;
        if config.repository.page_size == 0 {
            return Err(ScheduleError::Config(
                "repository.page_size must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
