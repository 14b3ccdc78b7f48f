//! Runtime settings read from the environment.
//!
//! | Variable           | Meaning                                  | Default                          |
//! |--------------------|------------------------------------------|----------------------------------|
//! | `TASKS_DB`         | data directory holding the JSON files    | `<data_local_dir>/tasktally`     |
//! | `TASKS_WEEK_START` | first day of the week for weekly stats   | `sun`                            |
//! | `TASKS_LOG`        | `tracing` filter directive               | `warn`                           |

use std::env;
use std::path::PathBuf;

use chrono::Weekday;

use crate::error::{Error, Result};

pub const DB_ENV: &str = "TASKS_DB";
pub const WEEK_START_ENV: &str = "TASKS_WEEK_START";
pub const LOG_ENV: &str = "TASKS_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub week_start: Weekday,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            week_start: Weekday::Sun,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(dir) = lookup(DB_ENV).filter(|s| !s.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(day) = lookup(WEEK_START_ENV).filter(|s| !s.is_empty()) {
            config.week_start = day.parse().map_err(|_| {
                Error::validation(WEEK_START_ENV, format!("'{}' is not a weekday", day))
            })?;
        }
        if let Some(filter) = lookup(LOG_ENV).filter(|s| !s.is_empty()) {
            config.log_filter = filter;
        }
        Ok(config)
    }
}

fn default_data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("tasktally");
    p
}
