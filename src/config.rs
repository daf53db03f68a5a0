//! Runtime settings, read from the environment (and a `.env` file if one is
//! present).

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;

// Largest board side accepted from the environment
pub const MAX_BOARD_SIDE: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dictionary_path: PathBuf,
    pub dictionary_cache_dir: PathBuf,
    pub match_duration: Duration,
    pub start_delay: Duration,
    pub board_rows: usize,
    pub board_cols: usize,
    pub bind_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictionary_path: PathBuf::from("static/words.txt"),
            dictionary_cache_dir: PathBuf::from("cache"),
            match_duration: Duration::from_secs(120),
            start_delay: Duration::from_secs(3),
            board_rows: 4,
            board_cols: 4,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal outside development
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            dictionary_path: lookup("DICTIONARY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.dictionary_path),
            dictionary_cache_dir: lookup("DICTIONARY_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dictionary_cache_dir),
            match_duration: parse(&lookup, "MATCH_DURATION_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.match_duration),
            start_delay: parse(&lookup, "MATCH_START_DELAY_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.start_delay),
            board_rows: parse(&lookup, "BOARD_ROWS")?.unwrap_or(defaults.board_rows),
            board_cols: parse(&lookup, "BOARD_COLS")?.unwrap_or(defaults.board_cols),
            bind_addr: parse(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr),
        };

        if config.match_duration.is_zero() {
            return Err(invalid(&lookup, "MATCH_DURATION_SECS"));
        }
        if !(1..=MAX_BOARD_SIDE).contains(&config.board_rows) {
            return Err(invalid(&lookup, "BOARD_ROWS"));
        }
        if !(1..=MAX_BOARD_SIDE).contains(&config.board_cols) {
            return Err(invalid(&lookup, "BOARD_COLS"));
        }

        Ok(config)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn invalid<F>(lookup: &F, key: &'static str) -> ConfigError
where
    F: Fn(&str) -> Option<String>,
{
    ConfigError::Invalid {
        key,
        value: lookup(key).unwrap_or_default(),
    }
}
