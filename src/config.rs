//! Configuration management
//!
//! Runtime settings for the ledger binary, read from environment variables.
//! Anything that affects hashes or validation lives in `crate::constants`
//! instead and is not configurable.

use log::LevelFilter;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{LedgerError, Result};

static DEFAULT_DB_PATH: &str = "data/ledger";

const DB_PATH_KEY: &str = "BIMS_DB_PATH";
const APPEND_RETRIES_KEY: &str = "BIMS_APPEND_RETRIES";
const LOG_LEVEL_KEY: &str = "BIMS_LOG_LEVEL";
const LOW_STOCK_WINDOW_KEY: &str = "BIMS_LOW_STOCK_WINDOW_DAYS";
const PREDICTION_THRESHOLD_KEY: &str = "BIMS_PREDICTION_THRESHOLD_DAYS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory of the sled database
    pub db_path: PathBuf,
    /// Extra append attempts after losing an index race
    pub max_append_retries: u32,
    pub log_level: LevelFilter,
    /// Days of STOCK_OUT history used to estimate sales velocity
    pub low_stock_window_days: u32,
    /// Items running out within this many days are reported
    pub prediction_threshold_days: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            max_append_retries: 3,
            log_level: LevelFilter::Info,
            low_stock_window_days: 30,
            prediction_threshold_days: 7,
        }
    }
}

impl Config {
    /// Defaults overridden by whatever `BIMS_*` variables are set
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(DB_PATH_KEY) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(APPEND_RETRIES_KEY) {
            config.max_append_retries = parse_value(APPEND_RETRIES_KEY, &raw)?;
        }
        if let Some(raw) = lookup(LOG_LEVEL_KEY) {
            config.log_level = parse_value(LOG_LEVEL_KEY, &raw)?;
        }
        if let Some(raw) = lookup(LOW_STOCK_WINDOW_KEY) {
            config.low_stock_window_days = parse_value(LOW_STOCK_WINDOW_KEY, &raw)?;
            if config.low_stock_window_days == 0 {
                return Err(LedgerError::Config(format!(
                    "{LOW_STOCK_WINDOW_KEY} must be at least 1"
                )));
            }
        }
        if let Some(raw) = lookup(PREDICTION_THRESHOLD_KEY) {
            config.prediction_threshold_days = parse_value(PREDICTION_THRESHOLD_KEY, &raw)?;
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| LedgerError::Config(format!("{key}: cannot parse '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.db_path, PathBuf::from("data/ledger"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BIMS_DB_PATH", "/tmp/bims"),
            ("BIMS_APPEND_RETRIES", "5"),
            ("BIMS_LOG_LEVEL", "debug"),
            ("BIMS_LOW_STOCK_WINDOW_DAYS", "14"),
            ("BIMS_PREDICTION_THRESHOLD_DAYS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/bims"));
        assert_eq!(config.max_append_retries, 5);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.low_stock_window_days, 14);
        assert_eq!(config.prediction_threshold_days, 3);
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = Config::from_lookup(lookup(&[("BIMS_APPEND_RETRIES", "many")])).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_zero_window_is_an_error() {
        assert!(Config::from_lookup(lookup(&[("BIMS_LOW_STOCK_WINDOW_DAYS", "0")])).is_err());
    }
}
