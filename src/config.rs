//! Engine knobs and environment-driven configuration.
use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Public Ethereum endpoint used when nothing else is configured.
pub const DEFAULT_NODE_URL: &str = "https://cloudflare-eth.com";

/// Blocks behind the head that the first scan pass covers.
pub const DEFAULT_LOOKBACK: u64 = 10;

/// Default polling period, in seconds.
pub const DEFAULT_POLL_SECS: u64 = 10;

/// Extra seconds the scan loop waits on top of the polling period.
pub const DEFAULT_SCAN_DELAY_SECS: u64 = 5;

/// Longest accepted polling period or scan delay, in seconds (one day).
pub const MAX_PERIOD_SECS: u64 = 24 * 60 * 60;

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The polling period must be at least one second.
    #[error("polling period must be a positive number of seconds")]
    ZeroPollPeriod,

    /// A polling period or scan delay above [`MAX_PERIOD_SECS`].
    #[error("{what} of {secs}s exceeds the {MAX_PERIOD_SECS}s limit")]
    PeriodTooLong {
        /// Which knob.
        what: &'static str,
        /// Rejected value, in seconds.
        secs: u64,
    },

    /// An environment variable that is set but does not parse.
    #[error("{key}={value:?} is not a valid non-negative integer")]
    NotANumber {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
    },
}

/// Timing and bootstrap knobs of the tracking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    poll_period: Duration,
    scan_delay: Duration,
    lookback: u64,
}

impl EngineConfig {
    /// Refresh the head every `poll_secs` seconds; scan every
    /// `poll_secs + DEFAULT_SCAN_DELAY_SECS`.
    pub fn new(poll_secs: u64) -> Result<Self, ConfigError> {
        if poll_secs == 0 {
            return Err(ConfigError::ZeroPollPeriod);
        }
        check_period("polling period", poll_secs)?;
        Ok(Self {
            poll_period: Duration::from_secs(poll_secs),
            scan_delay: Duration::from_secs(DEFAULT_SCAN_DELAY_SECS),
            lookback: DEFAULT_LOOKBACK,
        })
    }

    /// Seconds added to the polling period to get the scan interval.
    pub fn with_scan_delay(mut self, secs: u64) -> Result<Self, ConfigError> {
        check_period("scan delay", secs)?;
        self.scan_delay = Duration::from_secs(secs);
        Ok(self)
    }

    /// How many blocks behind the first observed head to start scanning.
    pub fn with_lookback(mut self, blocks: u64) -> Self {
        self.lookback = blocks;
        self
    }

    /// Interval of the height refresh loop.
    pub fn poll_period(&self) -> Duration {
        self.poll_period
    }

    /// Interval of the transaction scan loop.
    pub fn scan_period(&self) -> Duration {
        self.poll_period + self.scan_delay
    }

    /// Bootstrap lookback, in blocks.
    pub fn lookback(&self) -> u64 {
        self.lookback
    }
}

fn check_period(what: &'static str, secs: u64) -> Result<(), ConfigError> {
    if secs > MAX_PERIOD_SECS {
        return Err(ConfigError::PeriodTooLong { what, secs });
    }
    Ok(())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_secs(DEFAULT_POLL_SECS),
            scan_delay: Duration::from_secs(DEFAULT_SCAN_DELAY_SECS),
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

/// Everything needed to wire an engine to a real node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// SQLite file for matched transactions; `None` keeps them in memory.
    pub db_path: Option<PathBuf>,
    /// Engine timing.
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - `VIGIA_RPC_URL`: JSON-RPC endpoint (default: [`DEFAULT_NODE_URL`])
    /// - `VIGIA_POLL_SECS`: head refresh period (default 10, must be > 0)
    /// - `VIGIA_SCAN_DELAY_SECS`: extra delay of the scan loop (default 5)
    /// - `VIGIA_LOOKBACK`: blocks scanned behind the head at startup (default 10)
    /// - `VIGIA_DB_PATH`: SQLite file (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::NotANumber {
                    key,
                    value: raw,
                }),
            }
        };

        let engine = EngineConfig::new(number("VIGIA_POLL_SECS", DEFAULT_POLL_SECS)?)?
            .with_scan_delay(number("VIGIA_SCAN_DELAY_SECS", DEFAULT_SCAN_DELAY_SECS)?)?
            .with_lookback(number("VIGIA_LOOKBACK", DEFAULT_LOOKBACK)?);

        let rpc_url = lookup("VIGIA_RPC_URL")
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_NODE_URL.to_string());
        log::info!("node endpoint: {rpc_url}");

        let db_path = lookup("VIGIA_DB_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        match &db_path {
            Some(p) => log::info!("transaction store: sqlite at {}", p.display()),
            None => log::info!("transaction store: in-memory"),
        }

        log::info!(
            "poll every {:?}, scan every {:?}, lookback {} blocks",
            engine.poll_period(),
            engine.scan_period(),
            engine.lookback()
        );

        Ok(Self {
            rpc_url,
            db_path,
            engine,
        })
    }
}
