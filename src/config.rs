//! Scan configuration
//!
//! Built once by the caller and passed to whatever needs it:
//!
//! ```rust
//! use bullscan::prelude::*;
//!
//! let config = ScanConfig::from_toml_str(
//!     r#"
//!     exchange = "binance"
//!     timeframe = "4H"
//!     filters = ["strategy1", "zero_axis"]
//!     "#,
//! )?;
//! assert_eq!(config.exchange, Exchange::Binance);
//! assert_eq!(config.limit, 100);
//! # Ok::<(), SignalError>(())
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, SignalError};

pub const DEFAULT_TIMEFRAME: &str = "1H";
pub const DEFAULT_LIMIT: usize = 100;
pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_FILTER: &str = "sample";

/// Candle source. Fetching lives outside this crate; the value only travels
/// with the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    #[default]
    Okx,
    Binance,
}

impl Exchange {
    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Okx => "okx",
            Exchange::Binance => "binance",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "okx" => Ok(Exchange::Okx),
            "binance" => Ok(Exchange::Binance),
            _ => Err(SignalError::UnsupportedExchange(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Exchange {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// What to scan and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanConfig {
    pub exchange: Exchange,
    /// Exchange bar size, e.g. `"1H"`
    pub timeframe: String,
    /// Number of historical candles requested per instrument
    pub limit: usize,
    /// Window `n` handed to filters that take it from the config
    pub window: usize,
    /// Registry names of the filters to run
    pub filters: BTreeSet<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exchange: Exchange::default(),
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW,
            filters: BTreeSet::from([DEFAULT_FILTER.to_string()]),
        }
    }
}

/// On-disk shape; every key is optional and falls back to the default
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScanConfigRaw {
    exchange: Option<String>,
    timeframe: Option<String>,
    limit: Option<usize>,
    window: Option<usize>,
    filters: Option<Vec<String>>,
}

impl ScanConfigRaw {
    fn into_config(self) -> Result<ScanConfig> {
        let defaults = ScanConfig::default();
        let config = ScanConfig {
            exchange: match self.exchange {
                Some(name) => name.parse()?,
                None => defaults.exchange,
            },
            timeframe: self.timeframe.unwrap_or(defaults.timeframe),
            limit: self.limit.unwrap_or(defaults.limit),
            window: self.window.unwrap_or(defaults.window),
            filters: match self.filters {
                Some(names) => names.into_iter().collect(),
                None => defaults.filters,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl<'de> Deserialize<'de> for ScanConfig {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        ScanConfigRaw::deserialize(d)?
            .into_config()
            .map_err(serde::de::Error::custom)
    }
}

impl ScanConfig {
    /// Parse and validate a TOML document.
    ///
    /// Syntax errors and unknown keys are [`SignalError::Config`]; an unknown
    /// exchange is [`SignalError::UnsupportedExchange`].
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: ScanConfigRaw =
            toml::from_str(content).map_err(|e| SignalError::Config(e.to_string()))?;
        raw.into_config()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SignalError::Config(e.to_string()))
    }

    pub fn exchange(mut self, exchange: Exchange) -> Self {
        self.exchange = exchange;
        self
    }

    pub fn timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.timeframe = timeframe.into();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Add one filter name to the set
    pub fn filter(mut self, name: impl Into<String>) -> Self {
        self.filters.insert(name.into());
        self
    }

    /// Replace the filter set
    pub fn filters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeframe.trim().is_empty() {
            return Err(SignalError::InvalidConfig("timeframe is empty".to_string()));
        }
        if self.limit == 0 {
            return Err(SignalError::InvalidConfig("limit must be > 0".to_string()));
        }
        if self.window == 0 {
            return Err(SignalError::InvalidWindow);
        }
        if self.filters.is_empty() {
            return Err(SignalError::InvalidConfig("no filters selected".to_string()));
        }
        Ok(())
    }
}
