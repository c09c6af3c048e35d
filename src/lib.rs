//! # bullscan - bullish signal scanner
//!
//! Shortlists instruments whose recent candles show a bullish technical setup.
//!
//! The crate merges overlapping candle batches into one canonical series, runs
//! indicator columns (MACD, Bollinger Bands, Stochastic) over it and checks a
//! trailing window of the last `n` candles for crossover and band patterns.
//! Signals are combined into named filters that answer pass/fail per instrument.
//!
//! ## Quick Start
//!
//! ```rust
//! use bullscan::prelude::*;
//!
//! // Exchange rows: ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm
//! let history = CandleSeries::from_json(
//!     r#"[["1700000000000","10","11","9","10.5","100","1000","1000","1"]]"#,
//! )?;
//! let latest = CandleSeries::from_json(
//!     r#"[["1700003600000","10.5","12","10","11.5","80","900","900","0"]]"#,
//! )?;
//! let series = merge(&history, &latest);
//! assert_eq!(series.len(), 2);
//!
//! let registry = FilterRegistry::with_builtins();
//! let filter = registry.resolve("sample", &ScanConfig::default())?;
//!
//! // Two candles cannot cover the MACD warm-up.
//! assert!(filter.filter(&series).is_err());
//! # Ok::<(), bullscan::SignalError>(())
//! ```

pub mod config;
pub mod filters;
pub mod indicators;
pub mod params;
pub mod series;
pub mod signals;

pub mod prelude {
    pub use crate::{
        // Configuration
        config::{Exchange, ScanConfig},
        // Filters
        filters::{AllOf, Filter, FilterFactory, FilterRegistry},
        // Indicators
        indicators::{
            BollingerParams, BollingerSeries, IndicatorProvider, MacdParams, MacdSeries,
            StochParams, StochSeries, TaIndicatorProvider,
        },
        // Parameters
        params::{get_multiplier, get_period, ParamMeta, ParamType, ParameterizedSignal},
        // Parallel
        passed_symbols,
        scan_parallel,
        // Series
        series::{merge, merge_rows, Candle, CandleSeries},
        // Signals
        signals::*,
        BuiltinSignal,
        Multiplier,
        OHLCVExt,
        Period,
        Result,
        ScanError,
        ScanResult,
        SignalDetector,
        SignalError,
        SignalId,
        SignalMetadata,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors raised while parsing candles, computing indicators or evaluating signals
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("Malformed candle at index {index}: {reason}")]
    MalformedInput { index: usize, reason: &'static str },

    #[error("Insufficient history: need {need} candles, got {got}")]
    InsufficientHistory { need: usize, got: usize },

    #[error("Window size must be at least 1")]
    InvalidWindow,

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unsupported exchange: {0}")]
    UnsupportedExchange(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Indicator error: {0}")]
    Indicator(String),

    #[error("Config parse error: {0}")]
    Config(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Indicator period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(SignalError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

/// Standard-deviation multiplier for band width (finite, > 0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Multiplier(f64);

impl Multiplier {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(SignalError::InvalidValue(
                "Multiplier cannot be NaN or infinite",
            ));
        }
        if value <= 0.0 {
            return Err(SignalError::InvalidValue("Multiplier must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Multiplier {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Multiplier {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Multiplier::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait. Anything implementing it can be turned into a
/// [`CandleSeries`](series::CandleSeries).
pub trait OHLCV {
    fn timestamp(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    /// Whether the candle is closed. Feeds without the flag report every bar as closed.
    fn confirmed(&self) -> bool {
        true
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    /// Validate price consistency: finite values and `low <= open, close <= high`
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(SignalError::MalformedInput {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) || !self.volume().is_finite() {
            return Err(SignalError::MalformedInput {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(SignalError::MalformedInput {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open() < self.low()
            || self.open() > self.high()
            || self.close() < self.low()
            || self.close() > self.high()
        {
            return Err(SignalError::MalformedInput {
                index: 0,
                reason: "open/close outside [low, high]",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// SIGNAL DETECTOR TRAITS
// ============================================================

use indicators::IndicatorProvider;
use series::CandleSeries;

/// Unique identifier for a signal type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalId(pub &'static str);

impl SignalId {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Reporting metadata for a signal
#[derive(Debug, Clone)]
pub struct SignalMetadata {
    pub name: &'static str,
    pub description: &'static str,
    /// Nominal number of leading candles without indicator values
    pub warmup: usize,
}

/// A bullish condition evaluated over the last `n` candles of a series.
///
/// Detectors are pure: they read the series and the indicator columns the
/// provider computes for it, and never keep state between calls.
pub trait SignalDetector: Send + Sync {
    fn id(&self) -> SignalId;

    /// Nominal warm-up of the indicators this detector reads
    fn warmup(&self) -> usize;

    /// Minimum series length for window `n` with nominal warm-up
    fn min_history(&self, n: usize) -> usize {
        self.warmup() + n
    }

    fn detect<P: IndicatorProvider + ?Sized>(
        &self,
        series: &CandleSeries,
        n: usize,
        provider: &P,
    ) -> Result<bool>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            name: self.id().0,
            description: "",
            warmup: self.warmup(),
        }
    }
}

// ============================================================
// BUILTIN SIGNALS - generated via macro
// ============================================================

use signals::*;

/// Macro to generate BuiltinSignal enum without boilerplate
macro_rules! define_builtin_signals {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin signals - enum dispatch so filters can hold a mixed list
        #[derive(Debug, Clone)]
        pub enum BuiltinSignal {
            $($variant($detector)),*
        }

        impl BuiltinSignal {
            pub fn detect<P: IndicatorProvider + ?Sized>(
                &self,
                series: &CandleSeries,
                n: usize,
                provider: &P,
            ) -> Result<bool> {
                let passed = match self {
                    $(Self::$variant(d) => SignalDetector::detect(d, series, n, provider)),*
                }?;
                tracing::debug!(signal = %self.id(), n, passed, "signal evaluated");
                Ok(passed)
            }

            #[inline]
            pub fn id(&self) -> SignalId {
                match self {
                    $(Self::$variant(d) => SignalDetector::id(d)),*
                }
            }

            #[inline]
            pub fn min_history(&self, n: usize) -> usize {
                match self {
                    $(Self::$variant(d) => SignalDetector::min_history(d, n)),*
                }
            }

            pub fn metadata(&self) -> SignalMetadata {
                match self {
                    $(Self::$variant(d) => SignalDetector::metadata(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => SignalDetector::validate_config(d)),*
                }
            }
        }

        $(
            impl From<$detector> for BuiltinSignal {
                fn from(detector: $detector) -> Self {
                    Self::$variant(detector)
                }
            }
        )*
    };
}

define_builtin_signals! {
    MacdGoldenCross(MacdGoldenCross),
    ZeroAxisGoldenCross(ZeroAxisGoldenCross),
    BollingerBullish(BollingerBullish),
    MiddleBandInside(MiddleBandInside),
    KdjGoldenCross(KdjGoldenCross),
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use filters::Filter;
use rayon::prelude::*;

/// Verdict of one filter for one instrument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub symbol: String,
    pub passed: bool,
}

/// Error from evaluating a single instrument
#[derive(Debug, Clone)]
pub struct ScanError {
    pub symbol: String,
    pub error: SignalError,
}

/// Evaluate `filter` for many instruments in parallel.
///
/// A failing instrument lands in the error list and never stops the batch.
pub fn scan_parallel<'a, F, I>(filter: &F, instruments: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    F: Filter + ?Sized,
    I: IntoParallelIterator<Item = (&'a str, &'a CandleSeries)>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, series)| {
            filter
                .filter(series)
                .map(|passed| ScanResult {
                    symbol: symbol.to_string(),
                    passed,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => {
                tracing::warn!(
                    filter = filter.name(),
                    symbol = %e.symbol,
                    error = %e.error,
                    "instrument skipped"
                );
                errors.push(e)
            }
        }
    }

    tracing::info!(
        filter = filter.name(),
        passed = successes.iter().filter(|r| r.passed).count(),
        rejected = successes.iter().filter(|r| !r.passed).count(),
        errored = errors.len(),
        "scan finished"
    );

    (successes, errors)
}

/// Symbols whose filter verdict was a pass
pub fn passed_symbols(results: &[ScanResult]) -> Vec<&str> {
    results
        .iter()
        .filter(|r| r.passed)
        .map(|r| r.symbol.as_str())
        .collect()
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Candle;

    fn flat_series(len: usize) -> CandleSeries {
        let candles = (0..len)
            .map(|i| Candle::new(i as i64 * 60_000, 100.0, 101.0, 99.0, 100.0, 10.0))
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(100).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_multiplier_validation() {
        assert!(Multiplier::new(2.0).is_ok());
        assert!(Multiplier::new(0.0).is_err());
        assert!(Multiplier::new(-1.0).is_err());
        assert!(Multiplier::new(f64::NAN).is_err());
        assert!(Multiplier::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_period_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Period>("0").is_err());
        assert_eq!(serde_json::from_str::<Period>("9").unwrap().get(), 9);
    }

    #[test]
    fn test_ohlcv_validate() {
        let ok = Candle::new(0, 10.0, 12.0, 9.0, 11.0, 1.0);
        assert!(ok.validate().is_ok());

        let inverted = Candle::new(0, 10.0, 9.0, 12.0, 11.0, 1.0);
        assert!(matches!(
            inverted.validate(),
            Err(SignalError::MalformedInput { reason: "high < low", .. })
        ));

        let close_above = Candle::new(0, 10.0, 12.0, 9.0, 12.5, 1.0);
        assert!(close_above.validate().is_err());

        let nan = Candle::new(0, f64::NAN, 12.0, 9.0, 11.0, 1.0);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_builtin_signal_from_and_id() {
        let signal: BuiltinSignal = MacdGoldenCross::default().into();
        assert_eq!(signal.id(), SignalId("MACD_GOLDEN_CROSS"));
        assert_eq!(signal.min_history(5), 35 + 5);
        assert!(signal.validate_config().is_ok());
        assert_eq!(signal.metadata().warmup, 35);
    }

    #[test]
    fn test_parallel_scan_collects_errors() {
        let filter = filters::AllOf::sample();
        let short = flat_series(10);
        let long = flat_series(80);

        let instruments: Vec<(&str, &CandleSeries)> =
            vec![("BTC-USDT", &long), ("ETH-USDT", &short)];

        let (results, errors) = scan_parallel(&filter, instruments);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "BTC-USDT");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].symbol, "ETH-USDT");
        assert!(matches!(
            errors[0].error,
            SignalError::InsufficientHistory { .. }
        ));
    }

    #[test]
    fn test_passed_symbols() {
        let results = vec![
            ScanResult {
                symbol: "A".into(),
                passed: true,
            },
            ScanResult {
                symbol: "B".into(),
                passed: false,
            },
        ];
        assert_eq!(passed_symbols(&results), vec!["A"]);
    }
}
