//! Named filters
//!
//! A filter answers one question per instrument: does its candle series pass?
//! [`AllOf`] combines signals with a shared window and stops at the first
//! signal that fails. Filters are looked up by name in a [`FilterRegistry`],
//! which builds them from the caller's [`ScanConfig`].
//!
//! ```rust
//! use bullscan::prelude::*;
//!
//! let mut registry = FilterRegistry::with_builtins();
//! registry.register("boll", |config: &ScanConfig| {
//!     Box::new(
//!         AllOf::new("Boll", config.window)
//!             .describe("Close between the middle and upper band")
//!             .with(BollingerBullish::default()),
//!     )
//! });
//!
//! let filter = registry.resolve("boll", &ScanConfig::default())?;
//! assert_eq!(filter.name(), "Boll");
//! # Ok::<(), SignalError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::{
    config::ScanConfig,
    indicators::{IndicatorProvider, TaIndicatorProvider},
    series::CandleSeries,
    signals::{KdjGoldenCross, MacdGoldenCross, MiddleBandInside, ZeroAxisGoldenCross},
    BuiltinSignal, Result, SignalError,
};

/// Pass/fail predicate over a candle series
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn filter(&self, series: &CandleSeries) -> Result<bool>;

    /// Nominal number of candles needed before `filter` can answer
    fn min_history(&self) -> usize {
        0
    }
}

impl<T: Filter + ?Sized> Filter for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn description(&self) -> &str {
        (**self).description()
    }

    fn filter(&self, series: &CandleSeries) -> Result<bool> {
        (**self).filter(series)
    }

    fn min_history(&self) -> usize {
        (**self).min_history()
    }
}

// ============================================================
// CONJUNCTION
// ============================================================

/// Passes when every signal fires within the same window of `n` candles.
///
/// Signals are evaluated in insertion order and evaluation stops at the first
/// one that does not fire, so later signals never report their own errors
/// for a series an earlier one already rejected.
#[derive(Debug, Clone)]
pub struct AllOf<P: IndicatorProvider = TaIndicatorProvider> {
    name: String,
    description: String,
    window: usize,
    signals: Vec<BuiltinSignal>,
    provider: P,
}

impl AllOf<TaIndicatorProvider> {
    pub fn new(name: impl Into<String>, window: usize) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            window,
            signals: Vec::new(),
            provider: TaIndicatorProvider,
        }
    }

    /// MACD golden cross, middle band inside a candle and KDJ golden cross
    /// within the last `n` candles
    pub fn strategy1(n: usize) -> Self {
        Self::new("Strategy1", n)
            .describe(
                "MACD golden cross, Bollinger middle band inside a candle \
                 and KDJ golden cross within the window",
            )
            .with(MacdGoldenCross::default())
            .with(MiddleBandInside::default())
            .with(KdjGoldenCross::default())
    }

    /// [`strategy1`](Self::strategy1) over the last 5 candles
    pub fn sample() -> Self {
        let mut filter = Self::strategy1(5);
        filter.name = "Sample Filter".to_string();
        filter
    }

    /// Zero-axis MACD golden cross on the newest candle
    pub fn zero_axis() -> Self {
        Self::new("Zero Axis", 1)
            .describe("MACD histogram turns positive on the newest candle")
            .with(ZeroAxisGoldenCross::default())
    }
}

impl<P: IndicatorProvider> AllOf<P> {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a signal to the conjunction
    pub fn with(mut self, signal: impl Into<BuiltinSignal>) -> Self {
        self.signals.push(signal.into());
        self
    }

    /// Swap the indicator source
    pub fn provider<P2: IndicatorProvider>(self, provider: P2) -> AllOf<P2> {
        AllOf {
            name: self.name,
            description: self.description,
            window: self.window,
            signals: self.signals,
            provider,
        }
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    #[inline]
    pub fn signals(&self) -> &[BuiltinSignal] {
        &self.signals
    }

    /// Check window, signal list and every signal's parameters
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(SignalError::InvalidWindow);
        }
        if self.signals.is_empty() {
            return Err(SignalError::InvalidConfig(format!(
                "filter '{}' has no signals",
                self.name
            )));
        }
        self.signals.iter().try_for_each(|s| s.validate_config())
    }
}

impl<P: IndicatorProvider> Filter for AllOf<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn filter(&self, series: &CandleSeries) -> Result<bool> {
        self.validate()?;
        for signal in &self.signals {
            if !signal.detect(series, self.window, &self.provider)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn min_history(&self) -> usize {
        self.signals
            .iter()
            .map(|s| s.min_history(self.window))
            .max()
            .unwrap_or(0)
    }
}

// ============================================================
// REGISTRY
// ============================================================

/// Builds a filter from the scan configuration
pub type FilterFactory = Box<dyn Fn(&ScanConfig) -> Box<dyn Filter> + Send + Sync>;

/// Name-keyed filter constructors
#[derive(Default)]
pub struct FilterRegistry {
    factories: BTreeMap<String, FilterFactory>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `sample`, `strategy1` and `zero_axis`.
    ///
    /// `strategy1` takes its window from [`ScanConfig::window`]; the other two
    /// have fixed windows.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("sample", |_: &ScanConfig| Box::new(AllOf::sample()))
            .register("strategy1", |config: &ScanConfig| {
                Box::new(AllOf::strategy1(config.window))
            })
            .register("zero_axis", |_: &ScanConfig| Box::new(AllOf::zero_axis()));
        registry
    }

    /// Add or replace the constructor for `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ScanConfig) -> Box<dyn Filter> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the filter registered under `name`
    pub fn resolve(&self, name: &str, config: &ScanConfig) -> Result<Box<dyn Filter>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SignalError::UnsupportedFilter(name.to_string()))?;
        Ok(factory(config))
    }

    /// Build every filter named in `config`, in name order
    pub fn resolve_all(&self, config: &ScanConfig) -> Result<Vec<Box<dyn Filter>>> {
        config.validate()?;
        config
            .filters
            .iter()
            .map(|name| -> Result<Box<dyn Filter>> {
                let filter = self.resolve(name, config)?;
                if config.limit < filter.min_history() {
                    tracing::warn!(
                        filter = name.as_str(),
                        limit = config.limit,
                        need = filter.min_history(),
                        "history limit below filter warm-up"
                    );
                }
                Ok(filter)
            })
            .collect()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("names", &self.names())
            .finish()
    }
}
