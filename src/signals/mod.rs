//! Bullish signal detectors
//!
//! Every detector answers one question about the last `n` candles of a series:
//!
//! - **MACD**: golden cross (dip below the signal line, then back above it)
//!   and zero-axis golden cross (histogram flips from negative to positive)
//! - **Bollinger**: bullish close between middle and upper band, middle band
//!   inside the candle range
//! - **KDJ**: K line golden cross over D
//!
//! Window offsets count from the end: offset 1 is the most recent candle.

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod bollinger;
pub mod kdj;
pub mod macd;

pub use bollinger::*;
pub use kdj::*;
pub use macd::*;

use crate::{indicators::TaIndicatorProvider, series::CandleSeries, Result, SignalDetector};

/// MACD golden cross over the last `n` candles with default periods
pub fn golden_cross_macd(series: &CandleSeries, n: usize) -> Result<bool> {
    MacdGoldenCross::default().detect(series, n, &TaIndicatorProvider)
}

/// Zero-axis golden cross over the last `n` candles with default periods
pub fn zero_axis_golden_cross(series: &CandleSeries, n: usize) -> Result<bool> {
    ZeroAxisGoldenCross::default().detect(series, n, &TaIndicatorProvider)
}

/// Bollinger bullish close over the last `n` candles with default bands
pub fn boll_bullish(series: &CandleSeries, n: usize) -> Result<bool> {
    BollingerBullish::default().detect(series, n, &TaIndicatorProvider)
}

/// Middle band inside one of the last `n` candles with default bands
pub fn middle_band_inside(series: &CandleSeries, n: usize) -> Result<bool> {
    MiddleBandInside::default().detect(series, n, &TaIndicatorProvider)
}

/// KDJ golden cross over the last `n` candles with default periods
pub fn kdj_golden_cross(series: &CandleSeries, n: usize) -> Result<bool> {
    KdjGoldenCross::default().detect(series, n, &TaIndicatorProvider)
}
