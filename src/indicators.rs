//! Indicator adapter
//!
//! Signals never compute indicator math themselves; they ask an
//! [`IndicatorProvider`] for columns aligned index-for-index with the series.
//! Leading warm-up positions hold `NaN` and are never read by a detector.
//!
//! [`TaIndicatorProvider`] is backed by the `ta` crate. Tests and callers with
//! their own indicator source can plug in any other provider.

use serde::{Deserialize, Serialize};
use ta::indicators::{
    BollingerBands, FastStochastic, MovingAverageConvergenceDivergence, SimpleMovingAverage,
};
use ta::Next;

use crate::{series::CandleSeries, Multiplier, Period, Result, SignalError};

/// Exchanges display the MACD histogram doubled
pub const HISTOGRAM_SCALE: f64 = 2.0;

// ============================================================
// PARAMETERS
// ============================================================

/// MACD periods (fast EMA, slow EMA, signal EMA)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: Period,
    pub slow: Period,
    pub signal: Period,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: Period::new_const(12),
            slow: Period::new_const(26),
            signal: Period::new_const(9),
        }
    }
}

impl MacdParams {
    pub fn warmup(&self) -> usize {
        self.slow.get() + self.signal.get()
    }

    pub fn validate(&self) -> Result<()> {
        if self.fast >= self.slow {
            return Err(SignalError::InvalidConfig(format!(
                "MACD fast period {} must be below slow period {}",
                self.fast.get(),
                self.slow.get()
            )));
        }
        Ok(())
    }
}

/// Bollinger Bands: simple moving average +/- `multiplier` population std devs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub period: Period,
    pub multiplier: Multiplier,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: Period::new_const(21),
            multiplier: Multiplier::new_const(2.0),
        }
    }
}

impl BollingerParams {
    pub fn warmup(&self) -> usize {
        self.period.get()
    }
}

/// Slow stochastic (KDJ K and D lines), both smoothings are simple averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochParams {
    pub fastk: Period,
    pub slowk: Period,
    pub slowd: Period,
}

impl Default for StochParams {
    fn default() -> Self {
        Self {
            fastk: Period::new_const(9),
            slowk: Period::new_const(3),
            slowd: Period::new_const(3),
        }
    }
}

impl StochParams {
    pub fn warmup(&self) -> usize {
        (self.fastk.get() - 1) + (self.slowk.get() - 1) + (self.slowd.get() - 1)
    }
}

// ============================================================
// OUTPUT COLUMNS
// ============================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    /// MACD line (fast EMA - slow EMA)
    pub dif: Vec<f64>,
    /// Signal line
    pub dea: Vec<f64>,
    /// `HISTOGRAM_SCALE * (dif - dea)`
    pub histogram: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StochSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

// ============================================================
// PROVIDER
// ============================================================

/// Source of indicator columns for a candle series.
///
/// Every returned column has the same length as the series. Positions before
/// the indicator has enough lookback are `NaN`.
pub trait IndicatorProvider: Send + Sync {
    fn macd(&self, series: &CandleSeries, params: &MacdParams) -> Result<MacdSeries>;

    fn bollinger(&self, series: &CandleSeries, params: &BollingerParams)
        -> Result<BollingerSeries>;

    fn stochastic(&self, series: &CandleSeries, params: &StochParams) -> Result<StochSeries>;
}

/// Default provider computing columns with the `ta` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct TaIndicatorProvider;

fn mask_warmup(column: &mut [f64], warmup: usize) {
    for v in column.iter_mut().take(warmup) {
        *v = f64::NAN;
    }
}

fn indicator_error<E: std::fmt::Debug>(what: &'static str) -> impl FnOnce(E) -> SignalError {
    move |e| SignalError::Indicator(format!("{what}: {e:?}"))
}

impl IndicatorProvider for TaIndicatorProvider {
    fn macd(&self, series: &CandleSeries, params: &MacdParams) -> Result<MacdSeries> {
        params.validate()?;
        let mut macd = MovingAverageConvergenceDivergence::new(
            params.fast.get(),
            params.slow.get(),
            params.signal.get(),
        )
        .map_err(indicator_error("MACD"))?;

        let len = series.len();
        let mut out = MacdSeries {
            dif: Vec::with_capacity(len),
            dea: Vec::with_capacity(len),
            histogram: Vec::with_capacity(len),
        };
        for candle in series {
            let value = macd.next(candle.close);
            out.dif.push(value.macd);
            out.dea.push(value.signal);
            out.histogram.push(HISTOGRAM_SCALE * value.histogram);
        }

        let warmup = params.warmup();
        mask_warmup(&mut out.dif, warmup);
        mask_warmup(&mut out.dea, warmup);
        mask_warmup(&mut out.histogram, warmup);
        Ok(out)
    }

    fn bollinger(
        &self,
        series: &CandleSeries,
        params: &BollingerParams,
    ) -> Result<BollingerSeries> {
        let mut bands = BollingerBands::new(params.period.get(), params.multiplier.get())
            .map_err(indicator_error("Bollinger Bands"))?;

        let len = series.len();
        let mut out = BollingerSeries {
            upper: Vec::with_capacity(len),
            middle: Vec::with_capacity(len),
            lower: Vec::with_capacity(len),
        };
        for candle in series {
            let value = bands.next(candle.close);
            out.upper.push(value.upper);
            out.middle.push(value.average);
            out.lower.push(value.lower);
        }

        let warmup = params.warmup();
        mask_warmup(&mut out.upper, warmup);
        mask_warmup(&mut out.middle, warmup);
        mask_warmup(&mut out.lower, warmup);
        Ok(out)
    }

    fn stochastic(&self, series: &CandleSeries, params: &StochParams) -> Result<StochSeries> {
        let mut fast_k =
            FastStochastic::new(params.fastk.get()).map_err(indicator_error("Stochastic"))?;
        let mut slow_k =
            SimpleMovingAverage::new(params.slowk.get()).map_err(indicator_error("Stochastic"))?;
        let mut slow_d =
            SimpleMovingAverage::new(params.slowd.get()).map_err(indicator_error("Stochastic"))?;

        let len = series.len();
        let mut out = StochSeries {
            k: Vec::with_capacity(len),
            d: Vec::with_capacity(len),
        };
        for candle in series {
            let k = slow_k.next(fast_k.next(candle));
            out.k.push(k);
            out.d.push(slow_d.next(k));
        }

        let warmup = params.warmup();
        mask_warmup(&mut out.k, warmup);
        mask_warmup(&mut out.d, warmup);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Candle;

    fn trending(len: usize) -> CandleSeries {
        let candles = (0..len)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(i as i64, c, c + 1.0, c - 1.0, c, 10.0)
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn test_default_warmups() {
        assert_eq!(MacdParams::default().warmup(), 35);
        assert_eq!(BollingerParams::default().warmup(), 21);
        assert_eq!(StochParams::default().warmup(), 12);
    }

    #[test]
    fn test_macd_columns_aligned_and_masked() {
        let series = trending(50);
        let macd = TaIndicatorProvider
            .macd(&series, &MacdParams::default())
            .unwrap();

        assert_eq!(macd.dif.len(), 50);
        assert_eq!(macd.dea.len(), 50);
        assert_eq!(macd.histogram.len(), 50);
        assert!(macd.dif[..35].iter().all(|v| v.is_nan()));
        assert!(macd.dif[35..].iter().all(|v| v.is_finite()));

        for i in 35..50 {
            let expected = HISTOGRAM_SCALE * (macd.dif[i] - macd.dea[i]);
            assert!((macd.histogram[i] - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_macd_rejects_fast_not_below_slow() {
        let params = MacdParams {
            fast: Period::new_const(26),
            slow: Period::new_const(12),
            signal: Period::new_const(9),
        };
        assert!(matches!(
            TaIndicatorProvider.macd(&trending(50), &params),
            Err(SignalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bollinger_flat_series() {
        let candles = (0..30)
            .map(|i| Candle::new(i, 100.0, 101.0, 99.0, 100.0, 1.0))
            .collect();
        let series = CandleSeries::new(candles).unwrap();
        let bands = TaIndicatorProvider
            .bollinger(&series, &BollingerParams::default())
            .unwrap();

        assert!(bands.middle[..21].iter().all(|v| v.is_nan()));
        for i in 21..30 {
            assert!((bands.middle[i] - 100.0).abs() < 1e-9);
            assert!((bands.upper[i] - 100.0).abs() < 1e-9);
            assert!((bands.lower[i] - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bollinger_band_ordering() {
        let series = trending(40);
        let bands = TaIndicatorProvider
            .bollinger(&series, &BollingerParams::default())
            .unwrap();
        for i in 21..40 {
            assert!(bands.lower[i] < bands.middle[i]);
            assert!(bands.middle[i] < bands.upper[i]);
        }
    }

    #[test]
    fn test_stochastic_uptrend_is_high() {
        let series = trending(40);
        let stoch = TaIndicatorProvider
            .stochastic(&series, &StochParams::default())
            .unwrap();

        assert_eq!(stoch.k.len(), 40);
        assert!(stoch.k[..12].iter().all(|v| v.is_nan()));
        assert!(stoch.d[..12].iter().all(|v| v.is_nan()));
        // Close sits 1 below the window high in a steady climb
        for i in 12..40 {
            assert!(stoch.k[i] > 80.0 && stoch.k[i] <= 100.0);
            assert!(stoch.d[i] > 80.0 && stoch.d[i] <= 100.0);
        }
    }

    #[test]
    fn test_empty_series() {
        let series = CandleSeries::empty();
        let macd = TaIndicatorProvider
            .macd(&series, &MacdParams::default())
            .unwrap();
        assert!(macd.dif.is_empty());
    }
}
