//! MACD signals: golden cross and zero-axis golden cross

use std::collections::HashMap;

use super::helpers::{check_window, dip_then_cross, ensure_history, step_cross};
use crate::{
    indicators::{IndicatorProvider, MacdParams},
    params::{get_period, ParamMeta, ParameterizedSignal},
    series::CandleSeries,
    Result, SignalDetector, SignalId, SignalMetadata,
};

impl_with_defaults!(MacdGoldenCross, ZeroAxisGoldenCross);

const MACD_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("fast", 12.0, (5.0, 20.0, 1.0), "Fast EMA period"),
    ParamMeta::period("slow", 26.0, (15.0, 60.0, 1.0), "Slow EMA period"),
    ParamMeta::period("signal", 9.0, (3.0, 20.0, 1.0), "Signal line EMA period"),
];

fn macd_params_from(params: &HashMap<&str, f64>) -> Result<MacdParams> {
    let macd = MacdParams {
        fast: get_period(params, MACD_PARAMS, "fast", 12)?,
        slow: get_period(params, MACD_PARAMS, "slow", 26)?,
        signal: get_period(params, MACD_PARAMS, "signal", 9)?,
    };
    macd.validate()?;
    Ok(macd)
}

// ============================================================
// GOLDEN CROSS
// ============================================================

/// DIF dipped below DEA within the last `n` candles and has since closed above it.
///
/// The window only bounds how far back the dip may be; the recovery may happen
/// anywhere between the dip and the newest candle.
#[derive(Debug, Clone, Default)]
pub struct MacdGoldenCross {
    pub params: MacdParams,
}

impl SignalDetector for MacdGoldenCross {
    fn id(&self) -> SignalId {
        SignalId("MACD_GOLDEN_CROSS")
    }

    fn warmup(&self) -> usize {
        self.params.warmup()
    }

    fn detect<P: IndicatorProvider + ?Sized>(
        &self,
        series: &CandleSeries,
        n: usize,
        provider: &P,
    ) -> Result<bool> {
        check_window(n)?;
        let macd = provider.macd(series, &self.params)?;
        ensure_history(series.len(), &[&macd.dif, &macd.dea], n, self.warmup())?;

        Ok(dip_then_cross(&macd.dif, &macd.dea, n))
    }

    fn validate_config(&self) -> Result<()> {
        self.params.validate()
    }

    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            name: "MACD golden cross",
            description: "DIF below DEA within the window, then above it afterwards",
            warmup: self.warmup(),
        }
    }
}

impl ParameterizedSignal for MacdGoldenCross {
    fn param_meta() -> &'static [ParamMeta] {
        MACD_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            params: macd_params_from(params)?,
        })
    }

    fn signal_id_str() -> &'static str {
        "MACD_GOLDEN_CROSS"
    }
}

// ============================================================
// ZERO-AXIS GOLDEN CROSS
// ============================================================

/// Histogram turns from negative to positive between two adjacent candles,
/// with DIF crossing above DEA on the same step, at any of the last `n` candles.
#[derive(Debug, Clone, Default)]
pub struct ZeroAxisGoldenCross {
    pub params: MacdParams,
}

impl SignalDetector for ZeroAxisGoldenCross {
    fn id(&self) -> SignalId {
        SignalId("MACD_ZERO_AXIS_CROSS")
    }

    fn warmup(&self) -> usize {
        self.params.warmup()
    }

    // Reads one candle before the window
    fn min_history(&self, n: usize) -> usize {
        self.warmup() + n + 1
    }

    fn detect<P: IndicatorProvider + ?Sized>(
        &self,
        series: &CandleSeries,
        n: usize,
        provider: &P,
    ) -> Result<bool> {
        check_window(n)?;
        let macd = provider.macd(series, &self.params)?;
        ensure_history(
            series.len(),
            &[&macd.dif, &macd.dea, &macd.histogram],
            n + 1,
            self.warmup(),
        )?;

        Ok(step_cross(&macd.dif, &macd.dea, &macd.histogram, n))
    }

    fn validate_config(&self) -> Result<()> {
        self.params.validate()
    }

    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            name: "MACD zero-axis golden cross",
            description: "Histogram flips from negative to positive as DIF crosses DEA",
            warmup: self.warmup(),
        }
    }
}

impl ParameterizedSignal for ZeroAxisGoldenCross {
    fn param_meta() -> &'static [ParamMeta] {
        MACD_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            params: macd_params_from(params)?,
        })
    }

    fn signal_id_str() -> &'static str {
        "MACD_ZERO_AXIS_CROSS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        indicators::{BollingerParams, BollingerSeries, MacdSeries, StochParams, StochSeries},
        series::Candle,
        SignalError,
    };

    /// Hands back fixed MACD columns regardless of the series
    struct FixedMacd(MacdSeries);

    impl IndicatorProvider for FixedMacd {
        fn macd(&self, _: &CandleSeries, _: &MacdParams) -> Result<MacdSeries> {
            Ok(self.0.clone())
        }

        fn bollinger(&self, _: &CandleSeries, _: &BollingerParams) -> Result<BollingerSeries> {
            unreachable!("MACD detectors never ask for bands")
        }

        fn stochastic(&self, _: &CandleSeries, _: &StochParams) -> Result<StochSeries> {
            unreachable!("MACD detectors never ask for stochastic")
        }
    }

    fn flat(len: usize) -> CandleSeries {
        let candles = (0..len)
            .map(|i| Candle::new(i as i64, 10.0, 11.0, 9.0, 10.0, 1.0))
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    fn columns(dif: Vec<f64>, dea: Vec<f64>) -> MacdSeries {
        let histogram = dif.iter().zip(&dea).map(|(a, b)| 2.0 * (a - b)).collect();
        MacdSeries {
            dif,
            dea,
            histogram,
        }
    }

    #[test]
    fn test_golden_cross_zero_window() {
        let provider = FixedMacd(columns(vec![0.0; 5], vec![0.0; 5]));
        assert_eq!(
            MacdGoldenCross::default().detect(&flat(5), 0, &provider),
            Err(SignalError::InvalidWindow)
        );
    }

    #[test]
    fn test_golden_cross_recovery_after_dip() {
        let dif = vec![1.0, 1.0, -1.0, 0.0, 0.5];
        let dea = vec![0.0, 0.0, 0.0, 0.0, 0.0];
        let provider = FixedMacd(columns(dif, dea));
        let detector = MacdGoldenCross::with_defaults();

        assert!(detector.detect(&flat(5), 3, &provider).unwrap());
        assert!(!detector.detect(&flat(5), 2, &provider).unwrap());
    }

    #[test]
    fn test_golden_cross_reads_into_warmup() {
        let nan = f64::NAN;
        let dif = vec![nan, nan, nan, -1.0, 1.0];
        let dea = vec![nan, nan, nan, 0.0, 0.0];
        let provider = FixedMacd(columns(dif, dea));

        assert!(MacdGoldenCross::default()
            .detect(&flat(5), 2, &provider)
            .unwrap());
        assert_eq!(
            MacdGoldenCross::default().detect(&flat(5), 3, &provider),
            Err(SignalError::InsufficientHistory { need: 6, got: 5 })
        );
    }

    #[test]
    fn test_zero_axis_needs_one_extra_candle() {
        let nan = f64::NAN;
        let dif = vec![nan, nan, -1.0, 1.0];
        let dea = vec![nan, nan, 0.0, 0.0];
        let provider = FixedMacd(columns(dif, dea));
        let detector = ZeroAxisGoldenCross::default();

        assert!(detector.detect(&flat(4), 1, &provider).unwrap());
        assert!(matches!(
            detector.detect(&flat(4), 2, &provider),
            Err(SignalError::InsufficientHistory { need: 5, got: 4 })
        ));
    }

    #[test]
    fn test_zero_axis_ignores_non_adjacent_flip() {
        // negative, flat zero, positive: never a single-step flip
        let dif = vec![-1.0, -1.0, 0.0, 1.0, 1.0];
        let dea = vec![0.0, 0.0, 0.0, 0.0, 0.0];
        let provider = FixedMacd(columns(dif, dea));
        assert!(!ZeroAxisGoldenCross::default()
            .detect(&flat(5), 3, &provider)
            .unwrap());
    }

    #[test]
    fn test_with_params_validates() {
        let mut params = HashMap::new();
        params.insert("fast", 20.0);
        params.insert("slow", 15.0);
        assert!(matches!(
            MacdGoldenCross::with_params(&params),
            Err(SignalError::InvalidConfig(_))
        ));

        params.insert("slow", 40.0);
        let detector = ZeroAxisGoldenCross::with_params(&params).unwrap();
        assert_eq!(detector.warmup(), 40 + 9);
        assert_eq!(detector.min_history(3), 40 + 9 + 4);
    }
}
