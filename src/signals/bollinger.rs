//! Bollinger Band signals

use std::collections::HashMap;

use super::helpers::{any_in_window, check_window, ensure_history};
use crate::{
    indicators::{BollingerParams, IndicatorProvider},
    params::{get_multiplier, get_period, ParamMeta, ParameterizedSignal},
    series::CandleSeries,
    Result, SignalDetector, SignalId, SignalMetadata,
};

impl_with_defaults!(BollingerBullish, MiddleBandInside);

const BOLLINGER_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("period", 21.0, (5.0, 60.0, 1.0), "Moving average period"),
    ParamMeta::multiplier("multiplier", 2.0, (1.0, 4.0, 0.5), "Band width in std devs"),
];

fn bollinger_params_from(params: &HashMap<&str, f64>) -> Result<BollingerParams> {
    Ok(BollingerParams {
        period: get_period(params, BOLLINGER_PARAMS, "period", 21)?,
        multiplier: get_multiplier(params, BOLLINGER_PARAMS, "multiplier", 2.0)?,
    })
}

// ============================================================
// BULLISH CLOSE
// ============================================================

/// Close strictly between the middle and upper band, with the candle's high
/// above the previous close.
#[derive(Debug, Clone, Default)]
pub struct BollingerBullish {
    pub params: BollingerParams,
}

impl SignalDetector for BollingerBullish {
    fn id(&self) -> SignalId {
        SignalId("BOLL_BULLISH")
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
        let bands = provider.bollinger(series, &self.params)?;
        ensure_history(
            series.len(),
            &[&bands.upper, &bands.middle],
            n,
            self.warmup(),
        )?;
        // previous close at offset n + 1
        ensure_history(series.len(), &[], n + 1, 0)?;

        let candles = series.candles();
        Ok(any_in_window(candles.len(), n, |i| {
            let close = candles[i].close;
            close > bands.middle[i]
                && close < bands.upper[i]
                && candles[i].high > candles[i - 1].close
        }))
    }

    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            name: "Bollinger bullish",
            description: "Close between middle and upper band, high above the previous close",
            warmup: self.warmup(),
        }
    }
}

impl ParameterizedSignal for BollingerBullish {
    fn param_meta() -> &'static [ParamMeta] {
        BOLLINGER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            params: bollinger_params_from(params)?,
        })
    }

    fn signal_id_str() -> &'static str {
        "BOLL_BULLISH"
    }
}

// ============================================================
// MIDDLE BAND INSIDE CANDLE
// ============================================================

/// Middle band within `[low, high]` of a candle, bounds inclusive
#[derive(Debug, Clone, Default)]
pub struct MiddleBandInside {
    pub params: BollingerParams,
}

impl SignalDetector for MiddleBandInside {
    fn id(&self) -> SignalId {
        SignalId("BOLL_MIDDLE_INSIDE")
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
        let bands = provider.bollinger(series, &self.params)?;
        ensure_history(series.len(), &[&bands.middle], n, self.warmup())?;

        let candles = series.candles();
        Ok(any_in_window(candles.len(), n, |i| {
            let middle = bands.middle[i];
            candles[i].low <= middle && middle <= candles[i].high
        }))
    }

    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            name: "Middle band inside candle",
            description: "Bollinger middle band between the candle's low and high",
            warmup: self.warmup(),
        }
    }
}

impl ParameterizedSignal for MiddleBandInside {
    fn param_meta() -> &'static [ParamMeta] {
        BOLLINGER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            params: bollinger_params_from(params)?,
        })
    }

    fn signal_id_str() -> &'static str {
        "BOLL_MIDDLE_INSIDE"
    }
}
