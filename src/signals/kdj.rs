//! KDJ (slow stochastic) golden cross

use std::collections::HashMap;

use super::helpers::{check_window, dip_then_cross, ensure_history};
use crate::{
    indicators::{IndicatorProvider, StochParams},
    params::{get_period, ParamMeta, ParameterizedSignal},
    series::CandleSeries,
    Result, SignalDetector, SignalId, SignalMetadata,
};

impl_with_defaults!(KdjGoldenCross);

const STOCH_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("fastk", 9.0, (5.0, 30.0, 1.0), "Raw %K lookback"),
    ParamMeta::period("slowk", 3.0, (1.0, 10.0, 1.0), "K smoothing period"),
    ParamMeta::period("slowd", 3.0, (1.0, 10.0, 1.0), "D smoothing period"),
];

/// K dipped below D within the last `n` candles and has since closed above it.
///
/// Same two-phase scan as [`MacdGoldenCross`](super::MacdGoldenCross), with K
/// in place of DIF and D in place of DEA.
#[derive(Debug, Clone, Default)]
pub struct KdjGoldenCross {
    pub params: StochParams,
}

impl SignalDetector for KdjGoldenCross {
    fn id(&self) -> SignalId {
        SignalId("KDJ_GOLDEN_CROSS")
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
        let stoch = provider.stochastic(series, &self.params)?;
        ensure_history(series.len(), &[&stoch.k, &stoch.d], n, self.warmup())?;

        Ok(dip_then_cross(&stoch.k, &stoch.d, n))
    }

    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            name: "KDJ golden cross",
            description: "K below D within the window, then above it afterwards",
            warmup: self.warmup(),
        }
    }
}

impl ParameterizedSignal for KdjGoldenCross {
    fn param_meta() -> &'static [ParamMeta] {
        STOCH_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            params: StochParams {
                fastk: get_period(params, STOCH_PARAMS, "fastk", 9)?,
                slowk: get_period(params, STOCH_PARAMS, "slowk", 3)?,
                slowd: get_period(params, STOCH_PARAMS, "slowd", 3)?,
            },
        })
    }

    fn signal_id_str() -> &'static str {
        "KDJ_GOLDEN_CROSS"
    }
}
