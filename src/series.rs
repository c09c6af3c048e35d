//! Candle series model
//!
//! A [`CandleSeries`] is ordered strictly by timestamp with one candle per
//! timestamp. Exchange batches arrive as 9-field rows
//! `[ts, open, high, low, close, volume, volCcy, volCcyQuote, confirm]` where
//! numbers are usually sent as strings; [`Candle::from_row`] accepts both.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{OHLCVExt, Result, SignalError, OHLCV};

/// Number of fields in a raw exchange candle row
pub const ROW_FIELDS: usize = 9;

/// One OHLCV record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Exchange-native epoch, identity key within a series
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub quote_volume_alt: f64,
    /// `false` while the candle is still forming
    pub confirmed: bool,
}

impl Candle {
    /// Closed candle with quote volumes left at zero
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            quote_volume: 0.0,
            quote_volume_alt: 0.0,
            confirmed: true,
        }
    }

    /// Parse one raw exchange row.
    pub fn from_row(row: &[Value]) -> Result<Self> {
        parse_row(0, row)
    }
}

impl OHLCV for Candle {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn confirmed(&self) -> bool {
        self.confirmed
    }
}

// ta-rs data item traits, so candles feed the indicator library directly

impl ta::Open for Candle {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for Candle {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Candle {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Candle {
    fn close(&self) -> f64 {
        self.close
    }
}

impl ta::Volume for Candle {
    fn volume(&self) -> f64 {
        self.volume
    }
}

fn malformed(index: usize, reason: &'static str) -> SignalError {
    SignalError::MalformedInput { index, reason }
}

fn parse_timestamp(index: usize, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| malformed(index, "timestamp is not an integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(index, "timestamp is not an integer")),
        Value::Null => Err(malformed(index, "missing timestamp")),
        _ => Err(malformed(index, "timestamp is not an integer")),
    }
}

fn parse_number(index: usize, value: &Value, reason: &'static str) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(malformed(index, reason)),
    }
}

fn parse_confirmed(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}

fn parse_row(index: usize, row: &[Value]) -> Result<Candle> {
    if row.len() != ROW_FIELDS {
        return Err(malformed(index, "expected 9 fields"));
    }

    let candle = Candle {
        timestamp: parse_timestamp(index, &row[0])?,
        open: parse_number(index, &row[1], "open is not numeric")?,
        high: parse_number(index, &row[2], "high is not numeric")?,
        low: parse_number(index, &row[3], "low is not numeric")?,
        close: parse_number(index, &row[4], "close is not numeric")?,
        volume: parse_number(index, &row[5], "volume is not numeric")?,
        quote_volume: parse_number(index, &row[6], "quote volume is not numeric")?,
        quote_volume_alt: parse_number(index, &row[7], "quote volume is not numeric")?,
        confirmed: parse_confirmed(&row[8]),
    };

    candle.validate().map_err(|e| match e {
        SignalError::MalformedInput { reason, .. } => malformed(index, reason),
        other => other,
    })?;
    Ok(candle)
}

/// Later entries win on equal timestamps; output is ascending.
fn dedup_keep_last(candles: impl IntoIterator<Item = Candle>) -> Vec<Candle> {
    let mut by_ts = BTreeMap::new();
    for candle in candles {
        by_ts.insert(candle.timestamp, candle);
    }
    by_ts.into_values().collect()
}

// ============================================================
// CANDLE SERIES
// ============================================================

/// Candles ordered strictly by ascending timestamp. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build from candles that are already in canonical order.
    pub fn new(candles: Vec<Candle>) -> Result<Self> {
        for (i, candle) in candles.iter().enumerate() {
            candle.validate().map_err(|e| match e {
                SignalError::MalformedInput { reason, .. } => malformed(i, reason),
                other => other,
            })?;
        }
        if let Some(i) = candles
            .windows(2)
            .position(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(malformed(i + 1, "timestamps not strictly increasing"));
        }
        Ok(Self { candles })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert any OHLCV bars, sorting and dropping earlier duplicates.
    pub fn from_bars<T: OHLCV>(bars: &[T]) -> Result<Self> {
        let mut candles = Vec::with_capacity(bars.len());
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                SignalError::MalformedInput { reason, .. } => malformed(i, reason),
                other => other,
            })?;
            candles.push(Candle {
                timestamp: bar.timestamp(),
                open: bar.open(),
                high: bar.high(),
                low: bar.low(),
                close: bar.close(),
                volume: bar.volume(),
                quote_volume: 0.0,
                quote_volume_alt: 0.0,
                confirmed: bar.confirmed(),
            });
        }
        Ok(Self {
            candles: dedup_keep_last(candles),
        })
    }

    /// Parse a batch of raw rows in any order.
    ///
    /// Exchanges usually return newest first; the result is ascending and
    /// a repeated timestamp keeps the row listed last.
    pub fn from_rows<R: AsRef<[Value]>>(rows: &[R]) -> Result<Self> {
        let candles = rows
            .iter()
            .enumerate()
            .map(|(i, row)| parse_row(i, row.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            candles: dedup_keep_last(candles),
        })
    }

    /// Parse a JSON array of raw rows.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<Vec<Value>> =
            serde_json::from_str(json).map_err(|_| malformed(0, "not a JSON array of rows"))?;
        Self::from_rows(&rows)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Candle `i` positions from the end; `from_end(1)` is the most recent.
    pub fn from_end(&self, i: usize) -> Option<&Candle> {
        if i == 0 {
            return None;
        }
        self.len()
            .checked_sub(i)
            .and_then(|idx| self.candles.get(idx))
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

// ============================================================
// MERGE
// ============================================================

/// Merge a fetched history batch with the latest batch.
///
/// On a shared timestamp the `latest` candle replaces the `history` one,
/// whatever its confirm flag says. Gaps are preserved; nothing is interpolated.
pub fn merge(history: &CandleSeries, latest: &CandleSeries) -> CandleSeries {
    let candles = dedup_keep_last(history.iter().chain(latest.iter()).copied());
    let dropped = history.len() + latest.len() - candles.len();

    tracing::debug!(
        history = history.len(),
        latest = latest.len(),
        merged = candles.len(),
        dropped,
        "candle batches merged"
    );

    CandleSeries { candles }
}

/// Parse both raw batches and [`merge`] them.
pub fn merge_rows<H, L>(history: &[H], latest: &[L]) -> Result<CandleSeries>
where
    H: AsRef<[Value]>,
    L: AsRef<[Value]>,
{
    let history = CandleSeries::from_rows(history)?;
    let latest = CandleSeries::from_rows(latest)?;
    Ok(merge(&history, &latest))
}

// ============================================================
// TESTS
// ============================================================
