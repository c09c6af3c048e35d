//! Window scanning helpers shared by all signal detectors
//!
//! Columns are indicator (or price) vectors aligned with the candle series.
//! Offsets passed around here count from the end: offset 1 is the last element.

use crate::{Result, SignalError};

/// Reject an empty window
#[inline]
pub fn check_window(n: usize) -> Result<()> {
    if n == 0 {
        return Err(SignalError::InvalidWindow);
    }
    Ok(())
}

/// Index of the first defined (non-NaN) value; the column length if none
#[inline]
pub fn defined_from(column: &[f64]) -> usize {
    column
        .iter()
        .position(|v| !v.is_nan())
        .unwrap_or(column.len())
}

/// Check that reading the last `reach` positions of every column stays clear
/// of the undefined warm-up prefix.
///
/// When a column has no defined value at all the real warm-up is unknown, so
/// the detector's `nominal_warmup` is reported as the missing history.
pub fn ensure_history(
    series_len: usize,
    columns: &[&[f64]],
    reach: usize,
    nominal_warmup: usize,
) -> Result<()> {
    if columns.iter().any(|c| c.len() != series_len) {
        return Err(SignalError::Indicator(
            "indicator column not aligned with candle series".to_string(),
        ));
    }

    let undefined = columns.iter().map(|c| defined_from(c)).max().unwrap_or(0);
    let warmup = if undefined >= series_len {
        undefined.max(nominal_warmup)
    } else {
        undefined
    };

    let need = warmup + reach;
    if series_len < need {
        return Err(SignalError::InsufficientHistory {
            need,
            got: series_len,
        });
    }
    Ok(())
}

/// Two-phase crossover scan.
///
/// Walks backward over the last `n` positions looking for the most recent one
/// where `fast < slow`. From there it scans forward to the end of the column
/// for any position where `fast > slow`. Returns false when no dip is found.
pub fn dip_then_cross(fast: &[f64], slow: &[f64], n: usize) -> bool {
    let len = fast.len().min(slow.len());
    let start = len.saturating_sub(n);

    let Some(dip) = (start..len).rev().find(|&i| fast[i] < slow[i]) else {
        return false;
    };

    (dip..len).any(|j| fast[j] > slow[j])
}

/// Single-step zero-axis cross at any offset `1..=n`: the histogram flips from
/// negative to positive between offset `i + 1` and offset `i`, and `fast`
/// crosses above `slow` over the same pair of candles.
///
/// Offsets whose previous candle falls before the start of the columns are
/// skipped.
pub fn step_cross(fast: &[f64], slow: &[f64], histogram: &[f64], n: usize) -> bool {
    let len = fast.len().min(slow.len()).min(histogram.len());
    (1..=n).any(|i| {
        let Some(prev) = len.checked_sub(i + 1) else {
            return false;
        };
        let curr = prev + 1;
        histogram[curr] > 0.0
            && histogram[prev] < 0.0
            && fast[curr] > slow[curr]
            && fast[prev] < slow[prev]
    })
}

/// True if `pred(index)` holds at any offset in `1..=n`
#[inline]
pub fn any_in_window(len: usize, n: usize, mut pred: impl FnMut(usize) -> bool) -> bool {
    (1..=n.min(len)).any(|i| pred(len - i))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn test_check_window() {
        assert_eq!(check_window(0), Err(SignalError::InvalidWindow));
        assert!(check_window(1).is_ok());
    }

    #[test]
    fn test_defined_from() {
        assert_eq!(defined_from(&[NAN, NAN, 1.0, 2.0]), 2);
        assert_eq!(defined_from(&[1.0]), 0);
        assert_eq!(defined_from(&[NAN, NAN]), 2);
        assert_eq!(defined_from(&[]), 0);
    }

    #[test]
    fn test_ensure_history_boundary() {
        let col = [NAN, NAN, NAN, 1.0, 1.0, 1.0];
        assert!(ensure_history(6, &[&col], 3, 3).is_ok());
        assert_eq!(
            ensure_history(6, &[&col], 4, 3),
            Err(SignalError::InsufficientHistory { need: 7, got: 6 })
        );
    }

    #[test]
    fn test_ensure_history_all_undefined_uses_nominal() {
        let col = [NAN; 20];
        assert_eq!(
            ensure_history(20, &[&col], 1, 35),
            Err(SignalError::InsufficientHistory { need: 36, got: 20 })
        );
    }

    #[test]
    fn test_ensure_history_misaligned() {
        let col = [1.0; 5];
        assert!(matches!(
            ensure_history(6, &[&col], 1, 0),
            Err(SignalError::Indicator(_))
        ));
    }

    #[test]
    fn test_dip_then_cross_basic() {
        // dip at index 2, cross at index 4
        let fast = [1.0, 1.0, 0.0, 1.0, 2.0];
        let slow = [0.5, 0.5, 1.0, 1.0, 1.0];
        assert!(dip_then_cross(&fast, &slow, 3));
        // window [3, 4] has no dip
        assert!(!dip_then_cross(&fast, &slow, 2));
    }

    #[test]
    fn test_dip_then_cross_uses_most_recent_dip() {
        // older dip is followed by a cross, the newest dip is not
        let fast = [0.0, 2.0, 0.0];
        let slow = [1.0, 1.0, 1.0];
        assert!(!dip_then_cross(&fast, &slow, 3));
    }

    #[test]
    fn test_dip_then_cross_no_cross() {
        let fast = [0.0, 0.0, 0.0];
        let slow = [1.0, 1.0, 1.0];
        assert!(!dip_then_cross(&fast, &slow, 3));
    }

    #[test]
    fn test_dip_then_cross_window_larger_than_column() {
        let fast = [0.0, 2.0];
        let slow = [1.0, 1.0];
        assert!(dip_then_cross(&fast, &slow, 10));
    }

    #[test]
    fn test_step_cross_adjacent_only() {
        let fast = [-1.0, 1.0, 2.0];
        let slow = [0.0, 0.0, 0.0];
        let hist = [-2.0, 2.0, 4.0];
        // flip between index 0 and 1, i.e. offsets 3 -> 2
        assert!(!step_cross(&fast, &slow, &hist, 1));
        assert!(step_cross(&fast, &slow, &hist, 2));
    }

    #[test]
    fn test_step_cross_requires_both_conditions() {
        let fast = [-1.0, 1.0];
        let slow = [0.0, 0.0];
        // histogram does not change sign
        let hist = [1.0, 2.0];
        assert!(!step_cross(&fast, &slow, &hist, 1));
    }

    #[test]
    fn test_step_cross_short_columns() {
        assert!(!step_cross(&[1.0], &[0.0], &[2.0], 1));
        assert!(!step_cross(&[], &[], &[], 3));

        // the only flip sits at the oldest pair; larger windows still find it
        let fast = [-1.0, 1.0];
        let slow = [0.0, 0.0];
        let hist = [-2.0, 2.0];
        assert!(step_cross(&fast, &slow, &hist, 1));
        assert!(step_cross(&fast, &slow, &hist, 5));
    }

    #[test]
    fn test_any_in_window() {
        let col = [5.0, 1.0, 1.0];
        assert!(!any_in_window(col.len(), 2, |i| col[i] > 2.0));
        assert!(any_in_window(col.len(), 3, |i| col[i] > 2.0));
        assert!(any_in_window(col.len(), 9, |i| col[i] > 2.0));
    }
}
