//! Parameter metadata for signal detectors
//!
//! This module describes the tunable indicator periods of each signal, enabling:
//! - Building detectors from user-supplied key/value settings
//! - Parameter documentation
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use bullscan::params::ParameterizedSignal;
//! use bullscan::prelude::*;
//!
//! for param in MacdGoldenCross::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("fast", 6.0);
//! let detector = MacdGoldenCross::with_params(&params).unwrap();
//! assert_eq!(detector.params.fast.get(), 6);
//! ```

use std::collections::HashMap;

use crate::{Multiplier, Period, Result, SignalError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Lookback period (positive integer)
  Period,
  /// Band width in standard deviations (positive real)
  Multiplier,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "fast")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Accepted values: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn multiplier(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Multiplier, default, range, description }
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value < min || value > max {
      return Err(SignalError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Multiplier => Ok(()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(SignalError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED SIGNAL TRAIT
// ============================================================

/// Signals whose indicator periods can be set from a key/value map
pub trait ParameterizedSignal: Sized {
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector from a map. Missing keys use defaults.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  fn signal_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Look up `key` and validate it against its metadata when present
fn lookup(params: &HashMap<&str, f64>, meta: &[ParamMeta], key: &str, default: f64) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  if let Some(m) = meta.iter().find(|m| m.name == key) {
    m.validate(value)?;
  }
  Ok(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(
  params: &HashMap<&str, f64>,
  meta: &[ParamMeta],
  key: &str,
  default: usize,
) -> Result<Period> {
  let value = lookup(params, meta, key, default as f64)?;
  if value < 1.0 || value.fract() != 0.0 {
    return Err(SignalError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Helper to get a Multiplier from params with default fallback
pub fn get_multiplier(
  params: &HashMap<&str, f64>,
  meta: &[ParamMeta],
  key: &str,
  default: f64,
) -> Result<Multiplier> {
  Multiplier::new(lookup(params, meta, key, default)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  const META: &[ParamMeta] = &[
    ParamMeta::period("period", 21.0, (5.0, 50.0, 1.0), "Band period"),
    ParamMeta::multiplier("multiplier", 2.0, (1.0, 3.0, 0.5), "Band width"),
  ];

  #[test]
  fn test_validate_period() {
    let meta = &META[0];
    assert!(meta.validate(21.0).is_ok());
    assert!(meta.validate(5.0).is_ok());
    assert!(meta.validate(4.0).is_err());
    assert!(meta.validate(20.5).is_err());
  }

  #[test]
  fn test_get_period_helper() {
    let mut params = HashMap::new();
    params.insert("period", 30.0);

    assert_eq!(get_period(&params, META, "period", 21).unwrap().get(), 30);
    assert_eq!(get_period(&HashMap::new(), META, "period", 21).unwrap().get(), 21);

    params.insert("period", 80.0);
    assert!(matches!(
      get_period(&params, META, "period", 21),
      Err(SignalError::OutOfRange { field: "period", .. })
    ));
  }

  #[test]
  fn test_get_multiplier_helper() {
    let mut params = HashMap::new();
    params.insert("multiplier", 2.5);
    assert_eq!(get_multiplier(&params, META, "multiplier", 2.0).unwrap().get(), 2.5);

    // Keys without metadata are only checked by the value type
    params.insert("other", -1.0);
    assert!(get_multiplier(&params, META, "other", 2.0).is_err());
  }
}
