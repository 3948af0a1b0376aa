use std::time::Duration;

use crate::{SlError, SlResult};

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> SlResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SlError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: Real, what: &'static str) -> SlResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(SlError::NotPositive { what, value: v })
    }
}

/// Finite, positive and schedulable as a timer period: at least one
/// nanosecond and no larger than [`Duration::MAX`].
pub fn ensure_period(v: Real, what: &'static str) -> SlResult<Duration> {
    let v = ensure_positive(v, what)?;
    match Duration::try_from_secs_f64(v) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(SlError::UnusablePeriod { what, value: v }),
    }
}

/// Three-valued sign: -1, 0 or +1.
///
/// Unlike [`f64::signum`], zero (of either sign) maps to `0.0`. NaN stays NaN.
pub fn sign(v: Real) -> Real {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        v * 0.0
    }
}
