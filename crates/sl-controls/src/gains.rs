//! PID gain set and its validation rules.
//!
//! | gain | rejected when            |
//! |------|--------------------------|
//! | kp   | `< 0.0` or `> KP_MAX`    |
//! | ki   | `< 0.0`                  |
//! | kd   | `< 0.0`                  |
//!
//! Non-finite values are rejected for every gain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Upper bound accepted for the proportional gain. Configuration validation
/// goes through [`GainName::validate`], so this is the only copy of the cap.
pub const KP_MAX: f64 = 1.0;

/// Name of a single tunable gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GainName {
    Kp,
    Ki,
    Kd,
}

impl GainName {
    pub const ALL: [GainName; 3] = [GainName::Kp, GainName::Ki, GainName::Kd];

    /// Parameter name as exposed on the configuration surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            GainName::Kp => "kp",
            GainName::Ki => "ki",
            GainName::Kd => "kd",
        }
    }

    /// Check `value` against the rule for this gain.
    pub fn validate(self, value: f64) -> ControlResult<f64> {
        let rule = match self {
            // Message spells out KP_MAX; update both together.
            GainName::Kp if !value.is_finite() || !(0.0..=KP_MAX).contains(&value) => {
                Some("kp must be within [0.0, 1.0]")
            }
            GainName::Ki if !value.is_finite() || value < 0.0 => Some("ki cannot be negative"),
            GainName::Kd if !value.is_finite() || value < 0.0 => Some("kd cannot be negative"),
            _ => None,
        };
        match rule {
            Some(rule) => Err(ControlError::InvalidGain {
                gain: self,
                value,
                rule,
            }),
            None => Ok(value),
        }
    }
}

impl fmt::Display for GainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GainName {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kp" => Ok(GainName::Kp),
            "ki" => Ok(GainName::Ki),
            "kd" => Ok(GainName::Kd),
            other => Err(ControlError::UnknownParameter {
                name: other.to_string(),
            }),
        }
    }
}

/// The authoritative gain set of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (per second).
    pub ki: f64,
    /// Derivative gain (seconds).
    pub kd: f64,
}

impl PidGains {
    /// Create a validated gain set.
    ///
    /// # Errors
    ///
    /// Returns the first gain that breaks its rule, checked in kp, ki, kd order.
    pub fn new(kp: f64, ki: f64, kd: f64) -> ControlResult<Self> {
        Ok(Self {
            kp: GainName::Kp.validate(kp)?,
            ki: GainName::Ki.validate(ki)?,
            kd: GainName::Kd.validate(kd)?,
        })
    }

    /// Read one gain by name.
    pub fn get(&self, name: GainName) -> f64 {
        match name {
            GainName::Kp => self.kp,
            GainName::Ki => self.ki,
            GainName::Kd => self.kd,
        }
    }

    /// Validate and write one gain. On error the previous value is kept.
    pub fn set(&mut self, name: GainName, value: f64) -> ControlResult<()> {
        let value = name.validate(value)?;
        match name {
            GainName::Kp => self.kp = value,
            GainName::Ki => self.ki = value,
            GainName::Kd => self.kd = value,
        }
        Ok(())
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: KP_MAX,
            ki: 3.15,
            kd: 0.7875,
        }
    }
}
