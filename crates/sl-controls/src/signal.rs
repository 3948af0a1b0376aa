//! Reference setpoint generator.
//!
//! Produces `amplitude * sin(w t)` or its square-wave version
//! `amplitude * sign(sin(w t))`, where `t` is seconds since the generator
//! started. The square wave is exactly `0.0` at zero crossings.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sl_core::{AngularVelocity, ensure_finite, radians_per_second, sign};
use tracing::{info, warn};

use crate::error::{ControlError, ControlResult};
use crate::params::{Parameter, Parameterized};

const LOG_TARGET: &str = "speedloop::generator";

/// Parameter name of the waveform selector.
pub const TYPE_FLAG: &str = "type_flag";

/// Waveform produced by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sinusoid,
    Square,
}

impl Waveform {
    /// Decode the numeric `type_flag`: `0` is sine, `1` is square.
    pub fn from_flag(flag: f64) -> ControlResult<Self> {
        if flag == 0.0 {
            Ok(Waveform::Sinusoid)
        } else if flag == 1.0 {
            Ok(Waveform::Square)
        } else {
            Err(ControlError::InvalidWaveform { value: flag })
        }
    }

    pub fn flag(self) -> f64 {
        match self {
            Waveform::Sinusoid => 0.0,
            Waveform::Square => 1.0,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waveform::Sinusoid => f.write_str("sine"),
            Waveform::Square => f.write_str("square"),
        }
    }
}

/// Shape constants of the reference signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSignal {
    pub amplitude: f64,
    /// Angular frequency in rad/s.
    pub angular_frequency: f64,
}

impl ReferenceSignal {
    pub fn new(amplitude: f64, angular_frequency: AngularVelocity) -> ControlResult<Self> {
        Ok(Self {
            amplitude: ensure_finite(amplitude, "amplitude")?,
            angular_frequency: ensure_finite(
                radians_per_second(angular_frequency),
                "angular frequency",
            )?,
        })
    }

    /// Value at `elapsed` seconds for the given waveform.
    pub fn value_at(&self, waveform: Waveform, elapsed: f64) -> f64 {
        let phase = (self.angular_frequency * elapsed).sin();
        match waveform {
            Waveform::Sinusoid => self.amplitude * phase,
            Waveform::Square => self.amplitude * sign(phase),
        }
    }
}

impl Default for ReferenceSignal {
    fn default() -> Self {
        Self {
            amplitude: 2.0,
            angular_frequency: 1.0,
        }
    }
}

/// Reference generator with a switchable waveform.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    signal: ReferenceSignal,
    mode: Waveform,
    start_time: Instant,
}

impl SignalGenerator {
    /// Create a generator whose clock starts now.
    pub fn new(signal: ReferenceSignal, mode: Waveform) -> Self {
        Self::starting_at(signal, mode, Instant::now())
    }

    pub fn starting_at(signal: ReferenceSignal, mode: Waveform, start_time: Instant) -> Self {
        Self {
            signal,
            mode,
            start_time,
        }
    }

    /// Restart the elapsed-time origin.
    pub fn restart_at(&mut self, start_time: Instant) {
        self.start_time = start_time;
    }

    /// Value for the current wall-clock time.
    pub fn tick(&self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Value at the instant `now`. Instants before the start count as zero elapsed.
    pub fn tick_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.start_time).as_secs_f64();
        self.value_at(elapsed)
    }

    /// Value at `elapsed` seconds after the start.
    pub fn value_at(&self, elapsed: f64) -> f64 {
        self.signal.value_at(self.mode, elapsed)
    }

    pub fn mode(&self) -> Waveform {
        self.mode
    }

    /// Switch waveform from a numeric flag. Unknown flags leave the mode unchanged.
    pub fn set_mode(&mut self, flag: f64) -> ControlResult<()> {
        match Waveform::from_flag(flag) {
            Ok(mode) => {
                self.mode = mode;
                info!(target: LOG_TARGET, "{TYPE_FLAG} updated to {flag} ({mode})");
                Ok(())
            }
            Err(err) => {
                warn!(target: LOG_TARGET, "invalid {TYPE_FLAG}: {err}");
                Err(err)
            }
        }
    }
}

impl Parameterized for SignalGenerator {
    fn set_parameter(&mut self, param: &Parameter) -> Result<(), ControlError> {
        if param.name != TYPE_FLAG {
            warn!(target: LOG_TARGET, "rejected unknown parameter {}", param.name);
            return Err(ControlError::UnknownParameter {
                name: param.name.clone(),
            });
        }
        self.set_mode(param.value)
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::new(TYPE_FLAG, self.mode.flag())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use std::time::Duration;

    fn generator(mode: Waveform) -> SignalGenerator {
        SignalGenerator::new(ReferenceSignal::default(), mode)
    }

    #[test]
    fn sine_follows_elapsed_time() {
        let sine = generator(Waveform::Sinusoid);
        assert_eq!(sine.value_at(0.0), 0.0);
        assert!((sine.value_at(PI / 2.0) - 2.0).abs() < 1e-12);
        assert!((sine.value_at(1.0) - 2.0 * 1.0_f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn square_is_zero_at_start_and_amplitude_at_quarter_period() {
        let signal = ReferenceSignal {
            amplitude: 3.0,
            angular_frequency: 2.0,
        };
        let square = SignalGenerator::new(signal, Waveform::Square);
        assert_eq!(square.value_at(0.0), 0.0);
        assert_eq!(square.value_at(PI / (2.0 * 2.0)), 3.0);
        assert_eq!(square.value_at(3.0 * PI / 4.0 + 0.1), -3.0);
    }

    #[test]
    fn tick_at_measures_from_start() {
        let start = Instant::now();
        let sine = SignalGenerator::starting_at(ReferenceSignal::default(), Waveform::Sinusoid, start);
        let value = sine.tick_at(start + Duration::from_millis(500));
        assert!((value - 2.0 * 0.5_f64.sin()).abs() < 1e-9);
        assert_eq!(sine.tick_at(start), 0.0);
    }

    #[test]
    fn flag_two_rejected_and_mode_kept() {
        let mut sg = generator(Waveform::Square);
        let err = sg.set_mode(2.0).unwrap_err();
        assert!(err.to_string().contains("type_flag"));
        assert_eq!(sg.mode(), Waveform::Square);
    }

    #[test]
    fn fractional_and_negative_flags_rejected() {
        let mut sg = generator(Waveform::Sinusoid);
        assert!(sg.set_mode(0.5).is_err());
        assert!(sg.set_mode(-1.0).is_err());
        assert!(sg.set_mode(f64::NAN).is_err());
        assert_eq!(sg.mode(), Waveform::Sinusoid);
    }

    #[test]
    fn parameter_surface_switches_mode() {
        let mut sg = generator(Waveform::Sinusoid);
        let result = sg.set_parameters(&[Parameter::new(TYPE_FLAG, 1.0)]);
        assert!(result.successful);
        assert_eq!(sg.mode(), Waveform::Square);
        assert_eq!(sg.parameters(), vec![Parameter::new(TYPE_FLAG, 1.0)]);

        let result = sg.set_parameters(&[Parameter::new("amplitude", 5.0)]);
        assert!(!result.successful);
        assert!(result.reason.contains("amplitude"));
    }

    #[test]
    fn reference_signal_rejects_non_finite_shape() {
        assert!(ReferenceSignal::new(f64::NAN, sl_core::rad_per_s(1.0)).is_err());
        let ok = ReferenceSignal::new(2.0, sl_core::rad_per_s(1.0)).unwrap();
        assert_eq!(ok, ReferenceSignal::default());
    }
}
