//! First-order motor model used to close the loop in simulation.
//!
//! Dynamics: `dw/dt = (gain * u - w) / tau`, where `u` is the applied input and
//! `w` the shaft speed. Integrated with explicit Euler.

use serde::{Deserialize, Serialize};
use sl_core::{ensure_finite, ensure_positive};

use crate::error::ControlResult;

/// Speed of the simulated motor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorState {
    pub speed: f64,
}

/// First-order lag motor.
///
/// # Example
///
/// ```
/// use sl_controls::{FirstOrderMotor, MotorState};
///
/// let motor = FirstOrderMotor::new(1.0, 0.2).unwrap();
/// let mut state = MotorState::default();
///
/// for _ in 0..200 {
///     state = motor.step(&state, 0.01, 1.0);
/// }
///
/// assert!((state.speed - 1.0).abs() < 0.01);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderMotor {
    /// Steady-state speed per unit input.
    pub gain: f64,
    /// Time constant (seconds), must be positive.
    pub tau: f64,
}

impl FirstOrderMotor {
    /// Create a new motor model.
    ///
    /// # Errors
    ///
    /// Returns error if `gain` is not finite or `tau` is not positive.
    pub fn new(gain: f64, tau: f64) -> ControlResult<Self> {
        Ok(Self {
            gain: ensure_finite(gain, "motor gain")?,
            tau: ensure_positive(tau, "motor time constant")?,
        })
    }

    /// Speed derivative for the current speed and input.
    pub fn dwdt(&self, speed: f64, input: f64) -> f64 {
        (self.gain * input - speed) / self.tau
    }

    /// Advance the motor by `dt` seconds with `input` held constant.
    pub fn step(&self, state: &MotorState, dt: f64, input: f64) -> MotorState {
        MotorState {
            speed: state.speed + self.dwdt(state.speed, input) * dt,
        }
    }
}

impl Default for FirstOrderMotor {
    fn default() -> Self {
        Self {
            gain: 1.0,
            tau: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_toward_scaled_input() {
        let motor = FirstOrderMotor::new(2.0, 0.1).unwrap();
        let state = motor.step(&MotorState::default(), 0.01, 1.0);
        // dw/dt = (2 - 0) / 0.1 = 20
        assert!((state.speed - 0.2).abs() < 1e-12);
    }

    #[test]
    fn settles_at_gain_times_input() {
        let motor = FirstOrderMotor::new(3.0, 0.05).unwrap();
        let mut state = MotorState { speed: -1.0 };
        for _ in 0..1000 {
            state = motor.step(&state, 0.001, 0.5);
        }
        assert!((state.speed - 1.5).abs() < 1e-6);
    }

    #[test]
    fn invalid_parameters() {
        assert!(FirstOrderMotor::new(1.0, 0.0).is_err());
        assert!(FirstOrderMotor::new(1.0, -0.1).is_err());
        assert!(FirstOrderMotor::new(f64::NAN, 0.1).is_err());
    }
}
