//! Discrete-time PID loop with live, validated gains.
//!
//! One control step per sample period:
//!
//! ```text
//! e        = setpoint - measurement
//! integral = integral + e * dt            (clamped only if a limit is set)
//! de       = (e - previous_error) / dt
//! u        = kp * e + ki * integral + kd * de
//! output   = measurement + u * dt         (Incremental)
//!          | u                            (Direct)
//! ```
//!
//! Setpoint and measurement are cached as they arrive (last value wins) and do
//! not trigger a step on their own. The step runs on whatever is cached, which
//! is `0.0` for an input that never arrived, unless the loop is configured to
//! wait for both inputs.

use serde::{Deserialize, Serialize};
use sl_core::ensure_positive;
use tracing::{debug, info, warn};

use crate::error::{ControlError, ControlResult};
use crate::gains::{GainName, PidGains};
use crate::params::{Parameter, Parameterized, SetParametersResult};
use crate::sampled::SampleConfig;

const LOG_TARGET: &str = "speedloop::controller";

/// How the control signal `u` is turned into the published output.
///
/// The two forms give different closed-loop dynamics and are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputComposition {
    /// `measurement + u * dt`: the output is a small correction around the
    /// current process value.
    #[default]
    Incremental,
    /// `u`: the raw control signal.
    Direct,
}

impl OutputComposition {
    pub fn compose(self, measurement: f64, u: f64, dt: f64) -> f64 {
        match self {
            OutputComposition::Incremental => measurement + u * dt,
            OutputComposition::Direct => u,
        }
    }
}

/// Construction-time settings of a [`PidLoop`].
#[derive(Debug, Clone, PartialEq)]
pub struct PidLoopConfig {
    pub sample: SampleConfig,
    pub gains: PidGains,
    pub composition: OutputComposition,
    /// Skip steps until both a setpoint and a measurement have arrived.
    pub require_inputs_before_stepping: bool,
    /// Symmetric clamp on the integral accumulator. `None` leaves it unbounded.
    pub integral_limit: Option<f64>,
}

impl PidLoopConfig {
    pub fn new(sample: SampleConfig, gains: PidGains) -> Self {
        Self {
            sample,
            gains,
            composition: OutputComposition::default(),
            require_inputs_before_stepping: false,
            integral_limit: None,
        }
    }

    pub fn with_composition(mut self, composition: OutputComposition) -> Self {
        self.composition = composition;
        self
    }

    pub fn requiring_inputs(mut self, require: bool) -> Self {
        self.require_inputs_before_stepping = require;
        self
    }

    /// Clamp the integral to `[-limit, limit]`.
    ///
    /// # Errors
    ///
    /// `limit` must be finite and positive.
    pub fn with_integral_limit(mut self, limit: f64) -> ControlResult<Self> {
        self.integral_limit = Some(ensure_positive(limit, "integral limit")?);
        Ok(self)
    }
}

/// Everything the controller remembers between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    pub setpoint: f64,
    pub measurement: f64,
    pub previous_error: f64,
    pub integral: f64,
    pub gains: PidGains,
    /// Seconds between steps. Fixed for the life of the loop.
    pub sampling_interval: f64,
    pub has_setpoint: bool,
    pub has_measurement: bool,
}

impl ControllerState {
    fn new(gains: PidGains, sampling_interval: f64) -> Self {
        Self {
            setpoint: 0.0,
            measurement: 0.0,
            previous_error: 0.0,
            integral: 0.0,
            gains,
            sampling_interval,
            has_setpoint: false,
            has_measurement: false,
        }
    }
}

/// Terms of a single control step, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub error: f64,
    pub integral: f64,
    pub derivative: f64,
    /// Raw control signal.
    pub u: f64,
    /// Value to publish, after output composition.
    pub output: f64,
}

/// A single-loop PID controller.
///
/// The loop owns its state outright; callers that share it across threads must
/// serialize access themselves.
#[derive(Debug, Clone)]
pub struct PidLoop {
    state: ControllerState,
    sample: SampleConfig,
    composition: OutputComposition,
    require_inputs: bool,
    integral_limit: Option<f64>,
}

impl PidLoop {
    pub fn new(config: PidLoopConfig) -> Self {
        Self {
            state: ControllerState::new(config.gains, config.sample.dt()),
            sample: config.sample,
            composition: config.composition,
            require_inputs: config.require_inputs_before_stepping,
            integral_limit: config.integral_limit,
        }
    }

    /// Cache a new setpoint.
    pub fn on_setpoint_received(&mut self, value: f64) {
        self.state.setpoint = value;
        self.state.has_setpoint = true;
    }

    /// Cache a new measurement.
    ///
    /// Values are not screened: a NaN reaches the integral and stays there
    /// until [`PidLoop::reset`].
    pub fn on_measurement_received(&mut self, value: f64) {
        self.state.measurement = value;
        self.state.has_measurement = true;
    }

    /// Both inputs have been received at least once.
    pub fn inputs_ready(&self) -> bool {
        self.state.has_setpoint && self.state.has_measurement
    }

    /// Run one control step.
    ///
    /// Returns `None` only when the loop waits for inputs and they have not both
    /// arrived yet; in that case no state changes.
    pub fn control_step(&mut self) -> Option<StepOutput> {
        if self.require_inputs && !self.inputs_ready() {
            debug!(target: LOG_TARGET, "waiting for setpoint and measurement, step skipped");
            return None;
        }

        let dt = self.state.sampling_interval;
        let gains = self.state.gains;

        let error = self.state.setpoint - self.state.measurement;

        let mut integral = self.state.integral + error * dt;
        if let Some(limit) = self.integral_limit {
            integral = integral.clamp(-limit, limit);
        }

        let derivative = (error - self.state.previous_error) / dt;

        let u = gains.kp * error + gains.ki * integral + gains.kd * derivative;
        let output = self.composition.compose(self.state.measurement, u, dt);

        self.state.integral = integral;
        self.state.previous_error = error;

        debug!(
            target: LOG_TARGET,
            error, integral, derivative, u, output, "control step"
        );

        Some(StepOutput {
            error,
            integral,
            derivative,
            u,
            output,
        })
    }

    /// Validate and apply one gain. The previous value is kept on rejection.
    pub fn set_gain(&mut self, name: GainName, value: f64) -> ControlResult<()> {
        match self.state.gains.set(name, value) {
            Ok(()) => {
                info!(target: LOG_TARGET, "{name} updated to {value}");
                Ok(())
            }
            Err(err) => {
                warn!(target: LOG_TARGET, "rejected {name} update: {err}");
                Err(err)
            }
        }
    }

    /// Update a gain by parameter name and report the outcome.
    pub fn update_gain(&mut self, name: &str, value: f64) -> SetParametersResult {
        self.set_parameter(&Parameter::new(name, value)).into()
    }

    /// Apply gain updates in order, stopping at the first rejection.
    pub fn update_gains(&mut self, updates: &[Parameter]) -> SetParametersResult {
        self.set_parameters(updates)
    }

    pub fn gains(&self) -> PidGains {
        self.state.gains
    }

    pub fn composition(&self) -> OutputComposition {
        self.composition
    }

    pub fn sampling_interval(&self) -> f64 {
        self.state.sampling_interval
    }

    pub fn sample_config(&self) -> SampleConfig {
        self.sample
    }

    /// Read-only view of the controller state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Owned copy of the controller state.
    pub fn snapshot(&self) -> ControllerState {
        self.state.clone()
    }

    /// Forget inputs and accumulated history. Gains and sample period survive.
    pub fn reset(&mut self) {
        self.state = ControllerState::new(self.state.gains, self.state.sampling_interval);
    }
}

impl Parameterized for PidLoop {
    fn set_parameter(&mut self, param: &Parameter) -> Result<(), ControlError> {
        let name = match param.name.parse::<GainName>() {
            Ok(name) => name,
            Err(err) => {
                warn!(target: LOG_TARGET, "rejected parameter update: {err}");
                return Err(err);
            }
        };
        self.set_gain(name, param.value)
    }

    fn parameters(&self) -> Vec<Parameter> {
        GainName::ALL
            .iter()
            .map(|&name| Parameter::new(name.as_str(), self.state.gains.get(name)))
            .collect()
    }
}
