//! Discrete-time motor speed control for speedloop.
//!
//! This crate holds everything that does arithmetic on the loop: the PID
//! controller, the reference signal generator that drives it, and a simple
//! first-order motor model used to close the loop without hardware.
//!
//! # Architecture
//!
//! - Signals are scalar `f64` values
//! - The controller caches the latest setpoint and measurement (last value wins)
//!   and computes one output per sample period
//! - Gains and the generator waveform are live parameters, validated on every
//!   update and reported back as a [`SetParametersResult`]
//! - Nothing here owns a clock thread or a transport; callers drive `control_step`
//!   and `tick` from whatever scheduler they run

pub mod error;
pub mod gains;
pub mod params;
pub mod pid_loop;
pub mod plant;
pub mod sampled;
pub mod signal;
pub mod simulation;

pub use error::{ControlError, ControlResult};
pub use gains::{GainName, KP_MAX, PidGains};
pub use params::{Parameter, Parameterized, SetParametersResult};
pub use pid_loop::{ControllerState, OutputComposition, PidLoop, PidLoopConfig, StepOutput};
pub use plant::{FirstOrderMotor, MotorState};
pub use sampled::{SampleClock, SampleConfig, ZeroOrderHold};
pub use signal::{ReferenceSignal, SignalGenerator, TYPE_FLAG, Waveform};
pub use simulation::{ClosedLoopSim, SimConfig, SimSample};
