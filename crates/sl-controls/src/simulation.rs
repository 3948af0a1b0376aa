//! Deterministic closed-loop simulation: generator -> PID -> motor.
//!
//! Runs in simulated time. The motor integrates on the fine plant step, the
//! generator and the controller fire on their own sample clocks, and the
//! controller output is held between controller samples.

use serde::{Deserialize, Serialize};

use crate::pid_loop::PidLoop;
use crate::plant::{FirstOrderMotor, MotorState};
use crate::sampled::{SampleClock, SampleConfig, ZeroOrderHold};
use crate::signal::SignalGenerator;

/// Timing of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Motor integration step.
    pub plant: SampleConfig,
    /// Generator publishing period.
    pub generator: SampleConfig,
}

/// One row of simulation output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimSample {
    pub time: f64,
    pub setpoint: f64,
    pub measurement: f64,
    pub output: f64,
}

#[derive(Debug, Clone)]
pub struct ClosedLoopSim {
    generator: SignalGenerator,
    generator_clock: SampleClock,
    controller: PidLoop,
    controller_hold: ZeroOrderHold,
    motor: FirstOrderMotor,
    motor_state: MotorState,
    plant_dt: f64,
    steps: u64,
}

impl ClosedLoopSim {
    pub fn new(
        config: SimConfig,
        generator: SignalGenerator,
        controller: PidLoop,
        motor: FirstOrderMotor,
        initial: MotorState,
    ) -> Self {
        Self {
            generator,
            generator_clock: SampleClock::new(config.generator, 0.0),
            controller_hold: ZeroOrderHold::new(controller.sample_config(), 0.0, 0.0),
            controller,
            motor,
            motor_state: initial,
            plant_dt: config.plant.dt(),
            steps: 0,
        }
    }

    /// Simulated time in seconds.
    pub fn time(&self) -> f64 {
        self.steps as f64 * self.plant_dt
    }

    /// Advance by one plant step.
    pub fn step(&mut self) -> SimSample {
        self.motor_state = self
            .motor
            .step(&self.motor_state, self.plant_dt, self.controller_hold.get());
        self.steps += 1;
        let time = self.time();

        self.controller.on_measurement_received(self.motor_state.speed);

        if self.generator_clock.should_sample(time) {
            self.generator_clock.advance();
            self.controller
                .on_setpoint_received(self.generator.value_at(time));
        }

        let controller = &mut self.controller;
        self.controller_hold
            .update_with(time, || controller.control_step().map(|step| step.output));

        SimSample {
            time,
            setpoint: self.controller.state().setpoint,
            measurement: self.motor_state.speed,
            output: self.controller_hold.get(),
        }
    }

    /// Advance until `duration` seconds of simulated time have elapsed.
    pub fn run_for(&mut self, duration: f64) -> Vec<SimSample> {
        let steps = (duration / self.plant_dt).round().max(0.0) as u64;
        (0..steps).map(|_| self.step()).collect()
    }

    pub fn controller(&self) -> &PidLoop {
        &self.controller
    }

    /// Mutable access for live re-tuning between steps.
    pub fn controller_mut(&mut self) -> &mut PidLoop {
        &mut self.controller
    }

    pub fn generator_mut(&mut self) -> &mut SignalGenerator {
        &mut self.generator
    }

    pub fn motor_state(&self) -> MotorState {
        self.motor_state
    }
}
