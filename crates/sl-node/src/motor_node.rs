//! Simulated motor: integrates the control output and publishes the speed.

use std::time::Duration;

use sl_controls::{FirstOrderMotor, MotorState, SampleConfig};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::shutdown::Shutdown;
use crate::transport::{Bus, Publisher, Subscriber};

const LOG_TARGET: &str = "speedloop::motor";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorReport {
    pub steps: u64,
    pub final_state: MotorState,
}

pub struct MotorNode {
    motor: FirstOrderMotor,
    state: MotorState,
    dt: f64,
    period: Duration,
    input: f64,
    input_rx: Subscriber,
    speed_tx: Publisher,
}

impl MotorNode {
    pub fn new(
        motor: FirstOrderMotor,
        initial: MotorState,
        period: SampleConfig,
        bus: &mut Bus,
        input_topic: &str,
        speed_topic: &str,
    ) -> Self {
        Self {
            motor,
            state: initial,
            dt: period.dt(),
            period: period.duration(),
            input: 0.0,
            input_rx: bus.subscribe(input_topic),
            speed_tx: bus.publisher(speed_topic),
        }
    }

    /// Run until shutdown. The latest input is held between integration steps.
    pub async fn run(mut self, mut shutdown: Shutdown) -> MotorReport {
        info!(
            target: LOG_TARGET,
            tau_s = self.motor.tau,
            gain = self.motor.gain,
            "motor model started, publishing on {}",
            self.speed_tx.topic()
        );

        let mut timer = time::interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut steps = 0;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.wait() => break,
                Some(value) = self.input_rx.recv() => self.input = value,
                _ = timer.tick() => {
                    self.state = self.motor.step(&self.state, self.dt, self.input);
                    self.speed_tx.publish(self.state.speed);
                    steps += 1;
                }
            }
        }

        debug!(target: LOG_TARGET, speed = self.state.speed, "motor loop exited");
        info!(target: LOG_TARGET, "motor model stopped after {steps} steps");
        MotorReport {
            steps,
            final_state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::shutdown_channel;

    #[tokio::test(start_paused = true)]
    async fn speed_follows_held_input() {
        let mut bus = Bus::new(16);
        let node = MotorNode::new(
            FirstOrderMotor::new(2.0, 0.1).unwrap(),
            MotorState::default(),
            SampleConfig::new(0.01).unwrap(),
            &mut bus,
            "u",
            "y",
        );
        let input = bus.publisher("u");
        let mut speed = bus.subscribe("y");
        let (trigger, shutdown) = shutdown_channel();

        input.publish(1.0);
        let task = tokio::spawn(node.run(shutdown));

        // dw/dt = (2 * 1 - 0) / 0.1 = 20 on the first step
        let first = speed.recv().await.unwrap();
        assert!((first - 0.2).abs() < 1e-12);

        time::sleep(Duration::from_secs(2)).await;
        trigger.trigger();
        let report = task.await.unwrap();
        assert!((report.final_state.speed - 2.0).abs() < 1e-3);
    }
}
