//! Node hosting the PID loop.

use std::time::Duration;

use sl_controls::{ControllerState, PidLoop};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::params::{ParamClient, ParamRequest};
use crate::shutdown::Shutdown;
use crate::transport::{Bus, Publisher, Subscriber};

const LOG_TARGET: &str = "speedloop::controller";

/// Summary returned when the controller node stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerReport {
    /// Steps that produced an output.
    pub steps: u64,
    /// Timer ticks skipped while waiting for inputs.
    pub skipped: u64,
    pub final_state: ControllerState,
}

/// Caches setpoint and measurement, steps the loop on its own timer and
/// publishes one output per step.
pub struct ControllerNode {
    pid: PidLoop,
    period: Duration,
    setpoint_rx: Subscriber,
    measurement_rx: Subscriber,
    output_tx: Publisher,
    params_rx: mpsc::Receiver<ParamRequest>,
}

impl ControllerNode {
    pub fn new(
        pid: PidLoop,
        bus: &mut Bus,
        setpoint_topic: &str,
        measurement_topic: &str,
        output_topic: &str,
    ) -> (Self, ParamClient) {
        let (params, params_rx) = ParamClient::channel("controller");
        let node = Self {
            period: pid.sample_config().duration(),
            pid,
            setpoint_rx: bus.subscribe(setpoint_topic),
            measurement_rx: bus.subscribe(measurement_topic),
            output_tx: bus.publisher(output_topic),
            params_rx,
        };
        (node, params)
    }

    /// Run until shutdown. The first step happens one period after start.
    pub async fn run(mut self, mut shutdown: Shutdown) -> ControllerReport {
        info!(
            target: LOG_TARGET,
            period_s = self.period.as_secs_f64(),
            composition = ?self.pid.composition(),
            "controller started, publishing on {}",
            self.output_tx.topic()
        );

        let mut timer = time::interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut steps = 0;
        let mut skipped = 0;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.wait() => break,
                Some(request) = self.params_rx.recv() => request.handle(&mut self.pid),
                Some(value) = self.setpoint_rx.recv() => self.pid.on_setpoint_received(value),
                Some(value) = self.measurement_rx.recv() => self.pid.on_measurement_received(value),
                _ = timer.tick() => match self.pid.control_step() {
                    Some(step) => {
                        self.output_tx.publish(step.output);
                        steps += 1;
                    }
                    None => skipped += 1,
                },
            }
        }

        debug!(target: LOG_TARGET, steps, skipped, "controller loop exited");
        info!(target: LOG_TARGET, "controller stopped after {steps} steps");
        ControllerReport {
            steps,
            skipped,
            final_state: self.pid.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::shutdown_channel;
    use sl_controls::{OutputComposition, PidGains, PidLoopConfig, SampleConfig};

    fn direct_p_loop(require_inputs: bool) -> PidLoop {
        PidLoop::new(
            PidLoopConfig::new(
                SampleConfig::new(0.1).unwrap(),
                PidGains::new(1.0, 0.0, 0.0).unwrap(),
            )
            .with_composition(OutputComposition::Direct)
            .requiring_inputs(require_inputs),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_one_output_per_period() {
        let mut bus = Bus::new(16);
        let (node, _params) = ControllerNode::new(direct_p_loop(false), &mut bus, "sp", "y", "u");
        let mut outputs = bus.subscribe("u");
        let setpoint = bus.publisher("sp");
        let measurement = bus.publisher("y");
        let (trigger, shutdown) = shutdown_channel();

        setpoint.publish(2.0);
        measurement.publish(0.0);
        let task = tokio::spawn(node.run(shutdown));

        for _ in 0..5 {
            assert_eq!(outputs.recv().await, Some(2.0));
        }

        trigger.trigger();
        let report = task.await.unwrap();
        assert!(report.steps >= 5);
        assert_eq!(report.final_state.previous_error, 2.0);
        assert!((report.final_state.integral - 0.2 * report.steps as f64).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_gain_keeps_previous_value() {
        let mut bus = Bus::new(16);
        let (node, params) = ControllerNode::new(direct_p_loop(false), &mut bus, "sp", "y", "u");
        let (trigger, shutdown) = shutdown_channel();
        let task = tokio::spawn(node.run(shutdown));

        let result = params.set_parameter("kp", 1.5).await.unwrap();
        assert!(!result.successful);
        assert!(result.reason.contains("kp"));

        let accepted = params.set_parameter("ki", 0.0).await.unwrap();
        assert!(accepted.successful);

        let current = params.get_parameters().await.unwrap();
        assert_eq!(current[0].value, 1.0);

        trigger.trigger();
        let report = task.await.unwrap();
        assert_eq!(report.final_state.gains.kp, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn gated_controller_skips_until_inputs_arrive() {
        let mut bus = Bus::new(16);
        let (node, _params) = ControllerNode::new(direct_p_loop(true), &mut bus, "sp", "y", "u");
        let mut outputs = bus.subscribe("u");
        let setpoint = bus.publisher("sp");
        let measurement = bus.publisher("y");
        let (trigger, shutdown) = shutdown_channel();
        let task = tokio::spawn(node.run(shutdown));

        setpoint.publish(1.0);
        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(outputs.try_recv(), None);

        measurement.publish(0.25);
        assert_eq!(outputs.recv().await, Some(0.75));

        trigger.trigger();
        let report = task.await.unwrap();
        assert_eq!(report.skipped, 3);
    }
}
