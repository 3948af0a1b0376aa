//! Node publishing the reference setpoint.

use std::time::Duration;

use sl_controls::{SampleConfig, SignalGenerator, Waveform};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::info;

use crate::params::{ParamClient, ParamRequest};
use crate::shutdown::Shutdown;
use crate::transport::{Bus, Publisher};

const LOG_TARGET: &str = "speedloop::generator";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorReport {
    pub ticks: u64,
    pub final_mode: Waveform,
}

pub struct GeneratorNode {
    generator: SignalGenerator,
    period: Duration,
    setpoint_tx: Publisher,
    params_rx: mpsc::Receiver<ParamRequest>,
}

impl GeneratorNode {
    pub fn new(
        generator: SignalGenerator,
        period: SampleConfig,
        bus: &mut Bus,
        setpoint_topic: &str,
    ) -> (Self, ParamClient) {
        let (params, params_rx) = ParamClient::channel("generator");
        let node = Self {
            generator,
            period: period.duration(),
            setpoint_tx: bus.publisher(setpoint_topic),
            params_rx,
        };
        (node, params)
    }

    /// Run until shutdown. Elapsed time is measured from the start of the run.
    pub async fn run(mut self, mut shutdown: Shutdown) -> GeneratorReport {
        let start = Instant::now();
        self.generator.restart_at(start.into_std());
        info!(
            target: LOG_TARGET,
            mode = %self.generator.mode(),
            "setpoint generator started, publishing on {}",
            self.setpoint_tx.topic()
        );

        let mut timer = time::interval_at(start + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.wait() => break,
                Some(request) = self.params_rx.recv() => request.handle(&mut self.generator),
                now = timer.tick() => {
                    self.setpoint_tx.publish(self.generator.tick_at(now.into_std()));
                    ticks += 1;
                }
            }
        }

        info!(target: LOG_TARGET, "setpoint generator stopped after {ticks} ticks");
        GeneratorReport {
            ticks,
            final_mode: self.generator.mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::shutdown_channel;
    use sl_controls::{ReferenceSignal, TYPE_FLAG};

    #[tokio::test(start_paused = true)]
    async fn square_wave_published_each_period() {
        let mut bus = Bus::new(16);
        let generator = SignalGenerator::new(ReferenceSignal::default(), Waveform::Square);
        let (node, params) =
            GeneratorNode::new(generator, SampleConfig::new(0.1).unwrap(), &mut bus, "sp");
        let mut setpoints = bus.subscribe("sp");
        let (trigger, shutdown) = shutdown_channel();
        let task = tokio::spawn(node.run(shutdown));

        assert_eq!(setpoints.recv().await, Some(2.0));
        assert_eq!(setpoints.recv().await, Some(2.0));

        let rejected = params.set_parameter(TYPE_FLAG, 2.0).await.unwrap();
        assert!(!rejected.successful);
        assert!(rejected.reason.contains("type_flag"));
        assert_eq!(setpoints.recv().await, Some(2.0));

        trigger.trigger();
        let report = task.await.unwrap();
        assert_eq!(report.final_mode, Waveform::Square);
        assert!(report.ticks >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn sine_follows_run_time() {
        let mut bus = Bus::new(16);
        let generator = SignalGenerator::new(ReferenceSignal::default(), Waveform::Sinusoid);
        let (node, _params) =
            GeneratorNode::new(generator, SampleConfig::new(0.5).unwrap(), &mut bus, "sp");
        let mut setpoints = bus.subscribe("sp");
        let (trigger, shutdown) = shutdown_channel();
        let task = tokio::spawn(node.run(shutdown));

        let first = setpoints.recv().await.unwrap();
        assert!((first - 2.0 * 0.5_f64.sin()).abs() < 1e-6);
        let second = setpoints.recv().await.unwrap();
        assert!((second - 2.0 * 1.0_f64.sin()).abs() < 1e-6);

        trigger.trigger();
        task.await.unwrap();
    }
}
