//! Wiring of the generator, controller and motor nodes into one loop.

use sl_project::Project;
use tokio::task::JoinHandle;
use tracing::info;

use crate::compile::{compile_controller, compile_generator, compile_motor};
use crate::controller_node::{ControllerNode, ControllerReport};
use crate::error::{NodeError, NodeResult};
use crate::generator_node::{GeneratorNode, GeneratorReport};
use crate::motor_node::{MotorNode, MotorReport};
use crate::params::ParamClient;
use crate::shutdown::ShutdownTrigger;
use crate::transport::{Bus, Publisher, Subscriber};

const LOG_TARGET: &str = "speedloop::runtime";

/// Nodes built from a configuration, not yet running.
pub struct MotorLoop {
    bus: Bus,
    controller: ControllerNode,
    generator: GeneratorNode,
    motor: Option<MotorNode>,
    controller_params: ParamClient,
    generator_params: ParamClient,
}

impl MotorLoop {
    /// Build every node. Without the simulated motor, measurements must be
    /// published on the measurement topic by someone else.
    pub fn from_project(project: &Project, simulate_motor: bool) -> NodeResult<Self> {
        let topics = &project.topics;
        let mut bus = Bus::default();

        let pid = compile_controller(&project.controller)?;
        let (controller, controller_params) = ControllerNode::new(
            pid,
            &mut bus,
            &topics.setpoint,
            &topics.measurement,
            &topics.control_output,
        );

        let (signal, period) = compile_generator(&project.generator)?;
        let (generator, generator_params) =
            GeneratorNode::new(signal, period, &mut bus, &topics.setpoint);

        let motor = if simulate_motor {
            let (model, initial, period) = compile_motor(&project.motor)?;
            Some(MotorNode::new(
                model,
                initial,
                period,
                &mut bus,
                &topics.control_output,
                &topics.measurement,
            ))
        } else {
            None
        };

        Ok(Self {
            bus,
            controller,
            generator,
            motor,
            controller_params,
            generator_params,
        })
    }

    /// Observe a topic. Subscribe before spawning to see every sample.
    pub fn subscribe(&mut self, topic: &str) -> Subscriber {
        self.bus.subscribe(topic)
    }

    /// Publish into a topic from outside the loop, e.g. real measurements.
    pub fn publisher(&mut self, topic: &str) -> Publisher {
        self.bus.publisher(topic)
    }

    pub fn spawn(self, shutdown: &ShutdownTrigger) -> RunningLoop {
        info!(
            target: LOG_TARGET,
            simulated_motor = self.motor.is_some(),
            "starting nodes"
        );
        RunningLoop {
            controller: tokio::spawn(self.controller.run(shutdown.listener())),
            generator: tokio::spawn(self.generator.run(shutdown.listener())),
            motor: self
                .motor
                .map(|motor| tokio::spawn(motor.run(shutdown.listener()))),
            controller_params: self.controller_params,
            generator_params: self.generator_params,
            _bus: self.bus,
        }
    }
}

/// Handles to the running node tasks.
pub struct RunningLoop {
    controller: JoinHandle<ControllerReport>,
    generator: JoinHandle<GeneratorReport>,
    motor: Option<JoinHandle<MotorReport>>,
    controller_params: ParamClient,
    generator_params: ParamClient,
    // Keeps topics without a publishing node open.
    _bus: Bus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopReport {
    pub controller: ControllerReport,
    pub generator: GeneratorReport,
    pub motor: Option<MotorReport>,
}

impl RunningLoop {
    pub fn controller_params(&self) -> &ParamClient {
        &self.controller_params
    }

    pub fn generator_params(&self) -> &ParamClient {
        &self.generator_params
    }

    /// Wait for every node to stop. Call after triggering shutdown.
    pub async fn join(self) -> NodeResult<LoopReport> {
        let controller = self.controller.await.map_err(join_err("controller"))?;
        let generator = self.generator.await.map_err(join_err("generator"))?;
        let motor = match self.motor {
            Some(handle) => Some(handle.await.map_err(join_err("motor"))?),
            None => None,
        };
        info!(target: LOG_TARGET, "all nodes stopped");
        Ok(LoopReport {
            controller,
            generator,
            motor,
        })
    }
}

fn join_err(node: &'static str) -> impl FnOnce(tokio::task::JoinError) -> NodeError {
    move |err| NodeError::Join {
        node,
        what: err.to_string(),
    }
}
