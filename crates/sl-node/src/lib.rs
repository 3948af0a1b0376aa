//! In-process runtime for the speedloop nodes.
//!
//! Each node is one async task that owns its component (controller, generator
//! or motor model) and multiplexes its triggers with `tokio::select!`: incoming
//! topic messages, its fixed-period timer, parameter requests and shutdown.
//! Because a single task owns the component, every callback runs to completion
//! with exclusive access and no locking.
//!
//! Topics are broadcast channels carrying `f64` samples. Nodes cache the last
//! value they received; a subscriber that falls behind skips straight to newer
//! values.

pub mod compile;
pub mod controller_node;
pub mod error;
pub mod generator_node;
pub mod motor_node;
pub mod params;
pub mod runtime;
pub mod shutdown;
pub mod transport;

pub use compile::{compile_controller, compile_generator, compile_motor, compile_simulation};
pub use controller_node::{ControllerNode, ControllerReport};
pub use error::{NodeError, NodeResult};
pub use generator_node::{GeneratorNode, GeneratorReport};
pub use motor_node::{MotorNode, MotorReport};
pub use params::{ParamClient, ParamRequest};
pub use runtime::{LoopReport, MotorLoop, RunningLoop};
pub use shutdown::{Shutdown, ShutdownTrigger, shutdown_channel};
pub use transport::{Bus, Publisher, Subscriber};
