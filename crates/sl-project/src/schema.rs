//! Configuration schema definitions.
//!
//! Every section and field is optional in the file; missing values take the
//! defaults below.

use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Project {
    pub version: u32,
    pub name: String,
    pub topics: TopicsDef,
    pub controller: ControllerDef,
    pub generator: GeneratorDef,
    pub motor: MotorDef,
    pub simulation: SimulationDef,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            version: LATEST_VERSION,
            name: "motor speed loop".to_string(),
            topics: TopicsDef::default(),
            controller: ControllerDef::default(),
            generator: GeneratorDef::default(),
            motor: MotorDef::default(),
            simulation: SimulationDef::default(),
        }
    }
}

/// Channel names used to wire the nodes together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TopicsDef {
    /// Generator output, controller setpoint input.
    pub setpoint: String,
    /// Motor speed, controller measurement input.
    pub measurement: String,
    /// Controller output, motor input.
    pub control_output: String,
}

impl Default for TopicsDef {
    fn default() -> Self {
        Self {
            setpoint: "set_point".to_string(),
            measurement: "motor_speed_y".to_string(),
            control_output: "motor_input_u".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompositionDef {
    #[default]
    Incremental,
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControllerDef {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub sample_period_s: f64,
    pub composition: CompositionDef,
    pub require_inputs_before_stepping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
}

impl Default for ControllerDef {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 3.15,
            kd: 0.7875,
            sample_period_s: 0.1,
            composition: CompositionDef::default(),
            require_inputs_before_stepping: false,
            integral_limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorDef {
    /// `0` for sine, `1` for square.
    pub type_flag: f64,
    pub amplitude: f64,
    pub angular_frequency_rad_s: f64,
    pub period_s: f64,
}

impl Default for GeneratorDef {
    fn default() -> Self {
        Self {
            type_flag: 0.0,
            amplitude: 2.0,
            angular_frequency_rad_s: 1.0,
            period_s: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotorDef {
    pub gain: f64,
    pub tau_s: f64,
    pub period_s: f64,
    pub initial_speed: f64,
}

impl Default for MotorDef {
    fn default() -> Self {
        Self {
            gain: 1.0,
            tau_s: 0.5,
            period_s: 0.01,
            initial_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationDef {
    pub duration_s: f64,
}

impl Default for SimulationDef {
    fn default() -> Self {
        Self { duration_s: 10.0 }
    }
}
