//! Configuration validation logic.
//!
//! Gains and periods are checked with the same rules the controller and the
//! node timers apply, so a file that loads cleanly never starts a loop that
//! would refuse a gain or fail to schedule a period.

use sl_controls::GainName;
use sl_core::ensure_period;

use crate::schema::{ControllerDef, GeneratorDef, LATEST_VERSION, MotorDef, Project, TopicsDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Duplicate topic: {topic} used for {first} and {second}")]
    DuplicateTopic {
        topic: String,
        first: String,
        second: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_topics(&project.topics)?;
    validate_controller(&project.controller)?;
    validate_generator(&project.generator)?;
    validate_motor(&project.motor)?;
    positive("simulation.duration_s", project.simulation.duration_s)?;
    Ok(())
}

fn validate_topics(topics: &TopicsDef) -> Result<(), ValidationError> {
    let named = [
        ("topics.setpoint", &topics.setpoint),
        ("topics.measurement", &topics.measurement),
        ("topics.control_output", &topics.control_output),
    ];

    let mut seen: Vec<(&str, &String)> = Vec::new();
    for (field, topic) in named {
        if topic.trim().is_empty() {
            return Err(invalid(field, topic, "topic name cannot be empty"));
        }
        if let Some((first, _)) = seen.iter().find(|(_, t)| *t == topic) {
            return Err(ValidationError::DuplicateTopic {
                topic: topic.clone(),
                first: first.to_string(),
                second: field.to_string(),
            });
        }
        seen.push((field, topic));
    }
    Ok(())
}

fn validate_controller(controller: &ControllerDef) -> Result<(), ValidationError> {
    gain("controller.kp", GainName::Kp, controller.kp)?;
    gain("controller.ki", GainName::Ki, controller.ki)?;
    gain("controller.kd", GainName::Kd, controller.kd)?;
    period("controller.sample_period_s", controller.sample_period_s)?;
    if let Some(limit) = controller.integral_limit {
        positive("controller.integral_limit", limit)?;
    }
    Ok(())
}

fn validate_generator(generator: &GeneratorDef) -> Result<(), ValidationError> {
    if generator.type_flag != 0.0 && generator.type_flag != 1.0 {
        return Err(invalid(
            "generator.type_flag",
            generator.type_flag,
            "type_flag must be 0 (sine) or 1 (square)",
        ));
    }
    finite("generator.amplitude", generator.amplitude)?;
    finite(
        "generator.angular_frequency_rad_s",
        generator.angular_frequency_rad_s,
    )?;
    period("generator.period_s", generator.period_s)?;
    Ok(())
}

fn validate_motor(motor: &MotorDef) -> Result<(), ValidationError> {
    finite("motor.gain", motor.gain)?;
    positive("motor.tau_s", motor.tau_s)?;
    period("motor.period_s", motor.period_s)?;
    finite("motor.initial_speed", motor.initial_speed)?;
    Ok(())
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn gain(field: &str, name: GainName, value: f64) -> Result<(), ValidationError> {
    name.validate(value)
        .map(|_| ())
        .map_err(|err| invalid(field, value, &err.to_string()))
}

/// A period the node timers can actually run: positive and at least 1 ns.
fn period(field: &str, value: f64) -> Result<(), ValidationError> {
    ensure_period(value, "period")
        .map(|_| ())
        .map_err(|err| invalid(field, value, &err.to_string()))
}
