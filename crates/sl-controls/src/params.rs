//! Runtime parameter surface shared by the controller and the generator.

use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// A named scalar parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Outcome of a parameter update, reported back to whoever asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetParametersResult {
    pub successful: bool,
    /// Human-readable rejection reason. Empty on success.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

impl SetParametersResult {
    pub fn success() -> Self {
        Self {
            successful: true,
            reason: String::new(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            successful: false,
            reason: reason.into(),
        }
    }
}

impl From<Result<(), ControlError>> for SetParametersResult {
    fn from(result: Result<(), ControlError>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

/// Something with live, validated parameters.
pub trait Parameterized {
    /// Apply one parameter. Rejection must leave the component unchanged.
    fn set_parameter(&mut self, param: &Parameter) -> Result<(), ControlError>;

    /// Current values of every exposed parameter.
    fn parameters(&self) -> Vec<Parameter>;

    /// Apply parameters in order, stopping at the first rejection.
    ///
    /// Parameters accepted before the failing one stay applied.
    fn set_parameters(&mut self, params: &[Parameter]) -> SetParametersResult {
        for param in params {
            if let Err(err) = self.set_parameter(param) {
                return SetParametersResult::failure(err.to_string());
            }
        }
        SetParametersResult::success()
    }
}
