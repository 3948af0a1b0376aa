//! Error types for control operations.

use sl_core::SlError;
use thiserror::Error;

use crate::gains::GainName;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A gain value failed validation.
    #[error("Invalid {gain} = {value}: {rule}")]
    InvalidGain {
        gain: GainName,
        value: f64,
        rule: &'static str,
    },

    /// The waveform selector is outside the recognized set.
    #[error("Invalid type_flag = {value}: must be 0 (sine) or 1 (square)")]
    InvalidWaveform { value: f64 },

    /// Parameter name not exposed by this component.
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    /// Numeric precondition from sl-core.
    #[error(transparent)]
    Numeric(#[from] SlError),
}
