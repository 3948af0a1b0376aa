use thiserror::Error;

pub type SlResult<T> = Result<T, SlError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("{what} must be positive, got {value}")]
    NotPositive { what: &'static str, value: f64 },

    #[error("{what} of {value} s cannot be scheduled: must be between 1 ns and the maximum Duration")]
    UnusablePeriod { what: &'static str, value: f64 },
}
