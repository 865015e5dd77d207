use thiserror::Error;

use crate::timeseries::Time;

/// Error type for invalid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanopyError {
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },
    #[error("Integration failed in the step starting at t={time}: {reason}")]
    NumericalInstability { time: Time, reason: String },
    #[error("Invalid time grid: {0}")]
    InvalidTimeGrid(String),
}

impl CanopyError {
    pub fn invalid_parameter(name: &str, value: f64, reason: impl Into<String>) -> Self {
        CanopyError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, CanopyError>`.
pub type CanopyResult<T> = Result<T, CanopyError>;
