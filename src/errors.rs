use canopy_core::errors::CanopyError;
use thiserror::Error;

/// Errors raised while configuring, running or reporting a scenario
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Failed to serialise configuration: {0}")]
    ConfigSerialise(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Model(#[from] CanopyError),
    #[error(transparent)]
    Sensitivity(#[from] canopy_sobol::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render plot: {0}")]
    Plot(String),
}

/// Convenience type for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
