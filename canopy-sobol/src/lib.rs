//! Variance-based global sensitivity analysis.
//!
//! Implements the Saltelli sampling design and the Sobol first-order and
//! total-effect estimators, with bootstrap confidence intervals.
//!
//! # Workflow
//!
//! 1. Describe the uncertain inputs as a [`ParameterSet`] of marginal distributions
//! 2. Draw two independent base matrices with [`generate_base_samples`]
//! 3. Build the [`SaltelliDesign`] and evaluate it with a [`ModelRunner`]
//! 4. Estimate the indices for each model output with [`SobolAnalysis`]
//!
//! # References
//!
//! Saltelli, A., Annoni, P., Azzini, I., Campolongo, F., Ratto, M., & Tarantola, S. (2010).
//! Variance based sensitivity analysis of model output. Design and estimator for the
//! total sensitivity index. Computer Physics Communications, 181(2), 259-270.
//!
//! Jansen, M. J. W. (1999). Analysis of variance designs for model output.
//! Computer Physics Communications, 117(1-2), 35-43.

pub mod design;
pub mod distribution;
pub mod runner;
pub mod sample;
pub mod sobol;

pub use design::{DesignBlock, DesignOutputs, SaltelliDesign};
pub use distribution::{Normal, ParameterSet};
pub use runner::{evaluate_design, ModelRunner};
pub use sample::{generate_base_samples, SampleMatrix};
pub use sobol::{
    BootstrapSummary, IndexEstimate, ParameterIndices, SobolAnalysis, SobolIndices, SobolReport,
};

use thiserror::Error;

/// Errors raised while sampling, evaluating or analysing a design
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Sampling error: {0}")]
    SamplingError(String),

    #[error("Model evaluation failed for design row {row}: {message}")]
    ModelError { row: usize, message: String },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
