//! Model evaluation interface used by the sensitivity analysis.

use crate::design::{DesignOutputs, SaltelliDesign};
use crate::{Error, Result};
use log::info;
use ndarray::Array2;
use rayon::prelude::*;

/// Evaluates a model for a single parameter vector.
///
/// Implementations map a parameter vector (ordered as [`ModelRunner::param_names`])
/// to one value per entry of [`ModelRunner::output_names`]. Evaluations must be
/// independent of each other so that they can run in any order.
pub trait ModelRunner: Sync {
    /// Names of the parameters, in the order they appear in parameter vectors
    fn param_names(&self) -> &[String];

    /// Names of the scalar outputs, in the order they are returned by [`ModelRunner::run`]
    fn output_names(&self) -> &[String];

    /// Run the model for a single parameter vector
    fn run(&self, params: &[f64]) -> Result<Vec<f64>>;

    /// Run the model for many parameter vectors in parallel.
    ///
    /// Results are returned in the same order as `param_sets`.
    fn run_batch(&self, param_sets: &[Vec<f64>]) -> Vec<Result<Vec<f64>>> {
        param_sets.par_iter().map(|params| self.run(params)).collect()
    }
}

/// Evaluate every row of a design.
///
/// Outputs are stored by row index, so the sequential and parallel paths
/// produce identical results. The first failing row aborts the evaluation.
pub fn evaluate_design<R: ModelRunner>(
    runner: &R,
    design: &SaltelliDesign,
    parallel: bool,
) -> Result<DesignOutputs> {
    if runner.param_names() != design.param_names() {
        return Err(Error::DimensionMismatch(format!(
            "Runner parameters {:?} do not match design parameters {:?}",
            runner.param_names(),
            design.param_names()
        )));
    }

    let param_sets = design.parameter_vectors();
    let n_outputs = runner.output_names().len();
    info!(
        "Evaluating {} model runs ({} samples x {} blocks, parallel={})",
        param_sets.len(),
        design.n_samples(),
        design.n_blocks(),
        parallel
    );

    let results = if parallel {
        runner.run_batch(&param_sets)
    } else {
        param_sets.iter().map(|params| runner.run(params)).collect()
    };

    let mut values = Array2::zeros((param_sets.len(), n_outputs));
    for (row, result) in results.into_iter().enumerate() {
        let output = result.map_err(|e| match e {
            Error::ModelError { message, .. } => Error::ModelError { row, message },
            other => Error::ModelError {
                row,
                message: other.to_string(),
            },
        })?;
        if output.len() != n_outputs {
            return Err(Error::DimensionMismatch(format!(
                "Row {} returned {} outputs, expected {}",
                row,
                output.len(),
                n_outputs
            )));
        }
        for (j, value) in output.into_iter().enumerate() {
            values[[row, j]] = value;
        }
    }

    DesignOutputs::new(
        runner.output_names().to_vec(),
        design.n_samples(),
        design.n_params(),
        values,
    )
}
