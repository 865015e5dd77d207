//! Sobol first-order and total-effect indices.
//!
//! With `f_A`, `f_B` and `f_ABj` the model outputs on X1, X2 and the mixed
//! matrix of parameter `j`, and `V` and $\bar f$ the variance and mean of the
//! pooled base outputs:
//!
//! $$ S_j = \frac{1}{N V} \sum_i \left(f_B^{(i)} - \bar f\right) \left(f_{AB_j}^{(i)} - f_A^{(i)}\right) $$
//!
//! $$ T_j = \frac{1}{2 N V} \sum_i \left(f_A^{(i)} - f_{AB_j}^{(i)}\right)^2 $$
//!
//! The first-order estimator is from Saltelli et al. (2010) and the total-effect
//! estimator from Jansen (1999).

use crate::design::{DesignBlock, DesignOutputs, SaltelliDesign};
use crate::runner::{evaluate_design, ModelRunner};
use crate::{Error, Result};
use indexmap::IndexMap;
use log::{debug, info, warn};
use ndarray::ArrayView1;
use crate::sample::{stream_rng, STREAM_BOOTSTRAP};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Summary of the bootstrap distribution of an index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSummary {
    /// Mean of the bootstrap estimates minus the original estimate
    pub bias: f64,
    /// Standard deviation of the bootstrap estimates
    pub std_error: f64,
    /// Lower bound of the percentile confidence interval
    pub min_ci: f64,
    /// Upper bound of the percentile confidence interval
    pub max_ci: f64,
}

/// Point estimate of an index with optional bootstrap statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexEstimate {
    pub original: f64,
    pub bootstrap: Option<BootstrapSummary>,
}

/// First-order and total-effect indices of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterIndices {
    pub first_order: IndexEstimate,
    pub total: IndexEstimate,
}

/// Sensitivity indices of one model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SobolIndices {
    /// Indices per parameter, in design parameter order
    Estimated {
        /// Variance of the pooled base outputs
        variance: f64,
        indices: IndexMap<String, ParameterIndices>,
    },
    /// The output took the same value for every base sample, so no
    /// variance can be attributed to any parameter
    NoVariance { value: f64 },
}

impl SobolIndices {
    pub fn is_no_variance(&self) -> bool {
        matches!(self, SobolIndices::NoVariance { .. })
    }

    pub fn get(&self, param: &str) -> Option<&ParameterIndices> {
        match self {
            SobolIndices::Estimated { indices, .. } => indices.get(param),
            SobolIndices::NoVariance { .. } => None,
        }
    }
}

/// Result of a complete sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SobolReport {
    /// Model outputs for every design row
    pub outputs: DesignOutputs,
    /// Indices for each model output, keyed by output name
    pub indices: IndexMap<String, SobolIndices>,
}

/// Configuration of a Sobol sensitivity analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SobolAnalysis {
    /// Number of bootstrap replicates (0 disables the bootstrap)
    pub n_bootstrap: usize,
    /// Confidence level of the bootstrap intervals
    pub confidence_level: f64,
    /// Seed for the bootstrap resampling
    pub seed: u64,
    /// Evaluate the design in parallel
    pub parallel: bool,
}

impl Default for SobolAnalysis {
    fn default() -> Self {
        Self {
            n_bootstrap: 300,
            confidence_level: 0.95,
            seed: 0,
            parallel: true,
        }
    }
}

impl SobolAnalysis {
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "Confidence level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }

    /// Evaluate the design with `runner` and estimate the indices of every output
    pub fn run<R: ModelRunner>(&self, runner: &R, design: &SaltelliDesign) -> Result<SobolReport> {
        self.validate()?;
        let outputs = evaluate_design(runner, design, self.parallel)?;

        let mut indices = IndexMap::new();
        for output in outputs.output_names() {
            indices.insert(output.clone(), self.analyse(&outputs, output, design.param_names())?);
        }
        info!(
            "Estimated Sobol indices for {} outputs from {} runs",
            indices.len(),
            outputs.values().nrows()
        );

        Ok(SobolReport { outputs, indices })
    }

    /// Estimate the indices of a single output from evaluated design outputs
    pub fn analyse(
        &self,
        outputs: &DesignOutputs,
        output: &str,
        param_names: &[String],
    ) -> Result<SobolIndices> {
        self.validate()?;
        if param_names.len() != outputs.n_params() {
            return Err(Error::DimensionMismatch(format!(
                "{} parameter names supplied for {} design parameters",
                param_names.len(),
                outputs.n_params()
            )));
        }

        let f_a = outputs.block(output, DesignBlock::X1)?;
        let f_b = outputs.block(output, DesignBlock::X2)?;
        let f_ab = (0..outputs.n_params())
            .map(|j| outputs.block(output, DesignBlock::Mixed(j)))
            .collect::<Result<Vec<_>>>()?;

        let n = outputs.n_samples();
        if n == 0 {
            return Err(Error::DimensionMismatch(
                "Design has no samples".to_string(),
            ));
        }
        let rows: Vec<usize> = (0..n).collect();

        let first = f_a[0];
        if f_a.iter().chain(f_b.iter()).all(|v| *v == first) {
            warn!("Output '{}' has no variance; indices are undefined", output);
            return Ok(SobolIndices::NoVariance { value: first });
        }

        let estimates = estimate(&f_a, &f_b, &f_ab, &rows).ok_or_else(|| {
            Error::InvalidOutput(format!("Output '{}' has non-finite variance", output))
        })?;
        debug!("Output '{}' variance {:.6e}", output, estimates.variance);

        let boot = if self.n_bootstrap > 0 {
            Some(self.bootstrap(&f_a, &f_b, &f_ab, output))
        } else {
            None
        };

        let mut indices = IndexMap::new();
        for (j, name) in param_names.iter().enumerate() {
            let (first_boot, total_boot) = match &boot {
                Some(replicates) => (
                    summarise(
                        estimates.first_order[j],
                        replicates.iter().map(|r| r.first_order[j]),
                        self.confidence_level,
                    ),
                    summarise(
                        estimates.total[j],
                        replicates.iter().map(|r| r.total[j]),
                        self.confidence_level,
                    ),
                ),
                None => (None, None),
            };

            indices.insert(
                name.clone(),
                ParameterIndices {
                    first_order: IndexEstimate {
                        original: estimates.first_order[j],
                        bootstrap: first_boot,
                    },
                    total: IndexEstimate {
                        original: estimates.total[j],
                        bootstrap: total_boot,
                    },
                },
            );
        }

        Ok(SobolIndices::Estimated {
            variance: estimates.variance,
            indices,
        })
    }

    /// Re-estimate the indices on design rows resampled with replacement.
    ///
    /// Replicates whose resampled base outputs have no variance are dropped.
    fn bootstrap(
        &self,
        f_a: &ArrayView1<f64>,
        f_b: &ArrayView1<f64>,
        f_ab: &[ArrayView1<f64>],
        output: &str,
    ) -> Vec<Estimates> {
        let n = f_a.len();
        let mut rng = stream_rng(self.seed, STREAM_BOOTSTRAP);
        let mut rows = vec![0; n];
        let mut replicates = Vec::with_capacity(self.n_bootstrap);

        for _ in 0..self.n_bootstrap {
            for row in rows.iter_mut() {
                *row = rng.gen_range(0..n);
            }
            if let Some(estimates) = estimate(f_a, f_b, f_ab, &rows) {
                replicates.push(estimates);
            }
        }

        if replicates.len() < self.n_bootstrap {
            debug!(
                "Dropped {} of {} bootstrap replicates of '{}' with no variance",
                self.n_bootstrap - replicates.len(),
                self.n_bootstrap,
                output
            );
        }
        replicates
    }
}

/// Index estimates for every parameter from one set of design rows
#[derive(Debug, Clone)]
struct Estimates {
    variance: f64,
    first_order: Vec<f64>,
    total: Vec<f64>,
}

/// Estimate all indices using the design rows listed in `rows`.
///
/// Returns `None` if the pooled base outputs have zero or non-finite variance.
fn estimate(
    f_a: &ArrayView1<f64>,
    f_b: &ArrayView1<f64>,
    f_ab: &[ArrayView1<f64>],
    rows: &[usize],
) -> Option<Estimates> {
    let n = rows.len() as f64;

    let mean = rows.iter().map(|&i| f_a[i] + f_b[i]).sum::<f64>() / (2.0 * n);
    let variance = rows
        .iter()
        .map(|&i| (f_a[i] - mean).powi(2) + (f_b[i] - mean).powi(2))
        .sum::<f64>()
        / (2.0 * n);

    if !variance.is_finite() || variance <= 0.0 {
        return None;
    }

    let mut first_order = Vec::with_capacity(f_ab.len());
    let mut total = Vec::with_capacity(f_ab.len());
    for f_abj in f_ab {
        let partial = rows
            .iter()
            .map(|&i| (f_b[i] - mean) * (f_abj[i] - f_a[i]))
            .sum::<f64>()
            / n;
        let total_partial = rows
            .iter()
            .map(|&i| (f_a[i] - f_abj[i]).powi(2))
            .sum::<f64>()
            / (2.0 * n);

        first_order.push(partial / variance);
        total.push(total_partial / variance);
    }

    Some(Estimates {
        variance,
        first_order,
        total,
    })
}

/// Summarise bootstrap replicates of an index
fn summarise(
    original: f64,
    replicates: impl Iterator<Item = f64>,
    confidence_level: f64,
) -> Option<BootstrapSummary> {
    let mut values: Vec<f64> = replicates.collect();
    if values.len() < 2 {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let alpha = (1.0 - confidence_level) / 2.0;

    Some(BootstrapSummary {
        bias: mean - original,
        std_error: variance.sqrt(),
        min_ci: quantile(&values, alpha),
        max_ci: quantile(&values, 1.0 - alpha),
    })
}

/// Linearly interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn outputs(values: Vec<f64>, n_samples: usize, n_params: usize) -> DesignOutputs {
        let n = values.len();
        DesignOutputs::new(
            vec!["y".to_string()],
            n_samples,
            n_params,
            Array2::from_shape_vec((n, 1), values).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_quantile() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 5.0);
        assert_eq!(quantile(&values, 0.5), 3.0);
        assert_eq!(quantile(&values, 0.125), 1.5);
    }

    #[test]
    fn test_summarise() {
        let summary = summarise(2.0, [1.0, 2.0, 3.0].into_iter(), 0.5).unwrap();
        assert_eq!(summary.bias, 0.0);
        assert_eq!(summary.std_error, 1.0);
        assert_eq!(summary.min_ci, 1.5);
        assert_eq!(summary.max_ci, 2.5);

        assert!(summarise(2.0, [1.0].into_iter(), 0.95).is_none());
    }

    #[test]
    fn test_hand_computed_estimates() {
        // One parameter, two samples: A = [0, 2], B = [1, 3], AB_0 = [1, 3]
        let f_a = array![0.0, 2.0];
        let f_b = array![1.0, 3.0];
        let f_ab = vec![array![1.0, 3.0]];
        let views: Vec<_> = f_ab.iter().map(|a| a.view()).collect();

        let estimates = estimate(&f_a.view(), &f_b.view(), &views, &[0, 1]).unwrap();
        // Pooled [0, 2, 1, 3]: mean 1.5, variance 1.25
        assert_eq!(estimates.variance, 1.25);
        // mean((B - 1.5) * (AB - A)) = (-0.5 * 1 + 1.5 * 1) / 2 = 0.5
        assert_eq!(estimates.first_order[0], 0.5 / 1.25);
        // mean((A - AB)^2) / 2 = 1 / 2
        assert_eq!(estimates.total[0], 0.5 / 1.25);
    }

    #[test]
    fn test_no_variance() {
        let outputs = outputs(vec![5.0; 8], 2, 2);
        let analysis = SobolAnalysis {
            n_bootstrap: 10,
            ..Default::default()
        };
        let indices = analysis
            .analyse(&outputs, "y", &["a".to_string(), "b".to_string()])
            .unwrap();

        assert_eq!(indices, SobolIndices::NoVariance { value: 5.0 });
        assert!(indices.is_no_variance());
        assert!(indices.get("a").is_none());
    }

    #[test]
    fn test_without_bootstrap() {
        let outputs = outputs(vec![0.0, 2.0, 1.0, 3.0, 1.0, 3.0], 2, 1);
        let analysis = SobolAnalysis {
            n_bootstrap: 0,
            ..Default::default()
        };
        let indices = analysis.analyse(&outputs, "y", &["a".to_string()]).unwrap();
        let a = indices.get("a").unwrap();
        assert_eq!(a.first_order.original, 0.4);
        assert!(a.first_order.bootstrap.is_none());
        assert!(a.total.bootstrap.is_none());
    }

    #[test]
    fn test_invalid_confidence_level() {
        let outputs = outputs(vec![0.0, 2.0, 1.0, 3.0, 1.0, 3.0], 2, 1);
        let analysis = SobolAnalysis {
            confidence_level: 1.0,
            ..Default::default()
        };
        assert!(analysis.analyse(&outputs, "y", &["a".to_string()]).is_err());
    }

    #[test]
    fn test_first_order_ignores_output_offset() {
        let f_a = array![0.0, 2.0, 1.0, 5.0];
        let f_b = array![1.0, 3.0, 4.0, 2.0];
        let f_ab = vec![array![1.0, 2.5, 3.0, 4.0]];
        let shift = |a: &ndarray::Array1<f64>| a.mapv(|v| v + 1000.0);

        let views: Vec<_> = f_ab.iter().map(|a| a.view()).collect();
        let rows = [0, 1, 2, 3];
        let base = estimate(&f_a.view(), &f_b.view(), &views, &rows).unwrap();

        let shifted_ab = vec![shift(&f_ab[0])];
        let shifted_views: Vec<_> = shifted_ab.iter().map(|a| a.view()).collect();
        let shifted = estimate(
            &shift(&f_a).view(),
            &shift(&f_b).view(),
            &shifted_views,
            &rows,
        )
        .unwrap();

        assert!((base.variance - shifted.variance).abs() < 1e-9);
        assert!((base.first_order[0] - shifted.first_order[0]).abs() < 1e-9);
        assert!((base.total[0] - shifted.total[0]).abs() < 1e-9);
    }

    #[test]
    fn test_bootstrap_stream_is_independent_of_samples() {
        use crate::sample::{STREAM_X1, STREAM_X2};

        let draw = |stream| {
            let mut rng = stream_rng(42, stream);
            (0..5).map(|_| rng.gen::<u64>()).collect::<Vec<_>>()
        };
        let bootstrap = draw(STREAM_BOOTSTRAP);
        assert_ne!(bootstrap, draw(STREAM_X1));
        assert_ne!(bootstrap, draw(STREAM_X2));
    }

    #[test]
    fn test_empty_design_is_dimension_error() {
        let outputs = outputs(vec![], 0, 1);
        let result = SobolAnalysis::default().analyse(&outputs, "y", &["a".to_string()]);
        assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    }

    #[test]
    fn test_non_finite_output_is_rejected() {
        let outputs = outputs(vec![0.0, f64::NAN, 1.0, 3.0, 1.0, 3.0], 2, 1);
        let result = SobolAnalysis::default().analyse(&outputs, "y", &["a".to_string()]);
        assert!(matches!(result, Err(Error::InvalidOutput(_))));
    }

    #[test]
    fn test_parameter_name_count_checked() {
        let outputs = outputs(vec![0.0, 2.0, 1.0, 3.0, 1.0, 3.0], 2, 1);
        let analysis = SobolAnalysis::default();
        assert!(analysis
            .analyse(&outputs, "y", &["a".to_string(), "b".to_string()])
            .is_err());
    }
}
