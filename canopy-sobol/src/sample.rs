//! Base sample matrices for the Saltelli design.

use crate::distribution::ParameterSet;
use crate::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Random stream used for the first base matrix
pub(crate) const STREAM_X1: u64 = 0;
/// Random stream used for the second base matrix
pub(crate) const STREAM_X2: u64 = 1;
/// Random stream used for bootstrap resampling
pub(crate) const STREAM_BOOTSTRAP: u64 = 2;

/// ChaCha8 generator for one stream of `seed`
pub(crate) fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Samples of named parameters: shape (n_samples, n_params).
///
/// Row `i` is one parameter vector; column `j` holds every sample of
/// parameter `param_names[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMatrix {
    param_names: Vec<String>,
    values: Array2<f64>,
}

impl SampleMatrix {
    pub fn new(param_names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if param_names.len() != values.ncols() {
            return Err(Error::DimensionMismatch(format!(
                "Number of parameter names ({}) does not match sample columns ({})",
                param_names.len(),
                values.ncols()
            )));
        }
        Ok(Self {
            param_names,
            values,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_params(&self) -> usize {
        self.values.ncols()
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// All samples of a single parameter
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.param_names
            .iter()
            .position(|n| n == name)
            .map(|j| self.values.column(j))
    }

    /// Check that `other` can be paired with this matrix in a Saltelli design
    pub fn check_compatible(&self, other: &SampleMatrix) -> Result<()> {
        if self.param_names != other.param_names {
            return Err(Error::DimensionMismatch(format!(
                "Sample matrices have different parameters: {:?} vs {:?}",
                self.param_names, other.param_names
            )));
        }
        if self.n_samples() != other.n_samples() {
            return Err(Error::DimensionMismatch(format!(
                "Sample matrices have different sizes: {} vs {}",
                self.n_samples(),
                other.n_samples()
            )));
        }
        Ok(())
    }
}

/// Draw the two independent base matrices of a Saltelli design.
///
/// Both matrices come from ChaCha8 generators seeded with `seed` but set to
/// different streams, so they are statistically independent while the pair
/// as a whole is reproducible from the single seed.
///
/// # Arguments
///
/// * `params` - Marginal distributions; their order defines the column order
/// * `n_samples` - Number of rows in each matrix, at least 2
/// * `seed` - Seed shared by the two streams
pub fn generate_base_samples(
    params: &ParameterSet,
    n_samples: usize,
    seed: u64,
) -> Result<(SampleMatrix, SampleMatrix)> {
    if params.is_empty() {
        return Err(Error::InvalidParameter(
            "At least one parameter is required".to_string(),
        ));
    }
    if n_samples < 2 {
        return Err(Error::InvalidParameter(format!(
            "At least 2 samples are required, got {}",
            n_samples
        )));
    }

    let x1 = sample_stream(params, n_samples, seed, STREAM_X1)?;
    let x2 = sample_stream(params, n_samples, seed, STREAM_X2)?;
    Ok((x1, x2))
}

fn sample_stream(
    params: &ParameterSet,
    n_samples: usize,
    seed: u64,
    stream: u64,
) -> Result<SampleMatrix> {
    let mut rng = stream_rng(seed, stream);

    let mut values = Array2::zeros((n_samples, params.len()));
    for (j, (_, distribution)) in params.iter().enumerate() {
        for i in 0..n_samples {
            values[[i, j]] = distribution.sample(&mut rng);
        }
    }

    SampleMatrix::new(params.param_names(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Normal;
    use ndarray::array;

    fn params() -> ParameterSet {
        let mut params = ParameterSet::new();
        params
            .add("r", Normal::new(0.01, 0.001).unwrap().floored_at(0.0))
            .add("k", Normal::new(250.0, 25.0).unwrap().floored_at(0.0));
        params
    }

    #[test]
    fn test_shapes() {
        let (x1, x2) = generate_base_samples(&params(), 100, 1).unwrap();
        assert_eq!(x1.n_samples(), 100);
        assert_eq!(x1.n_params(), 2);
        x1.check_compatible(&x2).unwrap();
        assert_eq!(x1.param_names(), &["r".to_string(), "k".to_string()]);
    }

    #[test]
    fn test_streams_are_independent() {
        let (x1, x2) = generate_base_samples(&params(), 100, 1).unwrap();
        assert_ne!(x1.values(), x2.values());

        // Sample correlation between the matrices should be close to zero
        let a = x1.column("k").unwrap();
        let b = x2.column("k").unwrap();
        let ma = a.mean().unwrap();
        let mb = b.mean().unwrap();
        let cov = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - ma) * (y - mb))
            .sum::<f64>();
        let corr = cov / (a.std(0.0) * b.std(0.0) * a.len() as f64);
        assert!(corr.abs() < 0.3, "Correlation between streams: {}", corr);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let (a1, a2) = generate_base_samples(&params(), 50, 99).unwrap();
        let (b1, b2) = generate_base_samples(&params(), 50, 99).unwrap();
        assert_eq!(a1, b1);
        assert_eq!(a2, b2);

        let (c1, _) = generate_base_samples(&params(), 50, 100).unwrap();
        assert_ne!(a1, c1);
    }

    #[test]
    fn test_values_floored() {
        let mut params = ParameterSet::new();
        params.add("x", Normal::new(0.0, 1.0).unwrap().floored_at(0.0));
        let (x1, x2) = generate_base_samples(&params, 500, 3).unwrap();
        assert!(x1.values().iter().all(|v| *v >= 0.0));
        assert!(x2.values().iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_invalid_requests() {
        assert!(generate_base_samples(&params(), 1, 0).is_err());
        assert!(generate_base_samples(&ParameterSet::new(), 10, 0).is_err());
    }

    #[test]
    fn test_rows_and_columns() {
        let matrix = SampleMatrix::new(
            vec!["a".to_string(), "b".to_string()],
            array![[1.0, 2.0], [3.0, 4.0]],
        )
        .unwrap();
        assert_eq!(matrix.column("a").unwrap(), array![1.0, 3.0]);
        assert_eq!(matrix.column("b").unwrap(), array![2.0, 4.0]);
        assert_eq!(matrix.row(1), array![3.0, 4.0]);
        assert!(matrix.column("c").is_none());
    }

    #[test]
    fn test_dimension_checks() {
        assert!(SampleMatrix::new(vec!["a".to_string()], array![[1.0, 2.0]]).is_err());

        let a = SampleMatrix::new(vec!["a".to_string()], array![[1.0], [2.0]]).unwrap();
        let b = SampleMatrix::new(vec!["b".to_string()], array![[1.0], [2.0]]).unwrap();
        let c = SampleMatrix::new(vec!["a".to_string()], array![[1.0]]).unwrap();
        assert!(a.check_compatible(&b).is_err());
        assert!(a.check_compatible(&c).is_err());
    }
}
