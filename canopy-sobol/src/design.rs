//! The Saltelli sampling design and the model outputs evaluated on it.

use crate::sample::SampleMatrix;
use crate::{Error, Result};
use ndarray::{s, Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// One of the `k + 2` blocks of a Saltelli design
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignBlock {
    /// The first base matrix (A)
    X1,
    /// The second base matrix (B)
    X2,
    /// X1 with the column of parameter `j` taken from X2 (A_B^j)
    Mixed(usize),
}

impl DesignBlock {
    /// Position of the block in a design over `n_params` parameters
    fn position(self, n_params: usize) -> Result<usize> {
        match self {
            DesignBlock::X1 => Ok(0),
            DesignBlock::X2 => Ok(1),
            DesignBlock::Mixed(j) if j < n_params => Ok(2 + j),
            DesignBlock::Mixed(j) => Err(Error::DimensionMismatch(format!(
                "Parameter index {} out of range for {} parameters",
                j, n_params
            ))),
        }
    }
}

/// Saltelli design built from two base matrices.
///
/// The design holds `n_samples * (n_params + 2)` parameter vectors, ordered
/// block by block: all rows of X1, then X2, then each mixed matrix in
/// parameter order. Row `i` of every block belongs to the same design point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaltelliDesign {
    x1: SampleMatrix,
    x2: SampleMatrix,
}

impl SaltelliDesign {
    pub fn new(x1: SampleMatrix, x2: SampleMatrix) -> Result<Self> {
        x1.check_compatible(&x2)?;
        Ok(Self { x1, x2 })
    }

    pub fn x1(&self) -> &SampleMatrix {
        &self.x1
    }

    pub fn x2(&self) -> &SampleMatrix {
        &self.x2
    }

    pub fn n_samples(&self) -> usize {
        self.x1.n_samples()
    }

    pub fn n_params(&self) -> usize {
        self.x1.n_params()
    }

    pub fn param_names(&self) -> &[String] {
        self.x1.param_names()
    }

    pub fn n_blocks(&self) -> usize {
        self.n_params() + 2
    }

    /// Total number of model evaluations required
    pub fn n_runs(&self) -> usize {
        self.n_samples() * self.n_blocks()
    }

    /// Parameter vector for design row `row` (block-major ordering)
    pub fn parameter_vector(&self, row: usize) -> Vec<f64> {
        let n = self.n_samples();
        let block = row / n;
        let i = row % n;

        match block {
            0 => self.x1.row(i).to_vec(),
            1 => self.x2.row(i).to_vec(),
            b => {
                let j = b - 2;
                let mut values = self.x1.row(i).to_vec();
                values[j] = self.x2.values()[[i, j]];
                values
            }
        }
    }

    /// Every parameter vector of the design, in evaluation order
    pub fn parameter_vectors(&self) -> Vec<Vec<f64>> {
        (0..self.n_runs())
            .map(|row| self.parameter_vector(row))
            .collect()
    }
}

/// Model outputs for every row of a [`SaltelliDesign`]: shape (n_runs, n_outputs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignOutputs {
    output_names: Vec<String>,
    n_samples: usize,
    n_params: usize,
    values: Array2<f64>,
}

impl DesignOutputs {
    pub fn new(
        output_names: Vec<String>,
        n_samples: usize,
        n_params: usize,
        values: Array2<f64>,
    ) -> Result<Self> {
        let expected_rows = n_samples * (n_params + 2);
        if values.nrows() != expected_rows {
            return Err(Error::DimensionMismatch(format!(
                "Expected {} design rows, got {}",
                expected_rows,
                values.nrows()
            )));
        }
        if values.ncols() != output_names.len() {
            return Err(Error::DimensionMismatch(format!(
                "Number of output names ({}) does not match output columns ({})",
                output_names.len(),
                values.ncols()
            )));
        }
        Ok(Self {
            output_names,
            n_samples,
            n_params,
            values,
        })
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_params(&self) -> usize {
        self.n_params
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    fn output_index(&self, output: &str) -> Result<usize> {
        self.output_names
            .iter()
            .position(|name| name == output)
            .ok_or_else(|| Error::InvalidParameter(format!("Unknown model output '{}'", output)))
    }

    /// All values of one output across the design
    pub fn column(&self, output: &str) -> Result<ArrayView1<'_, f64>> {
        let j = self.output_index(output)?;
        Ok(self.values.column(j))
    }

    /// Values of one output for a single block of the design
    pub fn block(&self, output: &str, block: DesignBlock) -> Result<ArrayView1<'_, f64>> {
        let j = self.output_index(output)?;
        let start = block.position(self.n_params)? * self.n_samples;
        Ok(self
            .values
            .slice(s![start..start + self.n_samples, j]))
    }

    /// Values of one output on the base matrices only (X1 then X2)
    pub fn base_values(&self, output: &str) -> Result<Array1<f64>> {
        let j = self.output_index(output)?;
        Ok(self
            .values
            .slice(s![0..2 * self.n_samples, j])
            .to_owned())
    }
}
