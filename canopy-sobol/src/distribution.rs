//! Marginal distributions of the uncertain model parameters.

use crate::{Error, Result};
use indexmap::IndexMap;
use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

/// Normal distribution with an optional lower bound.
///
/// Draws below the lower bound are replaced by the bound itself rather than
/// redrawn, so the bound carries the probability mass of the lower tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normal {
    mean: f64,
    std_dev: f64,
    lower_bound: Option<f64>,
}

impl Normal {
    /// Create a new normal distribution.
    ///
    /// # Arguments
    ///
    /// * `mean` - Mean of the distribution, must be finite
    /// * `std_dev` - Standard deviation, must be finite and non-negative.
    ///   A standard deviation of zero always returns the mean.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "Mean must be finite, got {}",
                mean
            )));
        }
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "Standard deviation must be finite and non-negative, got {}",
                std_dev
            )));
        }
        Ok(Self {
            mean,
            std_dev,
            lower_bound: None,
        })
    }

    /// Replace draws below `bound` with `bound`
    pub fn floored_at(mut self, bound: f64) -> Self {
        self.lower_bound = Some(bound);
        self
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn lower_bound(&self) -> Option<f64> {
        self.lower_bound
    }

    /// Draw a single value
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let value = if self.std_dev == 0.0 {
            self.mean
        } else {
            // Parameters were validated in `new`
            match rand_distr::Normal::new(self.mean, self.std_dev) {
                Ok(normal) => normal.sample(rng),
                Err(_) => self.mean,
            }
        };

        match self.lower_bound {
            Some(bound) => value.max(bound),
            None => value,
        }
    }
}

/// Ordered collection of named parameter distributions.
///
/// The insertion order defines the column order of every sample matrix drawn
/// from the set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    params: IndexMap<String, Normal>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any existing parameter of the same name
    pub fn add(&mut self, name: impl Into<String>, distribution: Normal) -> &mut Self {
        self.params.insert(name.into(), distribution);
        self
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn param_names(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Normal> {
        self.params.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Normal)> {
        self.params.iter()
    }
}
