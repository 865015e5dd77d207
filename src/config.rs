//! Scenario configuration.
//!
//! A scenario is read from TOML. Every field has a default matching the
//! reference scenario, so an empty file is a valid configuration:
//!
//! ```toml
//! initial_stock = 10.0
//! horizon = 300.0
//!
//! [parameters]
//! carrying_capacity = 250.0
//!
//! [sensitivity]
//! sample_count = 2000
//!
//! [sensitivity.marginals.canopy_threshold]
//! mean = 50.0
//! sd = 10.0
//! ```

use crate::errors::{Error, Result};
use canopy_components::components::ForestGrowthParameters;
use canopy_core::ivp::SolverOptions;
use canopy_core::timeseries::{FloatValue, Time, TimeAxis};
use canopy_sobol::{Normal, ParameterSet, SobolAnalysis};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mean and standard deviation of a sampled parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marginal {
    pub mean: FloatValue,
    pub sd: FloatValue,
}

/// Settings of the Sobol sensitivity sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Rows in each base sample matrix (N)
    pub sample_count: usize,
    /// Bootstrap replicates; 0 disables the confidence intervals
    pub bootstrap_replicates: usize,
    pub confidence_level: f64,
    pub seed: u64,
    /// Standard deviation of each marginal as a fraction of the baseline value
    pub relative_sd: f64,
    /// Evaluate the design rows on the rayon thread pool
    pub parallel: bool,
    /// Explicit marginals, replacing the relative default for the named parameters
    pub marginals: IndexMap<String, Marginal>,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            sample_count: 2000,
            bootstrap_replicates: 300,
            confidence_level: 0.95,
            seed: 42,
            relative_sd: 0.1,
            parallel: true,
            marginals: IndexMap::new(),
        }
    }
}

/// A complete model scenario: simulation settings, baseline parameters and
/// the sensitivity sweep around them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub initial_stock: FloatValue,
    pub start_time: Time,
    /// Length of the simulation after `start_time`
    pub horizon: Time,
    pub time_step: Time,
    /// Stock level used for the `threshold_year` metric
    pub reporting_threshold: FloatValue,
    pub parameters: ForestGrowthParameters,
    pub solver: SolverOptions,
    pub sensitivity: SensitivityConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            initial_stock: 10.0,
            start_time: 0.0,
            horizon: 300.0,
            time_step: 1.0,
            reporting_threshold: 50.0,
            parameters: ForestGrowthParameters::default(),
            solver: SolverOptions::default(),
            sensitivity: SensitivityConfig::default(),
        }
    }
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Check the whole scenario before any model is run
    pub fn validate(&self) -> Result<()> {
        if !self.initial_stock.is_finite() || self.initial_stock < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial_stock must be finite and non-negative, got {}",
                self.initial_stock
            )));
        }
        if !(self.horizon > 0.0) || !self.horizon.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "horizon must be positive, got {}",
                self.horizon
            )));
        }
        if !(self.time_step > 0.0) || self.time_step > self.horizon {
            return Err(Error::InvalidConfig(format!(
                "time_step must be positive and no larger than the horizon, got {}",
                self.time_step
            )));
        }
        if !self.reporting_threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "reporting_threshold must be finite, got {}",
                self.reporting_threshold
            )));
        }
        self.parameters.validate()?;
        self.solver.validate()?;

        let sensitivity = &self.sensitivity;
        if sensitivity.sample_count < 2 {
            return Err(Error::InvalidConfig(format!(
                "sample_count must be at least 2, got {}",
                sensitivity.sample_count
            )));
        }
        if !(sensitivity.confidence_level > 0.0 && sensitivity.confidence_level < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "confidence_level must be in (0, 1), got {}",
                sensitivity.confidence_level
            )));
        }
        if !sensitivity.relative_sd.is_finite() || sensitivity.relative_sd < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "relative_sd must be finite and non-negative, got {}",
                sensitivity.relative_sd
            )));
        }
        for (name, marginal) in &sensitivity.marginals {
            if !ForestGrowthParameters::NAMES.contains(&name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "Unknown parameter '{}' in sensitivity.marginals, expected one of {:?}",
                    name,
                    ForestGrowthParameters::NAMES
                )));
            }
            Normal::new(marginal.mean, marginal.sd)?;
        }

        if self.reporting_threshold != self.parameters.canopy_threshold {
            warn!(
                "Reporting threshold ({}) differs from the canopy threshold ({})",
                self.reporting_threshold, self.parameters.canopy_threshold
            );
        }
        Ok(())
    }

    /// Output times of every simulation in the scenario
    pub fn time_axis(&self) -> Result<TimeAxis> {
        Ok(TimeAxis::regular(
            self.start_time,
            self.start_time + self.horizon,
            self.time_step,
        )?)
    }

    /// Sampling distribution of each model parameter, in the order of
    /// [`ForestGrowthParameters::NAMES`]. All draws are floored at zero.
    pub fn parameter_set(&self) -> Result<ParameterSet> {
        let baseline = self.parameters.to_values();
        let mut params = ParameterSet::new();

        for (name, value) in ForestGrowthParameters::NAMES.iter().zip(baseline) {
            let distribution = match self.sensitivity.marginals.get(*name) {
                Some(marginal) => Normal::new(marginal.mean, marginal.sd)?,
                None => Normal::new(value, (value * self.sensitivity.relative_sd).abs())?,
            };
            params.add(*name, distribution.floored_at(0.0));
        }
        Ok(params)
    }

    pub fn analysis(&self) -> SobolAnalysis {
        SobolAnalysis {
            n_bootstrap: self.sensitivity.bootstrap_replicates,
            confidence_level: self.sensitivity.confidence_level,
            seed: self.sensitivity.seed,
            parallel: self.sensitivity.parallel,
        }
    }
}
