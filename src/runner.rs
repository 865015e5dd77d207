//! Forest growth model wrapped for the sensitivity sweep.

use crate::config::Scenario;
use crate::errors::Result;
use canopy_components::components::{ForestGrowth, ForestGrowthParameters};
use canopy_components::metrics::{extract_metrics, Metric, MetricRecord};
use canopy_core::errors::CanopyResult;
use canopy_core::ivp::SolverOptions;
use canopy_core::timeseries::{FloatValue, TimeAxis};
use canopy_core::trajectory::Trajectory;
use canopy_sobol::ModelRunner;

/// Runs one simulation per parameter vector and reduces it to the values of
/// [`Metric::ALL`]
#[derive(Debug, Clone)]
pub struct ForestGrowthRunner {
    param_names: Vec<String>,
    output_names: Vec<String>,
    initial_stock: FloatValue,
    time_axis: TimeAxis,
    reporting_threshold: FloatValue,
    solver_options: SolverOptions,
}

impl ForestGrowthRunner {
    pub fn new(
        initial_stock: FloatValue,
        time_axis: TimeAxis,
        reporting_threshold: FloatValue,
        solver_options: SolverOptions,
    ) -> Self {
        Self {
            param_names: ForestGrowthParameters::NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            output_names: Metric::ALL.iter().map(|m| m.name().to_string()).collect(),
            initial_stock,
            time_axis,
            reporting_threshold,
            solver_options,
        }
    }

    pub fn from_scenario(scenario: &Scenario) -> Result<Self> {
        Ok(Self::new(
            scenario.initial_stock,
            scenario.time_axis()?,
            scenario.reporting_threshold,
            scenario.solver.clone(),
        ))
    }

    /// Simulate a single parameter set
    pub fn simulate(&self, parameters: ForestGrowthParameters) -> CanopyResult<Trajectory> {
        ForestGrowth::from_parameters(parameters)?
            .with_solver_options(self.solver_options.clone())?
            .simulate(self.initial_stock, &self.time_axis)
    }

    /// Simulate a single parameter set and summarise the trajectory
    pub fn evaluate(&self, parameters: ForestGrowthParameters) -> CanopyResult<MetricRecord> {
        let trajectory = self.simulate(parameters)?;
        Ok(extract_metrics(&trajectory, self.reporting_threshold))
    }
}

impl ModelRunner for ForestGrowthRunner {
    fn param_names(&self) -> &[String] {
        &self.param_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    fn run(&self, params: &[f64]) -> canopy_sobol::Result<Vec<f64>> {
        let to_model_error = |e: canopy_core::errors::CanopyError| canopy_sobol::Error::ModelError {
            row: 0,
            message: e.to_string(),
        };

        let parameters = ForestGrowthParameters::from_values(params).map_err(to_model_error)?;
        let record = self.evaluate(parameters).map_err(to_model_error)?;
        Ok(Metric::ALL.iter().map(|m| m.value(&record)).collect())
    }
}
