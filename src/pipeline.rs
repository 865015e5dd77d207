//! End-to-end runs of a [`Scenario`].

use crate::config::Scenario;
use crate::errors::Result;
use crate::runner::ForestGrowthRunner;
use canopy_components::metrics::{extract_metrics, MetricRecord};
use canopy_core::trajectory::Trajectory;
use canopy_sobol::{generate_base_samples, SaltelliDesign, SobolReport};
use log::info;

/// Baseline simulation of a scenario
#[derive(Debug, Clone)]
pub struct BaselineRun {
    pub trajectory: Trajectory,
    pub metrics: MetricRecord,
}

/// Simulate the scenario's baseline parameters
pub fn run_baseline(scenario: &Scenario) -> Result<BaselineRun> {
    scenario.validate()?;
    let runner = ForestGrowthRunner::from_scenario(scenario)?;

    let trajectory = runner.simulate(scenario.parameters.clone())?;
    let metrics = extract_metrics(&trajectory, scenario.reporting_threshold);
    info!(
        "Baseline: max_growth = {:.3}, threshold_year = {}",
        metrics.max_growth, metrics.threshold_year
    );

    Ok(BaselineRun {
        trajectory,
        metrics,
    })
}

/// Sample the parameters, evaluate the Saltelli design and estimate the
/// Sobol indices of every metric
pub fn run_sensitivity(scenario: &Scenario) -> Result<SobolReport> {
    scenario.validate()?;
    let runner = ForestGrowthRunner::from_scenario(scenario)?;
    let params = scenario.parameter_set()?;

    let (x1, x2) = generate_base_samples(
        &params,
        scenario.sensitivity.sample_count,
        scenario.sensitivity.seed,
    )?;
    let design = SaltelliDesign::new(x1, x2)?;
    info!(
        "Sensitivity sweep over {} parameters with N = {} ({} model runs)",
        design.n_params(),
        design.n_samples(),
        design.n_runs()
    );

    Ok(scenario.analysis().run(&runner, &design)?)
}
