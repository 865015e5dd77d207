//! Scalar summaries of a forest growth trajectory

use canopy_core::timeseries::{FloatValue, Time};
use canopy_core::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary statistics of a single trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Largest stock over the whole trajectory, including the initial point
    pub max_growth: FloatValue,
    /// Time of the first point strictly above the reporting threshold.
    ///
    /// If the threshold is never exceeded this is the final simulated time.
    pub threshold_year: Time,
}

/// A scalar metric that can be read from a [`MetricRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MaxGrowth,
    ThresholdYear,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::MaxGrowth, Metric::ThresholdYear];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::MaxGrowth => "max_growth",
            Metric::ThresholdYear => "threshold_year",
        }
    }

    pub fn value(&self, record: &MetricRecord) -> FloatValue {
        match self {
            Metric::MaxGrowth => record.max_growth,
            Metric::ThresholdYear => record.threshold_year,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reduce a trajectory to its [`MetricRecord`]
pub fn extract_metrics(trajectory: &Trajectory, reporting_threshold: FloatValue) -> MetricRecord {
    let max_growth = trajectory
        .values()
        .iter()
        .copied()
        .fold(FloatValue::NEG_INFINITY, FloatValue::max);

    let (final_time, _) = trajectory.last();
    let threshold_year = trajectory
        .iter()
        .find(|(_, stock)| *stock > reporting_threshold)
        .map(|(t, _)| t)
        .unwrap_or(final_time);

    MetricRecord {
        max_growth,
        threshold_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::timeseries::TimeAxis;
    use ndarray::array;

    fn trajectory(values: ndarray::Array1<f64>) -> Trajectory {
        let axis = TimeAxis::regular(0.0, (values.len() - 1) as f64, 1.0).unwrap();
        Trajectory::new(axis, values).unwrap()
    }

    #[test]
    fn test_first_crossing_is_strict() {
        let traj = trajectory(array![10.0, 50.0, 50.1, 80.0]);
        let record = extract_metrics(&traj, 50.0);
        assert_eq!(record.threshold_year, 2.0);
        assert_eq!(record.max_growth, 80.0);
    }

    #[test]
    fn test_sentinel_when_never_crossed() {
        let traj = trajectory(array![10.0, 20.0, 30.0]);
        let record = extract_metrics(&traj, 100.0);
        assert_eq!(record.threshold_year, 2.0);
        assert_eq!(record.max_growth, 30.0);
    }

    #[test]
    fn test_max_includes_initial_point() {
        let traj = trajectory(array![90.0, 60.0, 70.0]);
        let record = extract_metrics(&traj, 50.0);
        assert_eq!(record.max_growth, 90.0);
        assert_eq!(record.threshold_year, 0.0);
    }

    #[test]
    fn test_single_point() {
        let traj = trajectory(array![10.0]);
        let record = extract_metrics(&traj, 50.0);
        assert_eq!(record.max_growth, 10.0);
        assert_eq!(record.threshold_year, 0.0);
    }

    #[test]
    fn test_metric_accessors() {
        let record = MetricRecord {
            max_growth: 180.0,
            threshold_year: 161.0,
        };
        assert_eq!(Metric::MaxGrowth.value(&record), 180.0);
        assert_eq!(Metric::ThresholdYear.value(&record), 161.0);
        assert_eq!(Metric::ThresholdYear.to_string(), "threshold_year");
    }
}
