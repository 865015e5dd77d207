//! Forest growth component
//!
//! A single-pool model of forest carbon that grows exponentially while the
//! canopy is open and saturates towards a carrying capacity once it closes.

use canopy_core::errors::{CanopyError, CanopyResult};
use canopy_core::ivp::{IVPBuilder, ScalarState, SolverOptions, IVP};
use canopy_core::timeseries::{FloatValue, Time, TimeAxis};
use canopy_core::trajectory::Trajectory;
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const VAR_PRE_CLOSURE_RATE: &str = "pre_closure_rate";
const VAR_POST_CLOSURE_RATE: &str = "post_closure_rate";
const VAR_CANOPY_THRESHOLD: &str = "canopy_threshold";
const VAR_CARRYING_CAPACITY: &str = "carrying_capacity";

/// Parameters for the forest growth component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestGrowthParameters {
    /// Exponential growth rate before canopy closure (r)
    /// unit: 1 / yr
    pub pre_closure_rate: FloatValue,
    /// Linear growth rate after canopy closure (g)
    /// unit: kg C / yr
    pub post_closure_rate: FloatValue,
    /// Carbon stock at which the canopy closes
    /// unit: kg C
    pub canopy_threshold: FloatValue,
    /// Asymptotic carbon stock after canopy closure (K)
    /// unit: kg C
    pub carrying_capacity: FloatValue,
}

impl Default for ForestGrowthParameters {
    fn default() -> Self {
        Self {
            pre_closure_rate: 0.01,
            post_closure_rate: 2.0,
            canopy_threshold: 50.0,
            carrying_capacity: 250.0,
        }
    }
}

impl ForestGrowthParameters {
    /// Parameter names in the order used by [`Self::to_values`] and [`Self::from_values`]
    pub const NAMES: [&'static str; 4] = [
        VAR_PRE_CLOSURE_RATE,
        VAR_POST_CLOSURE_RATE,
        VAR_CANOPY_THRESHOLD,
        VAR_CARRYING_CAPACITY,
    ];

    pub fn to_values(&self) -> [FloatValue; 4] {
        [
            self.pre_closure_rate,
            self.post_closure_rate,
            self.canopy_threshold,
            self.carrying_capacity,
        ]
    }

    /// Build a parameter set from values ordered as [`Self::NAMES`]
    pub fn from_values(values: &[FloatValue]) -> CanopyResult<Self> {
        match values {
            [r, g, threshold, k] => Ok(Self {
                pre_closure_rate: *r,
                post_closure_rate: *g,
                canopy_threshold: *threshold,
                carrying_capacity: *k,
            }),
            _ => Err(CanopyError::invalid_parameter(
                "parameters",
                values.len() as FloatValue,
                format!("expected {} values", Self::NAMES.len()),
            )),
        }
    }

    /// Check that the parameters describe a physically valid forest.
    ///
    /// All values must be finite and non-negative, and the carrying capacity
    /// strictly positive.
    pub fn validate(&self) -> CanopyResult<()> {
        for (name, value) in Self::NAMES.iter().zip(self.to_values()) {
            if !value.is_finite() {
                return Err(CanopyError::invalid_parameter(name, value, "must be finite"));
            }
            if value < 0.0 {
                return Err(CanopyError::invalid_parameter(
                    name,
                    value,
                    "must be non-negative",
                ));
            }
        }
        if self.carrying_capacity <= 0.0 {
            return Err(CanopyError::invalid_parameter(
                VAR_CARRYING_CAPACITY,
                self.carrying_capacity,
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn regime(&self, stock: FloatValue) -> GrowthRegime {
        if stock < self.canopy_threshold {
            GrowthRegime::PreClosure
        } else {
            GrowthRegime::PostClosure
        }
    }
}

/// Which branch of the growth law applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthRegime {
    PreClosure,
    PostClosure,
}

/// Instantaneous rate of change of carbon stock.
///
/// $$ \frac{dC}{dt} = \begin{cases} r C & C < C_{thresh} \\\\ g (1 - C / K) & C \geq C_{thresh} \end{cases} $$
///
/// Fails if the carrying capacity is not strictly positive.
pub fn growth_rate(
    stock: FloatValue,
    parameters: &ForestGrowthParameters,
) -> CanopyResult<FloatValue> {
    if !(parameters.carrying_capacity > 0.0) {
        return Err(CanopyError::invalid_parameter(
            VAR_CARRYING_CAPACITY,
            parameters.carrying_capacity,
            "must be greater than zero",
        ));
    }
    Ok(unchecked_growth_rate(stock, parameters))
}

fn unchecked_growth_rate(stock: FloatValue, parameters: &ForestGrowthParameters) -> FloatValue {
    match parameters.regime(stock) {
        GrowthRegime::PreClosure => parameters.pre_closure_rate * stock,
        GrowthRegime::PostClosure => {
            parameters.post_closure_rate * (1.0 - stock / parameters.carrying_capacity)
        }
    }
}

/// Piecewise forest growth model
///
/// The governing equation is:
/// $$ \frac{dC}{dt} = \begin{cases} r C & C < C_{thresh} \\\\ g (1 - C / K) & C \geq C_{thresh} \end{cases} $$
///
/// Where:
/// - $C$ is the forest carbon stock
/// - $r$ is the pre-closure exponential growth rate
/// - $g$ is the post-closure linear growth rate
/// - $C_{thresh}$ is the canopy closure threshold
/// - $K$ is the carrying capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestGrowth {
    parameters: ForestGrowthParameters,
    solver_options: SolverOptions,
}

impl ForestGrowth {
    /// Create a new forest growth component, validating the parameters
    pub fn from_parameters(parameters: ForestGrowthParameters) -> CanopyResult<Self> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            solver_options: SolverOptions::default(),
        })
    }

    /// Set custom solver options
    pub fn with_solver_options(self, solver_options: SolverOptions) -> CanopyResult<Self> {
        solver_options.validate()?;
        Ok(Self {
            parameters: self.parameters,
            solver_options,
        })
    }

    pub fn parameters(&self) -> &ForestGrowthParameters {
        &self.parameters
    }

    /// Growth rate at a given stock using the validated parameters
    pub fn rate(&self, stock: FloatValue) -> FloatValue {
        unchecked_growth_rate(stock, &self.parameters)
    }

    /// Integrate the model from `initial_stock` over every time in `time_axis`.
    ///
    /// The first point of the returned trajectory is `initial_stock` at the
    /// first time of the axis.
    pub fn simulate(
        &self,
        initial_stock: FloatValue,
        time_axis: &TimeAxis,
    ) -> CanopyResult<Trajectory> {
        if !initial_stock.is_finite() || initial_stock < 0.0 {
            return Err(CanopyError::invalid_parameter(
                "initial_stock",
                initial_stock,
                "must be finite and non-negative",
            ));
        }

        let component = Arc::new(self.clone());
        let mut values = Vec::with_capacity(time_axis.len());
        values.push(initial_stock);

        let mut stock = initial_stock;
        for (t_current, t_next) in time_axis.steps() {
            let solver = IVPBuilder::new(Arc::clone(&component), ScalarState::new(stock));
            stock = solver.integrate(t_current, t_next, &self.solver_options)?[0];
            values.push(stock);
        }

        debug!(
            "Simulated {} steps, final stock {:.3}",
            time_axis.len() - 1,
            stock
        );
        Trajectory::new(time_axis.clone(), Array1::from_vec(values))
    }
}

impl IVP<Time, ScalarState> for ForestGrowth {
    fn calculate_dy_dt(&self, _t: Time, y: &ScalarState, dy_dt: &mut ScalarState) {
        dy_dt[0] = self.rate(y[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    fn default_component() -> ForestGrowth {
        ForestGrowth::from_parameters(ForestGrowthParameters::default()).unwrap()
    }

    #[test]
    fn test_growth_rate_below_threshold() {
        let params = ForestGrowthParameters::default();
        let rate = growth_rate(20.0, &params).unwrap();
        assert!(is_close!(rate, 0.2), "Expected 0.2, got {}", rate);
    }

    #[test]
    fn test_growth_rate_at_and_above_threshold() {
        let params = ForestGrowthParameters::default();
        // At the threshold the post-closure branch applies
        let rate = growth_rate(50.0, &params).unwrap();
        assert!(is_close!(rate, 1.6), "Expected 1.6, got {}", rate);

        let rate = growth_rate(250.0, &params).unwrap();
        assert!(rate.abs() < 1e-12, "Expected zero growth at K, got {}", rate);
    }

    #[test]
    fn test_growth_rate_zero_capacity_fails() {
        let params = ForestGrowthParameters {
            carrying_capacity: 0.0,
            ..Default::default()
        };
        let result = growth_rate(100.0, &params);
        assert!(matches!(
            result,
            Err(CanopyError::InvalidParameter { ref name, .. }) if name == "carrying_capacity"
        ));
    }

    #[test]
    fn test_validate() {
        assert!(ForestGrowthParameters::default().validate().is_ok());

        let negative = ForestGrowthParameters {
            pre_closure_rate: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let nan = ForestGrowthParameters {
            post_closure_rate: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let zero_capacity = ForestGrowthParameters {
            carrying_capacity: 0.0,
            ..Default::default()
        };
        assert!(ForestGrowth::from_parameters(zero_capacity).is_err());
    }

    #[test]
    fn test_values_round_trip_in_name_order() {
        let params = ForestGrowthParameters::default();
        let values = params.to_values();
        assert_eq!(values, [0.01, 2.0, 50.0, 250.0]);
        assert_eq!(ForestGrowthParameters::from_values(&values).unwrap(), params);
        assert!(ForestGrowthParameters::from_values(&values[..3]).is_err());
    }

    #[test]
    fn test_initial_point_is_exact() {
        let component = default_component();
        let axis = TimeAxis::regular(0.0, 10.0, 1.0).unwrap();
        let trajectory = component.simulate(10.0, &axis).unwrap();

        assert_eq!(trajectory.len(), 11);
        assert_eq!(trajectory.first(), (0.0, 10.0));
    }

    #[test]
    fn test_exponential_regime_matches_closed_form() {
        let component = default_component();
        let axis = TimeAxis::regular(0.0, 100.0, 1.0).unwrap();
        let trajectory = component.simulate(10.0, &axis).unwrap();

        // 10 * exp(0.01 * 100) stays below the threshold of 50
        let expected = 10.0 * (0.01_f64 * 100.0).exp();
        let (_, value) = trajectory.last();
        assert!(
            (value - expected).abs() < 1e-4,
            "Expected {}, got {}",
            expected,
            value
        );
    }

    #[test]
    fn test_no_growth_with_zero_rate() {
        let component = ForestGrowth::from_parameters(ForestGrowthParameters {
            pre_closure_rate: 0.0,
            ..Default::default()
        })
        .unwrap();
        let axis = TimeAxis::regular(0.0, 50.0, 1.0).unwrap();
        let trajectory = component.simulate(10.0, &axis).unwrap();

        assert!(trajectory.values().iter().all(|v| *v == 10.0));
    }

    #[test]
    fn test_negative_initial_stock_rejected() {
        let component = default_component();
        let axis = TimeAxis::regular(0.0, 10.0, 1.0).unwrap();
        assert!(component.simulate(-1.0, &axis).is_err());
    }

    #[test]
    fn test_single_time_axis() {
        let component = default_component();
        let axis = TimeAxis::regular(0.0, 0.0, 1.0).unwrap();
        let trajectory = component.simulate(10.0, &axis).unwrap();
        assert_eq!(trajectory.len(), 1);
    }

    #[test]
    fn test_regime() {
        let params = ForestGrowthParameters::default();
        assert_eq!(params.regime(49.9), GrowthRegime::PreClosure);
        assert_eq!(params.regime(50.0), GrowthRegime::PostClosure);
    }
}
