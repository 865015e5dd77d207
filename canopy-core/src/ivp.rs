//! Initial value problems solved with an adaptive Dormand-Prince integrator.
//!
//! Components describe their right-hand side through the [`IVP`] trait and use
//! [`IVPBuilder`] to advance their state between two output times.

use crate::errors::{CanopyError, CanopyResult};
use crate::timeseries::{FloatValue, Time};
use is_close::is_close;
use ode_solvers::{Dopri5, System, Vector1};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// State of a single-variable problem
pub type ScalarState = Vector1<FloatValue>;

/// Right-hand side of an initial value problem `dy/dt = f(t, y)`.
pub trait IVP<T, S> {
    fn calculate_dy_dt(&self, t: T, y: &S, dy_dt: &mut S);
}

/// Tolerances passed through to the Dormand-Prince integrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Relative tolerance of the local error estimate
    pub rtol: FloatValue,
    /// Absolute tolerance of the local error estimate
    pub atol: FloatValue,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-8,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> CanopyResult<()> {
        if !(self.rtol > 0.0) || !self.rtol.is_finite() {
            return Err(CanopyError::invalid_parameter(
                "rtol",
                self.rtol,
                "must be positive",
            ));
        }
        if !(self.atol > 0.0) || !self.atol.is_finite() {
            return Err(CanopyError::invalid_parameter(
                "atol",
                self.atol,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Couples a component with its initial state so that it can be handed to the solver
pub struct IVPBuilder<C> {
    component: Arc<C>,
    y0: ScalarState,
}

impl<C> System<Time, ScalarState> for IVPBuilder<C>
where
    C: IVP<Time, ScalarState>,
{
    fn system(&self, t: Time, y: &ScalarState, dy: &mut ScalarState) {
        self.component.calculate_dy_dt(t, y, dy)
    }
}

impl<C> IVPBuilder<C>
where
    C: IVP<Time, ScalarState>,
{
    pub fn new(component: Arc<C>, y0: ScalarState) -> Self {
        Self { component, y0 }
    }

    /// Integrate from `t_current` to `t_next` and return the state at `t_next`.
    ///
    /// Dense output is emitted on a grid accumulated from `t_current`, so the
    /// integration runs half a step past `t_next` to guarantee a sample there.
    pub fn integrate(
        self,
        t_current: Time,
        t_next: Time,
        options: &SolverOptions,
    ) -> CanopyResult<ScalarState> {
        let dt = t_next - t_current;
        if !(dt > 0.0) {
            return Err(CanopyError::InvalidTimeGrid(format!(
                "cannot integrate from {} to {}",
                t_current, t_next
            )));
        }

        let y0 = self.y0;
        let mut solver = Dopri5::new(
            self,
            t_current,
            t_next + 0.5 * dt,
            dt,
            y0,
            options.rtol,
            options.atol,
        );
        solver
            .integrate()
            .map_err(|e| CanopyError::NumericalInstability {
                time: t_current,
                reason: format!("{:?}", e),
            })?;

        let (times, states) = solver.results().get();
        let state = get_step(times, states, t_next).ok_or_else(|| {
            CanopyError::NumericalInstability {
                time: t_current,
                reason: format!("solver produced no output at t={}", t_next),
            }
        })?;

        if !state[0].is_finite() {
            return Err(CanopyError::NumericalInstability {
                time: t_current,
                reason: format!("non-finite state {} at t={}", state[0], t_next),
            });
        }
        Ok(state)
    }
}

/// Find the solver output at `t_expected`
pub fn get_step<S: Clone>(times: &[Time], states: &[S], t_expected: Time) -> Option<S> {
    times
        .iter()
        .zip(states.iter())
        .rev()
        .find(|(t, _)| is_close!(**t, t_expected))
        .map(|(_, y)| y.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dy/dt = -k y
    struct Decay {
        k: FloatValue,
    }

    impl IVP<Time, ScalarState> for Decay {
        fn calculate_dy_dt(&self, _t: Time, y: &ScalarState, dy_dt: &mut ScalarState) {
            dy_dt[0] = -self.k * y[0];
        }
    }

    #[test]
    fn exponential_decay_matches_closed_form() {
        let builder = IVPBuilder::new(Arc::new(Decay { k: 0.5 }), ScalarState::new(2.0));
        let y = builder
            .integrate(0.0, 3.0, &SolverOptions::default())
            .unwrap();
        let expected = 2.0 * (-0.5_f64 * 3.0).exp();
        assert!((y[0] - expected).abs() < 1e-6, "{} != {}", y[0], expected);
    }

    #[test]
    fn fractional_segment() {
        let builder = IVPBuilder::new(Arc::new(Decay { k: 1.0 }), ScalarState::new(1.0));
        let y = builder
            .integrate(0.1, 0.3, &SolverOptions::default())
            .unwrap();
        let expected = (-0.2_f64).exp();
        assert!((y[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn rejects_backwards_segment() {
        let builder = IVPBuilder::new(Arc::new(Decay { k: 1.0 }), ScalarState::new(1.0));
        let result = builder.integrate(1.0, 1.0, &SolverOptions::default());
        assert!(matches!(result, Err(CanopyError::InvalidTimeGrid(_))));
    }

    #[test]
    fn get_step_picks_matching_time() {
        let times = vec![0.0, 1.0, 2.0];
        let states = vec![10.0, 11.0, 12.0];
        assert_eq!(get_step(&times, &states, 1.0), Some(11.0));
        assert_eq!(get_step(&times, &states, 1.5), None);
    }

    #[test]
    fn invalid_tolerances() {
        let options = SolverOptions {
            rtol: 0.0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
        assert!(SolverOptions::default().validate().is_ok());
    }
}
