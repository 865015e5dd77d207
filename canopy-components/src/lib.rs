//! Components of the canopy forest-growth model
//!
//! - `components`: the piecewise forest growth ODE
//! - `metrics`: reduction of trajectories to scalar summary statistics

pub mod components;
pub mod metrics;
