//! Forest growth simulation and Sobol sensitivity analysis.
//!
//! The model itself lives in `canopy-components` and the sensitivity machinery in
//! `canopy-sobol`. This crate wires them together around a [`config::Scenario`]
//! and renders the results.

pub mod config;
pub mod errors;
pub mod pipeline;
pub mod report;
pub mod runner;

pub use errors::{Error, Result};
