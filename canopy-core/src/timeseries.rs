use crate::errors::{CanopyError, CanopyResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
pub type Time = f64;

/// An ordered set of output times.
///
/// Times are strictly increasing and there is always at least one of them,
/// the first being the initial time of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeAxis")]
pub struct TimeAxis {
    values: Array1<Time>,
}

/// Unvalidated serialised form of a [`TimeAxis`]
#[derive(Deserialize)]
struct RawTimeAxis {
    values: Array1<Time>,
}

impl TryFrom<RawTimeAxis> for TimeAxis {
    type Error = CanopyError;

    fn try_from(raw: RawTimeAxis) -> CanopyResult<Self> {
        Self::from_values(raw.values)
    }
}

impl TimeAxis {
    /// Create a time axis from explicit values
    pub fn from_values(values: Array1<Time>) -> CanopyResult<Self> {
        if values.is_empty() {
            return Err(CanopyError::InvalidTimeGrid(
                "at least one time is required".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|t| !t.is_finite()) {
            return Err(CanopyError::InvalidTimeGrid(format!(
                "non-finite time {}",
                bad
            )));
        }
        for (i, pair) in values.windows(2).into_iter().enumerate() {
            if pair[1] <= pair[0] {
                return Err(CanopyError::InvalidTimeGrid(format!(
                    "times must be strictly increasing, got {} followed by {} at index {}",
                    pair[0],
                    pair[1],
                    i + 1
                )));
            }
        }
        Ok(Self { values })
    }

    /// Create an evenly spaced axis covering `[start, end]` inclusive.
    ///
    /// The final time is `end` exactly when `end - start` is a multiple of
    /// `step`; otherwise the axis stops at the last step before `end`.
    pub fn regular(start: Time, end: Time, step: Time) -> CanopyResult<Self> {
        if !(step > 0.0) || !step.is_finite() {
            return Err(CanopyError::InvalidTimeGrid(format!(
                "step must be positive, got {}",
                step
            )));
        }
        if !(end >= start) {
            return Err(CanopyError::InvalidTimeGrid(format!(
                "end ({}) must not precede start ({})",
                end, start
            )));
        }
        // Guard against `(end - start) / step` landing a hair under an integer
        let n_steps = ((end - start) / step + 1e-9).floor() as usize;
        let values = Array1::from_iter((0..=n_steps).map(|i| start + i as Time * step));

        Self::from_values(values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Time {
        self.values[0]
    }

    pub fn last(&self) -> Time {
        self.values[self.values.len() - 1]
    }

    pub fn values(&self) -> &Array1<Time> {
        &self.values
    }

    /// Iterate over consecutive `(t_current, t_next)` pairs
    pub fn steps(&self) -> impl Iterator<Item = (Time, Time)> + '_ {
        self.values
            .iter()
            .zip(self.values.iter().skip(1))
            .map(|(a, b)| (*a, *b))
    }
}
