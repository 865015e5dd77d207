use crate::errors::{CanopyError, CanopyResult};
use crate::timeseries::{FloatValue, Time, TimeAxis};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// The solved state of a single-variable model on a [`TimeAxis`].
///
/// A trajectory always has one value per time in its axis and therefore at
/// least one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrajectory")]
pub struct Trajectory {
    time_axis: TimeAxis,
    values: Array1<FloatValue>,
}

/// Unvalidated serialised form of a [`Trajectory`]
#[derive(Deserialize)]
struct RawTrajectory {
    time_axis: TimeAxis,
    values: Array1<FloatValue>,
}

impl TryFrom<RawTrajectory> for Trajectory {
    type Error = CanopyError;

    fn try_from(raw: RawTrajectory) -> CanopyResult<Self> {
        Self::new(raw.time_axis, raw.values)
    }
}

impl Trajectory {
    pub fn new(time_axis: TimeAxis, values: Array1<FloatValue>) -> CanopyResult<Self> {
        if time_axis.len() != values.len() {
            return Err(CanopyError::InvalidTimeGrid(format!(
                "{} values supplied for {} times",
                values.len(),
                time_axis.len()
            )));
        }
        Ok(Self { time_axis, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn times(&self) -> &Array1<Time> {
        self.time_axis.values()
    }

    pub fn values(&self) -> &Array1<FloatValue> {
        &self.values
    }

    /// Value at an exact time on the axis
    pub fn at_time(&self, time: Time) -> Option<FloatValue> {
        self.times()
            .iter()
            .position(|t| *t == time)
            .map(|i| self.values[i])
    }

    pub fn first(&self) -> (Time, FloatValue) {
        (self.time_axis.first(), self.values[0])
    }

    pub fn last(&self) -> (Time, FloatValue) {
        (self.time_axis.last(), self.values[self.values.len() - 1])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, FloatValue)> + '_ {
        self.times()
            .iter()
            .zip(self.values.iter())
            .map(|(t, v)| (*t, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn trajectory() -> Trajectory {
        let axis = TimeAxis::from_values(array![0.0, 1.0, 2.0]).unwrap();
        Trajectory::new(axis, array![10.0, 12.0, 15.0]).unwrap()
    }

    #[test]
    fn length_must_match_axis() {
        let axis = TimeAxis::from_values(array![0.0, 1.0]).unwrap();
        assert!(Trajectory::new(axis, array![1.0]).is_err());
    }

    #[test]
    fn accessors() {
        let traj = trajectory();
        assert_eq!(traj.len(), 3);
        assert_eq!(traj.first(), (0.0, 10.0));
        assert_eq!(traj.last(), (2.0, 15.0));
        assert_eq!(traj.at_time(1.0), Some(12.0));
        assert_eq!(traj.at_time(1.5), None);
        assert_eq!(
            traj.iter().collect::<Vec<_>>(),
            vec![(0.0, 10.0), (1.0, 12.0), (2.0, 15.0)]
        );
    }

    #[test]
    fn serialisation_round_trip() {
        let traj = trajectory();
        let serialised = serde_json::to_string(&traj).unwrap();
        let deserialised: Trajectory = serde_json::from_str(&serialised).unwrap();
        assert_eq!(traj, deserialised);
    }

    #[test]
    fn deserialisation_checks_lengths() {
        let mut raw = serde_json::to_value(trajectory()).unwrap();
        raw["values"] = serde_json::to_value(array![1.0]).unwrap();
        assert!(serde_json::from_value::<Trajectory>(raw).is_err());
    }
}
