use super::Temporal;
use std::fmt::Debug;

/// An abstraction of the points processed by the windows and detectors.
/// A trace point pairs a time (or sample index) with a value.
pub(crate) trait TracePoint: Clone {
    /// The type which represents the time of the data point.
    /// This should be trivially copyable (usually a scalar).
    type Time: Temporal;

    /// The type which contains the value of the data point.
    type Value: Copy + Debug;

    /// Returns the time of the data point.
    fn get_time(&self) -> Self::Time;

    /// Returns the value of the data point.
    fn get_value(&self) -> Self::Value;
}

/// The first element is the time and the second the value.
impl<X, Y> TracePoint for (X, Y)
where
    X: Temporal,
    Y: Copy + Debug,
{
    type Time = X;
    type Value = Y;

    fn get_time(&self) -> Self::Time {
        self.0
    }

    fn get_value(&self) -> Self::Value {
        self.1
    }
}
