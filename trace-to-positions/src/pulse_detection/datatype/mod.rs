use super::Real;
use std::fmt::Debug;

pub(crate) mod tracepoint;

pub(crate) use tracepoint::TracePoint;

/// This trait abstracts any type used as a time variable.
/// Sample indices and physical times are both temporal.
pub(crate) trait Temporal: Default + Copy + Debug + PartialEq {}

impl Temporal for usize {}

impl Temporal for Real {}
