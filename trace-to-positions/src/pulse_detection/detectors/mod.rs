pub(crate) mod prominence_detector;
pub(crate) mod threshold_detector;

use super::TracePoint;

pub(crate) use prominence_detector::find_pulse_candidates;
pub(crate) use threshold_detector::{ThresholdDetector, ThresholdDuration};

/// A detector consumes a trace one point at a time and reports an event
/// whenever its trigger condition is satisfied.
pub(crate) trait Detector: Clone {
    type TracePointType: TracePoint;
    type EventPointType;

    fn signal(
        &mut self,
        time: <Self::TracePointType as TracePoint>::Time,
        value: <Self::TracePointType as TracePoint>::Value,
    ) -> Option<Self::EventPointType>;
}
