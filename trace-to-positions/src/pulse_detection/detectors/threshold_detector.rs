use super::{super::Real, Detector};

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct ThresholdDuration {
    /// A sample registers when its value is strictly greater than this.
    pub threshold: Real,
    /// The number of consecutive samples that must register. Zero is treated as one.
    pub duration: usize,
}

/// Reports the index of the first sample of each run of `duration`
/// consecutive samples above the threshold.
#[derive(Default, Clone)]
pub(crate) struct ThresholdDetector {
    run: usize,
    trigger: ThresholdDuration,
}

impl ThresholdDetector {
    pub(crate) fn new(trigger: &ThresholdDuration) -> Self {
        Self {
            trigger: ThresholdDuration {
                duration: trigger.duration.max(1),
                ..*trigger
            },
            run: 0,
        }
    }
}

impl Detector for ThresholdDetector {
    type TracePointType = (usize, Real);
    type EventPointType = usize;

    fn signal(&mut self, index: usize, value: Real) -> Option<usize> {
        if value > self.trigger.threshold {
            self.run += 1;
            (self.run == self.trigger.duration).then(|| index + 1 - self.trigger.duration)
        } else {
            self.run = 0;
            None
        }
    }
}
