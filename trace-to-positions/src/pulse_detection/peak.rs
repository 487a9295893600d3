use super::{
    EventFilter, Real,
    detectors::{ThresholdDetector, ThresholdDuration},
};
use crate::error::{Indeterminate, Outcome};
use clap::ValueEnum;
use itertools::Itertools;
use std::ops::Range;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, strum::Display)]
pub enum Polarity {
    #[default]
    #[strum(to_string = "positive")]
    Positive,
    #[strum(to_string = "negative")]
    Negative,
}

impl Polarity {
    pub fn sign(self) -> Real {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }
}

/// The first pulse found in a region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    /// The local maximum reached by climbing the pulse from its egress.
    pub peak_index: usize,
    /// The first sample strictly above the threshold.
    pub egress_index: usize,
}

#[derive(Debug, Clone)]
pub struct PeakDetector {
    trigger: ThresholdDuration,
}

impl PeakDetector {
    pub fn new(threshold: Real) -> Self {
        Self::with_duration(threshold, 1)
    }

    /// Requires `duration` consecutive samples above threshold before a pulse registers.
    pub fn with_duration(threshold: Real, duration: usize) -> Self {
        Self {
            trigger: ThresholdDuration {
                threshold,
                duration,
            },
        }
    }

    pub fn threshold(&self) -> Real {
        self.trigger.threshold
    }

    /// Scans the baseline-corrected `voltage` within `roi`, in increasing index order.
    /// Indices of `roi` beyond the end of the waveform are ignored.
    pub fn find(&self, voltage: &[Real], roi: Range<usize>) -> Outcome<Peak> {
        let end = roi.end.min(voltage.len());
        let start = roi.start.min(end);
        let window = voltage.get(start..end).unwrap_or_default();

        let egress_index = window
            .iter()
            .copied()
            .enumerate()
            .map(|(i, v)| (start + i, v))
            .events(ThresholdDetector::new(&self.trigger))
            .next()
            .ok_or(Indeterminate::NoPeakFound)?;

        let peak_index = window
            .iter()
            .enumerate()
            .skip(egress_index - start)
            .tuple_windows()
            .take_while(|((_, before), (_, after))| after > before)
            .last()
            .map(|(_, (i, _))| start + i)
            .unwrap_or(egress_index);

        Ok(Peak {
            peak_index,
            egress_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_above_maximum_finds_nothing() {
        let voltage = [0.0, 3.0, 9.0, 4.0, 1.0];
        let max = voltage.iter().copied().fold(Real::MIN, Real::max);
        for roi in [0..5, 1..3, 2..2, 0..100] {
            assert_eq!(
                PeakDetector::new(max + 0.1).find(&voltage, roi),
                Err(Indeterminate::NoPeakFound)
            );
        }
        assert_eq!(
            PeakDetector::new(max).find(&voltage, 0..5),
            Err(Indeterminate::NoPeakFound)
        );
    }

    #[test]
    fn first_crossing_and_climb_to_peak() {
        let voltage = [0.0, 1.0, 5.0, 7.0, 8.0, 6.0, 9.0, 2.0];
        let peak = PeakDetector::new(4.0).find(&voltage, 0..8).unwrap();
        assert_eq!(
            peak,
            Peak {
                peak_index: 4,
                egress_index: 2
            }
        );
    }

    #[test]
    fn roi_excludes_earlier_pulses() {
        let voltage = [0.0, 9.0, 0.0, 0.0, 5.0, 6.0, 0.0];
        let peak = PeakDetector::new(4.0).find(&voltage, 2..7).unwrap();
        assert_eq!(peak.egress_index, 4);
        assert_eq!(peak.peak_index, 5);
    }

    #[test]
    fn climb_stops_at_roi_end() {
        let voltage = [0.0, 5.0, 6.0, 7.0, 8.0];
        let peak = PeakDetector::new(4.0).find(&voltage, 0..3).unwrap();
        assert_eq!(peak.egress_index, 1);
        assert_eq!(peak.peak_index, 2);
    }

    #[test]
    fn flat_top_peak_is_its_first_sample() {
        let voltage = [0.0, 5.0, 8.0, 8.0, 8.0, 1.0];
        let peak = PeakDetector::new(4.0).find(&voltage, 0..6).unwrap();
        assert_eq!(peak.peak_index, 2);
    }

    #[test]
    fn crossing_on_last_sample() {
        let voltage = [0.0, 0.0, 5.0];
        let peak = PeakDetector::new(4.0).find(&voltage, 0..3).unwrap();
        assert_eq!(peak.peak_index, 2);
        assert_eq!(peak.egress_index, 2);
    }

    #[test]
    fn duration_rejects_single_sample_spike() {
        let voltage = [0.0, 9.0, 0.0, 5.0, 6.0, 0.0];
        let peak = PeakDetector::with_duration(4.0, 2)
            .find(&voltage, 0..6)
            .unwrap();
        assert_eq!(peak.egress_index, 3);
    }

    #[test]
    fn negative_polarity_sign() {
        assert_eq!(Polarity::Negative.sign(), -1.0);
        assert_eq!(Polarity::Positive.to_string(), "positive");
    }
}
