use super::Real;
use crate::error::{Outcome, ParameterError, RisetimeFailure};
use itertools::Itertools;

/// Times the moment a pulse's leading edge reaches a fixed fraction of its peak amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RisetimeCalculator {
    fraction: Real,
}

impl RisetimeCalculator {
    pub fn new(fraction: Real) -> Result<Self, ParameterError> {
        if fraction > 0.0 && fraction <= 1.0 {
            Ok(Self { fraction })
        } else {
            Err(ParameterError::FractionOutOfRange(fraction))
        }
    }

    pub fn fraction(&self) -> Real {
        self.fraction
    }

    /// The leading edge is the strictly increasing run of samples ending at `peak_index`.
    /// The result is interpolated linearly between the first pair of edge samples
    /// that brackets the target amplitude, so it is in the units of `time`.
    pub fn calculate(&self, time: &[Real], voltage: &[Real], peak_index: usize) -> Outcome<Real> {
        let (Some(time), Some(voltage)) = (time.get(..=peak_index), voltage.get(..=peak_index))
        else {
            return Err(RisetimeFailure::PeakOutOfBounds.into());
        };
        let peak = voltage.last().copied().unwrap_or_default();
        if peak <= 0.0 {
            return Err(RisetimeFailure::NonPositivePeak.into());
        }

        let edge_len = 1 + voltage
            .iter()
            .rev()
            .tuple_windows()
            .take_while(|(later, earlier)| earlier < later)
            .count();
        if edge_len < 2 {
            return Err(RisetimeFailure::EdgeTooShort.into());
        }

        let target = self.fraction * peak;
        voltage
            .iter()
            .zip(time)
            .skip(voltage.len() - edge_len)
            .tuple_windows()
            .find(|((lo, _), (hi, _))| **lo < target && target <= **hi)
            .map(|((v_lo, t_lo), (v_hi, t_hi))| {
                t_lo + (target - v_lo) / (v_hi - v_lo) * (t_hi - t_lo)
            })
            .ok_or(RisetimeFailure::NoCrossing.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Indeterminate;
    use assert_approx_eq::assert_approx_eq;

    const TIME: [Real; 6] = [0.0, 0.5, 1.0, 1.5, 2.0, 2.5];

    fn failure(reason: RisetimeFailure) -> Outcome<Real> {
        Err(Indeterminate::RisetimeIndeterminate(reason))
    }

    #[test]
    fn fraction_must_lie_in_unit_interval() {
        assert!(RisetimeCalculator::new(0.25).is_ok());
        assert!(RisetimeCalculator::new(1.0).is_ok());
        for fraction in [0.0, -0.1, 1.01, Real::NAN] {
            assert!(RisetimeCalculator::new(fraction).is_err());
        }
    }

    #[test]
    fn interpolates_between_bracketing_samples() {
        let voltage = [0.0, 0.0, 2.0, 6.0, 10.0, 8.0];
        let risetime = RisetimeCalculator::new(0.25)
            .unwrap()
            .calculate(&TIME, &voltage, 4)
            .unwrap();
        // Target 2.5 lies between 2.0 at t=1.0 and 6.0 at t=1.5.
        assert_approx_eq!(risetime, 1.0625);
        assert!(risetime > TIME[2] && risetime < TIME[3]);
    }

    #[test]
    fn strictly_between_for_any_fraction_off_the_samples() {
        let voltage = [0.0, 1.0, 3.0, 7.0, 15.0, 4.0];
        for fraction in [0.1, 0.25, 0.3, 0.5, 0.9] {
            let risetime = RisetimeCalculator::new(fraction)
                .unwrap()
                .calculate(&TIME, &voltage, 4)
                .unwrap();
            let target = fraction * 15.0;
            let hi = voltage.iter().position(|&v| v >= target).unwrap();
            assert!(risetime > TIME[hi - 1] && risetime < TIME[hi]);
        }
    }

    #[test]
    fn full_fraction_is_the_peak_time() {
        let voltage = [0.0, 1.0, 3.0, 7.0, 15.0, 4.0];
        let risetime = RisetimeCalculator::new(1.0)
            .unwrap()
            .calculate(&TIME, &voltage, 4)
            .unwrap();
        assert_approx_eq!(risetime, TIME[4]);
    }

    #[test]
    fn edge_shorter_than_two_samples() {
        let calculator = RisetimeCalculator::new(0.25).unwrap();
        assert_eq!(
            calculator.calculate(&TIME, &[10.0, 10.0, 3.0], 1),
            failure(RisetimeFailure::EdgeTooShort)
        );
        assert_eq!(
            calculator.calculate(&TIME, &[10.0], 0),
            failure(RisetimeFailure::EdgeTooShort)
        );
    }

    #[test]
    fn edge_starting_above_target_has_no_crossing() {
        let calculator = RisetimeCalculator::new(0.25).unwrap();
        assert_eq!(
            calculator.calculate(&TIME, &[7.0, 5.0, 8.0, 9.0, 10.0], 4),
            failure(RisetimeFailure::NoCrossing)
        );
    }

    #[test]
    fn non_positive_or_missing_peak() {
        let calculator = RisetimeCalculator::new(0.25).unwrap();
        assert_eq!(
            calculator.calculate(&TIME, &[-3.0, -2.0, -1.0], 2),
            failure(RisetimeFailure::NonPositivePeak)
        );
        assert_eq!(
            calculator.calculate(&TIME, &[0.0, 1.0, 2.0], 3),
            failure(RisetimeFailure::PeakOutOfBounds)
        );
    }
}
