//! Estimates the DC offset of a channel from the parts of its pre-trigger
//! record that contain no pulse.
use super::{
    CandidateCriteria, Real, WindowFilter, detectors::find_pulse_candidates,
    window::GaussianWindow,
};
use crate::error::{Indeterminate, Outcome};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineSettings {
    /// Standard deviation of the Gaussian smoothing kernel, in samples.
    pub smoothing_sigma: Real,
    /// Extent of the smoothing kernel, in standard deviations.
    pub smoothing_truncate: Real,
    pub candidates: CandidateCriteria,
    /// Each candidate pulse masks this many pulse widths either side of its apex.
    pub mask_multiplier: Real,
}

impl Default for BaselineSettings {
    fn default() -> Self {
        Self {
            smoothing_sigma: 2.0,
            smoothing_truncate: 4.0,
            candidates: CandidateCriteria {
                min_prominence: 20.0,
                min_width: 5.0,
                min_distance: 8,
            },
            mask_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineLevel {
    pub mean: Real,
    pub std: Real,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineEstimate {
    pub level: Outcome<BaselineLevel>,
    pub smoothed: Vec<Real>,
    /// True for samples excluded from the baseline.
    pub mask: Vec<bool>,
}

impl BaselineEstimate {
    /// Subtracts the baseline mean from the raw voltages.
    pub fn correct(&self, voltage: &[Real]) -> Outcome<Vec<Real>> {
        let level = self.level.clone()?;
        Ok(voltage.iter().map(|v| v - level.mean).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BaselineEstimator {
    settings: BaselineSettings,
}

impl BaselineEstimator {
    pub fn new(settings: BaselineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BaselineSettings {
        &self.settings
    }

    pub fn estimate(&self, voltage: &[Real]) -> BaselineEstimate {
        let smoothed = smooth(
            voltage,
            self.settings.smoothing_sigma,
            self.settings.smoothing_truncate,
        );
        let mask = self.exclusion_mask(&smoothed);

        let unmasked = voltage
            .iter()
            .zip(&mask)
            .filter_map(|(v, &masked)| (!masked).then_some(*v))
            .collect::<Vec<_>>();

        let level = if unmasked.is_empty() {
            Err(Indeterminate::BaselineIndeterminate)
        } else {
            let n = unmasked.len() as Real;
            let mean = unmasked.iter().sum::<Real>() / n;
            let variance = unmasked.iter().map(|v| (v - mean).powi(2)).sum::<Real>() / n;
            Ok(BaselineLevel {
                mean,
                std: variance.sqrt(),
            })
        };
        BaselineEstimate {
            level,
            smoothed,
            mask,
        }
    }

    fn exclusion_mask(&self, smoothed: &[Real]) -> Vec<bool> {
        let len = smoothed.len();
        let mut mask = vec![false; len];

        let candidates = find_pulse_candidates(smoothed, &self.settings.candidates);
        trace!(num_candidates = candidates.len());
        for candidate in candidates {
            let half = (self.settings.mask_multiplier * candidate.width).floor() as usize;
            let start = candidate.index.saturating_sub(half);
            let end = candidate.index.saturating_add(half).min(len);
            mask.iter_mut()
                .take(end)
                .skip(start)
                .for_each(|m| *m = true);
        }

        // The post-trigger half of the record holds the pulses being timed.
        mask.iter_mut()
            .skip((len / 2).saturating_sub(1))
            .for_each(|m| *m = true);
        mask
    }
}

/// Gaussian smoothing with mirrored edges, returning a trace the same length as the input.
pub(crate) fn smooth(voltage: &[Real], sigma: Real, truncate: Real) -> Vec<Real> {
    if voltage.is_empty() {
        return Vec::new();
    }
    let window = GaussianWindow::new(sigma, truncate);
    let radius = window.radius() as isize;
    let len = voltage.len();

    (-radius..len as isize + radius)
        .map(|i| {
            let value = voltage.get(reflect(i, len)).copied().unwrap_or_default();
            (i as Real, value)
        })
        .window(window)
        .map(|(_, value)| value)
        .collect()
}

/// Maps an index onto `0..len` by mirroring about the edges: `... b a | a b c | c b ...`
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let folded = index.rem_euclid(2 * len);
    if folded < len {
        folded as usize
    } else {
        (2 * len - 1 - folded) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn noisy_trace(len: usize, offset: Real, seed: u64) -> Vec<Real> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len)
            .map(|_| offset + rng.random_range(-1.0..1.0))
            .collect()
    }

    fn add_pulse(trace: &mut [Real], apex: usize, height: Real, half_width: usize) {
        for (i, v) in trace.iter_mut().enumerate() {
            let distance = i.abs_diff(apex);
            if distance < half_width {
                *v += height * (1.0 - distance as Real / half_width as Real);
            }
        }
    }

    #[test]
    fn reflect_edges() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn smoothing_preserves_length_and_constants() {
        let trace = vec![3.5; 17];
        let smoothed = smooth(&trace, 2.0, 4.0);
        assert_eq!(smoothed.len(), trace.len());
        for v in smoothed {
            assert_approx_eq!(v, 3.5, 1e-12);
        }
    }

    #[test]
    fn smoothing_short_trace() {
        let smoothed = smooth(&[1.0, 2.0], 2.0, 4.0);
        assert_eq!(smoothed.len(), 2);
        assert!(smooth(&[], 2.0, 4.0).is_empty());
    }

    #[test]
    fn second_half_is_always_masked() {
        let trace = vec![0.0; 10];
        let estimate = BaselineEstimator::default().estimate(&trace);
        assert_eq!(
            estimate.mask,
            vec![false, false, false, false, true, true, true, true, true, true]
        );
    }

    #[test]
    fn mean_of_unmasked_samples() {
        let mut trace = noisy_trace(400, 5.0, 42);
        add_pulse(&mut trace, 80, 200.0, 10);
        add_pulse(&mut trace, 300, 150.0, 10);

        let estimate = BaselineEstimator::default().estimate(&trace);
        let unmasked: Vec<Real> = trace
            .iter()
            .zip(&estimate.mask)
            .filter(|(_, masked)| !**masked)
            .map(|(v, _)| *v)
            .collect();
        let expected = unmasked.iter().sum::<Real>() / unmasked.len() as Real;

        let level = estimate.level.unwrap();
        assert_approx_eq!(level.mean, expected, 1e-9);
        assert!(level.std < 1.0);
        assert!((level.mean - 5.0).abs() < 0.2);
        // The pulse in the pre-trigger half is excluded.
        assert!(estimate.mask[80]);
        assert!(estimate.mask[75] && estimate.mask[85]);
        assert!(!estimate.mask[20]);
    }

    #[test]
    fn corrected_trace_has_zero_baseline() {
        let trace = noisy_trace(200, -12.0, 7);
        let estimate = BaselineEstimator::default().estimate(&trace);
        let corrected = estimate.correct(&trace).unwrap();
        let unmasked_mean = corrected
            .iter()
            .zip(&estimate.mask)
            .filter(|(_, masked)| !**masked)
            .map(|(v, _)| *v)
            .sum::<Real>()
            / estimate.mask.iter().filter(|m| !**m).count() as Real;
        assert_approx_eq!(unmasked_mean, 0.0, 1e-9);
    }

    #[test]
    fn fully_masked_record_is_indeterminate() {
        let trace = [1.0, 2.0];
        let estimate = BaselineEstimator::default().estimate(&trace);
        assert_eq!(estimate.mask, vec![true, true]);
        assert_eq!(estimate.level, Err(Indeterminate::BaselineIndeterminate));
        assert_eq!(
            estimate.correct(&trace),
            Err(Indeterminate::BaselineIndeterminate)
        );
    }

    #[test]
    fn estimation_is_deterministic() {
        let mut trace = noisy_trace(300, 1.0, 3);
        add_pulse(&mut trace, 60, 90.0, 8);
        let estimator = BaselineEstimator::default();
        assert_eq!(estimator.estimate(&trace), estimator.estimate(&trace));
    }
}
