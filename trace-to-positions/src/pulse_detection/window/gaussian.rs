use super::{super::Real, Window};
use std::collections::VecDeque;

/// A Gaussian-weighted moving average.
///
/// The kernel extends `truncate` standard deviations either side of its
/// centre and is normalised to unit sum, so constant traces pass through
/// unchanged. Output is produced once `2 * radius + 1` values have been
/// pushed, and refers to the time of the centre of the window.
#[derive(Clone)]
pub(crate) struct GaussianWindow {
    weights: Vec<Real>,
    window: VecDeque<Real>,
}

impl GaussianWindow {
    /// A non-positive or non-finite `sigma` gives the identity filter.
    pub(crate) fn new(sigma: Real, truncate: Real) -> Self {
        let weights = if sigma.is_finite() && sigma > 0.0 {
            let radius = (truncate.max(0.0) * sigma).round() as isize;
            let two_sigma2 = 2.0 * sigma * sigma;
            let kernel: Vec<Real> = (-radius..=radius)
                .map(|dx| {
                    let x = dx as Real;
                    (-x * x / two_sigma2).exp()
                })
                .collect();
            let sum: Real = kernel.iter().sum();
            kernel.into_iter().map(|w| w / sum).collect()
        } else {
            vec![1.0]
        };
        GaussianWindow {
            window: VecDeque::with_capacity(weights.len()),
            weights,
        }
    }

    pub(crate) fn radius(&self) -> usize {
        (self.weights.len() - 1) / 2
    }

    fn is_full(&self) -> bool {
        self.window.len() == self.weights.len()
    }
}

impl Window for GaussianWindow {
    type TimeType = Real;
    type InputType = Real;
    type OutputType = Real;

    fn push(&mut self, value: Real) -> bool {
        if self.is_full() {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.is_full()
    }

    fn output(&self) -> Option<Real> {
        self.is_full().then(|| {
            self.weights
                .iter()
                .zip(self.window.iter())
                .map(|(w, v)| w * v)
                .sum()
        })
    }

    fn apply_time_shift(&self, time: Real) -> Real {
        time - self.radius() as Real
    }
}
