//! Finds well-formed pulses in a smoothed trace by their prominence and width,
//! as needed to decide which parts of a trace cannot be used for the baseline.
use super::super::Real;
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateCriteria {
    /// Minimum height of the apex above the higher of its two flanking minima.
    pub min_prominence: Real,
    /// Minimum width, in samples, measured at half prominence.
    pub min_width: Real,
    /// Candidates closer than this many samples to a higher candidate are dropped.
    pub min_distance: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PulseCandidate {
    pub(crate) index: usize,
    pub(crate) prominence: Real,
    /// Width at half prominence, in samples.
    pub(crate) width: Real,
}

/// Returns the candidates ordered by index.
pub(crate) fn find_pulse_candidates(
    smoothed: &[Real],
    criteria: &CandidateCriteria,
) -> Vec<PulseCandidate> {
    let candidates = local_maxima(smoothed)
        .into_iter()
        .filter_map(|index| measure(smoothed, index))
        .filter(|candidate| {
            candidate.prominence >= criteria.min_prominence && candidate.width >= criteria.min_width
        })
        .collect::<Vec<_>>();

    // Higher apexes take precedence when enforcing the minimum distance.
    let mut kept: Vec<PulseCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates
        .into_iter()
        .sorted_by(|a, b| apex(smoothed, b).total_cmp(&apex(smoothed, a)))
    {
        if kept
            .iter()
            .all(|other| other.index.abs_diff(candidate.index) >= criteria.min_distance)
        {
            kept.push(candidate);
        }
    }
    kept.sort_by_key(|candidate| candidate.index);
    kept
}

fn apex(smoothed: &[Real], candidate: &PulseCandidate) -> Real {
    smoothed.get(candidate.index).copied().unwrap_or(Real::MIN)
}

/// Strict rise followed by a non-rise; a flat top is attributed to its leftmost sample.
fn local_maxima(trace: &[Real]) -> Vec<usize> {
    trace
        .iter()
        .enumerate()
        .tuple_windows()
        .filter_map(|((_, &before), (index, &value), (_, &after))| {
            (value > before && value >= after).then_some(index)
        })
        .collect()
}

fn measure(trace: &[Real], index: usize) -> Option<PulseCandidate> {
    let apex = *trace.get(index)?;
    let (left, right) = trace.split_at(index);

    // Each flank extends until a sample higher than the apex, or the end of the trace.
    let left_min = left
        .iter()
        .rev()
        .take_while(|&&v| v <= apex)
        .fold(apex, |acc, &v| acc.min(v));
    let right_min = right
        .iter()
        .skip(1)
        .take_while(|&&v| v <= apex)
        .fold(apex, |acc, &v| acc.min(v));

    let prominence = apex - left_min.max(right_min);
    let half = apex - prominence / 2.0;

    let width = right_crossing(trace, index, half) - left_crossing(trace, index, half);
    Some(PulseCandidate {
        index,
        prominence,
        width,
    })
}

/// Fractional index left of the apex at which the trace falls to `level`.
fn left_crossing(trace: &[Real], index: usize, level: Real) -> Real {
    trace
        .get(..=index)
        .unwrap_or_default()
        .windows(2)
        .enumerate()
        .rev()
        .find_map(|(i, pair)| match pair {
            [lo, hi] if *lo <= level => Some(interpolate_index(i, *lo, *hi, level)),
            _ => None,
        })
        .unwrap_or(0.0)
}

/// Fractional index right of the apex at which the trace falls to `level`.
fn right_crossing(trace: &[Real], index: usize, level: Real) -> Real {
    trace
        .get(index..)
        .unwrap_or_default()
        .windows(2)
        .enumerate()
        .find_map(|(i, pair)| match pair {
            [hi, lo] if *lo <= level => {
                Some((index + i) as Real + 1.0 - interpolate_index(0, *lo, *hi, level))
            }
            _ => None,
        })
        .unwrap_or(trace.len().saturating_sub(1) as Real)
}

/// The fractional position of `level` between `lo` at `base` and `hi` at `base + 1`.
fn interpolate_index(base: usize, lo: Real, hi: Real, level: Real) -> Real {
    if hi > lo {
        base as Real + (level - lo) / (hi - lo)
    } else {
        base as Real
    }
}
