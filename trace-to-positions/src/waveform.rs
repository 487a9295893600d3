use crate::{
    error::{Indeterminate, Outcome},
    pulse_detection::Real,
};
use std::ops::RangeInclusive;
use tracing::warn;

/// One channel's samples as `(time, voltage)` pairs held column-wise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waveform {
    time: Vec<Real>,
    voltage: Vec<Real>,
}

impl Waveform {
    pub fn time(&self) -> &[Real] {
        &self.time
    }

    pub fn voltage(&self) -> &[Real] {
        &self.voltage
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Real>, Vec<Real>) {
        (self.time, self.voltage)
    }
}

impl FromIterator<(Real, Real)> for Waveform {
    fn from_iter<T: IntoIterator<Item = (Real, Real)>>(iter: T) -> Self {
        let (time, voltage) = iter.into_iter().unzip();
        Self { time, voltage }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ChannelTrace {
    Recorded(Vec<Real>),
    /// The channel could not be loaded.
    #[default]
    Missing,
}

/// The traces of every channel of one scope, sharing that scope's time axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeTraces {
    time: Vec<Real>,
    channels: Vec<ChannelTrace>,
}

impl ScopeTraces {
    pub fn new(time: Vec<Real>, channels: Vec<ChannelTrace>) -> Self {
        Self { time, channels }
    }

    pub fn missing(num_channels: usize) -> Self {
        Self::new(Vec::new(), vec![ChannelTrace::Missing; num_channels])
    }

    /// The time axis is taken from the first channel that loaded.
    pub fn from_waveforms(waveforms: Vec<Option<Waveform>>) -> Self {
        let mut time = None;
        let channels = waveforms
            .into_iter()
            .map(|waveform| match waveform {
                Some(waveform) => {
                    let (t, voltage) = waveform.into_parts();
                    time.get_or_insert(t);
                    ChannelTrace::Recorded(voltage)
                }
                None => ChannelTrace::Missing,
            })
            .collect();
        Self::new(time.unwrap_or_default(), channels)
    }

    pub fn time(&self) -> &[Real] {
        &self.time
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Pads with missing channels, or drops surplus ones, to exactly `num_channels`.
    pub(crate) fn resize(&mut self, num_channels: usize) {
        self.channels.resize(num_channels, ChannelTrace::Missing);
    }

    /// The voltages of the channel at `index` (counting from zero), provided
    /// they were recorded against this scope's time axis.
    pub fn channel(&self, index: usize) -> Outcome<&[Real]> {
        match self.channels.get(index) {
            Some(ChannelTrace::Recorded(voltage)) if voltage.len() == self.time.len() => {
                Ok(voltage.as_slice())
            }
            Some(ChannelTrace::Recorded(voltage)) => {
                warn!(
                    channel = index,
                    len = voltage.len(),
                    time_len = self.time.len(),
                    "Channel length does not match time axis"
                );
                Err(Indeterminate::MissingChannelData)
            }
            _ => Err(Indeterminate::MissingChannelData),
        }
    }

    /// The inclusive index range whose ends are nearest `start` and `end` on this scope's time axis.
    pub fn region_of_interest(&self, start: Real, end: Real) -> Option<RangeInclusive<usize>> {
        Some(nearest_index(&self.time, start)?..=nearest_index(&self.time, end)?)
    }
}

/// Index of the sample closest to `target`, the earliest one on ties.
pub fn nearest_index(time: &[Real], target: Real) -> Option<usize> {
    time.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, Real)>, (index, t)| {
            let distance = (t - target).abs();
            match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((index, distance)),
            }
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_index_lookup() {
        let time = [0.0, 0.5, 1.0, 1.5];
        assert_eq!(nearest_index(&time, -3.0), Some(0));
        assert_eq!(nearest_index(&time, 0.7), Some(1));
        assert_eq!(nearest_index(&time, 0.75), Some(1));
        assert_eq!(nearest_index(&time, 1.4), Some(3));
        assert_eq!(nearest_index(&time, 99.0), Some(3));
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn region_of_interest_uses_own_time_axis() {
        let fast = ScopeTraces::new((0..10).map(|i| i as Real).collect(), vec![]);
        let slow = ScopeTraces::new((0..10).map(|i| 2.0 * i as Real).collect(), vec![]);
        assert_eq!(fast.region_of_interest(2.0, 6.0), Some(2..=6));
        assert_eq!(slow.region_of_interest(2.0, 6.0), Some(1..=3));
        assert_eq!(ScopeTraces::missing(2).region_of_interest(2.0, 6.0), None);
    }

    #[test]
    fn time_axis_from_first_loaded_channel() {
        let first: Waveform = [(0.0, 1.0), (1.0, 2.0)].into_iter().collect();
        let second: Waveform = [(5.0, 3.0), (6.0, 4.0)].into_iter().collect();
        let traces = ScopeTraces::from_waveforms(vec![None, Some(first), Some(second)]);
        assert_eq!(traces.time(), &[0.0, 1.0]);
        assert_eq!(traces.num_channels(), 3);
        assert_eq!(traces.channel(0), Err(Indeterminate::MissingChannelData));
        assert_eq!(traces.channel(1), Ok(&[1.0, 2.0][..]));
        assert_eq!(traces.channel(2), Ok(&[3.0, 4.0][..]));
        assert_eq!(traces.channel(3), Err(Indeterminate::MissingChannelData));
    }

    #[test]
    fn mismatched_channel_is_missing() {
        let traces = ScopeTraces::new(
            vec![0.0, 1.0, 2.0],
            vec![ChannelTrace::Recorded(vec![1.0, 2.0])],
        );
        assert_eq!(traces.channel(0), Err(Indeterminate::MissingChannelData));
    }

    #[test]
    fn resize_pads_with_missing() {
        let mut traces = ScopeTraces::new(vec![0.0], vec![ChannelTrace::Recorded(vec![1.0])]);
        traces.resize(4);
        assert_eq!(traces.num_channels(), 4);
        assert_eq!(traces.channel(3), Err(Indeterminate::MissingChannelData));
    }
}
