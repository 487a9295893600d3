//! Times both ends of every plate of an event and forms their delta-t.
use crate::{
    error::{Indeterminate, Outcome, ParameterError},
    event::{Event, ScopeSpec},
    pulse_detection::{
        BaselineEstimator, Peak, PeakDetector, Polarity, Real, RisetimeCalculator,
    },
    waveform::ScopeTraces,
};
use std::ops::RangeInclusive;
use tracing::{debug, instrument};

/// The risetimes of the two channels of one plate, first channel then second.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateRisetimes {
    pub first: Outcome<Real>,
    pub second: Outcome<Real>,
}

impl PlateRisetimes {
    /// Defined only when both risetimes are.
    pub fn delta_t(&self) -> Outcome<Real> {
        match (&self.first, &self.second) {
            (Ok(first), Ok(second)) => Ok(first - second),
            (Err(e), _) | (_, Err(e)) => Err(e.clone()),
        }
    }
}

/// Risetimes indexed by scope, then plate within the scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RisetimeMatrix {
    scopes: Vec<Vec<PlateRisetimes>>,
}

impl RisetimeMatrix {
    pub fn get(&self, scope: usize, plate: usize) -> Option<&PlateRisetimes> {
        self.scopes.get(scope)?.get(plate)
    }

    pub fn scope(&self, scope: usize) -> Option<&[PlateRisetimes]> {
        self.scopes.get(scope).map(Vec::as_slice)
    }

    pub fn num_scopes(&self) -> usize {
        self.scopes.len()
    }

    /// Every plate in configuration order, with its scope and plate index.
    pub fn plates(&self) -> impl Iterator<Item = (usize, usize, &PlateRisetimes)> {
        self.scopes.iter().enumerate().flat_map(|(scope, plates)| {
            plates
                .iter()
                .enumerate()
                .map(move |(plate, risetimes)| (scope, plate, risetimes))
        })
    }
}

/// One delta-t per plate, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaTArray(Vec<Outcome<Real>>);

impl DeltaTArray {
    pub fn iter(&self) -> impl Iterator<Item = &Outcome<Real>> {
        self.0.iter()
    }

    pub fn get(&self, plate: usize) -> Option<&Outcome<Real>> {
        self.0.get(plate)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn num_defined(&self) -> usize {
        self.0.iter().filter(|dt| dt.is_ok()).count()
    }
}

impl FromIterator<Outcome<Real>> for DeltaTArray {
    fn from_iter<T: IntoIterator<Item = Outcome<Real>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The timing of one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateTiming {
    pub risetimes: RisetimeMatrix,
    pub delta_t: DeltaTArray,
}

impl PlateTiming {
    /// Forms the delta-t of every plate from risetimes grouped by scope.
    pub fn from_scopes(scopes: Vec<Vec<PlateRisetimes>>) -> Self {
        let risetimes = RisetimeMatrix { scopes };
        let delta_t = risetimes
            .plates()
            .map(|(_, _, plate)| plate.delta_t())
            .collect();
        Self { risetimes, delta_t }
    }
}

/// A channel's pulse, found on its baseline-corrected trace.
struct ChannelPeak {
    corrected: Vec<Real>,
    peak: Peak,
}

#[derive(Debug, Clone)]
pub struct PlateTimingMatrix {
    baseline: BaselineEstimator,
    detector: PeakDetector,
    risetime: RisetimeCalculator,
    roi: (Real, Real),
    polarity: Polarity,
}

impl PlateTimingMatrix {
    /// `roi` holds the start and end times of the region of interest, in the
    /// units of the scopes' time axes.
    pub fn new(
        baseline: BaselineEstimator,
        detector: PeakDetector,
        risetime: RisetimeCalculator,
        roi: (Real, Real),
        polarity: Polarity,
    ) -> Result<Self, ParameterError> {
        if roi.0 > roi.1 {
            return Err(ParameterError::ReversedRegionOfInterest {
                start: roi.0,
                end: roi.1,
            });
        }
        Ok(Self {
            baseline,
            detector,
            risetime,
            roi,
            polarity,
        })
    }

    #[instrument(skip_all, fields(segment = event.segment(), num_defined))]
    pub fn compute(&self, event: &Event) -> PlateTiming {
        let timing = PlateTiming::from_scopes(
            event
                .scopes()
                .map(|(spec, traces)| self.time_scope(spec, traces))
                .collect(),
        );
        tracing::Span::current().record("num_defined", timing.delta_t.num_defined());
        timing
    }

    /// Subtracts the channel's baseline and orients it so that pulses are positive.
    pub fn correct(&self, traces: &ScopeTraces, channel: usize) -> Outcome<Vec<Real>> {
        let voltage = traces.channel(channel)?;
        let sign = self.polarity.sign();
        let oriented = voltage.iter().map(|v| sign * v).collect::<Vec<_>>();
        self.baseline.estimate(&oriented).correct(&oriented)
    }

    #[instrument(skip_all, fields(scope = %spec.name))]
    fn time_scope(&self, spec: &ScopeSpec, traces: &ScopeTraces) -> Vec<PlateRisetimes> {
        let Some(roi) = traces.region_of_interest(self.roi.0, self.roi.1) else {
            debug!("Scope has no time axis");
            let missing = PlateRisetimes {
                first: Err(Indeterminate::MissingChannelData),
                second: Err(Indeterminate::MissingChannelData),
            };
            return vec![missing; spec.num_plates()];
        };

        (0..spec.num_plates())
            .map(|plate| self.time_plate(traces, plate, &roi))
            .collect()
    }

    #[instrument(skip_all, level = "trace", fields(plate = plate))]
    fn time_plate(
        &self,
        traces: &ScopeTraces,
        plate: usize,
        roi: &RangeInclusive<usize>,
    ) -> PlateRisetimes {
        let first = self.channel_peak(traces, 2 * plate, roi);
        let second = self.channel_peak(traces, 2 * plate + 1, roi);

        match (first, second) {
            (Ok(first), Ok(second)) => PlateRisetimes {
                first: self.channel_risetime(traces, &first),
                second: self.channel_risetime(traces, &second),
            },
            (Ok(_), Err(e)) => PlateRisetimes {
                first: Err(Indeterminate::UnpairedPeak),
                second: Err(e),
            },
            (Err(e), Ok(_)) => PlateRisetimes {
                first: Err(e),
                second: Err(Indeterminate::UnpairedPeak),
            },
            (Err(first), Err(second)) => PlateRisetimes {
                first: Err(first),
                second: Err(second),
            },
        }
    }

    fn channel_peak(
        &self,
        traces: &ScopeTraces,
        channel: usize,
        roi: &RangeInclusive<usize>,
    ) -> Outcome<ChannelPeak> {
        let corrected = self.correct(traces, channel)?;
        let peak = self
            .detector
            .find(&corrected, *roi.start()..roi.end().saturating_add(1))?;
        Ok(ChannelPeak { corrected, peak })
    }

    fn channel_risetime(&self, traces: &ScopeTraces, channel: &ChannelPeak) -> Outcome<Real> {
        self.risetime
            .calculate(traces.time(), &channel.corrected, channel.peak.peak_index)
    }
}
