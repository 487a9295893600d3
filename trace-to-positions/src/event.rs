use crate::{
    error::ScopeConfigurationError,
    pulse_detection::Real,
    waveform::ScopeTraces,
};
use gesher_common::{CHANNELS_PER_PLATE, SegmentId};
use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

/// A scope and the number of channels it reads out, written `NAME:CHANNELS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSpec {
    pub name: String,
    pub channels: usize,
}

impl ScopeSpec {
    pub fn new(name: impl Into<String>, channels: usize) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }

    pub fn num_plates(&self) -> usize {
        self.channels / CHANNELS_PER_PLATE
    }
}

impl FromStr for ScopeSpec {
    type Err = ScopeConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, channels) = s
            .split_once(':')
            .ok_or_else(|| ScopeConfigurationError::Malformed(s.to_owned()))?;
        let channels = channels
            .trim()
            .parse()
            .map_err(|_| ScopeConfigurationError::Malformed(s.to_owned()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ScopeConfigurationError::Malformed(s.to_owned()));
        }
        Ok(Self::new(name, channels))
    }
}

impl Display for ScopeSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.channels)
    }
}

/// The scopes of the detector in readout order. Every scope carries whole plates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfiguration {
    scopes: Vec<ScopeSpec>,
}

impl ScopeConfiguration {
    pub fn new(scopes: Vec<ScopeSpec>) -> Result<Self, ScopeConfigurationError> {
        if scopes.is_empty() {
            return Err(ScopeConfigurationError::Empty);
        }
        for scope in &scopes {
            if scope.channels == 0 {
                return Err(ScopeConfigurationError::NoChannels {
                    scope: scope.name.clone(),
                });
            }
            if scope.channels % CHANNELS_PER_PLATE != 0 {
                return Err(ScopeConfigurationError::OddChannelCount {
                    scope: scope.name.clone(),
                    channels: scope.channels,
                });
            }
        }
        Ok(Self { scopes })
    }

    pub fn scopes(&self) -> &[ScopeSpec] {
        &self.scopes
    }

    pub fn num_plates(&self) -> usize {
        self.scopes.iter().map(ScopeSpec::num_plates).sum()
    }
}

/// The raw traces of one trigger across every configured scope.
#[derive(Debug, Clone)]
pub struct Event {
    location: PathBuf,
    segment: SegmentId,
    timestamp: Option<Real>,
    configuration: ScopeConfiguration,
    traces: Vec<ScopeTraces>,
}

impl Event {
    /// Fails if the configuration cannot be split into whole plates.
    /// Every channel starts out missing until traces are attached.
    pub fn new(
        location: impl Into<PathBuf>,
        segment: SegmentId,
        scopes: Vec<ScopeSpec>,
    ) -> Result<Self, ScopeConfigurationError> {
        Ok(Self::with_configuration(
            location,
            segment,
            ScopeConfiguration::new(scopes)?,
        ))
    }

    pub fn with_configuration(
        location: impl Into<PathBuf>,
        segment: SegmentId,
        configuration: ScopeConfiguration,
    ) -> Self {
        let traces = configuration
            .scopes()
            .iter()
            .map(|scope| ScopeTraces::missing(scope.channels))
            .collect();
        Self {
            location: location.into(),
            segment,
            timestamp: None,
            configuration,
            traces,
        }
    }

    /// Attaches traces in configuration order. Scopes without traces stay missing
    /// and each scope is padded or cut to its configured channel count.
    pub fn with_traces(mut self, traces: Vec<ScopeTraces>) -> Self {
        for ((slot, mut scope_traces), spec) in self
            .traces
            .iter_mut()
            .zip(traces)
            .zip(self.configuration.scopes())
        {
            scope_traces.resize(spec.channels);
            *slot = scope_traces;
        }
        self
    }

    pub fn with_timestamp(self, timestamp: Option<Real>) -> Self {
        Self { timestamp, ..self }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    pub fn timestamp(&self) -> Option<Real> {
        self.timestamp
    }

    pub fn configuration(&self) -> &ScopeConfiguration {
        &self.configuration
    }

    /// Pairs each configured scope with its traces.
    pub fn scopes(&self) -> impl Iterator<Item = (&ScopeSpec, &ScopeTraces)> {
        self.configuration.scopes().iter().zip(&self.traces)
    }
}
