use crate::pulse_detection::Real;
use std::{num::ParseFloatError, path::PathBuf};
use thiserror::Error;

/// The reason a derived value (baseline, peak, risetime, delta-t or position)
/// could not be determined.
///
/// These are expected outcomes of processing real traces, such as a plate that
/// saw no hit, so they are carried as data in an [`Outcome`] rather than
/// returned as errors from the pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Indeterminate {
    #[error("channel data missing")]
    MissingChannelData,
    #[error("baseline indeterminate: every sample is masked")]
    BaselineIndeterminate,
    #[error("no sample in the region of interest exceeds the threshold")]
    NoPeakFound,
    #[error("the other channel of the plate has no peak")]
    UnpairedPeak,
    #[error("risetime indeterminate: {0}")]
    RisetimeIndeterminate(#[from] RisetimeFailure),
    #[error("delta-t {delta_t} lies outside the calibrated range")]
    PositionOutOfCalibratedRange { delta_t: Real },
}

impl Indeterminate {
    /// Short machine-readable name, used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            Indeterminate::MissingChannelData => "missing_channel_data",
            Indeterminate::BaselineIndeterminate => "baseline_indeterminate",
            Indeterminate::NoPeakFound => "no_peak_found",
            Indeterminate::UnpairedPeak => "unpaired_peak",
            Indeterminate::RisetimeIndeterminate(_) => "risetime_indeterminate",
            Indeterminate::PositionOutOfCalibratedRange { .. } => {
                "position_out_of_calibrated_range"
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RisetimeFailure {
    #[error("peak index outside the waveform")]
    PeakOutOfBounds,
    #[error("peak amplitude is not positive")]
    NonPositivePeak,
    #[error("leading edge shorter than two samples")]
    EdgeTooShort,
    #[error("leading edge never crosses the target amplitude")]
    NoCrossing,
}

/// A value that is either determined or carries the reason it is not.
pub type Outcome<T> = Result<T, Indeterminate>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeConfigurationError {
    #[error("scope configuration is empty")]
    Empty,
    #[error("scope {scope} has {channels} channels, which cannot form whole plates")]
    OddChannelCount { scope: String, channels: usize },
    #[error("scope {scope} has no channels")]
    NoChannels { scope: String },
    #[error("expected NAME:CHANNELS, got '{0}'")]
    Malformed(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("risetime fraction {0} outside (0, 1]")]
    FractionOutOfRange(Real),
    #[error("region of interest start {start} is after its end {end}")]
    ReversedRegionOfInterest { start: Real, end: Real },
    #[error("position bounds [{min}, {max}] are empty")]
    EmptyPositionBounds { min: Real, max: Real },
    #[error("tolerance {0} must be non-negative")]
    NegativeTolerance(Real),
    #[error("inversion grid needs at least two points, got {0}")]
    GridTooCoarse(usize),
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("IO Error reading {path}: {source}")]
    IO {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed calibration artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Calibration slope {0} cannot be inverted")]
    DegenerateSlope(Real),
    #[error("Calibration intercept {0} is not finite")]
    NonFiniteIntercept(Real),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO Error reading {path}: {source}")]
    IO {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Line {line} of {path}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("Cannot parse number: {0}")]
    ParseFloat(#[from] ParseFloatError),
    #[error("Glob Pattern Error: {0}")]
    GlobPattern(#[from] glob::PatternError),
    #[error("Glob Error: {0}")]
    Glob(#[from] glob::GlobError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Serialisation Error: {0}")]
    Json(#[from] serde_json::Error),
}
