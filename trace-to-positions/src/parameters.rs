use crate::{
    loader::{DEFAULT_MAX_SEGMENTS, UnitScales},
    position::{DEFAULT_GRID_POINTS, PositionBounds},
    pulse_detection::{BaselineSettings, CandidateCriteria, Polarity, Real},
};
use clap::{Args, Subcommand};
use gesher_common::SegmentId;

#[derive(Debug, Clone, Args)]
pub struct BaselineParameters {
    /// Standard deviation, in samples, of the Gaussian smoothing applied before searching for pulses to mask.
    #[clap(long, default_value = "2.0")]
    pub smoothing_sigma: Real,

    /// The smoothing kernel is cut off at this many standard deviations.
    #[clap(long, default_value = "4.0")]
    pub smoothing_truncate: Real,

    /// Pulses less prominent than this, in loaded voltage units, do not mask the baseline.
    #[clap(long, default_value = "20.0")]
    pub min_prominence: Real,

    /// Pulses narrower than this many samples at half prominence do not mask the baseline.
    #[clap(long, default_value = "5.0")]
    pub min_width: Real,

    /// Of two pulses closer than this many samples, only the higher masks the baseline.
    #[clap(long, default_value = "8")]
    pub min_distance: usize,

    /// Each pulse masks this many of its widths either side of its apex.
    #[clap(long, default_value = "1.5")]
    pub mask_multiplier: Real,
}

impl BaselineParameters {
    pub fn settings(&self) -> BaselineSettings {
        BaselineSettings {
            smoothing_sigma: self.smoothing_sigma,
            smoothing_truncate: self.smoothing_truncate,
            candidates: CandidateCriteria {
                min_prominence: self.min_prominence,
                min_width: self.min_width,
                min_distance: self.min_distance,
            },
            mask_multiplier: self.mask_multiplier,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DetectorParameters {
    /// A pulse is registered when the corrected trace exceeds this value.
    #[clap(long, default_value = "140.0")]
    pub threshold: Real,

    /// The number of consecutive samples that must exceed the threshold.
    #[clap(long, default_value = "1")]
    pub duration: usize,

    /// Negative polarity flips traces before detection.
    #[clap(long, value_enum, default_value_t = Polarity::Positive)]
    pub polarity: Polarity,

    /// Start time of the region of interest, in loaded time units.
    #[clap(long, default_value = "-60.0", allow_negative_numbers = true)]
    pub roi_start: Real,

    /// End time of the region of interest, in loaded time units.
    #[clap(long, default_value = "80.0", allow_negative_numbers = true)]
    pub roi_end: Real,

    /// Risetimes are taken where the leading edge reaches this fraction of the peak.
    #[clap(long, default_value = "0.25")]
    pub fraction: Real,
}

#[derive(Debug, Clone, Args)]
pub struct ReconstructionParameters {
    /// Position of the near end of each plate.
    #[clap(long, default_value = "0.0", allow_negative_numbers = true)]
    pub x_min: Real,

    /// Position of the far end of each plate.
    #[clap(long, default_value = "144.0", allow_negative_numbers = true)]
    pub x_max: Real,

    /// Positions up to this far beyond either end are clamped to it, further ones are rejected.
    #[clap(long, default_value = "25.0")]
    pub max_err: Real,

    /// Number of points at which the calibration is tabulated for inversion.
    #[clap(long, default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,
}

impl ReconstructionParameters {
    pub fn bounds(&self) -> PositionBounds {
        PositionBounds {
            min: self.x_min,
            max: self.x_max,
            tolerance: self.max_err,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct LoaderParameters {
    /// Loaded times are multiplied by this. The default converts seconds to nanoseconds.
    #[clap(long, default_value = "1e9")]
    pub time_scale: Real,

    /// Loaded voltages are multiplied by this. The default converts volts to millivolts.
    #[clap(long, default_value = "1e3")]
    pub voltage_scale: Real,

    /// At most this many timestamps are read from the info file.
    #[clap(long, default_value_t = DEFAULT_MAX_SEGMENTS)]
    pub max_segments: usize,
}

impl LoaderParameters {
    pub fn scales(&self) -> UnitScales {
        UnitScales {
            time: self.time_scale,
            voltage: self.voltage_scale,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SegmentParameters {
    /// The segment to reconstruct, counted from 1.
    #[clap(long)]
    pub segment: SegmentId,
}

#[derive(Debug, Clone, Args)]
pub struct RunParameters {
    /// Segments before this one are skipped.
    #[clap(long)]
    pub first: Option<SegmentId>,

    /// Segments after this one are skipped.
    #[clap(long)]
    pub last: Option<SegmentId>,
}

impl RunParameters {
    pub fn contains(&self, segment: SegmentId) -> bool {
        self.first.is_none_or(|first| first <= segment)
            && self.last.is_none_or(|last| segment <= last)
    }
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Reconstructs a single segment.
    Segment(SegmentParameters),
    /// Reconstructs every segment found in the data directory.
    Run(RunParameters),
}
