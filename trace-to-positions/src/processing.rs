use crate::{
    event::{Event, ScopeConfiguration},
    loader::WaveformLoader,
    plate::{PlateTiming, PlateTimingMatrix},
    position::{PositionArray, PositionReconstructor},
    pulse_detection::{Real, SaveToFileFilter},
};
use gesher_common::{Channel, SegmentId};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Everything derived from one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventReconstruction {
    pub segment: SegmentId,
    pub timestamp: Option<Real>,
    /// Scope names in configuration order.
    pub scopes: Vec<String>,
    pub timing: PlateTiming,
    pub positions: PositionArray,
}

/// The full chain from raw traces to plate positions. Holds no per-event
/// state, so one pipeline serves any number of events concurrently.
#[derive(Debug, Clone)]
pub struct Pipeline {
    timing: PlateTimingMatrix,
    reconstructor: PositionReconstructor,
}

impl Pipeline {
    pub fn new(timing: PlateTimingMatrix, reconstructor: PositionReconstructor) -> Self {
        Self {
            timing,
            reconstructor,
        }
    }

    #[instrument(skip_all, fields(segment = event.segment()))]
    pub fn process(&self, event: &Event) -> EventReconstruction {
        let timing = self.timing.compute(event);
        let positions = self.reconstructor.reconstruct(&timing.delta_t);
        EventReconstruction {
            segment: event.segment(),
            timestamp: event.timestamp(),
            scopes: event
                .configuration()
                .scopes()
                .iter()
                .map(|scope| scope.name.clone())
                .collect(),
            timing,
            positions,
        }
    }

    /// Writes the baseline-corrected trace of every channel whose baseline is defined.
    pub fn save_corrected(&self, event: &Event, save_path: &Path) -> std::io::Result<()> {
        for (spec, traces) in event.scopes() {
            for channel in 0..spec.channels {
                let Ok(corrected) = self.timing.correct(traces, channel) else {
                    continue;
                };
                traces
                    .time()
                    .iter()
                    .copied()
                    .zip(corrected)
                    .save_to_file(&get_save_file_name(
                        save_path,
                        event.segment(),
                        &spec.name,
                        channel as Channel + 1,
                    ))?;
            }
        }
        Ok(())
    }
}

pub fn get_save_file_name(
    path: &Path,
    segment: SegmentId,
    scope: &str,
    channel: Channel,
) -> PathBuf {
    path.join(format!("{scope}_segment-{segment}_{channel}_corrected.csv"))
}

/// Loads and reconstructs each segment in parallel, returning results in segment order.
/// Segment `n` takes the `n`-th of `timestamps`, if there is one.
#[instrument(skip_all, fields(num_segments = segments.len()))]
pub fn process_segments(
    pipeline: &Pipeline,
    loader: &WaveformLoader,
    configuration: &ScopeConfiguration,
    segments: &[SegmentId],
    timestamps: &[Real],
    save_path: Option<&Path>,
) -> Vec<EventReconstruction> {
    let reconstructions = segments
        .par_iter()
        .map(|&segment| {
            let timestamp = (segment as usize)
                .checked_sub(1)
                .and_then(|index| timestamps.get(index))
                .copied();
            let event = loader.load_event(configuration, segment, timestamp);
            if let Some(save_path) = save_path {
                if let Err(e) = pipeline.save_corrected(&event, save_path) {
                    warn!(segment, "Failed to save corrected traces: {e}");
                }
            }
            pipeline.process(&event)
        })
        .collect::<Vec<_>>();

    let num_defined = reconstructions
        .iter()
        .map(|reconstruction| reconstruction.positions.num_defined())
        .sum::<usize>();
    info!(num_defined, "Processed {} segments", reconstructions.len());
    reconstructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::ScopeSpec,
        loader::UnitScales,
        position::{CalibrationCurve, DEFAULT_GRID_POINTS, PositionBounds},
        pulse_detection::{BaselineEstimator, PeakDetector, Polarity, RisetimeCalculator},
    };
    use assert_approx_eq::assert_approx_eq;
    use std::fs;

    fn pipeline() -> Pipeline {
        let timing = PlateTimingMatrix::new(
            BaselineEstimator::default(),
            PeakDetector::new(140.0),
            RisetimeCalculator::new(0.25).unwrap(),
            (0.0, 14.0),
            Polarity::Positive,
        )
        .unwrap();
        let reconstructor = PositionReconstructor::new(
            &CalibrationCurve::new(0.05, -5.0).unwrap(),
            PositionBounds::default(),
            DEFAULT_GRID_POINTS,
        )
        .unwrap();
        Pipeline::new(timing, reconstructor)
    }

    /// Writes a channel file in seconds and volts whose pulse peaks at sample `apex`.
    fn write_channel(path: &Path, apex: usize) {
        let rows = (0..146)
            .map(|i| {
                let pulse = if i <= apex {
                    200.0 - 5.5 * (apex - i) as Real
                } else {
                    200.0 - 20.0 * (i - apex) as Real
                };
                format!("{:e},{:e}\n", i as Real * 1e-10, (5.0 + pulse.max(0.0)) * 1e-3)
            })
            .collect::<String>();
        fs::write(path, rows).unwrap();
    }

    #[test]
    fn segments_from_disk() {
        let scratch = tempfile::TempDir::with_prefix("gesher-processing-").unwrap();
        let dir = scratch.path();
        let save_dir = dir.join("corrected");
        fs::create_dir_all(&save_dir).unwrap();

        let loader = WaveformLoader::new(dir, UnitScales::default());
        // Segment 1: first channel leads by 2 ns. Segment 2: second channel is absent.
        write_channel(&loader.channel_path("s1", 1, 1), 110);
        write_channel(&loader.channel_path("s1", 1, 2), 130);
        write_channel(&loader.channel_path("s1", 2, 1), 110);

        let configuration = ScopeConfiguration::new(vec![ScopeSpec::new("s1", 2)]).unwrap();
        let reconstructions = process_segments(
            &pipeline(),
            &loader,
            &configuration,
            &[1, 2],
            &[0.5],
            Some(&save_dir),
        );

        assert_eq!(reconstructions.len(), 2);
        let first = &reconstructions[0];
        assert_eq!(first.timestamp, Some(0.5));
        assert_approx_eq!(first.timing.delta_t.get(0).unwrap().clone().unwrap(), -2.0, 1e-6);
        // -2 = 0.05 x - 5
        assert_approx_eq!(first.positions.get(0).unwrap().clone().unwrap().value, 60.0, 1e-4);

        let second = &reconstructions[1];
        assert_eq!(second.timestamp, None);
        assert!(second.positions.get(0).unwrap().is_err());

        assert!(get_save_file_name(&save_dir, 1, "s1", 2).exists());
        assert!(!get_save_file_name(&save_dir, 2, "s1", 2).exists());
    }
}
