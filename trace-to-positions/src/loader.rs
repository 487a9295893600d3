//! Reads the CSV files written by the oscilloscopes' export tool.
//!
//! A run directory holds one file per scope, segment and channel, named
//! `{scope}_segment-{segment}_{channel}.csv` with channels counted from 1,
//! and a `{scope}_info.txt` file carrying the trigger time of each segment.
use crate::{
    error::LoadError,
    event::{Event, ScopeConfiguration, ScopeSpec},
    pulse_detection::Real,
    waveform::{ScopeTraces, Waveform},
};
use gesher_common::{Channel, SegmentId};
use glob::Pattern;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

pub const DEFAULT_MAX_SEGMENTS: usize = 1000;

/// Factors applied to the values read from file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScales {
    pub time: Real,
    pub voltage: Real,
}

impl Default for UnitScales {
    /// Seconds to nanoseconds and volts to millivolts.
    fn default() -> Self {
        Self {
            time: 1e9,
            voltage: 1e3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaveformLoader {
    location: PathBuf,
    scales: UnitScales,
}

impl WaveformLoader {
    pub fn new(location: impl Into<PathBuf>, scales: UnitScales) -> Self {
        Self {
            location: location.into(),
            scales,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn channel_path(&self, scope: &str, segment: SegmentId, channel: Channel) -> PathBuf {
        self.location
            .join(format!("{scope}_segment-{segment}_{channel}.csv"))
    }

    pub fn info_path(&self, scope: &str) -> PathBuf {
        self.location.join(format!("{scope}_info.txt"))
    }

    /// Reads `time,voltage` rows, scaling both columns. Blank lines are skipped
    /// and any further columns are ignored.
    pub fn read_waveform(&self, path: &Path) -> Result<Waveform, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::IO {
            path: path.to_owned(),
            source,
        })?;
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                self.parse_row(line).map_err(|reason| LoadError::Malformed {
                    path: path.to_owned(),
                    line: index + 1,
                    reason,
                })
            })
            .collect()
    }

    fn parse_row(&self, line: &str) -> Result<(Real, Real), String> {
        let mut fields = line.split(',').map(str::trim);
        let mut next = |name: &str| -> Result<Real, String> {
            let field = fields.next().ok_or_else(|| format!("missing {name} column"))?;
            field
                .parse::<Real>()
                .map_err(|e| format!("{name} '{field}': {e}"))
        };
        let time = next("time")?;
        let voltage = next("voltage")?;
        Ok((self.scales.time * time, self.scales.voltage * voltage))
    }

    /// Loads every channel of the scope. Channels that fail to load are missing.
    #[instrument(skip_all, fields(scope = %scope.name, segment = segment))]
    pub fn load_scope(&self, scope: &ScopeSpec, segment: SegmentId) -> ScopeTraces {
        let waveforms = (1..=scope.channels as Channel)
            .map(|channel| {
                let path = self.channel_path(&scope.name, segment, channel);
                self.read_waveform(&path)
                    .inspect_err(|e| warn!(channel, "Channel missing: {e}"))
                    .ok()
            })
            .collect();
        ScopeTraces::from_waveforms(waveforms)
    }

    pub fn load_event(
        &self,
        configuration: &ScopeConfiguration,
        segment: SegmentId,
        timestamp: Option<Real>,
    ) -> Event {
        let traces = configuration
            .scopes()
            .iter()
            .map(|scope| self.load_scope(scope, segment))
            .collect();
        Event::with_configuration(self.location.clone(), segment, configuration.clone())
            .with_traces(traces)
            .with_timestamp(timestamp)
    }

    /// The segments for which the scope recorded its first channel, in increasing order.
    pub fn discover_segments(&self, scope: &str) -> Result<Vec<SegmentId>, LoadError> {
        let pattern = format!(
            "{}/{}_segment-*_1.csv",
            Pattern::escape(&self.location.to_string_lossy()),
            Pattern::escape(scope)
        );
        let prefix = format!("{scope}_segment-");

        let mut segments = Vec::new();
        for path in glob::glob(&pattern)? {
            let path = path?;
            let segment = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_prefix(&prefix))
                .and_then(|name| name.strip_suffix("_1.csv"))
                .and_then(|number| number.parse::<SegmentId>().ok());
            match segment {
                Some(segment) => segments.push(segment),
                None => debug!("Ignoring {}", path.display()),
            }
        }
        segments.sort_unstable();
        segments.dedup();
        Ok(segments)
    }

    pub fn read_timestamps(
        &self,
        scope: &str,
        max_segments: usize,
    ) -> Result<Vec<Real>, LoadError> {
        read_timestamps(&self.info_path(scope), max_segments)
    }
}

/// Reads the trigger time, in seconds, of each segment from a scope's info file.
/// Each `Time Tags` line holds one, quoted after its last ` = `.
pub fn read_timestamps(path: &Path, max_segments: usize) -> Result<Vec<Real>, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::IO {
        path: path.to_owned(),
        source,
    })?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains("Time Tags"))
        .take(max_segments)
        .map(|(index, line)| -> Result<Real, LoadError> {
            let malformed = |reason: &str| LoadError::Malformed {
                path: path.to_owned(),
                line: index + 1,
                reason: reason.to_owned(),
            };
            let value = line.rsplit(" = ").next().unwrap_or(line);
            let quoted = value
                .split('\'')
                .nth(1)
                .ok_or_else(|| malformed("timestamp is not quoted"))?;
            Ok(quoted.trim().parse::<Real>()?)
        })
        .collect()
}
