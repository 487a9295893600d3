//! Flattens reconstructed events into one record per plate.
use crate::{
    error::{Outcome, ReportError},
    processing::EventReconstruction,
    pulse_detection::{Real, SavablePoint, SaveToFileFilter},
};
use clap::ValueEnum;
use gesher_common::{Channel, SegmentId, plate_channels};
use serde::Serialize;
use std::io::{Error, Write};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, strum::Display)]
pub enum OutputFormat {
    #[default]
    #[strum(to_string = "csv")]
    Csv,
    #[strum(to_string = "json")]
    Json,
}

const CSV_HEADER: &str = "segment,timestamp,scope,plate,first_channel,second_channel,\
risetime_first,risetime_second,delta_t,position,clamped,status";

/// Undefined values are `None`, and `status` names the first reason the
/// position of the plate is undefined, or `ok`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateRecord {
    pub segment: SegmentId,
    pub timestamp: Option<Real>,
    pub scope: String,
    /// Counted from 1 within the scope.
    pub plate: usize,
    pub first_channel: Channel,
    pub second_channel: Channel,
    pub risetime_first: Option<Real>,
    pub risetime_second: Option<Real>,
    pub delta_t: Option<Real>,
    pub position: Option<Real>,
    pub clamped: bool,
    pub status: &'static str,
}

impl PlateRecord {
    pub fn from_reconstruction(reconstruction: &EventReconstruction) -> Vec<PlateRecord> {
        reconstruction
            .timing
            .risetimes
            .plates()
            .zip(reconstruction.timing.delta_t.iter())
            .zip(reconstruction.positions.iter())
            .map(|(((scope, plate, risetimes), delta_t), position)| {
                let (first_channel, second_channel) = plate_channels(plate);
                PlateRecord {
                    segment: reconstruction.segment,
                    timestamp: reconstruction.timestamp,
                    scope: reconstruction.scopes.get(scope).cloned().unwrap_or_default(),
                    plate: plate + 1,
                    first_channel,
                    second_channel,
                    risetime_first: defined(&risetimes.first),
                    risetime_second: defined(&risetimes.second),
                    delta_t: defined(delta_t),
                    position: position.as_ref().ok().map(|p| p.value),
                    clamped: position.as_ref().is_ok_and(|p| p.clamped),
                    status: position.as_ref().err().map_or("ok", |e| e.code()),
                }
            })
            .collect()
    }
}

fn defined(value: &Outcome<Real>) -> Option<Real> {
    value.as_ref().ok().copied()
}

fn field<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl SavablePoint for PlateRecord {
    fn write_to_file<W: Write>(&self, file: &mut W) -> Result<(), Error> {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            self.segment,
            field(self.timestamp),
            self.scope,
            self.plate,
            self.first_channel,
            self.second_channel,
            field(self.risetime_first),
            field(self.risetime_second),
            field(self.delta_t),
            field(self.position),
            self.clamped,
            self.status
        )
    }
}

pub fn write_report<W: Write>(
    records: &[PlateRecord],
    format: OutputFormat,
    writer: &mut W,
) -> Result<(), ReportError> {
    match format {
        OutputFormat::Csv => {
            writeln!(writer, "{CSV_HEADER}")?;
            records.iter().save_to_writer(writer)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, records)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}
