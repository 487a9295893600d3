use anyhow::{Context, Result};
use clap::Parser;
use gesher_common::{
    init_tracer,
    tracer::{LogTarget, TracerEngine, TracerOptions},
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};
use tracing::{info, warn};
use trace_to_positions::{
    event::{ScopeConfiguration, ScopeSpec},
    loader::WaveformLoader,
    parameters::{
        BaselineParameters, DetectorParameters, LoaderParameters, Mode, ReconstructionParameters,
    },
    plate::PlateTimingMatrix,
    position::{CalibrationCurve, PositionReconstructor},
    processing::{Pipeline, process_segments},
    pulse_detection::{BaselineEstimator, PeakDetector, RisetimeCalculator},
    report::{OutputFormat, PlateRecord, write_report},
};

// cargo run --bin trace-to-positions -- --location ../Data/run8 --scope scope-1-run8:4 --scope scope-2-run8:4 --calibration ../Data/calibration.json run

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Directory holding the scopes' exported CSV files.
    #[clap(long)]
    location: PathBuf,

    /// A scope and its channel count, as NAME:CHANNELS. Repeat for each scope, in readout order.
    #[clap(long = "scope", required = true)]
    scopes: Vec<ScopeSpec>,

    /// JSON file holding the fitted delta-t against position calibration.
    #[clap(long)]
    calibration: PathBuf,

    /// Info file from which segment timestamps are read. Defaults to the first scope's.
    #[clap(long)]
    info_file: Option<PathBuf>,

    /// Report destination. Written to stdout if not given.
    #[clap(long)]
    output: Option<PathBuf>,

    #[clap(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// If set, the baseline-corrected trace of each channel is written to this directory.
    #[clap(long)]
    save_path: Option<PathBuf>,

    #[command(flatten)]
    baseline: BaselineParameters,

    #[command(flatten)]
    detector: DetectorParameters,

    #[command(flatten)]
    reconstruction: ReconstructionParameters,

    #[command(flatten)]
    loader: LoaderParameters,

    #[command(flatten)]
    tracer: TracerOptions,

    #[command(subcommand)]
    mode: Mode,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let tracer = init_tracer!(args.tracer.clone());
    if matches!(tracer.target(), LogTarget::Stdout) && args.output.is_none() {
        warn!("Logs and report are both written to stdout");
    }

    let configuration = ScopeConfiguration::new(args.scopes.clone())?;

    let timing = PlateTimingMatrix::new(
        BaselineEstimator::new(args.baseline.settings()),
        PeakDetector::with_duration(args.detector.threshold, args.detector.duration),
        RisetimeCalculator::new(args.detector.fraction)?,
        (args.detector.roi_start, args.detector.roi_end),
        args.detector.polarity,
    )?;
    let calibration = CalibrationCurve::from_file(&args.calibration)?;
    let reconstructor = PositionReconstructor::new(
        &calibration,
        args.reconstruction.bounds(),
        args.reconstruction.grid_points,
    )?;
    let pipeline = Pipeline::new(timing, reconstructor);

    let loader = WaveformLoader::new(&args.location, args.loader.scales());

    let first_scope = configuration
        .scopes()
        .first()
        .map(|scope| scope.name.clone())
        .unwrap_or_default();
    let info_file = args
        .info_file
        .clone()
        .unwrap_or_else(|| loader.info_path(&first_scope));
    let timestamps = trace_to_positions::loader::read_timestamps(
        &info_file,
        args.loader.max_segments,
    )
    .unwrap_or_else(|e| {
        warn!("No timestamps: {e}");
        Vec::new()
    });

    let segments = match &args.mode {
        Mode::Segment(parameters) => vec![parameters.segment],
        Mode::Run(parameters) => loader
            .discover_segments(&first_scope)?
            .into_iter()
            .filter(|&segment| parameters.contains(segment))
            .collect(),
    };
    info!(
        num_segments = segments.len(),
        num_plates = configuration.num_plates(),
        "Reconstructing"
    );

    if let Some(save_path) = &args.save_path {
        std::fs::create_dir_all(save_path)
            .with_context(|| format!("Cannot create {}", save_path.display()))?;
    }

    let records = process_segments(
        &pipeline,
        &loader,
        &configuration,
        &segments,
        &timestamps,
        args.save_path.as_deref(),
    )
    .iter()
    .flat_map(PlateRecord::from_reconstruction)
    .collect::<Vec<_>>();

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    write_report(&records, args.format, &mut writer)?;
    Ok(())
}
