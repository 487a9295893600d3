use clap::{Args, ValueEnum};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("Global subscriber already set: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Where formatted log lines are written.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum LogTarget {
    Stdout,
    /// Keeps stdout free for report output.
    #[default]
    Stderr,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TracerOptions {
    /// Stream to which log lines are written.
    #[clap(long, default_value = "stderr")]
    pub log_target: LogTarget,

    /// Disable ANSI colour codes in log lines.
    #[clap(long)]
    pub no_ansi: bool,
}

/// This object initialises the global tracing subscriber, given a TracerOptions struct.
/// Log filtering is taken from the `RUST_LOG` environment variable, defaulting to `info`.
pub struct TracerEngine {
    target: LogTarget,
}

impl TracerEngine {
    /// Installs the fmt tracer for the crate
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// #Returns
    /// An instance of TracerEngine, or an error if a global subscriber was already installed.
    pub fn new(options: TracerOptions) -> Result<Self, TracerError> {
        let log_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();

        let fmt_layer = match options.log_target {
            LogTarget::Stdout => tracing_subscriber::fmt::layer()
                .with_ansi(!options.no_ansi)
                .with_writer(std::io::stdout)
                .boxed(),
            LogTarget::Stderr => tracing_subscriber::fmt::layer()
                .with_ansi(!options.no_ansi)
                .with_writer(std::io::stderr)
                .boxed(),
        };

        let subscriber =
            tracing_subscriber::Registry::default().with(fmt_layer.with_filter(log_filter));

        tracing::subscriber::set_global_default(subscriber)?;

        Ok(Self {
            target: options.log_target,
        })
    }

    pub fn target(&self) -> LogTarget {
        self.target
    }
}
