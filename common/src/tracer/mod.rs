mod tracer_engine;

pub use tracer_engine::{LogTarget, TracerEngine, TracerError, TracerOptions};

/// Should be called at the start of each component.
/// Initialises the global subscriber and reports which binary and module it was
/// installed from, so that the first line of every log identifies the component.
#[macro_export]
macro_rules! init_tracer {
    ($options:expr) => {{
        let tracer = TracerEngine::new($options)?;
        tracing::info!(
            component = env!("CARGO_BIN_NAME"),
            module = module_path!(),
            "Tracer initialised"
        );
        tracer
    }};
}
