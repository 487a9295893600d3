//! Tools for turning one channel's raw trace into a pulse timing.
//!
//! Each stage consumes plain slices and returns a fresh value, so a trace
//! is processed as
//! ```text
//! raw -> BaselineEstimator -> corrected -> PeakDetector -> Peak -> RisetimeCalculator -> risetime
//! ```
//! Internally the stages are built from the iterator adapters in `window`
//! (smoothing) and `detectors` (threshold triggers), which consume a trace
//! one `(time, value)` point at a time.

pub(crate) mod datatype;
pub(crate) mod detectors;
pub(crate) mod iterators;
pub(crate) mod window;

pub mod baseline;
pub mod peak;
pub mod risetime;

pub use baseline::{BaselineEstimate, BaselineEstimator, BaselineLevel, BaselineSettings};
pub(crate) use datatype::{Temporal, TracePoint};
pub(crate) use detectors::Detector;
pub use detectors::prominence_detector::CandidateCriteria;
pub(crate) use iterators::{EventFilter, SavablePoint, SaveToFileFilter};
pub use peak::{Peak, PeakDetector, Polarity};
pub use risetime::RisetimeCalculator;
pub(crate) use window::WindowFilter;

pub type Real = f64;
