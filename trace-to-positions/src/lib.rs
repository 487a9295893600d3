//! Reconstructs where particles crossed scintillator plates from the relative
//! arrival time of the light at the two ends of each plate.
//!
//! Each plate is read out by two consecutive scope channels. For every event
//! the traces are baseline-corrected, the first pulse in the region of
//! interest is timed on each channel, and the difference of the two times is
//! mapped to a position through the inverted calibration.

pub mod error;
pub mod event;
pub mod loader;
pub mod parameters;
pub mod plate;
pub mod position;
pub mod processing;
pub mod pulse_detection;
pub mod report;
pub mod waveform;
