pub mod tracer;

/// Index of a trigger segment within a run, counted from 1.
pub type SegmentId = u32;
/// Channel number on a scope, counted from 1.
pub type Channel = u32;

/// Each plate is read out by exactly this many consecutive channels.
pub const CHANNELS_PER_PLATE: usize = 2;

/// Returns the 1-based channel numbers of the two ends of the plate with
/// the given 0-based index on its scope.
pub fn plate_channels(plate_index: usize) -> (Channel, Channel) {
    let first = (plate_index * CHANNELS_PER_PLATE) as Channel + 1;
    (first, first + 1)
}
