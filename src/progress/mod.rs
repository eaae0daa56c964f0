//! Segment-based completion tracking
//!
//! A note is tracked once its body carries at least one segment marker.
//! Every recompute rescans the persisted note, applies the completion
//! threshold and reports what changed.

mod markers;
mod tracker;

pub use markers::{MarkerScanner, SegmentCounts, DEFAULT_MARKER};
pub use tracker::{display_name, ProgressOutcome, ProgressReport, ProgressTracker};
