//! # Export Module
//!
//! Consumers of a decoded [`FrameSequence`](crate::record::FrameSequence).
//!
//! This module handles:
//! - Flight track CSV (one row per Time frame, latest state of every other kind)
//! - JSON Lines (one serialized frame per line)
//! - Human-readable decode summaries
//! - Baseline ground elevation for absolute altitudes

pub mod jsonl;
pub mod summary;
pub mod track;

pub use jsonl::write_jsonl;
pub use summary::write_summary;
pub use track::{track_rows, write_csv, TrackRow};

/// Ground elevation lookup used to turn ascent into altitude
pub trait ElevationSource {
    /// Elevation in meters at a position, `None` if unknown
    fn elevation(&self, latitude: f64, longitude: f64) -> Option<f64>;
}

/// The same elevation everywhere, e.g. from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedElevation(pub f64);

impl ElevationSource for FixedElevation {
    fn elevation(&self, _latitude: f64, _longitude: f64) -> Option<f64> {
        Some(self.0)
    }
}

/// No elevation data; altitude columns stay empty
#[derive(Debug, Clone, Copy, Default)]
pub struct NoElevation;

impl ElevationSource for NoElevation {
    fn elevation(&self, _latitude: f64, _longitude: f64) -> Option<f64> {
        None
    }
}
