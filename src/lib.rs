//! # Flight Record Library
//!
//! Decode consumer drone flight-controller logs into typed telemetry records.
//!
//! A log is an opaque header followed by back-to-back frames of the form
//! `[type][size][body][0xFF]`. This library provides the framer that walks
//! those frames, the per-type body decoders, and exporters that turn the
//! decoded sequence into a flight track CSV, JSON Lines or a text summary.

pub mod config;
pub mod error;
pub mod export;
pub mod record;

pub use error::{FlightRecordError, Result};
pub use record::{decode, decode_bytes, decode_strict, Frame, FrameSequence, Halt};
