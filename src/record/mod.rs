//! # Flight Record Module
//!
//! Decoder for the binary flight-controller log format.
//!
//! This module handles:
//! - Splitting the post-header buffer into `[type][size][body][0xFF]` frames
//! - Dispatching each frame to its typed decoder by type code
//! - Converting raw fields into physical units (degrees, meters, volts, UTC)
//! - Collecting decoded frames in file order

pub mod protocol;
pub mod codec;
pub mod decoder;
pub mod framer;
pub mod sequence;

pub use framer::{decode, decode_bytes, decode_strict, Framer};
pub use protocol::{Frame, RawFrame};
pub use sequence::{FrameSequence, Halt};
