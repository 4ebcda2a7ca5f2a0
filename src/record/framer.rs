//! # Framer
//!
//! Splits the post-header part of a log buffer into raw frames and decodes
//! them in file order.
//!
//! Frame layout: `[type: u8][size: u8][body: size bytes][trailer: 0xFF]`.
//! The size byte is trusted; the scan never searches for a boundary.
//!
//! The scan has two states, scanning and halted. It halts for good on the
//! first bad trailer or when too few bytes remain for a whole frame; both are
//! normal ends of the understood stream, not errors.

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::decoder::decode_one;
use super::protocol::{RawFrame, FRAME_OVERHEAD, FRAME_TRAILER};
use super::sequence::{FrameSequence, Halt};
use crate::error::{FlightRecordError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning,
    Halted(Halt),
}

/// Iterator over the raw frames of a log buffer
#[derive(Debug, Clone)]
pub struct Framer {
    buffer: Bytes,
    cursor: usize,
    state: ScanState,
}

impl Framer {
    /// Create a framer that skips `header_size` opaque bytes
    ///
    /// A buffer shorter than the header leaves nothing to scan.
    pub fn new(buffer: Bytes, header_size: usize) -> Self {
        let cursor = header_size.min(buffer.len());
        Self {
            buffer,
            cursor,
            state: ScanState::Scanning,
        }
    }

    /// Absolute offset of the next unread byte
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Why scanning stopped, once it has
    pub fn halt(&self) -> Option<Halt> {
        match self.state {
            ScanState::Scanning => None,
            ScanState::Halted(halt) => Some(halt),
        }
    }

    fn stop(&mut self, halt: Halt) -> Option<RawFrame> {
        self.state = ScanState::Halted(halt);
        None
    }
}

impl Iterator for Framer {
    type Item = RawFrame;

    fn next(&mut self) -> Option<RawFrame> {
        if let ScanState::Halted(_) = self.state {
            return None;
        }

        let offset = self.cursor;
        let rest = &self.buffer[offset..];

        if rest.len() < 2 {
            return self.stop(Halt::Exhausted { offset });
        }

        let frame_type = rest[0];
        let size = rest[1] as usize;

        let Some(&trailer) = rest.get(2 + size) else {
            return self.stop(Halt::Exhausted { offset });
        };

        if trailer != FRAME_TRAILER {
            return self.stop(Halt::BadTrailer {
                offset,
                found: trailer,
            });
        }

        let body = self.buffer.slice(offset + 2..offset + 2 + size);
        self.cursor += size + FRAME_OVERHEAD;

        Some(RawFrame {
            frame_type,
            offset,
            body,
        })
    }
}

/// Decode a complete log buffer
///
/// # Arguments
///
/// * `buffer` - Whole log file contents
/// * `header_size` - Opaque prefix to skip (100 bytes in current logs)
///
/// # Returns
///
/// * `Result<FrameSequence>` - Every frame before the scan halted
///
/// # Errors
///
/// Returns [`FlightRecordError::ShortBody`] if a known frame kind has a body
/// shorter than its layout. Nothing decoded before it is returned.
///
/// # Examples
///
/// ```
/// use flight_record::decode;
///
/// // Empty header, one 1-byte marker frame, then junk
/// let log = [0x06, 0x01, 0x20, 0xFF, 0x00];
/// let frames = decode(&log, 0)?;
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames.remaining(), 1);
/// # Ok::<(), flight_record::error::FlightRecordError>(())
/// ```
pub fn decode(buffer: &[u8], header_size: usize) -> Result<FrameSequence> {
    decode_bytes(Bytes::copy_from_slice(buffer), header_size)
}

/// Decode a complete log buffer without copying it
///
/// Frame bodies share the buffer's storage.
pub fn decode_bytes(buffer: Bytes, header_size: usize) -> Result<FrameSequence> {
    let total_len = buffer.len();
    let mut framer = Framer::new(buffer, header_size);
    let mut frames = Vec::new();

    for RawFrame {
        frame_type,
        offset,
        body,
    } in framer.by_ref()
    {
        let frame = decode_one(frame_type, body).map_err(|e| FlightRecordError::ShortBody {
            frame_type,
            offset,
            expected: e.expected,
            actual: e.actual,
        })?;
        debug!("Frame at {}: {}", offset, frame.kind_name());
        frames.push(frame);
    }

    let consumed = framer.cursor();
    let halt = framer.halt().unwrap_or(Halt::Exhausted { offset: consumed });

    if let Halt::BadTrailer { offset, found } = halt {
        warn!(
            "Stopped at offset {} on trailer 0x{:02X}, {} bytes not decoded",
            offset,
            found,
            total_len - consumed
        );
    }
    info!(
        "Decoded {} frames ({} of {} bytes)",
        frames.len(),
        consumed,
        total_len
    );

    Ok(FrameSequence::new(
        frames,
        header_size.min(total_len),
        consumed,
        total_len,
        halt,
    ))
}

/// Decode a complete log buffer, failing if any bytes are left unparsed
///
/// # Errors
///
/// Returns [`FlightRecordError::TrailingBytes`] if the scan halted before the
/// end of the buffer, or any error from [`decode`].
pub fn decode_strict(buffer: &[u8], header_size: usize) -> Result<FrameSequence> {
    let frames = decode(buffer, header_size)?;
    if frames.remaining() > 0 {
        return Err(FlightRecordError::TrailingBytes {
            offset: frames.consumed(),
            remaining: frames.remaining(),
        });
    }
    Ok(frames)
}
