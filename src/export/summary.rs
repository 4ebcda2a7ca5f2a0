//! # Decode Summary
//!
//! Human-readable overview of a decoded log.

use std::io;

use crate::error::Result;
use crate::record::{Frame, FrameSequence};

/// Write frame counts per kind, aircraft identity and where decoding stopped
pub fn write_summary<W: io::Write>(frames: &FrameSequence, mut writer: W) -> Result<()> {
    writeln!(writer, "Frames: {}", frames.len())?;
    for (kind, count) in frames.counts() {
        writeln!(writer, "  {:<13} {}", kind, count)?;
    }

    if let Some(aircraft) = frames.iter().find(|f| matches!(f, Frame::Aircraft(_))) {
        writeln!(writer, "{}", aircraft)?;
    }

    writeln!(
        writer,
        "Consumed {} bytes (header {}), {} bytes not decoded",
        frames.consumed(),
        frames.header_size(),
        frames.remaining()
    )?;
    writeln!(writer, "Stopped: {}", frames.halt())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decode;

    #[test]
    fn test_write_summary() {
        let buf = [0, 0, 6, 1, 0x20, 0xFF, 6, 0, 0xFF, 11, 0, 0x00];
        let frames = decode(&buf, 2).unwrap();

        let mut out = Vec::new();
        write_summary(&frames, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Frames: 2"));
        assert!(text.contains("Frame6        2"));
        assert!(text.contains("Consumed 9 bytes (header 2), 3 bytes not decoded"));
        assert!(text.contains("Stopped: invalid trailer 0x00 for frame at offset 9"));
    }
}
