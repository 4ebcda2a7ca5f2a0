//! # JSON Lines Export
//!
//! Writes every decoded frame as one JSON object per line. Raw bodies are
//! hex strings.

use std::io::{self, Write};

use crate::error::Result;
use crate::record::FrameSequence;

/// Write frames as JSON Lines
///
/// # Returns
///
/// * `Result<usize>` - Number of lines written
pub fn write_jsonl<W: io::Write>(frames: &FrameSequence, writer: W) -> Result<usize> {
    let mut writer = io::BufWriter::new(writer);
    for frame in frames {
        serde_json::to_writer(&mut writer, frame)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(frames.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decode;

    #[test]
    fn test_write_jsonl() {
        let mut buf = vec![6, 1, 0x20, 0xFF];
        buf.extend_from_slice(&[9, 2, b'h', b'i', 0xFF]);
        buf.extend_from_slice(&[77, 0, 0xFF]);
        let frames = decode(&buf, 0).unwrap();

        let mut out = Vec::new();
        assert_eq!(write_jsonl(&frames, &mut out).unwrap(), 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["frame"], "Marker");
        assert_eq!(lines[0]["kind"], "Frame6");
        assert_eq!(lines[0]["raw"], "20");
        assert_eq!(lines[1]["frame"], "Message");
        assert_eq!(lines[1]["text"], "hi");
        assert_eq!(lines[2]["frame"], "Unknown");
        assert_eq!(lines[2]["frame_type"], 77);
        assert_eq!(lines[2]["raw"], "");
    }
}
