//! # Frame Sequence
//!
//! File-ordered collection of decoded frames, plus how and where the scan
//! stopped.

use std::collections::BTreeMap;
use std::fmt;

use super::protocol::Frame;

/// Why the framer stopped scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Fewer bytes remained than a complete frame needs
    Exhausted { offset: usize },

    /// The byte after a declared body was not the 0xFF trailer
    BadTrailer { offset: usize, found: u8 },
}

impl Halt {
    /// Absolute offset of the first byte that was not consumed
    pub fn offset(&self) -> usize {
        match *self {
            Halt::Exhausted { offset } | Halt::BadTrailer { offset, .. } => offset,
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Exhausted { offset } => write!(f, "end of buffer at offset {}", offset),
            Halt::BadTrailer { offset, found } => write!(
                f,
                "invalid trailer 0x{:02X} for frame at offset {}",
                found, offset
            ),
        }
    }
}

/// Decoded frames in file order
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    header_size: usize,
    consumed: usize,
    total_len: usize,
    halt: Halt,
}

impl FrameSequence {
    pub(crate) fn new(
        frames: Vec<Frame>,
        header_size: usize,
        consumed: usize,
        total_len: usize,
        halt: Halt,
    ) -> Self {
        Self {
            frames,
            header_size,
            consumed,
            total_len,
            halt,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.frames
    }

    /// Header bytes skipped before scanning
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Bytes consumed: the skipped header plus every complete frame
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Unparsed tail length
    pub fn remaining(&self) -> usize {
        self.total_len - self.consumed
    }

    pub fn halt(&self) -> Halt {
        self.halt
    }

    /// Number of frames per kind
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for frame in &self.frames {
            *counts.entry(frame.kind_name()).or_insert(0) += 1;
        }
        counts
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl IntoIterator for FrameSequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::protocol::{MarkerKind, MarkerRecord, UnknownRecord};
    use bytes::Bytes;

    fn sample() -> FrameSequence {
        let frames = vec![
            Frame::Marker(MarkerRecord {
                kind: MarkerKind::Frame6,
                raw: Bytes::from_static(&[0x20]),
            }),
            Frame::Unknown(UnknownRecord {
                frame_type: 99,
                raw: Bytes::new(),
            }),
            Frame::Marker(MarkerRecord {
                kind: MarkerKind::Frame6,
                raw: Bytes::from_static(&[0xA0]),
            }),
        ];
        FrameSequence::new(frames, 100, 110, 115, Halt::BadTrailer { offset: 110, found: 0 })
    }

    #[test]
    fn test_sequence_accessors() {
        let seq = sample();
        assert_eq!(seq.len(), 3);
        assert!(!seq.is_empty());
        assert_eq!(seq.header_size(), 100);
        assert_eq!(seq.consumed(), 110);
        assert_eq!(seq.remaining(), 5);
        assert_eq!(seq.halt().offset(), 110);
        assert_eq!(seq.get(1).map(Frame::type_code), Some(99));
        assert!(seq.get(3).is_none());
    }

    #[test]
    fn test_sequence_iteration_preserves_order() {
        let seq = sample();
        let codes: Vec<u8> = seq.iter().map(Frame::type_code).collect();
        assert_eq!(codes, vec![6, 99, 6]);

        let by_ref: Vec<u8> = (&seq).into_iter().map(|f| f.type_code()).collect();
        assert_eq!(by_ref, codes);

        let owned: Vec<Frame> = seq.into_iter().collect();
        assert_eq!(owned.len(), 3);
    }

    #[test]
    fn test_sequence_counts() {
        let counts = sample().counts();
        assert_eq!(counts.get("Frame6"), Some(&2));
        assert_eq!(counts.get("Unknown"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_halt_display() {
        let halt = Halt::BadTrailer { offset: 42, found: 0x1C };
        assert_eq!(halt.to_string(), "invalid trailer 0x1C for frame at offset 42");
        assert_eq!(Halt::Exhausted { offset: 7 }.to_string(), "end of buffer at offset 7");
    }
}
