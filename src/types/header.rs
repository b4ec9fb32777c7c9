//! CSI frame header types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{FRAME_MAGIC, HEADER_SIZE};

/// 6-byte station identifier (source MAC of the frame that triggered the CSI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StationId(pub [u8; 6]);

impl StationId {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Fixed-layout header at the start of every CSI datagram.
///
/// All fields are big-endian on the wire:
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     Magic (0x11111111)
/// 4       6     Station identifier
/// 10      2     Sequence number
/// 12      2     Core / spatial stream (bits 0..3 core, 3..6 stream)
/// 14      2     Channel specification
/// 16      2     Chip version
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub station: StationId,
    /// Observational only; may skip or wrap at 65536.
    pub sequence: u16,
    /// Receive core index, `core_stream & 0x7`.
    pub core: u8,
    /// Spatial stream index, `(core_stream >> 3) & 0x7`.
    pub stream: u8,
    /// The raw packed core/stream field.
    pub core_stream: u16,
    pub chanspec: u16,
    pub chip_version: u16,
}

impl FrameHeader {
    /// Build a header, deriving core and stream from the packed field.
    pub fn new(
        station: StationId,
        sequence: u16,
        core_stream: u16,
        chanspec: u16,
        chip_version: u16,
    ) -> Self {
        Self {
            station,
            sequence,
            core: (core_stream & 0x7) as u8,
            stream: ((core_stream >> 3) & 0x7) as u8,
            core_stream,
            chanspec,
            chip_version,
        }
    }

    /// Serialize back to the 18-byte wire layout.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&FRAME_MAGIC.to_be_bytes());
        out[4..10].copy_from_slice(self.station.as_bytes());
        out[10..12].copy_from_slice(&self.sequence.to_be_bytes());
        out[12..14].copy_from_slice(&self.core_stream.to_be_bytes());
        out[14..16].copy_from_slice(&self.chanspec.to_be_bytes());
        out[16..18].copy_from_slice(&self.chip_version.to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_and_stream_are_derived_from_packed_field() {
        let header = FrameHeader::new(StationId::default(), 7, 0b101_011, 0, 0);
        assert_eq!(header.core, 0b011);
        assert_eq!(header.stream, 0b101);

        // Bits above the stream field are ignored.
        let header = FrameHeader::new(StationId::default(), 7, 0xffc0 | 0b010_001, 0, 0);
        assert_eq!(header.core, 1);
        assert_eq!(header.stream, 2);
    }

    #[test]
    fn encode_writes_big_endian_fields() {
        let station = StationId::new([0x04, 0x33, 0xc2, 0x27, 0x31, 0xed]);
        let header = FrameHeader::new(station, 0x0102, 0x0009, 0x100a, 0x006a);
        let bytes = header.encode();

        assert_eq!(&bytes[0..4], &[0x11, 0x11, 0x11, 0x11]);
        assert_eq!(&bytes[4..10], station.as_bytes());
        assert_eq!(&bytes[10..12], &[0x01, 0x02]);
        assert_eq!(&bytes[12..14], &[0x00, 0x09]);
        assert_eq!(&bytes[14..16], &[0x10, 0x0a]);
        assert_eq!(&bytes[16..18], &[0x00, 0x6a]);
    }

    #[test]
    fn station_displays_as_mac() {
        let station = StationId::new([0x04, 0x33, 0xc2, 0x27, 0x31, 0xed]);
        assert_eq!(station.to_string(), "04:33:c2:27:31:ed");
    }
}
