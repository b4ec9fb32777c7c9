//! CSI datagram framing.
//!
//! Each datagram carries one fixed 18-byte big-endian header followed by
//! [`SUBCARRIER_COUNT`] packed 32-bit samples:
//!
//! 1. **Header** (18 bytes) - magic, station, sequence, core/stream, chanspec, chip
//! 2. **Samples** (64 x 4 bytes) - shared-exponent words, radio-native little-endian
//!
//! Trailing bytes after the last sample are ignored.
//!
//! Decoding is a pure function of the input bytes. All multi-byte fields are
//! extracted with explicit bounds checks; nothing is reinterpreted in place.

pub mod unpack;

pub use unpack::{FloatUnpacker, Unpacked, highest_set_bit};

use crate::FrameError;
use crate::types::{FrameHeader, PackedSample, StationId};

/// Sentinel carried in the first four header bytes.
pub const FRAME_MAGIC: u32 = 0x1111_1111;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 18;

/// Subcarriers per frame (20 MHz, BCM4366c0).
pub const SUBCARRIER_COUNT: usize = 64;

/// Bytes per packed sample.
pub const SAMPLE_SIZE: usize = 4;

/// Bytes of sample payload a frame must carry.
pub const PAYLOAD_SIZE: usize = SUBCARRIER_COUNT * SAMPLE_SIZE;

/// Smallest valid datagram.
pub const FRAME_SIZE: usize = HEADER_SIZE + PAYLOAD_SIZE;

/// A validated frame: parsed header plus a view of exactly [`PAYLOAD_SIZE`] sample bytes.
#[derive(Debug, Clone, Copy)]
pub struct CsiFrame<'a> {
    pub header: FrameHeader,
    payload: &'a [u8],
}

impl<'a> CsiFrame<'a> {
    /// The raw sample bytes.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Packed samples in subcarrier order.
    pub fn samples(&self) -> [PackedSample; SUBCARRIER_COUNT] {
        std::array::from_fn(|i| {
            let o = i * SAMPLE_SIZE;
            let p = self.payload;
            PackedSample::new(u32::from_le_bytes([p[o], p[o + 1], p[o + 2], p[o + 3]]))
        })
    }
}

/// Validate a datagram and split it into header and sample payload.
///
/// Checks run in order: header length, magic, payload length. No byte past
/// the end of `data` is ever read.
pub fn decode_frame(data: &[u8]) -> Result<CsiFrame<'_>, FrameError> {
    if data.len() < HEADER_SIZE {
        return Err(FrameError::TooShort { needed: HEADER_SIZE, got: data.len() });
    }

    let magic = read_u32_be(data, 0)?;
    if magic != FRAME_MAGIC {
        return Err(FrameError::BadMagic { expected: FRAME_MAGIC, found: magic });
    }

    let payload = &data[HEADER_SIZE..];
    if payload.len() < PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooSmall { needed: PAYLOAD_SIZE, got: payload.len() });
    }

    let mut station = [0u8; 6];
    station.copy_from_slice(&data[4..10]);

    let header = FrameHeader::new(
        StationId::new(station),
        read_u16_be(data, 10)?,
        read_u16_be(data, 12)?,
        read_u16_be(data, 14)?,
        read_u16_be(data, 16)?,
    );

    Ok(CsiFrame { header, payload: &payload[..PAYLOAD_SIZE] })
}

/// Build a wire frame from a header and packed samples.
pub fn encode_frame(header: &FrameHeader, samples: &[PackedSample]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + samples.len() * SAMPLE_SIZE);
    out.extend_from_slice(&header.encode());
    for sample in samples {
        out.extend_from_slice(&sample.value().to_le_bytes());
    }
    out
}

/// Bounds-checked field readers
fn read_u16_be(data: &[u8], offset: usize) -> Result<u16, FrameError> {
    match data.get(offset..offset + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(FrameError::TooShort { needed: offset + 2, got: data.len() }),
    }
}

fn read_u32_be(data: &[u8], offset: usize) -> Result<u32, FrameError> {
    match data.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(FrameError::TooShort { needed: offset + 4, got: data.len() }),
    }
}
