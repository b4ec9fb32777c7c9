//! Test utilities for fixture access and frame construction
//!
//! This module provides helpers for locating the recorded CSI capture and for
//! synthesizing wire frames, shared by unit tests and benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::codec::{SUBCARRIER_COUNT, encode_frame};
use crate::providers::replay::parse_hex_dump;
use crate::types::{FrameHeader, PackedSample, StationId};

/// Station used for synthesized frames.
pub const TEST_STATION: StationId = StationId([0x04, 0x33, 0xc2, 0x27, 0x31, 0xed]);

/// Chip version reported by the BCM4366c0.
pub const TEST_CHIP_VERSION: u16 = 0x006a;

/// Decoded (real, imaginary) pairs of the recorded capture after guard zeroing,
/// as produced by the vendor reference decoder.
pub const CAPTURE_DECODED: [(i32, i32); SUBCARRIER_COUNT] = [
    (0, 0), (0, 0), (0, 0), (0, 0),
    (630, 1495), (932, 1271), (1263, 1033), (1491, 775),
    (1670, 405), (1762, 34), (1749, -360), (1620, -762),
    (1467, -1080), (1188, -1448), (841, -1681), (366, -1723),
    (-49, -1674), (-430, -1516), (-751, -1246), (-951, -910),
    (-1162, -651), (-1277, -284), (-1324, 68), (-1239, 496),
    (-1039, 899), (-692, 1335), (-103, 1725), (-9, -18),
    (-48, 3), (4, 15), (-2, 10), (0, 6),
    (0, 0), (-15, -8), (-4, 0), (10, 0),
    (10, -48), (9, 12), (560, 740), (719, 435),
    (758, 167), (781, -78), (717, -292), (594, -504),
    (442, -658), (268, -743), (110, -893), (-74, -1017),
    (-376, -1034), (-645, -993), (-910, -923), (-1119, -719),
    (-1261, -470), (-1322, -134), (-1379, 152), (-1303, 428),
    (-1223, 671), (-1041, 949), (-840, 1162), (-507, 1276),
    (-184, 1472), (275, 1594), (0, 0), (0, 0),
];

/// Error returned when a required fixture cannot be loaded.
#[derive(Debug, Clone)]
pub struct FixtureError {
    message: String,
}

impl FixtureError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FixtureError {}

/// The test-data directory shipped with the crate.
pub fn test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

/// Path of the recorded single-frame capture.
pub fn capture_fixture_path() -> PathBuf {
    test_data_dir().join("frames").join("bcm4366c0_capture.hex")
}

/// Load the recorded capture as one datagram.
pub fn load_capture() -> Result<Vec<u8>, FixtureError> {
    let path = capture_fixture_path();
    let text = std::fs::read_to_string(&path)
        .map_err(|e| FixtureError::new(format!("Reading {}: {}", path.display(), e)))?;

    let mut datagrams = parse_hex_dump(&text)
        .map_err(|e| FixtureError::new(format!("Parsing {}: {}", path.display(), e)))?;

    match datagrams.len() {
        1 => Ok(datagrams.remove(0)),
        n => Err(FixtureError::new(format!("Expected one datagram in {}, found {}", path.display(), n))),
    }
}

/// Build a wire frame with the test station and chip version.
pub fn build_frame(sequence: u16, core_stream: u16, samples: &[PackedSample]) -> Vec<u8> {
    let header = FrameHeader::new(TEST_STATION, sequence, core_stream, 0x1001, TEST_CHIP_VERSION);
    encode_frame(&header, samples)
}

/// A valid frame whose samples are all zero mantissa and zero exponent.
pub fn zero_frame(sequence: u16) -> Vec<u8> {
    build_frame(sequence, 0, &[PackedSample::default(); SUBCARRIER_COUNT])
}

/// A valid frame with a strong, flat spectrum (DC-band amplitude well above 20).
pub fn strong_frame(sequence: u16) -> Vec<u8> {
    build_frame(sequence, 0, &[PackedSample::pack(600, -400, 0); SUBCARRIER_COUNT])
}
