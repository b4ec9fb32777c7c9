//! Core types for CSI frame representation.
//!
//! This module provides the data model that flows through the decode pipeline,
//! leaves first:
//!
//! - [`RawFrame`] is one received datagram, never retained after processing
//! - [`FrameHeader`] is the fixed 18-byte header parsed from a frame
//! - [`PackedSample`] is one 32-bit shared-exponent word per subcarrier
//! - [`UnpackedSample`] is a decoded (real, imaginary) pair
//! - [`SpectrumSnapshot`] aggregates one decoded frame
//! - [`DetectionEvent`] reports a blocking detection
//! - [`IngestStats`] counts what the ingest loop has seen
//!
//! ## Usage Example
//!
//! ```rust
//! use csiwatch::types::{PackedSample, UnpackedSample};
//!
//! let word = PackedSample::pack(100, -50, 0);
//! assert_eq!(word.real_magnitude(), 100);
//! assert!(word.imag_negative());
//!
//! let sample = UnpackedSample::new(3, 4);
//! assert_eq!(sample.magnitude(), 5.0);
//! ```

mod event;
mod frame;
mod header;
mod sample;
mod spectrum;
mod stats;
mod update_rate;

// Re-export all public types
pub use event::{DetectionEvent, DetectorState};
pub use frame::RawFrame;
pub use header::{FrameHeader, StationId};
pub use sample::{
    EXPONENT_BIAS, EXPONENT_BITS, MAGNITUDE_MASK, MANTISSA_BITS, PackedSample, UnpackedSample,
};
pub use spectrum::SpectrumSnapshot;
pub use stats::IngestStats;
pub use update_rate::UpdateRate;
