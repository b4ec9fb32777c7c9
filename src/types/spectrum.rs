//! Per-frame spectrum aggregate

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{FrameHeader, UnpackedSample};

/// Everything derived from one decoded frame.
///
/// Created once by [`crate::spectrum::SpectrumPostProcessor`] and immutable
/// afterwards. Guard subcarriers are exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSnapshot {
    /// Header of the frame this snapshot was decoded from
    pub header: FrameHeader,

    /// Samples in subcarrier order
    pub samples: Vec<UnpackedSample>,

    /// Per-subcarrier Euclidean magnitude
    pub magnitudes: Vec<f64>,

    /// Mean magnitude across all subcarriers
    pub average_amplitude: f64,

    /// Mean magnitude across the band adjacent to DC
    pub dc_band_amplitude: f64,

    /// Standard deviation of the detrended, unwrapped phase
    pub phase_residual_std: f64,

    /// Shared exponent discovered while unpacking
    pub global_max_exponent: i32,
}

impl SpectrumSnapshot {
    pub fn subcarrier_count(&self) -> usize {
        self.samples.len()
    }

    pub fn sample(&self, index: usize) -> Option<UnpackedSample> {
        self.samples.get(index).copied()
    }

    /// Samples as complex doubles.
    pub fn to_complex(&self) -> Vec<Complex64> {
        self.samples.iter().map(|s| s.to_complex()).collect()
    }
}
