//! Guard-band suppression and amplitude statistics.
//!
//! Legitimate 20 MHz transmissions leave energy on the subcarriers right next
//! to DC; an active blocker suppresses it. The DC-band average computed here
//! is the signal [`crate::detector::AnomalyDetector`] thresholds on.

use std::f64::consts::PI;

use crate::codec::{SUBCARRIER_COUNT, Unpacked};
use crate::types::{FrameHeader, SpectrumSnapshot, UnpackedSample};

/// The zero-frequency subcarrier.
pub const DC_SUBCARRIER: usize = SUBCARRIER_COUNT / 2;

/// Subcarriers that carry no signal: band edges and DC.
pub const GUARD_SUBCARRIERS: [usize; 7] = [0, 1, 2, 3, DC_SUBCARRIER, 62, 63];

/// Subcarriers averaged for blocking detection: three either side of DC.
pub const DC_BAND: [usize; 6] = [29, 30, 31, 33, 34, 35];

/// Turns unpacked samples into a [`SpectrumSnapshot`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectrumPostProcessor;

impl SpectrumPostProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Zero guard subcarriers and compute per-frame statistics.
    pub fn process(&self, header: FrameHeader, unpacked: Unpacked) -> SpectrumSnapshot {
        let Unpacked { mut samples, global_max_exponent, .. } = unpacked;

        zero_guards(&mut samples);

        let magnitudes: Vec<f64> = samples.iter().map(|s| s.magnitude()).collect();
        let average_amplitude = mean(magnitudes.iter().copied());
        let dc_band_amplitude = mean(DC_BAND.iter().filter_map(|&i| magnitudes.get(i).copied()));
        let phase_residual_std = phase_residual_std(&samples);

        SpectrumSnapshot {
            header,
            samples,
            magnitudes,
            average_amplitude,
            dc_band_amplitude,
            phase_residual_std,
            global_max_exponent,
        }
    }
}

/// Force every guard subcarrier present in `samples` to exactly (0, 0).
pub fn zero_guards(samples: &mut [UnpackedSample]) {
    for &index in &GUARD_SUBCARRIERS {
        if let Some(sample) = samples.get_mut(index) {
            *sample = UnpackedSample::ZERO;
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Spread of the phase around its linear trend across subcarriers.
///
/// Uses the non-guard subcarriers in index order. The phase is unwrapped,
/// a least-squares line over subcarrier index is removed and the population
/// standard deviation of the residual returned.
///
/// Guards are left out of the fit. Zeroed guards have phase 0 regardless of
/// the channel, so fitting over all 64 subcarriers (as the Python live monitor
/// does) pulls the trend toward zero at both band edges and at DC, and the
/// result no longer tracks the channel alone.
pub fn phase_residual_std(samples: &[UnpackedSample]) -> f64 {
    let points: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .filter(|(i, _)| !GUARD_SUBCARRIERS.contains(i))
        .map(|(i, s)| (i as f64, s.to_complex().arg()))
        .collect();

    if points.len() < 2 {
        return 0.0;
    }

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let phase = unwrap(&points.iter().map(|p| p.1).collect::<Vec<_>>());

    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = phase.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    let sxy: f64 = xs.iter().zip(&phase).map(|(x, y)| (x - x_mean) * (y - y_mean)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    let residuals: Vec<f64> =
        xs.iter().zip(&phase).map(|(x, y)| y - (slope * x + intercept)).collect();
    let r_mean = residuals.iter().sum::<f64>() / n;
    (residuals.iter().map(|r| (r - r_mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Remove 2π jumps between consecutive phase values.
fn unwrap(phase: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phase.len());
    let mut correction = 0.0;

    for (i, &p) in phase.iter().enumerate() {
        if i > 0 {
            let delta = p - phase[i - 1];
            let mut wrapped = (delta + PI).rem_euclid(2.0 * PI) - PI;
            if wrapped == -PI && delta > 0.0 {
                wrapped = PI;
            }
            if delta.abs() >= PI {
                correction += wrapped - delta;
            }
        }
        out.push(p + correction);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FloatUnpacker;
    use crate::types::{PackedSample, StationId};

    fn header() -> FrameHeader {
        FrameHeader::new(StationId::default(), 1, 0, 0, 0)
    }

    fn unpacked(samples: Vec<UnpackedSample>) -> Unpacked {
        Unpacked { samples, global_max_exponent: 0, shift: 10 }
    }

    #[test]
    fn guard_subcarriers_are_zeroed() {
        let samples = vec![UnpackedSample::new(7, -3); SUBCARRIER_COUNT];
        let snapshot = SpectrumPostProcessor::new().process(header(), unpacked(samples));

        for &index in &GUARD_SUBCARRIERS {
            assert_eq!(snapshot.samples[index], UnpackedSample::ZERO, "guard {index}");
            assert_eq!(snapshot.magnitudes[index], 0.0);
        }
        assert_eq!(snapshot.samples[4], UnpackedSample::new(7, -3));
        assert_eq!(snapshot.samples[DC_SUBCARRIER - 1], UnpackedSample::new(7, -3));
    }

    #[test]
    fn averages_cover_all_subcarriers_and_dc_band() {
        let mut samples = vec![UnpackedSample::ZERO; SUBCARRIER_COUNT];
        samples[10] = UnpackedSample::new(3, 4);
        samples[29] = UnpackedSample::new(6, 8);
        samples[35] = UnpackedSample::new(0, 12);
        // DC itself is a guard and must not leak into the DC-band average.
        samples[DC_SUBCARRIER] = UnpackedSample::new(1000, 1000);

        let snapshot = SpectrumPostProcessor::new().process(header(), unpacked(samples));

        assert_eq!(snapshot.average_amplitude, (5.0 + 10.0 + 12.0) / 64.0);
        assert_eq!(snapshot.dc_band_amplitude, (10.0 + 12.0) / 6.0);
    }

    #[test]
    fn all_zero_frame_has_zero_statistics() {
        let words = vec![PackedSample::default(); SUBCARRIER_COUNT];
        let unpacked = FloatUnpacker::default().unpack(&words);
        let snapshot = SpectrumPostProcessor::new().process(header(), unpacked);

        assert!(snapshot.samples.iter().all(|s| s.is_zero()));
        assert_eq!(snapshot.average_amplitude, 0.0);
        assert_eq!(snapshot.dc_band_amplitude, 0.0);
        assert_eq!(snapshot.phase_residual_std, 0.0);
    }

    #[test]
    fn linear_phase_has_no_residual() {
        // A pure delay: phase advances 0.5 rad per subcarrier and wraps several times.
        let samples: Vec<UnpackedSample> = (0..SUBCARRIER_COUNT)
            .map(|i| {
                let phi = 0.5 * i as f64;
                let re = (1000.0 * phi.cos()).round() as i32;
                let im = (1000.0 * phi.sin()).round() as i32;
                UnpackedSample::new(re, im)
            })
            .collect();

        let std = phase_residual_std(&samples);
        assert!(std < 1e-2, "residual std {std} should be near zero");
    }

    #[test]
    fn guard_phases_do_not_enter_the_fit() {
        let mut samples: Vec<UnpackedSample> = (0..SUBCARRIER_COUNT as i32)
            .map(|i| UnpackedSample::new(800 - 20 * i, 300 + 7 * i))
            .collect();
        let with_guards = phase_residual_std(&samples);

        zero_guards(&mut samples);
        assert_eq!(phase_residual_std(&samples), with_guards);
    }

    #[test]
    fn snapshot_carries_phase_residual_of_its_samples() {
        let samples: Vec<UnpackedSample> = (0..SUBCARRIER_COUNT as i32)
            .map(|i| UnpackedSample::new(500 + (i * 37) % 200, -400 + (i * 53) % 300))
            .collect();
        let snapshot = SpectrumPostProcessor::new().process(header(), unpacked(samples));

        assert!(snapshot.phase_residual_std > 0.0);
        assert_eq!(snapshot.phase_residual_std, phase_residual_std(&snapshot.samples));
    }

    #[test]
    fn unwrap_removes_two_pi_jumps() {
        let wrapped = [3.0, -3.0, -2.9];
        let unwrapped = unwrap(&wrapped);

        assert_eq!(unwrapped[0], 3.0);
        assert!((unwrapped[1] - (2.0 * PI - 3.0)).abs() < 1e-12);
        assert!((unwrapped[2] - (2.0 * PI - 2.9)).abs() < 1e-12);
    }

    #[test]
    fn short_sample_slices_are_tolerated() {
        let mut samples = vec![UnpackedSample::new(1, 1); 3];
        zero_guards(&mut samples);
        assert!(samples.iter().all(|s| s.is_zero()));
        assert_eq!(phase_residual_std(&samples), 0.0);
    }
}
