//! Shared-exponent float unpacking.
//!
//! The firmware packs every subcarrier into a 12-bit sign+magnitude pair with
//! a 6-bit exponent per word. Decoding is a block floating-point operation:
//! one scale, derived from the largest sample in the whole frame, is applied
//! to every subcarrier. That forces two passes.
//!
//! **Pass 1** extracts magnitudes and exponents and, when autoscaling, finds
//! the highest adjusted exponent (`exponent + highest set bit of |re| | |im|`)
//! over the frame.
//!
//! **Pass 2** applies `shift = TARGET_BITS - global_max_exponent` to every
//! real and imaginary slot. Slots whose scaled exponent falls below the zero
//! floor decode to exactly zero; negative exponents truncate with a right
//! shift; non-negative exponents shift left.
//!
//! The output is bit-identical to the vendor reference decoder, including
//! the truncating right shift.

use crate::types::{EXPONENT_BIAS, MANTISSA_BITS, PackedSample, UnpackedSample};

/// Width of the integer output before sign, when autoscaling.
pub const TARGET_BITS: i32 = 10;

/// Scaled exponents below this decode to zero.
pub const ZERO_FLOOR: i32 = -(MANTISSA_BITS as i32 - 1);

/// Marks a negative working slot between the two passes. Sits above any
/// 11-bit magnitude.
const SIGN_SENTINEL: u32 = 1 << 31;

/// Result of unpacking one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked {
    /// Decoded samples in input order
    pub samples: Vec<UnpackedSample>,

    /// Highest adjusted exponent seen in pass 1, `-32` when nothing was nonzero
    pub global_max_exponent: i32,

    /// Shift applied to every base exponent in pass 2
    pub shift: i32,
}

/// Two-pass decoder for packed CSI words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatUnpacker {
    autoscale: bool,
}

impl Default for FloatUnpacker {
    fn default() -> Self {
        Self { autoscale: true }
    }
}

impl FloatUnpacker {
    /// Create an unpacker. Without autoscale the shared shift is zero and each
    /// sample keeps its own exponent.
    pub fn new(autoscale: bool) -> Self {
        Self { autoscale }
    }

    pub fn autoscale(&self) -> bool {
        self.autoscale
    }

    /// Decode a frame's worth of packed samples.
    ///
    /// Total over any input; the output has one sample per input word.
    pub fn unpack(&self, words: &[PackedSample]) -> Unpacked {
        let mut base_exponents = Vec::with_capacity(words.len());
        let mut slots = Vec::with_capacity(words.len() * 2);
        let mut global_max_exponent = -EXPONENT_BIAS;

        for word in words {
            let mut re = word.real_magnitude();
            let mut im = word.imag_magnitude();
            let exponent = word.exponent();
            base_exponents.push(exponent);

            let x = re | im;
            if self.autoscale && x != 0 {
                global_max_exponent = global_max_exponent.max(exponent + highest_set_bit(x));
            }

            if word.real_negative() {
                re |= SIGN_SENTINEL;
            }
            if word.imag_negative() {
                im |= SIGN_SENTINEL;
            }
            slots.push(re);
            slots.push(im);
        }

        let shift = if self.autoscale { TARGET_BITS - global_max_exponent } else { 0 };

        let scaled: Vec<i32> = slots
            .iter()
            .enumerate()
            .map(|(slot, &raw)| scale_slot(raw, base_exponents[slot / 2] + shift))
            .collect();

        let samples =
            scaled.chunks_exact(2).map(|pair| UnpackedSample::new(pair[0], pair[1])).collect();

        Unpacked { samples, global_max_exponent, shift }
    }
}

fn scale_slot(raw: u32, exponent: i32) -> i32 {
    let negative = raw & SIGN_SENTINEL != 0;
    let magnitude = (raw & !SIGN_SENTINEL) as i64;

    let value = if magnitude == 0 || exponent < ZERO_FLOOR {
        0
    } else if exponent < 0 {
        magnitude >> -exponent
    } else {
        // Only reachable with large exponents when autoscale is off.
        (magnitude << exponent.min(32)).min(i32::MAX as i64)
    };

    let value = value as i32;
    if negative { -value } else { value }
}

/// Position of the highest set bit of a nonzero word, found by halving.
///
/// Tests the upper 16, 8, 4, 2 and 1 bits in turn, shifting `x` down each
/// time a test hits. Returns 0 for `x == 0`.
pub fn highest_set_bit(mut x: u32) -> i32 {
    let mut position = 0;
    let mut mask: u32 = 0xffff_0000;
    let mut low: u32 = 0xffff;
    let mut step = 16;

    while step > 0 {
        if x & mask != 0 {
            position += step;
            x >>= step;
        }
        step >>= 1;
        mask = (mask >> step) & low;
        low >>= step;
    }

    position
}
