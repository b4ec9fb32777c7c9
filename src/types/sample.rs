//! Packed and unpacked CSI sample types

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Bits per component (sign + magnitude) in the packed format.
pub const MANTISSA_BITS: u32 = 12;

/// Width of the shared exponent field.
pub const EXPONENT_BITS: u32 = 6;

/// Two's-complement offset of the exponent field (`2^(E-1)`).
pub const EXPONENT_BIAS: i32 = 1 << (EXPONENT_BITS - 1);

/// Largest magnitude a component can carry (11 bits).
pub const MAGNITUDE_MASK: u32 = (1 << (MANTISSA_BITS - 1)) - 1;

const EXPONENT_MASK: u32 = (1 << EXPONENT_BITS) - 1;
const IMAG_SHIFT: u32 = EXPONENT_BITS;
const REAL_SHIFT: u32 = EXPONENT_BITS + MANTISSA_BITS;
const REAL_SIGN: u32 = 1 << (EXPONENT_BITS + 2 * MANTISSA_BITS - 1);
const IMAG_SIGN: u32 = REAL_SIGN >> MANTISSA_BITS;

/// One packed 32-bit CSI word as emitted by the BCM4366c0 firmware.
///
/// ```text
/// bit 29     28..18        17      16..6         5..0
/// [sign re][|re| 11 bits][sign im][|im| 11 bits][exponent 6 bits]
/// ```
///
/// Bits 30 and 31 are unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PackedSample(pub u32);

impl PackedSample {
    /// Wrap a raw word.
    pub fn new(word: u32) -> Self {
        Self(word)
    }

    /// Build a packed word from signed components and a signed exponent.
    ///
    /// Magnitudes are clamped to 11 bits and the exponent to `[-32, 31]`.
    pub fn pack(real: i32, imag: i32, exponent: i32) -> Self {
        let exponent = exponent.clamp(-EXPONENT_BIAS, EXPONENT_BIAS - 1);
        let mut word = (exponent as u32) & EXPONENT_MASK;

        word |= (real.unsigned_abs().min(MAGNITUDE_MASK)) << REAL_SHIFT;
        word |= (imag.unsigned_abs().min(MAGNITUDE_MASK)) << IMAG_SHIFT;
        if real < 0 {
            word |= REAL_SIGN;
        }
        if imag < 0 {
            word |= IMAG_SIGN;
        }

        Self(word)
    }

    /// Get the raw u32 value.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Unsigned real magnitude, `[0, 2047]`.
    pub fn real_magnitude(&self) -> u32 {
        (self.0 >> REAL_SHIFT) & MAGNITUDE_MASK
    }

    /// Unsigned imaginary magnitude, `[0, 2047]`.
    pub fn imag_magnitude(&self) -> u32 {
        (self.0 >> IMAG_SHIFT) & MAGNITUDE_MASK
    }

    pub fn real_negative(&self) -> bool {
        self.0 & REAL_SIGN != 0
    }

    pub fn imag_negative(&self) -> bool {
        self.0 & IMAG_SIGN != 0
    }

    /// The raw 6-bit exponent field.
    pub fn raw_exponent(&self) -> u32 {
        self.0 & EXPONENT_MASK
    }

    /// The exponent decoded as a 6-bit two's-complement value, `[-32, 31]`.
    pub fn exponent(&self) -> i32 {
        let e = self.raw_exponent() as i32;
        if e >= EXPONENT_BIAS { e - (EXPONENT_BIAS << 1) } else { e }
    }
}

impl From<u32> for PackedSample {
    fn from(word: u32) -> Self {
        Self(word)
    }
}

/// A decoded subcarrier after shared-exponent normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnpackedSample {
    pub real: i32,
    pub imag: i32,
}

impl UnpackedSample {
    pub const ZERO: Self = Self { real: 0, imag: 0 };

    pub fn new(real: i32, imag: i32) -> Self {
        Self { real, imag }
    }

    /// The sample as a double-precision complex number.
    pub fn to_complex(self) -> Complex64 {
        Complex64::new(self.real as f64, self.imag as f64)
    }

    /// Euclidean norm of (real, imag).
    pub fn magnitude(self) -> f64 {
        self.to_complex().norm()
    }

    pub fn is_zero(self) -> bool {
        self.real == 0 && self.imag == 0
    }
}
