//! Fixed-width bit vectors.
//!
//! `Bits` is the value type carried by every port, register, and memory cell
//! in the simulator. It provides:
//! 1. **Indexed access:** Bounds-checked get/set with bit 0 as the least significant bit.
//! 2. **Datapath operations:** Bitwise AND/NOT and the two single-position shifts.
//! 3. **Conversions:** To/from unsigned integers (width <= 32) and MSB-first bit strings.
//! 4. **Width adaptation:** Resizing that copies the overlapping low range and zero-fills.

use std::fmt;

use super::error::BitsError;

/// A fixed-width ordered sequence of bits.
///
/// Index 0 is the least significant bit. The width is fixed at construction;
/// every operation that produces a different width returns a new vector.
#[derive(Clone, PartialEq, Eq)]
pub struct Bits {
    bits: Vec<bool>,
}

impl Bits {
    /// Creates an all-zero vector of the given width.
    pub fn new(width: usize) -> Self {
        Self {
            bits: vec![false; width],
        }
    }

    /// Encodes the low `width` bits of an unsigned integer.
    ///
    /// Bit `i` of the result is bit `i` of `value`; bits at index 32 and
    /// above (for widths wider than the integer) are zero.
    pub fn from_u32(value: u32, width: usize) -> Self {
        let mut bits = Self::new(width);
        for i in 0..width.min(32) {
            bits.bits[i] = (value >> i) & 1 != 0;
        }
        bits
    }

    /// Decodes an MSB-first bit string such as `"0111000000000001"`.
    ///
    /// # Errors
    ///
    /// Returns [`BitsError::InvalidBitChar`] if the string contains anything
    /// but `'0'` and `'1'`.
    pub fn from_bit_string(source: &str) -> Result<Self, BitsError> {
        let width = source.chars().count();
        let mut bits = Self::new(width);
        for (position, ch) in source.chars().enumerate() {
            let value = match ch {
                '0' => false,
                '1' => true,
                found => return Err(BitsError::InvalidBitChar { found }),
            };
            bits.bits[width - 1 - position] = value;
        }
        Ok(bits)
    }

    /// Width of the vector in bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the vector has zero width.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Value of bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range, like slice indexing.
    pub fn bit(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Value of bit `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Sets bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range, like slice indexing.
    pub fn set_bit(&mut self, index: usize, value: bool) {
        self.bits[index] = value;
    }

    /// Sets every bit to `value`.
    pub fn set_all(&mut self, value: bool) {
        self.bits.fill(value);
    }

    /// True iff every bit is set. Trivially true for a zero-width vector.
    pub fn all_set(&self) -> bool {
        self.bits.iter().all(|&b| b)
    }

    /// True iff at least one bit is set.
    pub fn any_set(&self) -> bool {
        self.bits.iter().any(|&b| b)
    }

    /// Bitwise AND with another vector of the same width.
    ///
    /// # Panics
    ///
    /// Panics if the widths differ; equal widths are a construction-time
    /// obligation of the caller.
    pub fn and(&self, other: &Self) -> Self {
        assert_eq!(self.len(), other.len(), "AND operands must share a width");
        Self {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| a && b)
                .collect(),
        }
    }

    /// Bitwise NOT.
    pub fn inverted(&self) -> Self {
        Self {
            bits: self.bits.iter().map(|&b| !b).collect(),
        }
    }

    /// Shifts every bit one position toward the low-index end.
    ///
    /// Bit `i` of the result is bit `i + 1` of the input; the highest-index
    /// bit becomes 0. Numerically this halves the unsigned value.
    pub fn shift_low(&self) -> Self {
        let width = self.len();
        let mut shifted = Self::new(width);
        for i in 0..width.saturating_sub(1) {
            shifted.bits[i] = self.bits[i + 1];
        }
        shifted
    }

    /// Shifts every bit one position toward the high-index end.
    ///
    /// Bit `i` of the result is bit `i - 1` of the input; bit 0 becomes 0.
    /// Numerically this doubles the unsigned value, discarding the top bit.
    pub fn shift_high(&self) -> Self {
        let width = self.len();
        let mut shifted = Self::new(width);
        for i in 1..width {
            shifted.bits[i] = self.bits[i - 1];
        }
        shifted
    }

    /// Converts the vector to an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`BitsError::WidthTooLarge`] if the width exceeds 32 bits.
    pub fn to_u32(&self) -> Result<u32, BitsError> {
        if self.len() > 32 {
            return Err(BitsError::WidthTooLarge { width: self.len() });
        }
        let mut value = 0;
        for (i, &bit) in self.bits.iter().enumerate() {
            if bit {
                value |= 1 << i;
            }
        }
        Ok(value)
    }

    /// Converts the vector to a selector or address index.
    ///
    /// Selector and address ports are kept within 32 bits by construction;
    /// a wider vector reaching this point is a wiring fault.
    ///
    /// # Panics
    ///
    /// Panics if the width exceeds 32 bits.
    pub fn to_index(&self) -> usize {
        assert!(
            self.len() <= 32,
            "selector or address port wider than 32 bits"
        );
        let mut value = 0usize;
        for (i, &bit) in self.bits.iter().enumerate() {
            if bit {
                value |= 1 << i;
            }
        }
        value
    }

    /// Renders the vector as an MSB-first bit string.
    pub fn to_bit_string(&self) -> String {
        self.bits.iter().rev().map(|&b| if b { '1' } else { '0' }).collect()
    }

    /// Produces a vector of `width` bits, copying the overlapping low-index
    /// range and zero-filling the remainder.
    pub fn resized(&self, width: usize) -> Self {
        let mut resized = Self::new(width);
        for i in 0..width.min(self.len()) {
            resized.bits[i] = self.bits[i];
        }
        resized
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({})", self.to_bit_string())
    }
}
