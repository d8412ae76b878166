//! Packed two-state bit vectors for classical simulation of wiring graphs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitXor};

/// A fixed-width vector of bits, index 0 being the least significant.
///
/// Bits are packed 64 per `u64` word. Bits beyond `width` in the last word
/// are always zero, so derived equality is value equality.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bits {
    width: u32,
    data: Vec<u64>,
}

const BITS_PER_WORD: u32 = 64;

impl Bits {
    /// Creates an all-zero vector of the given width.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            data: vec![0; word_count(width)],
        }
    }

    /// Returns the number of bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> bool {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = (index / BITS_PER_WORD) as usize;
        (self.data[word] >> (index % BITS_PER_WORD)) & 1 == 1
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word = (index / BITS_PER_WORD) as usize;
        let mask = 1u64 << (index % BITS_PER_WORD);
        if value {
            self.data[word] |= mask;
        } else {
            self.data[word] &= !mask;
        }
    }

    /// Inverts the bit at the given index.
    pub fn flip(&mut self, index: u32) {
        let current = self.get(index);
        self.set(index, !current);
    }

    /// Creates a single-bit vector.
    pub fn from_bool(value: bool) -> Self {
        let mut v = Self::new(1);
        v.set(0, value);
        v
    }

    /// Creates a vector from the low `width` bits of `value`.
    pub fn from_u128(value: u128, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width.min(128) {
            if (value >> i) & 1 == 1 {
                v.set(i, true);
            }
        }
        v
    }

    /// Creates a vector holding the two's-complement pattern of `value`.
    pub fn from_i128(value: i128, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width {
            let bit = if i < 128 { (value >> i) & 1 == 1 } else { value < 0 };
            v.set(i, bit);
        }
        v
    }

    /// Converts to `u128`, or `None` if the width exceeds 128 bits.
    pub fn to_u128(&self) -> Option<u128> {
        if self.width > 128 {
            return None;
        }
        Some(
            (0..self.width)
                .filter(|&i| self.get(i))
                .fold(0u128, |acc, i| acc | (1 << i)),
        )
    }

    /// Returns true if every bit is zero.
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|w| *w == 0)
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.data.iter().map(|w| w.count_ones()).sum()
    }

    /// Returns `width` bits starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the vector.
    pub fn slice(&self, offset: u32, width: u32) -> Self {
        let mut v = Self::new(width);
        for i in 0..width {
            v.set(i, self.get(offset + i));
        }
        v
    }

    /// Concatenates parts, the first part supplying the least significant bits.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Bits>) -> Self {
        let parts: Vec<&Bits> = parts.into_iter().collect();
        let mut v = Self::new(parts.iter().map(|p| p.width).sum());
        let mut offset = 0;
        for part in parts {
            for i in 0..part.width {
                v.set(offset + i, part.get(i));
            }
            offset += part.width;
        }
        v
    }

    /// Iterates the bits from least to most significant.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.width).map(move |i| self.get(i))
    }

    /// Parses a binary string; the leftmost character is the most significant bit.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let mut v = Self::new(s.len() as u32);
        for (i, c) in s.chars().rev().enumerate() {
            match c {
                '0' => {}
                '1' => v.set(i as u32, true),
                _ => return None,
            }
        }
        Some(v)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({self})")
    }
}

impl BitXor for &Bits {
    type Output = Bits;

    fn bitxor(self, rhs: Self) -> Bits {
        assert_eq!(self.width, rhs.width, "Bits width mismatch in XOR");
        Bits {
            width: self.width,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a ^ b).collect(),
        }
    }
}

impl BitAnd for &Bits {
    type Output = Bits;

    fn bitand(self, rhs: Self) -> Bits {
        assert_eq!(self.width, rhs.width, "Bits width mismatch in AND");
        Bits {
            width: self.width,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a & b).collect(),
        }
    }
}

fn word_count(width: u32) -> usize {
    width.div_ceil(BITS_PER_WORD) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero() {
        let v = Bits::new(70);
        assert_eq!(v.width(), 70);
        assert!(v.is_all_zero());
        assert_eq!(v.count_ones(), 0);
    }

    #[test]
    fn set_get_across_words() {
        let mut v = Bits::new(130);
        v.set(0, true);
        v.set(64, true);
        v.set(129, true);
        assert!(v.get(0) && v.get(64) && v.get(129));
        assert!(!v.get(1));
        v.flip(64);
        assert!(!v.get(64));
        assert_eq!(v.count_ones(), 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_out_of_bounds() {
        Bits::new(4).get(4);
    }

    #[test]
    fn u128_roundtrip_truncates() {
        let v = Bits::from_u128(0b1_0110, 4);
        assert_eq!(v.to_u128(), Some(0b0110));
        assert_eq!(v.to_string(), "0110");
        assert_eq!(Bits::new(129).to_u128(), None);
    }

    #[test]
    fn twos_complement() {
        assert_eq!(Bits::from_i128(-1, 4).to_u128(), Some(0b1111));
        assert_eq!(Bits::from_i128(-3, 4).to_u128(), Some(0b1101));
        assert_eq!(Bits::from_i128(5, 4).to_u128(), Some(5));
    }

    #[test]
    fn slice_and_concat() {
        let v = Bits::from_binary_str("110010").unwrap();
        let lo = v.slice(0, 3);
        let hi = v.slice(3, 3);
        assert_eq!(lo.to_string(), "010");
        assert_eq!(hi.to_string(), "110");
        assert_eq!(Bits::concat([&lo, &hi]), v);
    }

    #[test]
    fn xor_and() {
        let a = Bits::from_u128(0b1100, 4);
        let b = Bits::from_u128(0b1010, 4);
        assert_eq!((&a ^ &b).to_u128(), Some(0b0110));
        assert_eq!((&a & &b).to_u128(), Some(0b1000));
    }

    #[test]
    fn binary_str_rejects_garbage() {
        assert!(Bits::from_binary_str("10x").is_none());
        assert_eq!(Bits::from_binary_str("").unwrap().width(), 0);
    }

    #[test]
    fn iter_lsb_first() {
        let bits: Vec<bool> = Bits::from_u128(0b01, 2).iter().collect();
        assert_eq!(bits, vec![true, false]);
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Bits::from_bool(true)), "Bits(1)");
    }
}
