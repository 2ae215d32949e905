//! Common SIMD utilities shared across all implementations
//!
//! Provides the nibble tables every shuffle-based kernel is built on.

use crate::fec::galois::tables;

/// Nibble lookup tables for one coefficient
///
/// GF(2^8) multiplication distributes over XOR, so for an input byte
/// `x = (hi << 4) | lo`:
///
/// ```text
/// c * x = low[lo] ^ high[hi]
/// ```
///
/// Two 16-entry tables fit a single PSHUFB / TBL register each, which turns a
/// 256-entry lookup into two parallel shuffles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NibbleTables {
    /// `c * n` for `n` in `0x00..=0x0F`
    pub low: [u8; 16],
    /// `c * (n << 4)` for `n` in `0x0..=0xF`
    pub high: [u8; 16],
}

/// Build nibble lookup tables for a coefficient
///
/// # Example
/// ```rust
/// # use fecrs::fec::simd::common::build_nibble_tables;
/// # use fecrs::fec::galois::gf_mul;
/// let nibbles = build_nibble_tables(0x35);
/// let x = 0xA7u8;
/// assert_eq!(nibbles.low[(x & 0x0F) as usize] ^ nibbles.high[(x >> 4) as usize], gf_mul(0x35, x));
/// ```
pub fn build_nibble_tables(coefficient: u8) -> NibbleTables {
    let row = tables().mul_row(coefficient);
    let mut low = [0u8; 16];
    let mut high = [0u8; 16];

    for nib in 0..16 {
        low[nib] = row[nib];
        high[nib] = row[nib << 4];
    }

    NibbleTables { low, high }
}
