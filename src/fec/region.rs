//! Buffer algebra: one field scalar applied across a whole block
//!
//! The encoder and decoder spend nearly all their time here. Each call walks
//! the common prefix of `dst` and `src`:
//!
//! - [`assign_scaled`]: `dst[i] = c * src[i]`
//! - [`accumulate_scaled`]: `dst[i] ^= c * src[i]`
//!
//! The bulk goes through the widest SIMD kernel the CPU offers (see
//! [`simd`](super::simd)); the tail, and CPUs without SIMD, use the full
//! 256-entry product row for `c`.

use super::galois::tables;
use super::simd::{self, common::build_nibble_tables, SimdLevel};

/// Specifies how to combine the multiplication result with the output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// Direct write: output = coefficient * input (replaces contents)
    Direct,
    /// Accumulate: output = output XOR (coefficient * input)
    Add,
}

/// `dst[i] = c * src[i]` over the common prefix of both slices
///
/// `c = 0` zeroes the prefix; `c = 1` copies it.
#[inline]
pub fn assign_scaled(dst: &mut [u8], src: &[u8], c: u8) {
    process_with_level(dst, src, c, WriteOp::Direct, simd::active_level());
}

/// `dst[i] ^= c * src[i]` over the common prefix of both slices
///
/// `c = 0` leaves `dst` untouched; `c = 1` is a plain XOR.
#[inline]
pub fn accumulate_scaled(dst: &mut [u8], src: &[u8], c: u8) {
    process_with_level(dst, src, c, WriteOp::Add, simd::active_level());
}

/// Region multiply with an explicit kernel choice
///
/// Used by tests and benchmarks to pin a particular [`SimdLevel`]. A level the
/// CPU cannot run degrades to the scalar loop.
#[doc(hidden)]
pub fn process_with_level(dst: &mut [u8], src: &[u8], c: u8, mode: WriteOp, level: SimdLevel) {
    let len = dst.len().min(src.len());
    if len == 0 {
        return;
    }
    let (dst, src) = (&mut dst[..len], &src[..len]);

    match (c, mode) {
        (0, WriteOp::Direct) => {
            dst.fill(0);
            return;
        }
        (0, WriteOp::Add) => return,
        (1, WriteOp::Direct) => {
            dst.copy_from_slice(src);
            return;
        }
        (1, WriteOp::Add) => {
            xor_into(dst, src);
            return;
        }
        _ => {}
    }

    let done = if level == SimdLevel::None {
        0
    } else {
        let nibbles = build_nibble_tables(c);
        simd::process_vectors(src, dst, &nibbles, mode, level)
    };

    process_slice_multiply_mode(&src[done..], &mut dst[done..], c, mode);
}

/// Scalar region multiply using the product row for `c`
///
/// Processes `min(input.len(), output.len())` bytes.
#[doc(hidden)]
#[inline]
pub fn process_slice_multiply_mode(input: &[u8], output: &mut [u8], c: u8, mode: WriteOp) {
    let row = tables().mul_row(c);
    match mode {
        WriteOp::Direct => {
            for (out, &x) in output.iter_mut().zip(input) {
                *out = row[x as usize];
            }
        }
        WriteOp::Add => {
            for (out, &x) in output.iter_mut().zip(input) {
                *out ^= row[x as usize];
            }
        }
    }
}

#[inline]
fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Byte-at-a-time reference: `dst[i] = c * src[i]` via bitwise multiplication
///
/// Independent of every table and kernel; tests compare against it.
#[doc(hidden)]
pub fn assign_scaled_reference(dst: &mut [u8], src: &[u8], c: u8) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = super::galois::mul_bitwise(c, s);
    }
}

/// Byte-at-a-time reference: `dst[i] ^= c * src[i]` via bitwise multiplication
#[doc(hidden)]
pub fn accumulate_scaled_reference(dst: &mut [u8], src: &[u8], c: u8) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d ^= super::galois::mul_bitwise(c, s);
    }
}
