//! ARM NEON GF(2^8) region multiplication
//!
//! Same nibble strategy as the PSHUFB kernels, using `vqtbl1q_u8` for the two
//! 16-entry lookups. 16 bytes per iteration.

use super::super::region::WriteOp;
use super::common::NibbleTables;
use std::arch::aarch64::*;

/// NEON region multiply
///
/// Returns the number of leading bytes written (a multiple of 16).
///
/// # Safety
/// - Requires NEON (baseline on aarch64).
/// - `input` and `output` must not alias.
#[target_feature(enable = "neon")]
pub unsafe fn process_slice_multiply_neon(
    input: &[u8],
    output: &mut [u8],
    tables: &NibbleTables,
    mode: WriteOp,
) -> usize {
    let len = input.len().min(output.len());
    let end = len - len % 16;

    let low_tbl: uint8x16_t = vld1q_u8(tables.low.as_ptr());
    let high_tbl: uint8x16_t = vld1q_u8(tables.high.as_ptr());
    let mask_0x0f = vdupq_n_u8(0x0F);

    let mut pos = 0;
    while pos < end {
        let in_vec = vld1q_u8(input.as_ptr().add(pos));

        let lo_nib = vandq_u8(in_vec, mask_0x0f);
        let hi_nib = vandq_u8(vshrq_n_u8(in_vec, 4), mask_0x0f);
        let product = veorq_u8(vqtbl1q_u8(low_tbl, lo_nib), vqtbl1q_u8(high_tbl, hi_nib));

        let result = match mode {
            WriteOp::Direct => product,
            WriteOp::Add => veorq_u8(vld1q_u8(output.as_ptr().add(pos)), product),
        };
        vst1q_u8(output.as_mut_ptr().add(pos), result);

        pos += 16;
    }

    end
}
