//! Systematic encoder
//!
//! FEC block `row` is a fixed linear combination of the data blocks:
//!
//! ```text
//! fec[row] = Σ_col coefficient(row, col) * data[col]
//! coefficient(row, col) = inverse(row XOR (128 + col))
//! ```
//!
//! Rows and columns are drawn from the two disjoint halves of the field
//! (`row < 128 ≤ 128 + col`), so any square selection of these coefficients
//! forms a Cauchy matrix and is invertible. That is what caps both `k` and
//! `m` at 128.

use super::error::{BlockKind, FecError, Result};
use super::galois::gf_inverse;
use super::region::{accumulate_scaled, assign_scaled};
use super::validate::{check_block_lengths, check_data_count, check_fec_count};
use rayon::prelude::*;

/// Coefficient applied to data block `col` when building FEC block `row`
///
/// Both indices must be below 128.
#[inline]
pub fn coefficient(row: usize, col: usize) -> u8 {
    debug_assert!(row < super::MAX_FEC_BLOCKS && col < super::MAX_DATA_BLOCKS);
    gf_inverse((row ^ (128 + col)) as u8)
}

/// Compute `fec.len()` FEC blocks from `data`
///
/// Only the first `fragment_len` bytes of every block are read or written.
/// Encoding is deterministic; re-encoding the same data overwrites the FEC
/// blocks with identical bytes.
///
/// # Errors
/// - [`NoDataBlocks`](super::FecError::NoDataBlocks) / too many data or FEC blocks
/// - [`BlockTooShort`](super::FecError::BlockTooShort) for any block under `fragment_len`
///
/// # Example
/// ```rust
/// use fecrs::fec::encode;
///
/// let data = vec![vec![1u8, 2, 3], vec![4, 5, 6]];
/// let mut fec = vec![vec![0u8; 3]; 2];
/// encode(3, &data, &mut fec).unwrap();
/// ```
pub fn encode<D, F>(fragment_len: usize, data: &[D], fec: &mut [F]) -> Result<()>
where
    D: AsRef<[u8]>,
    F: AsMut<[u8]>,
{
    validate(fragment_len, data, fec)?;

    // Column-major: each data block is streamed once into every FEC row
    for (col, block) in data.iter().enumerate() {
        let src = &block.as_ref()[..fragment_len];
        for (row, out) in fec.iter_mut().enumerate() {
            let dst = &mut out.as_mut()[..fragment_len];
            if col == 0 {
                assign_scaled(dst, src, coefficient(row, col));
            } else {
                accumulate_scaled(dst, src, coefficient(row, col));
            }
        }
    }

    Ok(())
}

/// [`encode`] with one rayon task per FEC block
///
/// Each worker owns exactly one output block, so the result is identical to
/// the sequential path.
pub fn encode_parallel<D, F>(fragment_len: usize, data: &[D], fec: &mut [F]) -> Result<()>
where
    D: AsRef<[u8]> + Sync,
    F: AsMut<[u8]> + Send,
{
    validate(fragment_len, data, fec)?;

    fec.par_iter_mut().enumerate().for_each(|(row, out)| {
        encode_row(row, &mut out.as_mut()[..fragment_len], data, fragment_len);
    });

    Ok(())
}

fn encode_row<D: AsRef<[u8]>>(row: usize, dst: &mut [u8], data: &[D], fragment_len: usize) {
    for (col, block) in data.iter().enumerate() {
        let src = &block.as_ref()[..fragment_len];
        if col == 0 {
            assign_scaled(dst, src, coefficient(row, col));
        } else {
            accumulate_scaled(dst, src, coefficient(row, col));
        }
    }
}

fn validate<D, F>(fragment_len: usize, data: &[D], fec: &mut [F]) -> Result<()>
where
    D: AsRef<[u8]>,
    F: AsMut<[u8]>,
{
    check_data_count(data.len())?;
    check_fec_count(fec.len())?;
    check_block_lengths(BlockKind::Data, data, fragment_len)?;
    for (index, block) in fec.iter_mut().enumerate() {
        let len = block.as_mut().len();
        if len < fragment_len {
            return Err(FecError::BlockTooShort {
                kind: BlockKind::Fec,
                index,
                len,
                fragment_len,
            });
        }
    }
    Ok(())
}
