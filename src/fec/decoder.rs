//! Decoder: reduce + resolve
//!
//! Given the surviving data blocks, the erased indices `E` and one received
//! FEC block per erasure (with original indices `R`):
//!
//! 1. **Reduce** strips every present data block's contribution out of each
//!    received FEC block. What remains in `fec[j]` is a combination of the
//!    erased data blocks only.
//! 2. **Resolve** inverts the `|E|×|E|` matrix of those remaining
//!    coefficients and multiplies it back onto the reduced FEC blocks, writing
//!    each reconstructed block into its slot in `data`.
//!
//! The received FEC buffers are consumed: after a successful decode they hold
//! intermediate values, not the original FEC bytes.

use super::encoder::coefficient;
use super::error::{BlockKind, FecError, Result};
use super::matrix::SquareMatrix;
use super::region::{accumulate_scaled, assign_scaled};
use super::validate::{
    check_block_lengths, check_data_count, check_erased_indices, check_fec_count,
    check_fec_indices,
};
use super::{MAX_DATA_BLOCKS, MAX_FEC_BLOCKS};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Reconstruct the erased data blocks in place
///
/// `fec[j]` must be the FEC block originally produced as row `fec_indices[j]`.
/// Exactly one FEC block per erasure is required; use
/// [`FecCodec::decode`](super::FecCodec::decode) to hand over surplus blocks.
///
/// Contents of erased data slots are ignored and overwritten. With no
/// erasures, or `fragment_len == 0`, nothing is written.
///
/// # Errors
/// - Block-count and index errors (see [`FecError`]), checked before any buffer is touched
/// - [`FecError::InsufficientRedundancy`] when `|E| > |R|`
/// - [`FecError::ErasureCountMismatch`] when `|E| < |R|`
/// - [`FecError::SingularMatrix`] if the resolve matrix cannot be inverted
///
/// # Example
/// ```rust
/// use fecrs::fec::{decode, encode};
///
/// let original = vec![vec![1u8; 16], vec![2u8; 16], vec![3u8; 16]];
/// let mut fec = vec![vec![0u8; 16]; 2];
/// encode(16, &original, &mut fec).unwrap();
///
/// let mut data = original.clone();
/// data[1].fill(0);
/// let mut received = vec![fec[1].clone()];
/// decode(16, &mut data, &[1], &mut received, &[1]).unwrap();
/// assert_eq!(data, original);
/// ```
pub fn decode<D, F>(
    fragment_len: usize,
    data: &mut [D],
    erased: &[usize],
    fec: &mut [F],
    fec_indices: &[usize],
) -> Result<()>
where
    D: AsRef<[u8]> + AsMut<[u8]>,
    F: AsRef<[u8]> + AsMut<[u8]>,
{
    decode_bounded(fragment_len, data, erased, fec, fec_indices, MAX_FEC_BLOCKS)
}

/// [`decode`] with rayon fan-out
///
/// Reduce runs one task per received FEC block, resolve one task per
/// reconstructed data block. Output is identical to [`decode`].
pub fn decode_parallel<D, F>(
    fragment_len: usize,
    data: &mut [D],
    erased: &[usize],
    fec: &mut [F],
    fec_indices: &[usize],
) -> Result<()>
where
    D: AsRef<[u8]> + AsMut<[u8]> + Send + Sync,
    F: AsRef<[u8]> + AsMut<[u8]> + Send + Sync,
{
    decode_parallel_bounded(fragment_len, data, erased, fec, fec_indices, MAX_FEC_BLOCKS)
}

/// [`decode`] with received indices checked against `fec_blocks`
pub(crate) fn decode_bounded<D, F>(
    fragment_len: usize,
    data: &mut [D],
    erased: &[usize],
    fec: &mut [F],
    fec_indices: &[usize],
    fec_blocks: usize,
) -> Result<()>
where
    D: AsRef<[u8]> + AsMut<[u8]>,
    F: AsRef<[u8]> + AsMut<[u8]>,
{
    validate(fragment_len, data, erased, fec, fec_indices, fec_blocks)?;
    if erased.is_empty() || fragment_len == 0 {
        return Ok(());
    }

    let inverse = resolve_matrix(erased, fec_indices)?;
    let present = present_columns(data.len(), erased);

    log::debug!(
        "reduce: {} present data blocks into {} FEC blocks of {} bytes",
        data.len() - erased.len(),
        fec.len(),
        fragment_len
    );
    for (col, block) in data.iter().enumerate().filter(|(col, _)| present[*col]) {
        let src = &block.as_ref()[..fragment_len];
        for (out, &row) in fec.iter_mut().zip(fec_indices) {
            accumulate_scaled(&mut out.as_mut()[..fragment_len], src, coefficient(row, col));
        }
    }

    log::debug!("resolve: rebuilding data blocks {:?}", erased);
    for (j, &target) in erased.iter().enumerate() {
        let dst = &mut data[target].as_mut()[..fragment_len];
        resolve_block(dst, j, &inverse, fec, fragment_len);
    }

    Ok(())
}

pub(crate) fn decode_parallel_bounded<D, F>(
    fragment_len: usize,
    data: &mut [D],
    erased: &[usize],
    fec: &mut [F],
    fec_indices: &[usize],
    fec_blocks: usize,
) -> Result<()>
where
    D: AsRef<[u8]> + AsMut<[u8]> + Send + Sync,
    F: AsRef<[u8]> + AsMut<[u8]> + Send + Sync,
{
    validate(fragment_len, data, erased, fec, fec_indices, fec_blocks)?;
    if erased.is_empty() || fragment_len == 0 {
        return Ok(());
    }

    let inverse = resolve_matrix(erased, fec_indices)?;
    let present = present_columns(data.len(), erased);

    log::debug!(
        "reduce (parallel): {} present data blocks into {} FEC blocks of {} bytes",
        data.len() - erased.len(),
        fec.len(),
        fragment_len
    );
    {
        let data: &[D] = data;
        fec.par_iter_mut()
            .zip(fec_indices.par_iter())
            .for_each(|(out, &row)| {
                let dst = &mut out.as_mut()[..fragment_len];
                for (col, block) in data.iter().enumerate().filter(|(col, _)| present[*col]) {
                    accumulate_scaled(dst, &block.as_ref()[..fragment_len], coefficient(row, col));
                }
            });
    }

    log::debug!("resolve (parallel): rebuilding data blocks {:?}", erased);
    let mut slot = [None; MAX_DATA_BLOCKS];
    for (j, &target) in erased.iter().enumerate() {
        slot[target] = Some(j);
    }
    let fec: &[F] = fec;
    data.par_iter_mut()
        .enumerate()
        .filter_map(|(idx, block)| slot[idx].map(|j| (j, block)))
        .for_each(|(j, block)| {
            resolve_block(&mut block.as_mut()[..fragment_len], j, &inverse, fec, fragment_len);
        });

    Ok(())
}

/// `dst = Σ_i inverse[j][i] * fec[i]`
fn resolve_block<F: AsRef<[u8]>>(
    dst: &mut [u8],
    j: usize,
    inverse: &SquareMatrix,
    fec: &[F],
    fragment_len: usize,
) {
    for (i, block) in fec.iter().enumerate() {
        let src = &block.as_ref()[..fragment_len];
        if i == 0 {
            assign_scaled(dst, src, inverse.get(j, i));
        } else {
            accumulate_scaled(dst, src, inverse.get(j, i));
        }
    }
}

/// Inverse of `M[i][j] = coefficient(R[i], E[j])`
fn resolve_matrix(erased: &[usize], fec_indices: &[usize]) -> Result<SquareMatrix> {
    let size = erased.len();
    let mut matrix = SquareMatrix::from_fn(size, |i, j| coefficient(fec_indices[i], erased[j]));
    if let Err(err) = matrix.invert() {
        log::warn!(
            "{}x{} decode matrix is singular: FEC rows {:?}, erased data columns {:?}",
            size,
            size,
            fec_indices,
            erased
        );
        return Err(err);
    }
    Ok(matrix)
}

fn present_columns(data_blocks: usize, erased: &[usize]) -> [bool; MAX_DATA_BLOCKS] {
    let mut present = [false; MAX_DATA_BLOCKS];
    present[..data_blocks].fill(true);
    for &index in erased {
        present[index] = false;
    }
    present
}

fn validate<D, F>(
    fragment_len: usize,
    data: &[D],
    erased: &[usize],
    fec: &[F],
    fec_indices: &[usize],
    fec_blocks: usize,
) -> Result<()>
where
    D: AsRef<[u8]>,
    F: AsRef<[u8]>,
{
    check_data_count(data.len())?;
    if fec.len() != fec_indices.len() {
        return Err(FecError::FecIndexCountMismatch {
            blocks: fec.len(),
            indices: fec_indices.len(),
        });
    }
    check_fec_count(fec.len())?;
    check_erased_indices(erased, data.len())?;
    check_fec_indices(fec_indices, fec_blocks)?;

    match erased.len().cmp(&fec.len()) {
        Ordering::Greater => {
            return Err(FecError::InsufficientRedundancy {
                erased: erased.len(),
                received: fec.len(),
            })
        }
        Ordering::Less => {
            return Err(FecError::ErasureCountMismatch {
                erased: erased.len(),
                received: fec.len(),
            })
        }
        Ordering::Equal => {}
    }

    check_block_lengths(BlockKind::Data, data, fragment_len)?;
    check_block_lengths(BlockKind::Fec, fec, fragment_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fec::encoder::encode;

    fn batch(k: usize, len: usize) -> Vec<Vec<u8>> {
        (0..k)
            .map(|i| {
                (0..len)
                    .map(|j| (i * 37 + j * 11 + 5) as u8)
                    .collect()
            })
            .collect()
    }

    fn encoded(k: usize, m: usize, len: usize) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
        let data = batch(k, len);
        let mut fec = vec![vec![0u8; len]; m];
        encode(len, &data, &mut fec).unwrap();
        (data, fec)
    }

    #[test]
    fn recovers_unsorted_erasures() {
        let (original, fec) = encoded(6, 4, 50);
        let mut data = original.clone();
        let erased = [4, 0, 2];
        for &e in &erased {
            data[e].fill(0xFF);
        }
        let fec_indices = [3, 1, 0];
        let mut received: Vec<Vec<u8>> = fec_indices.iter().map(|&r| fec[r].clone()).collect();
        decode(50, &mut data, &erased, &mut received, &fec_indices).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn parallel_matches_sequential() {
        let (original, fec) = encoded(10, 5, 77);
        let erased = [9, 3, 5, 1];
        let fec_indices = [4, 0, 2, 3];

        let mut seq = original.clone();
        let mut par = original.clone();
        for &e in &erased {
            seq[e].fill(0);
            par[e].fill(0);
        }
        let mut fec_seq: Vec<Vec<u8>> = fec_indices.iter().map(|&r| fec[r].clone()).collect();
        let mut fec_par = fec_seq.clone();

        decode(77, &mut seq, &erased, &mut fec_seq, &fec_indices).unwrap();
        decode_parallel(77, &mut par, &erased, &mut fec_par, &fec_indices).unwrap();
        assert_eq!(seq, original);
        assert_eq!(par, original);
        assert_eq!(fec_seq, fec_par);
    }

    #[test]
    fn no_erasures_is_noop() {
        let (original, _) = encoded(3, 1, 8);
        let mut data = original.clone();
        let mut fec: Vec<Vec<u8>> = Vec::new();
        decode(8, &mut data, &[], &mut fec, &[]).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn rejected_call_leaves_buffers_untouched() {
        let (original, fec) = encoded(4, 2, 8);
        let mut data = original.clone();
        let mut received = vec![fec[0].clone(), fec[1].clone()];
        let err = decode(8, &mut data, &[1], &mut received, &[0, 1]).unwrap_err();
        assert_eq!(
            err,
            FecError::ErasureCountMismatch {
                erased: 1,
                received: 2
            }
        );
        assert_eq!(data, original);
        assert_eq!(received, fec);
    }

    #[test]
    fn index_count_mismatch() {
        let mut data = batch(2, 4);
        let mut fec = vec![vec![0u8; 4]];
        assert_eq!(
            decode(4, &mut data, &[0], &mut fec, &[0, 1]),
            Err(FecError::FecIndexCountMismatch {
                blocks: 1,
                indices: 2
            })
        );
    }
}
