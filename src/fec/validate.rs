//! Precondition checks shared by the encoder, decoder and codec
//!
//! Everything here runs before any block is touched, so a rejected call
//! leaves every buffer as it was.

use super::error::{BlockKind, FecError, Result};
use super::{MAX_DATA_BLOCKS, MAX_FEC_BLOCKS};

pub(crate) fn check_data_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(FecError::NoDataBlocks);
    }
    if count > MAX_DATA_BLOCKS {
        return Err(FecError::TooManyDataBlocks { count });
    }
    Ok(())
}

pub(crate) fn check_fec_count(count: usize) -> Result<()> {
    if count > MAX_FEC_BLOCKS {
        return Err(FecError::TooManyFecBlocks { count });
    }
    Ok(())
}

/// Every block must hold at least `fragment_len` bytes
pub(crate) fn check_block_lengths<B: AsRef<[u8]>>(
    kind: BlockKind,
    blocks: &[B],
    fragment_len: usize,
) -> Result<()> {
    match blocks
        .iter()
        .enumerate()
        .find(|(_, block)| block.as_ref().len() < fragment_len)
    {
        Some((index, block)) => Err(FecError::BlockTooShort {
            kind,
            index,
            len: block.as_ref().len(),
            fragment_len,
        }),
        None => Ok(()),
    }
}

/// Erased indices: in `0..data_blocks`, no repeats
pub(crate) fn check_erased_indices(erased: &[usize], data_blocks: usize) -> Result<()> {
    let mut seen = [false; MAX_DATA_BLOCKS];
    for &index in erased {
        if index >= data_blocks {
            return Err(FecError::DataIndexOutOfRange { index, data_blocks });
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(FecError::DuplicateDataIndex { index });
        }
    }
    Ok(())
}

/// Received FEC indices: in `0..fec_blocks`, no repeats
///
/// `fec_blocks` is the encoder's `m` when known, otherwise [`MAX_FEC_BLOCKS`].
pub(crate) fn check_fec_indices(fec_indices: &[usize], fec_blocks: usize) -> Result<()> {
    let mut seen = [false; MAX_FEC_BLOCKS];
    for &index in fec_indices {
        if index >= fec_blocks.min(MAX_FEC_BLOCKS) {
            return Err(FecError::FecIndexOutOfRange { index, fec_blocks });
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(FecError::DuplicateFecIndex { index });
        }
    }
    Ok(())
}
