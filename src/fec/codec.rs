//! `FecCodec`: a validated `(k, m)` code with optional rayon fan-out

use super::decoder::{decode_bounded, decode_parallel_bounded};
use super::encoder::{encode, encode_parallel};
use super::error::{BlockKind, FecError, Result};
use super::validate::{check_data_count, check_fec_count, check_fec_indices};

/// A systematic code with `k` data blocks and `m` FEC blocks per batch
///
/// The codec holds no buffers; one instance can serve any number of batches
/// and threads at once.
///
/// # Example
/// ```rust
/// use fecrs::fec::FecCodec;
///
/// let codec = FecCodec::new(4, 2).unwrap();
/// let original: Vec<Vec<u8>> = (0..4u8).map(|i| vec![i; 32]).collect();
/// let mut fec = vec![vec![0u8; 32]; 2];
/// codec.encode(32, &original, &mut fec).unwrap();
///
/// let mut data = original.clone();
/// data[2].fill(0);
/// codec.decode(32, &mut data, &[2], &mut fec, &[0, 1]).unwrap();
/// assert_eq!(data, original);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecCodec {
    data_blocks: usize,
    fec_blocks: usize,
    parallel: bool,
}

impl FecCodec {
    /// Create a codec for `data_blocks` (1..=128) and `fec_blocks` (0..=128)
    pub fn new(data_blocks: usize, fec_blocks: usize) -> Result<Self> {
        check_data_count(data_blocks)?;
        check_fec_count(fec_blocks)?;
        super::init();
        Ok(Self {
            data_blocks,
            fec_blocks,
            parallel: false,
        })
    }

    /// Spread each encode/decode over the current rayon pool
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn data_blocks(&self) -> usize {
        self.data_blocks
    }

    pub fn fec_blocks(&self) -> usize {
        self.fec_blocks
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Whether `missing` lost data blocks can be rebuilt from a full set of FEC blocks
    pub fn can_recover(&self, missing: usize) -> bool {
        missing <= self.fec_blocks
    }

    /// Encode one batch; `data` must hold `k` blocks and `fec` exactly `m`
    pub fn encode<D, F>(&self, fragment_len: usize, data: &[D], fec: &mut [F]) -> Result<()>
    where
        D: AsRef<[u8]> + Sync,
        F: AsMut<[u8]> + Send,
    {
        self.check_count(BlockKind::Data, self.data_blocks, data.len())?;
        self.check_count(BlockKind::Fec, self.fec_blocks, fec.len())?;

        if self.parallel {
            encode_parallel(fragment_len, data, fec)
        } else {
            encode(fragment_len, data, fec)
        }
    }

    /// Decode one batch in place
    ///
    /// Unlike the free [`decode`](super::decode), surplus FEC blocks are
    /// allowed: only the first `erased.len()` received blocks are used (and
    /// consumed), the rest are left as they were.
    pub fn decode<D, F>(
        &self,
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
        self.check_count(BlockKind::Data, self.data_blocks, data.len())?;
        if fec.len() != fec_indices.len() {
            return Err(FecError::FecIndexCountMismatch {
                blocks: fec.len(),
                indices: fec_indices.len(),
            });
        }
        check_fec_indices(fec_indices, self.fec_blocks)?;

        let used = if fec.len() > erased.len() {
            log::debug!(
                "using {} of {} received FEC blocks",
                erased.len(),
                fec.len()
            );
            erased.len()
        } else {
            fec.len()
        };
        let (fec, fec_indices) = (&mut fec[..used], &fec_indices[..used]);

        if self.parallel {
            decode_parallel_bounded(fragment_len, data, erased, fec, fec_indices, self.fec_blocks)
        } else {
            decode_bounded(fragment_len, data, erased, fec, fec_indices, self.fec_blocks)
        }
    }

    fn check_count(&self, kind: BlockKind, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(FecError::BlockCountMismatch {
                kind,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_limits() {
        assert_eq!(FecCodec::new(0, 1), Err(FecError::NoDataBlocks));
        assert_eq!(
            FecCodec::new(129, 1),
            Err(FecError::TooManyDataBlocks { count: 129 })
        );
        assert_eq!(
            FecCodec::new(1, 129),
            Err(FecError::TooManyFecBlocks { count: 129 })
        );
        let codec = FecCodec::new(128, 128).unwrap();
        assert!(codec.can_recover(128));
        assert!(!codec.can_recover(129));
        assert!(!codec.is_parallel());
        assert!(codec.parallel(true).is_parallel());
    }

    #[test]
    fn block_count_must_match() {
        let codec = FecCodec::new(3, 2).unwrap();
        let data = vec![vec![0u8; 4]; 2];
        let mut fec = vec![vec![0u8; 4]; 2];
        assert_eq!(
            codec.encode(4, &data, &mut fec),
            Err(FecError::BlockCountMismatch {
                kind: BlockKind::Data,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn fec_index_bounded_by_m() {
        let codec = FecCodec::new(3, 2).unwrap();
        let mut data = vec![vec![0u8; 4]; 3];
        let mut fec = vec![vec![0u8; 4]];
        assert_eq!(
            codec.decode(4, &mut data, &[0], &mut fec, &[2]),
            Err(FecError::FecIndexOutOfRange {
                index: 2,
                fec_blocks: 2
            })
        );
    }

    #[test]
    fn surplus_fec_blocks_are_left_alone() {
        let codec = FecCodec::new(5, 3).unwrap();
        let original: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i.wrapping_mul(41); 20]).collect();
        let mut fec = vec![vec![0u8; 20]; 3];
        codec.encode(20, &original, &mut fec).unwrap();
        let untouched = fec[2].clone();

        let mut data = original.clone();
        data[3].fill(0);
        codec.decode(20, &mut data, &[3], &mut fec, &[0, 1, 2]).unwrap();
        assert_eq!(data, original);
        assert_eq!(fec[1], original_fec_row(&original, 1));
        assert_eq!(fec[2], untouched);
    }

    fn original_fec_row(data: &[Vec<u8>], row: usize) -> Vec<u8> {
        let mut fec = vec![vec![0u8; data[0].len()]; row + 1];
        encode(data[0].len(), data, &mut fec).unwrap();
        fec.swap_remove(row)
    }
}
