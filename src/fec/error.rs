//! Error types for encode and decode operations

use std::fmt;
use thiserror::Error;

/// Which block list a block-level error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Data,
    Fec,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Data => write!(f, "data"),
            BlockKind::Fec => write!(f, "FEC"),
        }
    }
}

/// Errors that can occur while encoding or decoding a batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FecError {
    /// A batch needs at least one data block
    #[error("No data blocks supplied")]
    NoDataBlocks,

    /// More data blocks than the code structure allows
    #[error("Too many data blocks: {count} (maximum {max})", max = super::MAX_DATA_BLOCKS)]
    TooManyDataBlocks { count: usize },

    /// More FEC blocks than the code structure allows
    #[error("Too many FEC blocks: {count} (maximum {max})", max = super::MAX_FEC_BLOCKS)]
    TooManyFecBlocks { count: usize },

    /// Block list length differs from the codec's configured count
    #[error("Expected {expected} {kind} blocks, got {actual}")]
    BlockCountMismatch {
        kind: BlockKind,
        expected: usize,
        actual: usize,
    },

    /// A block is shorter than the fragment length of the call
    #[error("{kind} block {index} is {len} bytes, fragment length is {fragment_len}")]
    BlockTooShort {
        kind: BlockKind,
        index: usize,
        len: usize,
        fragment_len: usize,
    },

    /// Erased index does not name a data block
    #[error("Erased data index {index} out of range ({data_blocks} data blocks)")]
    DataIndexOutOfRange { index: usize, data_blocks: usize },

    /// Received index does not name a FEC block
    #[error("FEC index {index} out of range ({fec_blocks} FEC blocks)")]
    FecIndexOutOfRange { index: usize, fec_blocks: usize },

    /// Same data index listed as erased twice
    #[error("Data index {index} listed as erased more than once")]
    DuplicateDataIndex { index: usize },

    /// Same FEC index listed as received twice
    #[error("FEC index {index} listed more than once")]
    DuplicateFecIndex { index: usize },

    /// FEC blocks and their indices differ in count
    #[error("{blocks} FEC blocks supplied with {indices} FEC indices")]
    FecIndexCountMismatch { blocks: usize, indices: usize },

    /// Fewer FEC blocks than erasures
    #[error("Cannot recover: {erased} erased data blocks but only {received} FEC blocks")]
    InsufficientRedundancy { erased: usize, received: usize },

    /// More FEC blocks than erasures handed to the core decoder
    #[error("Decoder needs exactly one FEC block per erasure: {erased} erased, {received} FEC blocks")]
    ErasureCountMismatch { erased: usize, received: usize },

    /// The inverter found no usable pivot
    #[error("Singular {size}x{size} decode matrix")]
    SingularMatrix { size: usize },
}

/// Type alias for Result with FecError
pub type Result<T> = std::result::Result<T, FecError>;
