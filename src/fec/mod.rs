//! Systematic GF(2^8) erasure code
//!
//! `k` data blocks produce `m` FEC blocks; any `k` of the `k + m` blocks
//! rebuild the batch. Data blocks are transmitted unchanged (the code is
//! systematic), so the decoder only has work to do when data blocks are lost.
//!
//! ## Layers
//!
//! - [`galois`]: GF(2^8) tables and scalar arithmetic
//! - [`region`]: `assign_scaled` / `accumulate_scaled` over whole blocks, SIMD-dispatched
//! - [`matrix`]: Gauss-Jordan inversion of the decode matrix
//! - [`encoder`] and [`decoder`]: the free `encode` / `decode` functions
//! - [`codec`]: [`FecCodec`], a validated `(k, m)` pair with optional rayon fan-out
//!
//! ## Limits
//!
//! Both `k` and `m` are capped at 128: FEC row indices and `128 + col` data
//! indices must stay in disjoint halves of the field.

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod galois;
pub mod matrix;
pub mod region;
pub mod simd;
mod validate;

pub use codec::FecCodec;
pub use decoder::{decode, decode_parallel};
pub use encoder::{coefficient, encode, encode_parallel};
pub use error::{BlockKind, FecError, Result};
pub use galois::Galois8;
pub use matrix::SquareMatrix;
pub use region::{accumulate_scaled, assign_scaled};

/// Maximum number of data blocks per batch
pub const MAX_DATA_BLOCKS: usize = 128;

/// Maximum number of FEC blocks per batch
pub const MAX_FEC_BLOCKS: usize = 128;

/// Build the field tables and probe the CPU's SIMD level
///
/// Idempotent and thread-safe. Every operation initializes lazily, so calling
/// this is only needed to keep the one-time cost off the first batch.
pub fn init() {
    galois::init();
    simd::active_level();
}
